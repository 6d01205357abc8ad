use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, GeofencePolygon, RouteSummary};

/// A shop row as the backend returns it, the geofence still an opaque JSON
/// payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRecord {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub pincode: String,
    pub coordinates_json: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub pincode: String,
    pub geofence: GeofencePolygon,
    pub is_inside: bool,
}

/// Result of one discovery pass. Carries the center and radius it was
/// computed for so callers never mix route results across invocations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Discovery {
    pub center: Coordinates,
    pub radius_meters: f64,
    pub shops: Vec<Shop>,
    pub routes: HashMap<i64, RouteSummary>,
}
