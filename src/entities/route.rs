use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Sentinel distance/duration text for a route the provider could not
/// supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// A provider-computed path and travel estimate between two coordinates.
/// The distance and duration are opaque display strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_text: String,
    pub duration_text: String,
    pub start_address: String,
    pub end_address: String,
    pub polyline: Vec<Coordinates>,
}

impl RouteSummary {
    /// Straight two-point stand-in used when the directions provider fails.
    pub fn fallback(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            distance_text: NOT_AVAILABLE.into(),
            duration_text: NOT_AVAILABLE.into(),
            start_address: String::new(),
            end_address: String::new(),
            polyline: vec![origin, destination],
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.distance_text == NOT_AVAILABLE && self.duration_text == NOT_AVAILABLE
    }
}

#[test]
fn fallback_is_a_straight_two_point_route() {
    let origin = Coordinates::new(17.385, 78.4867);
    let destination = Coordinates::new(17.385, 78.4967);

    let route = RouteSummary::fallback(origin, destination);

    assert!(route.is_fallback());
    assert_eq!(route.distance_text, NOT_AVAILABLE);
    assert_eq!(route.duration_text, NOT_AVAILABLE);
    assert_eq!(route.polyline, vec![origin, destination]);
}
