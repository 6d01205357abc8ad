use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{parse_error, Error};

/// A shop's catchment boundary, ordered vertices. Anything below three
/// vertices never contains a point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeofencePolygon {
    vertices: Vec<Coordinates>,
}

// The backend stores geofences as opaque JSON text in one of two shapes:
// a list of {lat, lng} objects, or a list of [lng, lat] pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGeofence {
    Objects(Vec<RawVertex>),
    Pairs(Vec<Vec<f64>>),
}

#[derive(Deserialize)]
struct RawVertex {
    lat: f64,
    lng: f64,
}

impl GeofencePolygon {
    pub fn new(vertices: Vec<Coordinates>) -> Self {
        Self { vertices }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses an untrusted geofence payload, degrading to an empty polygon
    /// on any shape it does not recognize.
    pub fn parse(payload: &str) -> Self {
        match Self::try_parse(payload) {
            Ok(polygon) => polygon,
            Err(err) => {
                tracing::debug!("discarding geofence payload: {}", err);
                Self::empty()
            }
        }
    }

    pub fn try_parse(payload: &str) -> Result<Self, Error> {
        let raw: RawGeofence = serde_json::from_str(payload)?;

        let vertices = match raw {
            RawGeofence::Objects(vertices) => vertices
                .into_iter()
                .map(|vertex| Coordinates::new(vertex.lat, vertex.lng))
                .collect(),
            RawGeofence::Pairs(pairs) => {
                if pairs.iter().any(|pair| pair.len() < 2) {
                    return Err(parse_error("geofence pair with fewer than two values"));
                }

                pairs
                    .into_iter()
                    .map(|pair| Coordinates::new(pair[1], pair[0]))
                    .collect()
            }
        };

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Coordinates] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// First vertex, the shop's stand-in location for distance filtering.
    pub fn representative(&self) -> Option<Coordinates> {
        self.vertices.first().copied()
    }
}

#[test]
fn parses_object_vertices() {
    let polygon = GeofencePolygon::parse(r#"[{"lat":1,"lng":2}]"#);
    assert_eq!(polygon.vertices(), &[Coordinates::new(1.0, 2.0)]);
}

#[test]
fn parses_lng_lat_pairs() {
    let polygon = GeofencePolygon::parse("[[2,1]]");
    assert_eq!(polygon.vertices(), &[Coordinates::new(1.0, 2.0)]);
}

#[test]
fn extra_pair_values_are_ignored() {
    let polygon = GeofencePolygon::parse("[[2,1,99]]");
    assert_eq!(polygon.vertices(), &[Coordinates::new(1.0, 2.0)]);
}

#[test]
fn degrades_to_empty_on_garbage() {
    assert!(GeofencePolygon::parse("not json").is_empty());
    assert!(GeofencePolygon::parse("[]").is_empty());
    assert!(GeofencePolygon::parse("{\"lat\":1}").is_empty());
    assert!(GeofencePolygon::parse("[[1]]").is_empty());
    assert!(GeofencePolygon::parse(r#"[{"lat":1,"lng":2},[3,4]]"#).is_empty());
}

#[test]
fn try_parse_surfaces_the_parse_error() {
    use crate::error::Kind;

    let err = GeofencePolygon::try_parse("not json").unwrap_err();
    assert_eq!(err.kind, Kind::Parse);

    let err = GeofencePolygon::try_parse("[[1]]").unwrap_err();
    assert_eq!(err.kind, Kind::Parse);
}

#[test]
fn representative_is_the_first_vertex() {
    let polygon = GeofencePolygon::parse(r#"[{"lat":1,"lng":2},{"lat":3,"lng":4}]"#);
    assert_eq!(polygon.representative(), Some(Coordinates::new(1.0, 2.0)));
    assert_eq!(GeofencePolygon::empty().representative(), None);
}
