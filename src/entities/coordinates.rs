use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees. Immutable value type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// "lat,lng" query form expected by the directions provider.
impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{},{}", coordinates.latitude, coordinates.longitude)
    }
}

// x is longitude, y is latitude.
impl From<Coordinates> for Coord<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Coord {
            x: coordinates.longitude,
            y: coordinates.latitude,
        }
    }
}

#[test]
fn validates_coordinate_ranges() {
    assert!(Coordinates::new(17.385, 78.4867).is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());
    assert!(!Coordinates::new(90.1, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.5).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
}

#[test]
fn query_form_is_lat_comma_lng() {
    let query: String = Coordinates::new(17.385, 78.4867).into();
    assert_eq!(query, "17.385,78.4867");
}
