use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

/// Forward-geocoding result: a free-text address resolved to a coordinate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub coordinates: Coordinates,
    pub formatted_address: String,
    pub components: Vec<AddressComponent>,
}

/// Reverse-geocoding result: a coordinate resolved to an address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReverseGeocodedAddress {
    pub address: String,
    pub components: Vec<AddressComponent>,
}

pub fn postal_code(components: &[AddressComponent]) -> Option<&str> {
    components
        .iter()
        .find(|component| component.types.iter().any(|t| t == "postal_code"))
        .map(|component| component.long_name.as_str())
}

#[test]
fn finds_the_postal_code_component() {
    let components = vec![
        AddressComponent {
            long_name: "Gudiwada".into(),
            short_name: "Gudiwada".into(),
            types: vec!["locality".into(), "political".into()],
        },
        AddressComponent {
            long_name: "521301".into(),
            short_name: "521301".into(),
            types: vec!["postal_code".into()],
        },
    ];

    assert_eq!(postal_code(&components), Some("521301"));
    assert_eq!(postal_code(&components[..1]), None);
    assert_eq!(postal_code(&[]), None);
}
