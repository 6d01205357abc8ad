use super::Engine;

use async_trait::async_trait;

use crate::{
    api::RelocationAPI,
    entities::{
        postal_code, Coordinates, CustomerAddressUpdate, GeocodedAddress, ReverseGeocodedAddress,
    },
    error::{invalid_input_error, Error},
};

// Persisted when the geocoder supplies no postal-code component.
const UNKNOWN_PINCODE: &str = "000000";

#[async_trait]
impl RelocationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn relocate_to_address(
        &self,
        customer_id: i64,
        address: &str,
    ) -> Result<GeocodedAddress, Error> {
        let place = self.directions.geocode(address).await?;

        let update = CustomerAddressUpdate {
            latitude: place.coordinates.latitude,
            longitude: place.coordinates.longitude,
            location: place.formatted_address.clone(),
            pincode: postal_code(&place.components)
                .unwrap_or(UNKNOWN_PINCODE)
                .to_owned(),
        };

        self.backend
            .update_customer_address(customer_id, update)
            .await?;

        Ok(place)
    }

    #[tracing::instrument(skip(self))]
    async fn relocate_to_coordinates(
        &self,
        customer_id: i64,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodedAddress, Error> {
        if !coordinates.is_valid() {
            return Err(invalid_input_error());
        }

        let place = self.directions.reverse_geocode(coordinates).await?;

        let update = CustomerAddressUpdate {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            location: place.address.clone(),
            pincode: postal_code(&place.components)
                .unwrap_or(UNKNOWN_PINCODE)
                .to_owned(),
        };

        self.backend
            .update_customer_address(customer_id, update)
            .await?;

        Ok(place)
    }
}

#[cfg(test)]
use super::test_support::{FakeBackend, FakeDirections};
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio_test::block_on;

#[test]
fn relocating_by_address_persists_the_geocoded_place() {
    let backend = Arc::new(FakeBackend::default());
    let directions = FakeDirections {
        postal_code: Some("521301".into()),
        ..FakeDirections::default()
    };
    let engine = Engine::new(Arc::new(directions), backend.clone());

    let place = block_on(engine.relocate_to_address(7, "Gudiwada")).unwrap();
    assert_eq!(place.coordinates, Coordinates::new(16.44, 80.99));

    let updates = backend.address_updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, 7);
    assert_eq!(updates[0].1.pincode, "521301");
    assert_eq!(updates[0].1.location, place.formatted_address);
}

#[test]
fn relocating_by_coordinates_falls_back_to_the_unknown_pincode() {
    let backend = Arc::new(FakeBackend::default());
    let engine = Engine::new(Arc::new(FakeDirections::default()), backend.clone());

    block_on(engine.relocate_to_coordinates(7, Coordinates::new(17.385, 78.4867))).unwrap();

    let updates = backend.address_updates.lock().unwrap();
    assert_eq!(updates[0].1.pincode, UNKNOWN_PINCODE);
    assert_eq!(updates[0].1.latitude, 17.385);
}

#[test]
fn relocation_rejects_out_of_range_coordinates() {
    use crate::error::Kind;

    let engine = Engine::new(
        Arc::new(FakeDirections::default()),
        Arc::new(FakeBackend::default()),
    );

    let err = block_on(engine.relocate_to_coordinates(7, Coordinates::new(91.0, 0.0)))
        .unwrap_err();

    assert_eq!(err.kind, Kind::InvalidInput);
}

#[test]
fn a_geocoder_failure_surfaces_to_the_caller() {
    use crate::error::Kind;

    let engine = Engine::new(
        Arc::new(FakeDirections {
            fail_all: true,
            ..FakeDirections::default()
        }),
        Arc::new(FakeBackend::default()),
    );

    let err = block_on(engine.relocate_to_address(7, "nowhere")).unwrap_err();

    assert_eq!(err.kind, Kind::Geocode);
}
