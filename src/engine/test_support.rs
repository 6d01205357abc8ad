use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{DirectionsAPI, ShopBackendAPI};
use crate::entities::{
    AddressComponent, Coordinates, CustomerAddressUpdate, DeliveryOrder, GeocodedAddress,
    OrderSummary, ReverseGeocodedAddress, RouteSummary, ShopRecord, StoredCustomerLocation,
};
use crate::error::{fetch_error, geocode_error, route_error, Error};

fn same_point(a: &Coordinates, b: &Coordinates) -> bool {
    (a.latitude - b.latitude).abs() < 1e-9 && (a.longitude - b.longitude).abs() < 1e-9
}

/// In-memory directions provider. Routes fail for the listed destinations
/// (or everywhere when `fail_all` is set); successes come back with fixed
/// display text and a two-point path.
#[derive(Default)]
pub struct FakeDirections {
    pub fail_all: bool,
    pub fail_destinations: Vec<Coordinates>,
    pub postal_code: Option<String>,
}

#[async_trait]
impl DirectionsAPI for FakeDirections {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, Error> {
        if self.fail_all {
            return Err(geocode_error("ZERO_RESULTS"));
        }

        Ok(GeocodedAddress {
            coordinates: Coordinates::new(16.44, 80.99),
            formatted_address: format!("{}, Andhra Pradesh, India", address),
            components: self.components(),
        })
    }

    async fn reverse_geocode(
        &self,
        _coordinates: Coordinates,
    ) -> Result<ReverseGeocodedAddress, Error> {
        if self.fail_all {
            return Err(geocode_error("ZERO_RESULTS"));
        }

        Ok(ReverseGeocodedAddress {
            address: "Benz Circle, Vijayawada, Andhra Pradesh, India".into(),
            components: self.components(),
        })
    }

    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, Error> {
        let failing = self
            .fail_destinations
            .iter()
            .any(|c| same_point(c, &destination));

        if self.fail_all || failing {
            return Err(route_error("UNKNOWN_ERROR"));
        }

        Ok(RouteSummary {
            distance_text: "4.2 km".into(),
            duration_text: "11 mins".into(),
            start_address: String::from(origin),
            end_address: String::from(destination),
            polyline: vec![origin, destination],
        })
    }
}

impl FakeDirections {
    fn components(&self) -> Vec<AddressComponent> {
        match &self.postal_code {
            Some(code) => vec![AddressComponent {
                long_name: code.clone(),
                short_name: code.clone(),
                types: vec!["postal_code".into()],
            }],
            None => vec![],
        }
    }
}

/// In-memory shop/order backend recording the writes it receives.
#[derive(Default)]
pub struct FakeBackend {
    pub fail_fetches: bool,
    pub shops: Vec<ShopRecord>,
    pub orders: HashMap<i64, DeliveryOrder>,
    pub order_lists: Vec<OrderSummary>,
    pub location_updates: Mutex<Vec<(i64, Coordinates)>>,
    pub address_updates: Mutex<Vec<(i64, CustomerAddressUpdate)>>,
}

#[async_trait]
impl ShopBackendAPI for FakeBackend {
    async fn fetch_shops(&self, _customer_id: i64) -> Result<Vec<ShopRecord>, Error> {
        if self.fail_fetches {
            return Err(fetch_error("shop list unavailable"));
        }

        Ok(self.shops.clone())
    }

    async fn fetch_orders(
        &self,
        _customer_id: i64,
        _shop_id: i64,
    ) -> Result<Vec<OrderSummary>, Error> {
        if self.fail_fetches {
            return Err(fetch_error("order list unavailable"));
        }

        Ok(self.order_lists.clone())
    }

    async fn fetch_order(&self, order_id: i64) -> Result<DeliveryOrder, Error> {
        if self.fail_fetches {
            return Err(fetch_error("order detail unavailable"));
        }

        self.orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| fetch_error("no such order"))
    }

    async fn customer_location(
        &self,
        _customer_id: i64,
    ) -> Result<Option<StoredCustomerLocation>, Error> {
        Ok(None)
    }

    async fn update_customer_location(
        &self,
        customer_id: i64,
        coordinates: Coordinates,
    ) -> Result<(), Error> {
        self.location_updates
            .lock()
            .unwrap()
            .push((customer_id, coordinates));

        Ok(())
    }

    async fn update_customer_address(
        &self,
        customer_id: i64,
        update: CustomerAddressUpdate,
    ) -> Result<(), Error> {
        self.address_updates
            .lock()
            .unwrap()
            .push((customer_id, update));

        Ok(())
    }
}

pub fn shop_record(id: i64, name: &str, coordinates_json: &str) -> ShopRecord {
    ShopRecord {
        id,
        name: name.into(),
        location: "Vijayawada".into(),
        pincode: "520010".into(),
        coordinates_json: coordinates_json.into(),
    }
}
