use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{
    Coordinates, CustomerAddressUpdate, DeliveryOrder, Discovery, GeocodedAddress, OrderSummary,
    ReverseGeocodedAddress, RouteSummary, ShopRecord, StoredCustomerLocation, TrackingSnapshot,
};
use crate::error::Error;

/// External directions/geocoding provider.
#[async_trait]
pub trait DirectionsAPI {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, Error>;
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodedAddress, Error>;
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, Error>;
}

/// Shop/order backend.
#[async_trait]
pub trait ShopBackendAPI {
    async fn fetch_shops(&self, customer_id: i64) -> Result<Vec<ShopRecord>, Error>;
    async fn fetch_orders(
        &self,
        customer_id: i64,
        shop_id: i64,
    ) -> Result<Vec<OrderSummary>, Error>;
    async fn fetch_order(&self, order_id: i64) -> Result<DeliveryOrder, Error>;
    async fn customer_location(
        &self,
        customer_id: i64,
    ) -> Result<Option<StoredCustomerLocation>, Error>;
    async fn update_customer_location(
        &self,
        customer_id: i64,
        coordinates: Coordinates,
    ) -> Result<(), Error>;
    async fn update_customer_address(
        &self,
        customer_id: i64,
        update: CustomerAddressUpdate,
    ) -> Result<(), Error>;
}

#[async_trait]
pub trait DiscoveryAPI {
    async fn discover(
        &self,
        customer_id: i64,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Discovery, Error>;
}

#[async_trait]
pub trait TrackingAPI {
    async fn orders(&self, customer_id: i64, shop_id: i64) -> Result<Vec<OrderSummary>, Error>;
    async fn refresh(&self, order_id: i64) -> Result<TrackingSnapshot, Error>;
}

#[async_trait]
pub trait RelocationAPI {
    async fn relocate_to_address(
        &self,
        customer_id: i64,
        address: &str,
    ) -> Result<GeocodedAddress, Error>;
    async fn relocate_to_coordinates(
        &self,
        customer_id: i64,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodedAddress, Error>;
}

pub trait API: DiscoveryAPI + TrackingAPI + RelocationAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
pub type DynDirectionsAPI = Arc<dyn DirectionsAPI + Send + Sync>;
pub type DynShopBackendAPI = Arc<dyn ShopBackendAPI + Send + Sync>;
