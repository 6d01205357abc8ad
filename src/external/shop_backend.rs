use serde::{Deserialize, Serialize};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::ShopBackendAPI;
use crate::entities::{
    Coordinates, CustomerAddressUpdate, DeliveryOrder, OrderItem, OrderStatus, OrderSummary,
    ShopRecord, StoredCustomerLocation,
};
use crate::error::{fetch_error, invalid_input_error, Error};

/// Client for the shop/order backend. Base URL injected at construction.
#[derive(Clone, Debug)]
pub struct ShopBackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl ShopBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn check_http_status(status_code: u16, operation: &str) -> Result<(), Error> {
        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if !(200..300).contains(&status_code) {
            return Err(fetch_error(format!(
                "{} returned HTTP {}",
                operation, status_code
            )));
        }

        Ok(())
    }
}

// Order detail as the backend nests it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrderDetail {
    id: i64,
    status: OrderStatus,
    customer_location: Option<WireCustomerLocation>,
    delivery_boy_location: Option<WireAgentLocation>,
    #[serde(default)]
    items: Vec<WireItem>,
    estimated_delivery_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCustomerLocation {
    customer_lat: f64,
    customer_lng: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAgentLocation {
    delivery_boy_lat: f64,
    delivery_boy_lng: f64,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    id: i64,
    name: String,
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireStoredLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<String>,
    pincode: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireLocationUpdate {
    latitude: f64,
    longitude: f64,
}

impl From<WireOrderDetail> for DeliveryOrder {
    fn from(wire: WireOrderDetail) -> Self {
        DeliveryOrder {
            id: wire.id,
            status: wire.status,
            customer_location: wire
                .customer_location
                .map(|l| Coordinates::new(l.customer_lat, l.customer_lng)),
            delivery_agent_location: wire
                .delivery_boy_location
                .map(|l| Coordinates::new(l.delivery_boy_lat, l.delivery_boy_lng)),
            items: wire
                .items
                .into_iter()
                .map(|item| OrderItem {
                    id: item.id,
                    name: item.name,
                    price: item.price,
                })
                .collect(),
            estimated_delivery_time: wire.estimated_delivery_time,
        }
    }
}

#[async_trait]
impl ShopBackendAPI for ShopBackendClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_shops(&self, customer_id: i64) -> Result<Vec<ShopRecord>, Error> {
        let url = format!("{}/customer/shops/{}", self.base_url, customer_id);

        let res = self.client.get(url).send().await?;
        Self::check_http_status(res.status().as_u16(), "shop list")?;

        Ok(res.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_orders(
        &self,
        customer_id: i64,
        shop_id: i64,
    ) -> Result<Vec<OrderSummary>, Error> {
        let url = format!("{}/orders/customer/{}", self.base_url, customer_id);

        let res = self
            .client
            .get(url)
            .query(&[("shopId", shop_id)])
            .send()
            .await?;
        Self::check_http_status(res.status().as_u16(), "order list")?;

        Ok(res.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_order(&self, order_id: i64) -> Result<DeliveryOrder, Error> {
        let url = format!("{}/orders/{}", self.base_url, order_id);

        let res = self.client.get(url).send().await?;
        Self::check_http_status(res.status().as_u16(), "order detail")?;

        let wire: WireOrderDetail = res.json().await?;

        Ok(wire.into())
    }

    #[tracing::instrument(skip(self))]
    async fn customer_location(
        &self,
        customer_id: i64,
    ) -> Result<Option<StoredCustomerLocation>, Error> {
        let url = format!("{}/customer/location/{}", self.base_url, customer_id);

        let res = self.client.get(url).send().await?;
        Self::check_http_status(res.status().as_u16(), "customer location")?;

        let wire: WireStoredLocation = res.json().await?;

        // Customers who never shared a position come back with null fields.
        Ok(match (wire.latitude, wire.longitude) {
            (Some(latitude), Some(longitude)) => Some(StoredCustomerLocation {
                latitude,
                longitude,
                location: wire.location,
                pincode: wire.pincode,
            }),
            _ => None,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn update_customer_location(
        &self,
        customer_id: i64,
        coordinates: Coordinates,
    ) -> Result<(), Error> {
        let url = format!("{}/customer/location/{}", self.base_url, customer_id);

        let res = self
            .client
            .put(url)
            .json(&WireLocationUpdate {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            })
            .send()
            .await?;
        Self::check_http_status(res.status().as_u16(), "customer location update")?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_customer_address(
        &self,
        customer_id: i64,
        update: CustomerAddressUpdate,
    ) -> Result<(), Error> {
        let url = format!("{}/customer/address/{}", self.base_url, customer_id);

        let res = self.client.put(url).json(&update).send().await?;
        Self::check_http_status(res.status().as_u16(), "customer address update")?;

        Ok(())
    }
}

#[cfg(test)]
use serde_json::json;
#[cfg(test)]
use tokio_test::block_on;
#[cfg(test)]
use wiremock::matchers::{body_json, method, path, query_param};
#[cfg(test)]
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn fetches_shop_records() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customer/shops/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 3,
                "name": "City Pharmacy",
                "location": "Benz Circle",
                "pincode": "520010",
                "coordinatesJson": "[{\"lat\":17.385,\"lng\":78.4967}]"
            }])))
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let records = client.fetch_shops(7).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 3);
        assert_eq!(records[0].name, "City Pharmacy");
        assert!(records[0].coordinates_json.contains("17.385"));
    });
}

#[test]
fn fetch_shops_surfaces_server_failures() {
    use crate::error::Kind;

    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customer/shops/7"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let err = client.fetch_shops(7).await.unwrap_err();

        assert_eq!(err.kind, Kind::Fetch);
    });
}

#[test]
fn fetches_and_flattens_an_order_detail() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "status": "IN_TRANSIT",
                "customerLocation": { "customerLat": 17.385, "customerLng": 78.4867 },
                "deliveryBoyLocation": { "deliveryBoyLat": 17.39, "deliveryBoyLng": 78.49 },
                "items": [{ "id": 1, "name": "Paracetamol", "price": 35.0 }],
                "estimatedDeliveryTime": "2025-11-02T10:30:00Z"
            })))
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let order = client.fetch_order(12).await.unwrap();

        assert_eq!(order.status, OrderStatus::InTransit);
        assert_eq!(
            order.customer_location,
            Some(Coordinates::new(17.385, 78.4867))
        );
        assert_eq!(
            order.delivery_agent_location,
            Some(Coordinates::new(17.39, 78.49))
        );
        assert_eq!(order.items.len(), 1);
        assert!(order.estimated_delivery_time.is_some());
    });
}

#[test]
fn order_detail_tolerates_missing_locations() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders/13"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": 13, "status": "PENDING" })),
            )
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let order = client.fetch_order(13).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer_location, None);
        assert_eq!(order.delivery_agent_location, None);
        assert!(order.items.is_empty());
    });
}

#[test]
fn lists_orders_for_a_shop() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders/customer/7"))
            .and(query_param("shopId", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 12, "itemName": "Paracetamol", "status": "PENDING" }
            ])))
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let orders = client.fetch_orders(7, 3).await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Pending);
    });
}

#[test]
fn customer_location_is_none_until_shared() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customer/location/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "latitude": null, "longitude": null })),
            )
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        assert!(client.customer_location(7).await.unwrap().is_none());
    });
}

#[test]
fn customer_location_round_trips_once_shared() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customer/location/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "latitude": 17.385,
                "longitude": 78.4867,
                "location": "Benz Circle, Vijayawada"
            })))
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        let stored = client.customer_location(7).await.unwrap().unwrap();

        assert_eq!(stored.coordinates(), Coordinates::new(17.385, 78.4867));
        assert_eq!(stored.location.as_deref(), Some("Benz Circle, Vijayawada"));
    });
}

#[test]
fn pushes_location_updates_upstream() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/customer/location/7"))
            .and(body_json(json!({ "latitude": 17.385, "longitude": 78.4867 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ShopBackendClient::new(server.uri());
        client
            .update_customer_location(7, Coordinates::new(17.385, 78.4867))
            .await
            .unwrap();
    });
}
