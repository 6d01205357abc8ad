use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, RouteSummary};

/// Backend-reported order lifecycle stage. The backend is authoritative;
/// the client only reacts to whatever it observes on each poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub id: i64,
    pub status: OrderStatus,
    pub customer_location: Option<Coordinates>,
    pub delivery_agent_location: Option<Coordinates>,
    pub items: Vec<OrderItem>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
}

/// One row of a customer's order list for a shop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i64,
    pub item_name: Option<String>,
    pub status: OrderStatus,
}

/// A fresh view of an order plus the route relevant to its lifecycle stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub order: DeliveryOrder,
    pub delivery_route: Option<RouteSummary>,
}

#[test]
fn status_uses_the_backend_wire_form() {
    let status: OrderStatus = serde_json::from_str("\"IN_TRANSIT\"").unwrap();
    assert_eq!(status, OrderStatus::InTransit);
    assert!(!status.is_pending());
    assert!(!status.is_terminal());

    let status: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
    assert!(status.is_terminal());

    assert!(serde_json::from_str::<OrderStatus>("\"LOST\"").is_err());
}
