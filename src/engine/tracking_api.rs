use super::helpers::route_or_fallback;
use super::Engine;

use async_trait::async_trait;

use crate::{
    api::TrackingAPI,
    entities::{OrderSummary, TrackingSnapshot},
    error::Error,
};

#[async_trait]
impl TrackingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn orders(&self, customer_id: i64, shop_id: i64) -> Result<Vec<OrderSummary>, Error> {
        self.backend.fetch_orders(customer_id, shop_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn refresh(&self, order_id: i64) -> Result<TrackingSnapshot, Error> {
        let order = self.backend.fetch_order(order_id).await?;

        // While the order is pending the shop-to-customer route from
        // discovery stays relevant; once a delivery agent is on it, the
        // agent-to-customer leg is what matters.
        let delivery_route = if order.status.is_pending() {
            None
        } else {
            match (order.delivery_agent_location, order.customer_location) {
                (Some(agent), Some(customer)) => {
                    Some(route_or_fallback(&self.directions, agent, customer).await)
                }
                _ => None,
            }
        };

        Ok(TrackingSnapshot {
            order,
            delivery_route,
        })
    }
}

#[cfg(test)]
use super::test_support::{FakeBackend, FakeDirections};
#[cfg(test)]
use crate::entities::{Coordinates, DeliveryOrder, OrderStatus};
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio_test::block_on;

#[cfg(test)]
fn order(
    id: i64,
    status: OrderStatus,
    agent: Option<Coordinates>,
    customer: Option<Coordinates>,
) -> DeliveryOrder {
    DeliveryOrder {
        id,
        status,
        customer_location: customer,
        delivery_agent_location: agent,
        items: vec![],
        estimated_delivery_time: None,
    }
}

#[cfg(test)]
fn engine_for(orders: Vec<DeliveryOrder>, directions: FakeDirections) -> Engine {
    let backend = FakeBackend {
        orders: orders.into_iter().map(|o| (o.id, o)).collect(),
        ..FakeBackend::default()
    };

    Engine::new(Arc::new(directions), Arc::new(backend))
}

#[test]
fn pending_orders_have_no_delivery_route() {
    let customer = Coordinates::new(17.385, 78.4867);
    let engine = engine_for(
        vec![order(12, OrderStatus::Pending, None, Some(customer))],
        FakeDirections::default(),
    );

    let snapshot = block_on(engine.refresh(12)).unwrap();

    assert_eq!(snapshot.order.status, OrderStatus::Pending);
    assert!(snapshot.delivery_route.is_none());
}

#[test]
fn pending_orders_stay_routeless_even_with_an_agent_position() {
    let agent = Coordinates::new(17.39, 78.49);
    let customer = Coordinates::new(17.385, 78.4867);
    let engine = engine_for(
        vec![order(12, OrderStatus::Pending, Some(agent), Some(customer))],
        FakeDirections::default(),
    );

    let snapshot = block_on(engine.refresh(12)).unwrap();

    assert!(snapshot.delivery_route.is_none());
}

#[test]
fn in_transit_orders_route_agent_to_customer() {
    let agent = Coordinates::new(17.39, 78.49);
    let customer = Coordinates::new(17.385, 78.4867);
    let engine = engine_for(
        vec![order(12, OrderStatus::InTransit, Some(agent), Some(customer))],
        FakeDirections::default(),
    );

    let snapshot = block_on(engine.refresh(12)).unwrap();
    let route = snapshot.delivery_route.unwrap();

    assert!(!route.is_fallback());
    // agent first, customer second: the leg is agent -> customer
    assert_eq!(route.polyline, vec![agent, customer]);
}

#[test]
fn a_missing_agent_position_means_no_route_in_any_state() {
    let customer = Coordinates::new(17.385, 78.4867);
    let engine = engine_for(
        vec![order(12, OrderStatus::InTransit, None, Some(customer))],
        FakeDirections::default(),
    );

    let snapshot = block_on(engine.refresh(12)).unwrap();

    assert!(snapshot.delivery_route.is_none());
}

#[test]
fn provider_failure_degrades_to_a_straight_route() {
    let agent = Coordinates::new(17.39, 78.49);
    let customer = Coordinates::new(17.385, 78.4867);
    let engine = engine_for(
        vec![order(12, OrderStatus::Accepted, Some(agent), Some(customer))],
        FakeDirections {
            fail_all: true,
            ..FakeDirections::default()
        },
    );

    let snapshot = block_on(engine.refresh(12)).unwrap();
    let route = snapshot.delivery_route.unwrap();

    assert!(route.is_fallback());
    assert_eq!(route.polyline, vec![agent, customer]);
}

#[test]
fn lists_a_customers_orders_for_a_shop() {
    let backend = FakeBackend {
        order_lists: vec![OrderSummary {
            id: 12,
            item_name: Some("Paracetamol".into()),
            status: OrderStatus::Pending,
        }],
        ..FakeBackend::default()
    };
    let engine = Engine::new(Arc::new(FakeDirections::default()), Arc::new(backend));

    let orders = block_on(engine.orders(7, 3)).unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, 12);
}
