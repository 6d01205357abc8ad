use super::helpers::route_or_fallback;
use super::Engine;

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;

use crate::{
    api::DiscoveryAPI,
    entities::{Coordinates, Discovery, GeofencePolygon, RouteSummary, Shop},
    error::Error,
    geo,
};

#[async_trait]
impl DiscoveryAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn discover(
        &self,
        customer_id: i64,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Discovery, Error> {
        let records = self.backend.fetch_shops(customer_id).await?;

        tracing::info!("filtering {} candidate shops...", records.len());

        let mut shops = Vec::new();
        for record in records {
            let geofence = GeofencePolygon::parse(&record.coordinates_json);

            let anchor = match geofence.representative() {
                Some(anchor) => anchor,
                None => {
                    tracing::debug!(shop_id = record.id, "dropping shop with unusable geofence");
                    continue;
                }
            };

            if geo::haversine_distance_meters(&center, &anchor) > radius_meters {
                continue;
            }

            let is_inside = geo::point_in_polygon(&center, &geofence);

            shops.push(Shop {
                id: record.id,
                name: record.name,
                location: record.location,
                pincode: record.pincode,
                geofence,
                is_inside,
            });
        }

        tracing::info!("requesting routes for {} shops in range...", shops.len());

        let route_requests = shops.iter().map(|shop| {
            let directions = self.directions.clone();
            let shop_id = shop.id;
            // representative() is Some for every shop that survived filtering
            let destination = shop.geofence.representative().unwrap_or(center);

            async move {
                (
                    shop_id,
                    route_or_fallback(&directions, center, destination).await,
                )
            }
        });

        let routes: HashMap<i64, RouteSummary> =
            join_all(route_requests).await.into_iter().collect();

        Ok(Discovery {
            center,
            radius_meters,
            shops,
            routes,
        })
    }
}

#[cfg(test)]
use super::test_support::{shop_record, FakeBackend, FakeDirections};
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio_test::block_on;

#[cfg(test)]
fn engine_with(directions: FakeDirections, backend: FakeBackend) -> Engine {
    Engine::new(Arc::new(directions), Arc::new(backend))
}

#[test]
fn radius_filter_is_boundary_inclusive() {
    let center = Coordinates::new(17.385, 78.4867);
    let anchor = Coordinates::new(17.385, 78.4967);
    let distance = geo::haversine_distance_meters(&center, &anchor);

    let backend = FakeBackend {
        shops: vec![shop_record(
            1,
            "City Pharmacy",
            r#"[{"lat":17.385,"lng":78.4967}]"#,
        )],
        ..FakeBackend::default()
    };
    let engine = engine_with(FakeDirections::default(), backend);

    let included = block_on(engine.discover(7, center, distance)).unwrap();
    assert_eq!(included.shops.len(), 1);

    let excluded = block_on(engine.discover(7, center, distance - 1.0)).unwrap();
    assert!(excluded.shops.is_empty());
}

#[test]
fn one_route_failure_does_not_poison_the_rest() {
    let center = Coordinates::new(17.385, 78.4867);
    let failing_anchor = Coordinates::new(17.395, 78.4967);

    let backend = FakeBackend {
        shops: vec![
            shop_record(1, "City Pharmacy", r#"[{"lat":17.385,"lng":78.4967}]"#),
            shop_record(2, "Ring Road Stores", r#"[{"lat":17.395,"lng":78.4967}]"#),
        ],
        ..FakeBackend::default()
    };
    let directions = FakeDirections {
        fail_destinations: vec![failing_anchor],
        ..FakeDirections::default()
    };
    let engine = engine_with(directions, backend);

    let discovery = block_on(engine.discover(7, center, 10_000.0)).unwrap();

    assert_eq!(discovery.shops.len(), 2);
    assert_eq!(discovery.routes[&1].distance_text, "4.2 km");
    assert!(discovery.routes[&2].is_fallback());
}

#[test]
fn shops_with_unusable_geofences_are_dropped_not_fatal() {
    let center = Coordinates::new(17.385, 78.4867);

    let backend = FakeBackend {
        shops: vec![
            shop_record(1, "City Pharmacy", r#"[{"lat":17.385,"lng":78.4967}]"#),
            shop_record(2, "Broken Fence", "not json"),
            shop_record(3, "Empty Fence", "[]"),
        ],
        ..FakeBackend::default()
    };
    let engine = engine_with(FakeDirections::default(), backend);

    let discovery = block_on(engine.discover(7, center, 10_000.0)).unwrap();

    assert_eq!(discovery.shops.len(), 1);
    assert_eq!(discovery.shops[0].id, 1);
}

#[test]
fn a_failed_shop_fetch_fails_the_whole_call() {
    use crate::error::Kind;

    let backend = FakeBackend {
        fail_fetches: true,
        ..FakeBackend::default()
    };
    let engine = engine_with(FakeDirections::default(), backend);

    let err = block_on(engine.discover(7, Coordinates::new(17.385, 78.4867), 10_000.0))
        .unwrap_err();

    assert_eq!(err.kind, Kind::Fetch);
}

#[test]
fn zero_shops_in_range_is_a_success_not_a_failure() {
    let backend = FakeBackend {
        shops: vec![shop_record(
            1,
            "Far Away",
            // Berlin, nowhere near the Vijayawada center
            r#"[{"lat":52.52,"lng":13.405}]"#,
        )],
        ..FakeBackend::default()
    };
    let engine = engine_with(FakeDirections::default(), backend);

    let discovery = block_on(engine.discover(7, Coordinates::new(17.385, 78.4867), 10_000.0))
        .unwrap();

    assert!(discovery.shops.is_empty());
    assert!(discovery.routes.is_empty());
}

#[test]
fn discovers_a_nearby_shop_with_geofence_containment() {
    // A diamond around the center whose first vertex is the shop itself.
    let center = Coordinates::new(17.385, 78.4867);
    let geofence = r#"[
        {"lat":17.385,"lng":78.4967},
        {"lat":17.485,"lng":78.4867},
        {"lat":17.385,"lng":78.4767},
        {"lat":17.285,"lng":78.4867}
    ]"#;

    let backend = FakeBackend {
        shops: vec![shop_record(1, "City Pharmacy", geofence)],
        ..FakeBackend::default()
    };
    let engine = engine_with(FakeDirections::default(), backend);

    let discovery = block_on(engine.discover(7, center, super::DEFAULT_RADIUS_METERS)).unwrap();

    assert_eq!(discovery.shops.len(), 1);
    assert!(discovery.shops[0].is_inside);
    assert!(!discovery.routes[&1].is_fallback());
    assert_eq!(discovery.center, center);
}
