use crate::api::DynDirectionsAPI;
use crate::entities::{Coordinates, RouteSummary};

/// Requests a route, degrading to the straight two-point "N/A" summary so
/// one provider failure never aborts the caller's larger operation.
#[tracing::instrument(skip(directions))]
pub async fn route_or_fallback(
    directions: &DynDirectionsAPI,
    origin: Coordinates,
    destination: Coordinates,
) -> RouteSummary {
    match directions.route(origin, destination).await {
        Ok(route) => route,
        Err(err) => {
            tracing::warn!("falling back to a straight route: {}", err);
            RouteSummary::fallback(origin, destination)
        }
    }
}
