//! Pure geodesic math: great-circle distance and polygon containment.

use geo_types::Coord;

use crate::entities::{Coordinates, GeofencePolygon};

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
pub fn haversine_distance_meters(from: &Coordinates, to: &Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Even-odd ray cast against the polygon boundary. Returns `false` for
/// polygons with fewer than three vertices. Points on a bottom or left edge
/// count as inside, top or right edges as outside.
pub fn point_in_polygon(point: &Coordinates, polygon: &GeofencePolygon) -> bool {
    let vertices = polygon.vertices();
    if vertices.len() < 3 {
        return false;
    }

    let p: Coord<f64> = (*point).into();
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let a: Coord<f64> = vertices[i].into();
        let b: Coord<f64> = vertices[j].into();

        if (a.y > p.y) != (b.y > p.y) {
            let crossing_x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < crossing_x {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

#[cfg(test)]
fn unit_square() -> GeofencePolygon {
    GeofencePolygon::new(vec![
        Coordinates::new(0.0, 0.0),
        Coordinates::new(0.0, 10.0),
        Coordinates::new(10.0, 10.0),
        Coordinates::new(10.0, 0.0),
    ])
}

#[test]
fn distance_to_self_is_zero() {
    let here = Coordinates::new(17.385, 78.4867);
    assert_eq!(haversine_distance_meters(&here, &here), 0.0);
}

#[test]
fn distance_is_symmetric() {
    let berlin = Coordinates::new(52.52, 13.405);
    let paris = Coordinates::new(48.8566, 2.3522);

    let there = haversine_distance_meters(&berlin, &paris);
    let back = haversine_distance_meters(&paris, &berlin);

    assert!((there - back).abs() < 1e-9);
    // ~878 km between the two city centers
    assert!((there - 878_000.0).abs() < 5_000.0, "got {}", there);
}

#[test]
fn distance_matches_the_reference_pair() {
    let center = Coordinates::new(17.385, 78.4867);
    let shop = Coordinates::new(17.385, 78.4967);

    let distance = haversine_distance_meters(&center, &shop);

    // ~1.06 km, well under a 10 km discovery radius
    assert!((distance - 1061.0).abs() < 10.0, "got {}", distance);
}

#[test]
fn degenerate_polygons_contain_nothing() {
    let p = Coordinates::new(5.0, 5.0);

    assert!(!point_in_polygon(&p, &GeofencePolygon::empty()));
    assert!(!point_in_polygon(
        &p,
        &GeofencePolygon::new(vec![Coordinates::new(5.0, 5.0)])
    ));
    assert!(!point_in_polygon(
        &p,
        &GeofencePolygon::new(vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(10.0, 10.0),
        ])
    ));
}

#[test]
fn square_containment() {
    assert!(point_in_polygon(&Coordinates::new(5.0, 5.0), &unit_square()));
    assert!(!point_in_polygon(
        &Coordinates::new(15.0, 5.0),
        &unit_square()
    ));
    assert!(!point_in_polygon(
        &Coordinates::new(5.0, -0.1),
        &unit_square()
    ));
}

#[test]
fn boundary_convention_is_deterministic() {
    // Left edge (lng = 0) is inside, right edge (lng = 10) is outside.
    assert!(point_in_polygon(&Coordinates::new(5.0, 0.0), &unit_square()));
    assert!(!point_in_polygon(
        &Coordinates::new(5.0, 10.0),
        &unit_square()
    ));
}
