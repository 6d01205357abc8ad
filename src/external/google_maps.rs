use serde::Deserialize;

use async_trait::async_trait;

use crate::api::DirectionsAPI;
use crate::entities::{
    AddressComponent, Coordinates, GeocodedAddress, ReverseGeocodedAddress, RouteSummary,
};
use crate::error::{fetch_error, geocode_error, invalid_input_error, route_error, Error};

pub const DEFAULT_API_BASE: &str = "https://maps.googleapis.com";

/// Directions/geocoding provider client. The key and base URL are injected
/// at construction so tests can point it at a mock server.
#[derive(Clone, Debug)]
pub struct GoogleMapsClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_api_base(api_key, DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        }
    }

    fn check_http_status(status_code: u16, operation: &str) -> Result<(), Error> {
        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(fetch_error(format!(
                "{} returned HTTP {}",
                operation, status_code
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<ProviderRoute>,
}

#[derive(Debug, Deserialize)]
struct ProviderRoute {
    legs: Vec<RouteLeg>,
    overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
struct RouteLeg {
    distance: TextField,
    duration: TextField,
    start_address: String,
    end_address: String,
}

#[derive(Debug, Deserialize)]
struct TextField {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl DirectionsAPI for GoogleMapsClient {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, Error> {
        let url = format!("{}/maps/api/geocode/json", self.api_base);

        let res = self
            .client
            .get(url)
            .query(&[("address", address)])
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        Self::check_http_status(res.status().as_u16(), "geocode")?;

        let data: GeocodeResponse = res.json().await?;

        if data.status != "OK" {
            return Err(geocode_error(&data.status));
        }

        let result = data
            .results
            .into_iter()
            .next()
            .ok_or_else(|| geocode_error("zero results"))?;

        Ok(GeocodedAddress {
            coordinates: Coordinates::new(result.geometry.location.lat, result.geometry.location.lng),
            formatted_address: result.formatted_address,
            components: result.address_components,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodedAddress, Error> {
        let url = format!("{}/maps/api/geocode/json", self.api_base);
        let latlng: String = coordinates.into();

        let res = self
            .client
            .get(url)
            .query(&[("latlng", latlng)])
            .query(&[("key", self.api_key.clone())])
            .send()
            .await?;

        Self::check_http_status(res.status().as_u16(), "reverse geocode")?;

        let data: GeocodeResponse = res.json().await?;

        if data.status != "OK" {
            return Err(geocode_error(&data.status));
        }

        let result = data
            .results
            .into_iter()
            .next()
            .ok_or_else(|| geocode_error("zero results"))?;

        Ok(ReverseGeocodedAddress {
            address: result.formatted_address,
            components: result.address_components,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, Error> {
        let url = format!("{}/maps/api/directions/json", self.api_base);
        let origin: String = origin.into();
        let destination: String = destination.into();

        let res = self
            .client
            .get(url)
            .query(&[("origin", origin)])
            .query(&[("destination", destination)])
            .query(&[("mode", "driving".to_owned())])
            .query(&[("key", self.api_key.clone())])
            .send()
            .await?;

        Self::check_http_status(res.status().as_u16(), "directions")?;

        let data: DirectionsResponse = res.json().await?;

        if data.status != "OK" {
            return Err(route_error(&data.status));
        }

        let route = data
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| route_error("zero routes"))?;
        let leg = route
            .legs
            .into_iter()
            .next()
            .ok_or_else(|| route_error("route without legs"))?;

        Ok(RouteSummary {
            distance_text: leg.distance.text,
            duration_text: leg.duration.text,
            start_address: leg.start_address,
            end_address: leg.end_address,
            polyline: decode_polyline(&route.overview_polyline.points),
        })
    }
}

/// Decodes the provider's encoded-polyline format into coordinates. The
/// rest of the crate only ever sees the decoded path; a truncated or
/// corrupt tail yields however many whole points preceded it.
fn decode_polyline(encoded: &str) -> Vec<Coordinates> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();
    let mut index = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while index < bytes.len() {
        let (d_lat, next) = match decode_chunk(bytes, index) {
            Some(decoded) => decoded,
            None => break,
        };
        let (d_lng, next) = match decode_chunk(bytes, next) {
            Some(decoded) => decoded,
            None => break,
        };

        lat += d_lat;
        lng += d_lng;
        index = next;

        coordinates.push(Coordinates::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }

    coordinates
}

// One zigzag-encoded base-63 varint.
fn decode_chunk(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut shift = 0u32;
    let mut result = 0i64;

    loop {
        let byte = i64::from(*bytes.get(index)?) - 63;
        if byte < 0 || shift > 60 {
            return None;
        }

        index += 1;
        result |= (byte & 0x1f) << shift;
        shift += 5;

        if byte < 0x20 {
            break;
        }
    }

    let delta = if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    };

    Some((delta, index))
}

#[cfg(test)]
use serde_json::json;
#[cfg(test)]
use tokio_test::block_on;
#[cfg(test)]
use wiremock::matchers::{method, path, query_param};
#[cfg(test)]
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn decodes_the_canonical_polyline_example() {
    let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");

    assert_eq!(
        points,
        vec![
            Coordinates::new(38.5, -120.2),
            Coordinates::new(40.7, -120.95),
            Coordinates::new(43.252, -126.453),
        ]
    );
}

#[test]
fn tolerates_truncated_polylines() {
    assert_eq!(decode_polyline(""), vec![]);
    // A lone delta with no longitude half decodes to nothing.
    assert_eq!(decode_polyline("_p~iF"), vec![]);
}

#[test]
fn route_parses_the_provider_envelope() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .and(query_param("origin", "17.385,78.4867"))
            .and(query_param("destination", "17.385,78.4967"))
            .and(query_param("mode", "driving"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "routes": [{
                    "legs": [{
                        "distance": { "text": "1.2 km", "value": 1200 },
                        "duration": { "text": "5 mins", "value": 300 },
                        "start_address": "Benz Circle, Vijayawada",
                        "end_address": "Eluru Rd, Vijayawada"
                    }],
                    "overview_polyline": { "points": "_p~iF~ps|U_ulLnnqC_mqNvxq`@" }
                }]
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::with_api_base("test-key", server.uri());
        let route = client
            .route(
                Coordinates::new(17.385, 78.4867),
                Coordinates::new(17.385, 78.4967),
            )
            .await
            .unwrap();

        assert_eq!(route.distance_text, "1.2 km");
        assert_eq!(route.duration_text, "5 mins");
        assert_eq!(route.start_address, "Benz Circle, Vijayawada");
        assert_eq!(route.end_address, "Eluru Rd, Vijayawada");
        assert_eq!(route.polyline.len(), 3);
    });
}

#[test]
fn route_rejects_a_non_ok_envelope() {
    use crate::error::Kind;

    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "ZERO_RESULTS", "routes": [] })),
            )
            .mount(&server)
            .await;

        let client = GoogleMapsClient::with_api_base("test-key", server.uri());
        let err = client
            .route(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
            .await
            .unwrap_err();

        assert_eq!(err.kind, Kind::Route);
    });
}

#[test]
fn geocode_resolves_an_address() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("address", "Gudiwada"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [{
                    "formatted_address": "Gudiwada, Andhra Pradesh 521301, India",
                    "geometry": { "location": { "lat": 16.44, "lng": 80.99 } },
                    "address_components": [
                        { "long_name": "521301", "short_name": "521301", "types": ["postal_code"] }
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::with_api_base("test-key", server.uri());
        let place = client.geocode("Gudiwada").await.unwrap();

        assert_eq!(place.coordinates, Coordinates::new(16.44, 80.99));
        assert_eq!(
            crate::entities::postal_code(&place.components),
            Some("521301")
        );
    });
}

#[test]
fn geocode_fails_on_zero_results() {
    use crate::error::Kind;

    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "ZERO_RESULTS", "results": [] })),
            )
            .mount(&server)
            .await;

        let client = GoogleMapsClient::with_api_base("test-key", server.uri());
        let err = client.geocode("nowhere at all").await.unwrap_err();

        assert_eq!(err.kind, Kind::Geocode);
    });
}

#[test]
fn reverse_geocode_resolves_a_coordinate() {
    block_on(async {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("latlng", "16.44,80.99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [{
                    "formatted_address": "Gudiwada, Andhra Pradesh 521301, India",
                    "geometry": { "location": { "lat": 16.44, "lng": 80.99 } },
                    "address_components": []
                }]
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::with_api_base("test-key", server.uri());
        let place = client
            .reverse_geocode(Coordinates::new(16.44, 80.99))
            .await
            .unwrap();

        assert_eq!(place.address, "Gudiwada, Andhra Pradesh 521301, India");
    });
}
