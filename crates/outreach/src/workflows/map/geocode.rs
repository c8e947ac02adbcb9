use reqwest::Url;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;

const NOMINATIM_TIMEOUT: Duration = Duration::from_secs(25);
const MAPBOX_TIMEOUT: Duration = Duration::from_secs(15);
const COUNTRY_FILTER: &str = "us,ca";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("{provider} returned HTTP {status}")]
    Http { provider: &'static str, status: u16 },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("geocoder runtime unavailable: {0}")]
    Runtime(String),
}

/// Free-text place search returning at most one match.
pub trait Geocoder: Debug {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap search. Requests are spaced by the configured delay to stay
/// within the public usage policy.
pub struct NominatimClient {
    client: reqwest::Client,
    runtime: Runtime,
    base_url: String,
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    const PROVIDER: &'static str = "nominatim";

    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(NOMINATIM_TIMEOUT)
            .user_agent(format!("outreach-map ({})", config.contact_email))
            .build()
            .map_err(|err| GeocodeError::Transport {
                provider: Self::PROVIDER,
                message: err.to_string(),
            })?;
        let runtime = Runtime::new().map_err(|err| GeocodeError::Runtime(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            base_url: config.nominatim_base_url.clone(),
            delay: config.nominatim_delay,
            last_request: Mutex::new(None),
        })
    }

    fn wait_turn(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

impl Debug for NominatimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimClient")
            .field("base_url", &self.base_url)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Geocoder for NominatimClient {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.wait_turn();
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let places: Vec<NominatimPlace> = self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("q", query),
                    ("format", "json"),
                    ("addressdetails", "1"),
                    ("limit", "1"),
                    ("countrycodes", COUNTRY_FILTER),
                ])
                .send()
                .await
                .map_err(|err| GeocodeError::Transport {
                    provider: Self::PROVIDER,
                    message: err.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(GeocodeError::Http {
                    provider: Self::PROVIDER,
                    status: response.status().as_u16(),
                });
            }

            response.json().await.map_err(|err| GeocodeError::Decode {
                provider: Self::PROVIDER,
                message: err.to_string(),
            })
        })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };
        let parse = |value: &str| {
            value.trim().parse::<f64>().map_err(|err| GeocodeError::Decode {
                provider: Self::PROVIDER,
                message: format!("invalid coordinate '{value}': {err}"),
            })
        };

        Ok(Some(Coordinates {
            latitude: parse(&place.lat)?,
            longitude: parse(&place.lon)?,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    #[serde(default)]
    center: Vec<f64>,
}

/// Mapbox forward geocoding; used ahead of Nominatim when a token is set.
pub struct MapboxClient {
    client: reqwest::Client,
    runtime: Runtime,
    base_url: String,
    token: String,
}

impl MapboxClient {
    const PROVIDER: &'static str = "mapbox";

    pub fn new(base_url: &str, token: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(MAPBOX_TIMEOUT)
            .build()
            .map_err(|err| GeocodeError::Transport {
                provider: Self::PROVIDER,
                message: err.to_string(),
            })?;
        let runtime = Runtime::new().map_err(|err| GeocodeError::Runtime(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            base_url: base_url.to_string(),
            token: token.to_string(),
        })
    }

    fn places_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let invalid = |message: String| GeocodeError::Transport {
            provider: Self::PROVIDER,
            message,
        };
        let file_name = format!("{query}.json");
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file_name.as_str()]);
        Ok(url)
    }
}

impl Debug for MapboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Geocoder for MapboxClient {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self.places_url(query)?;

        let payload: MapboxResponse = self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .query(&[
                    ("access_token", self.token.as_str()),
                    ("limit", "1"),
                    ("country", COUNTRY_FILTER),
                ])
                .send()
                .await
                .map_err(|err| GeocodeError::Transport {
                    provider: Self::PROVIDER,
                    message: err.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(GeocodeError::Http {
                    provider: Self::PROVIDER,
                    status: response.status().as_u16(),
                });
            }

            response.json().await.map_err(|err| GeocodeError::Decode {
                provider: Self::PROVIDER,
                message: err.to_string(),
            })
        })?;

        // Centers come back as [longitude, latitude].
        Ok(payload
            .features
            .first()
            .filter(|feature| feature.center.len() >= 2)
            .map(|feature| Coordinates {
                latitude: feature.center[1],
                longitude: feature.center[0],
            }))
    }
}

/// Tries each provider in order for every query. Provider failures are
/// logged and count as "no match".
#[derive(Debug, Default)]
pub struct GeocoderChain {
    providers: Vec<Box<dyn Geocoder>>,
}

impl GeocoderChain {
    pub fn new(providers: Vec<Box<dyn Geocoder>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let mut providers: Vec<Box<dyn Geocoder>> = Vec::new();
        if let Some(token) = &config.mapbox_token {
            providers.push(Box::new(MapboxClient::new(&config.mapbox_base_url, token)?));
        }
        providers.push(Box::new(NominatimClient::new(config)?));
        Ok(Self::new(providers))
    }
}

impl Geocoder for GeocoderChain {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        for provider in &self.providers {
            match provider.geocode(query) {
                Ok(Some(found)) => {
                    debug!(query, "geocoded");
                    return Ok(Some(found));
                }
                Ok(None) => {}
                Err(err) => warn!(query, error = %err, "geocoding failed"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use wiremock::matchers::{header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoding_config(server: &MockServer) -> GeocodingConfig {
        GeocodingConfig {
            contact_email: "ops@example.com".to_string(),
            nominatim_base_url: server.uri(),
            nominatim_delay: Duration::ZERO,
            mapbox_token: None,
            mapbox_base_url: server.uri(),
        }
    }

    #[test]
    fn nominatim_parses_string_coordinates() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .and(path("/search"))
                .and(query_param("q", "Reno, NV"))
                .and(query_param("countrycodes", "us,ca"))
                .and(query_param("limit", "1"))
                .and(header_regex("user-agent", "ops@example.com"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"lat": "39.5296", "lon": "-119.8138", "display_name": "Reno"}
                ])))
                .mount(&server),
        );
        harness.block_on(
            Mock::given(method("GET"))
                .and(path("/search"))
                .and(query_param("q", "Nowhere"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
                .mount(&server),
        );

        let client = NominatimClient::new(&geocoding_config(&server)).expect("client builds");
        let found = client.geocode("Reno, NV").expect("lookup succeeds");
        assert_eq!(
            found,
            Some(Coordinates {
                latitude: 39.5296,
                longitude: -119.8138
            })
        );
        assert_eq!(client.geocode("Nowhere").expect("lookup succeeds"), None);
    }

    #[test]
    fn mapbox_swaps_center_order() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .and(path("/geocoding/v5/mapbox.places/Reno.json"))
                .and(query_param("access_token", "pk.test"))
                .and(query_param("country", "us,ca"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "features": [{"center": [-119.8, 39.5]}]
                })))
                .mount(&server),
        );

        let client = MapboxClient::new(&server.uri(), "pk.test").expect("client builds");
        let found = client.geocode("Reno").expect("lookup succeeds");
        assert_eq!(
            found,
            Some(Coordinates {
                latitude: 39.5,
                longitude: -119.8
            })
        );
    }

    #[test]
    fn server_errors_surface_from_providers() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server),
        );

        let client = NominatimClient::new(&geocoding_config(&server)).expect("client builds");
        assert!(matches!(
            client.geocode("Reno"),
            Err(GeocodeError::Http { status: 503, .. })
        ));
    }

    #[derive(Debug)]
    struct Fixed {
        answer: Option<Coordinates>,
        fail: bool,
        calls: RefCell<usize>,
    }

    impl Geocoder for Fixed {
        fn geocode(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
            *self.calls.borrow_mut() += 1;
            if self.fail {
                return Err(GeocodeError::Runtime("down".to_string()));
            }
            Ok(self.answer)
        }
    }

    #[test]
    fn chain_skips_failures_and_misses() {
        let hit = Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        };
        let chain = GeocoderChain::new(vec![
            Box::new(Fixed {
                answer: None,
                fail: true,
                calls: RefCell::new(0),
            }),
            Box::new(Fixed {
                answer: None,
                fail: false,
                calls: RefCell::new(0),
            }),
            Box::new(Fixed {
                answer: Some(hit),
                fail: false,
                calls: RefCell::new(0),
            }),
        ]);

        assert_eq!(chain.geocode("anything").expect("never errors"), Some(hit));
        assert_eq!(GeocoderChain::default().geocode("x").expect("empty chain"), None);
    }
}
