use reqwest::StatusCode;
use serde::Deserialize;
use tokio::runtime::Runtime;

use super::{ContactDirectory, DirectoryError, DirectoryPerson};
use crate::config::ApolloConfig;

const DOMAIN_PAGE_SIZE: &str = "10";
const COMPANY_PAGE_SIZE: &str = "15";
const ERROR_BODY_LIMIT: usize = 400;

#[derive(Debug, Deserialize)]
struct PeopleSearchResponse {
    #[serde(default)]
    people: Option<Vec<DirectoryPerson>>,
}

/// Blocking wrapper around the Apollo people search endpoint so the
/// sequential lead workflow can call it without exposing async details.
pub struct ApolloPeopleClient {
    client: reqwest::Client,
    runtime: Runtime,
    config: ApolloConfig,
}

impl ApolloPeopleClient {
    pub fn new(config: ApolloConfig) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;
        let runtime = Runtime::new().map_err(|err| DirectoryError::Runtime(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            config,
        })
    }

    fn search(&self, query: &[(&str, &str)]) -> Result<Vec<DirectoryPerson>, DirectoryError> {
        let url = format!(
            "{}/v1/people/search",
            self.config.base_url.trim_end_matches('/')
        );

        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.config.api_key)
                .query(query)
                .send()
                .await
                .map_err(|err| DirectoryError::Transport(err.to_string()))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(DirectoryError::RateLimited);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DirectoryError::Http {
                    status: status.as_u16(),
                    body: body.chars().take(ERROR_BODY_LIMIT).collect(),
                });
            }

            let payload: PeopleSearchResponse = response
                .json()
                .await
                .map_err(|err| DirectoryError::Decode(err.to_string()))?;
            Ok(payload.people.unwrap_or_default())
        })
    }
}

impl std::fmt::Debug for ApolloPeopleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApolloPeopleClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ContactDirectory for ApolloPeopleClient {
    fn people_by_domain(&self, domain: &str) -> Result<Vec<DirectoryPerson>, DirectoryError> {
        self.search(&[
            ("domain", domain),
            ("page", "1"),
            ("per_page", DOMAIN_PAGE_SIZE),
        ])
    }

    fn people_by_company(&self, company: &str) -> Result<Vec<DirectoryPerson>, DirectoryError> {
        self.search(&[("q", company), ("page", "1"), ("per_page", COMPANY_PAGE_SIZE)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApolloPeopleClient {
        ApolloPeopleClient::new(ApolloConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            request_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        })
        .expect("client builds")
    }

    #[test]
    fn domain_search_sends_bearer_and_page_size() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .and(path("/v1/people/search"))
                .and(header("authorization", "Bearer test-key"))
                .and(query_param("domain", "acme.com"))
                .and(query_param("per_page", "10"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "people": [
                        {"id": "p1", "name": "Robin", "title": "Fleet Manager", "email": "robin@acme.com"}
                    ]
                })))
                .mount(&server),
        );

        let people = client_for(&server)
            .people_by_domain("acme.com")
            .expect("search succeeds");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].email.as_deref(), Some("robin@acme.com"));
    }

    #[test]
    fn company_search_uses_free_text_query() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .and(path("/v1/people/search"))
                .and(query_param("q", "Acme Haulage"))
                .and(query_param("per_page", "15"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"people": null})),
                )
                .mount(&server),
        );

        let people = client_for(&server)
            .people_by_company("Acme Haulage")
            .expect("search succeeds");
        assert!(people.is_empty());
    }

    #[test]
    fn rate_limit_and_server_errors_are_reported() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .and(query_param("domain", "busy.com"))
                .respond_with(ResponseTemplate::new(429))
                .mount(&server),
        );
        harness.block_on(
            Mock::given(method("GET"))
                .and(query_param("domain", "broken.com"))
                .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
                .mount(&server),
        );

        let client = client_for(&server);
        assert!(matches!(
            client.people_by_domain("busy.com"),
            Err(DirectoryError::RateLimited)
        ));
        match client.people_by_domain("broken.com") {
            Err(DirectoryError::Http { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let harness = Runtime::new().expect("test runtime");
        let server = harness.block_on(MockServer::start());
        harness.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
                .mount(&server),
        );

        assert!(matches!(
            client_for(&server).people_by_domain("acme.com"),
            Err(DirectoryError::Decode(_))
        ));
    }
}
