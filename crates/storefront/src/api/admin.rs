//! City lookups used by the admin event form.
//!
//! These endpoints sit behind the admin's session cookie rather than the
//! bearer token, so no `Authorization` header is sent.

use luma_core::{City, StateId};
use tracing::instrument;

use super::ApiError;
use super::client::ApiClient;

impl ApiClient {
    /// Cities of a state given by its two-letter code.
    ///
    /// Sends the AJAX marker header and, when known, the CSRF token the admin
    /// site expects.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a city list.
    #[instrument(skip(self, csrf_token), fields(uf = %uf))]
    pub async fn admin_cities_by_uf(
        &self,
        uf: &str,
        csrf_token: Option<&str>,
    ) -> Result<Vec<City>, ApiError> {
        let mut url = self.endpoint("/api/cities/")?;
        url.query_pairs_mut().append_pair("state", uf);

        let mut request = self
            .http()
            .get(url)
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(token) = csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        self.send_json(request, false).await
    }

    /// Cities of a state given by its ID (legacy event form endpoint).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a city list.
    #[instrument(skip(self), fields(state_id = %state_id))]
    pub async fn admin_event_cities(&self, state_id: StateId) -> Result<Vec<City>, ApiError> {
        let mut url = self.endpoint("/admin/events/city/")?;
        url.query_pairs_mut()
            .append_pair("state", &state_id.to_string());

        self.send_json(self.http().get(url), false).await
    }
}

/// Extract a cookie value from a `Cookie` header string, percent-decoded.
///
/// ```
/// use luma_storefront::api::csrf_token_from_cookies;
///
/// let header = "sessionid=abc; csrftoken=t0k%2Ben";
/// assert_eq!(csrf_token_from_cookies(header, "csrftoken").as_deref(), Some("t0k+en"));
/// ```
#[must_use]
pub fn csrf_token_from_cookies(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = StorefrontConfig::new(
            Url::parse(&format!("{}/api", server.uri())).unwrap(),
            "unused",
        );
        ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_cookie_lookup() {
        assert_eq!(
            csrf_token_from_cookies("csrftoken=abc123", "csrftoken").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            csrf_token_from_cookies("a=1;  csrftoken=x%3Dy ; b=2", "csrftoken").as_deref(),
            Some("x=y")
        );
        assert_eq!(csrf_token_from_cookies("xcsrftoken=1", "csrftoken"), None);
        assert_eq!(csrf_token_from_cookies("", "csrftoken"), None);
    }

    #[tokio::test]
    async fn test_cities_by_uf_sends_ajax_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cities/"))
            .and(query_param("state", "RO"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(header("X-CSRFToken", "tok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([
                    {"id": 1, "name": "Ariquemes"},
                    {"id": 2, "name": "Porto Velho"}
                ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cities = client_for(&server)
            .admin_cities_by_uf("RO", Some("tok"))
            .await
            .unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].name, "Porto Velho");
    }

    #[tokio::test]
    async fn test_legacy_endpoint_resolves_against_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/events/city/"))
            .and(query_param("state", "22"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let cities = client_for(&server)
            .admin_event_cities(StateId::new(22))
            .await
            .unwrap();
        assert!(cities.is_empty());
    }
}
