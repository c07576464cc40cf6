//! State-dependent city selector of the admin event form.
//!
//! Picking a state refetches that state's cities and repopulates the city
//! selector. The selector is disabled while loading, when no state is
//! chosen, and when the state has no cities.

use luma_core::{City, CityId};
use tracing::{debug, instrument, warn};

use crate::api::ApiClient;
use crate::error::AppError;

/// Options and selection of the city field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySelect {
    options: Vec<City>,
    selected: Option<CityId>,
    disabled: bool,
}

impl Default for CitySelect {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            selected: None,
            disabled: true,
        }
    }
}

impl CitySelect {
    /// An empty, disabled selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn options(&self) -> &[City] {
        &self.options
    }

    #[must_use]
    pub const fn selected(&self) -> Option<CityId> {
        self.selected
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Choose a city; ignored unless it is one of the current options.
    pub fn select(&mut self, id: CityId) -> bool {
        if self.disabled || !self.options.iter().any(|city| city.id == id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// No state chosen: drop every option and disable.
    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
        self.disabled = true;
    }

    /// Replace the options with a freshly fetched list.
    ///
    /// An empty list leaves the selector disabled. Otherwise it is enabled
    /// and the previous selection is kept if that city is still listed.
    pub fn repopulate(&mut self, cities: Vec<City>) {
        self.options = cities;
        self.disabled = self.options.is_empty();
        self.selected = self
            .selected
            .filter(|id| self.options.iter().any(|city| city.id == *id));
    }

    /// React to the state field changing to `uf` (a two-letter code, blank
    /// for none).
    ///
    /// # Errors
    ///
    /// Returns the request error. The selector then stays disabled with
    /// its previous options.
    #[instrument(skip(self, client, csrf_token))]
    pub async fn on_state_changed(
        &mut self,
        client: &ApiClient,
        uf: &str,
        csrf_token: Option<&str>,
    ) -> Result<(), AppError> {
        let uf = uf.trim();
        if uf.is_empty() {
            self.clear();
            return Ok(());
        }

        self.disabled = true;
        match client.admin_cities_by_uf(uf, csrf_token).await {
            Ok(cities) => {
                debug!(count = cities.len(), "Cities loaded");
                self.repopulate(cities);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cities");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    fn city(id: i64, name: &str) -> City {
        City {
            id: CityId::new(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_repopulate_restores_surviving_selection() {
        let mut select = CitySelect::new();
        assert!(select.is_disabled());

        select.repopulate(vec![city(1, "Ariquemes"), city(2, "Cacoal")]);
        assert!(!select.is_disabled());
        assert!(select.select(CityId::new(2)));

        select.repopulate(vec![city(2, "Cacoal"), city(3, "Vilhena")]);
        assert_eq!(select.selected(), Some(CityId::new(2)));

        select.repopulate(vec![city(3, "Vilhena")]);
        assert_eq!(select.selected(), None);
    }

    #[test]
    fn test_empty_result_disables() {
        let mut select = CitySelect::new();
        select.repopulate(vec![city(1, "Ariquemes")]);
        select.repopulate(Vec::new());
        assert!(select.is_disabled());
        assert!(select.options().is_empty());
        assert!(!select.select(CityId::new(1)));
    }

    #[test]
    fn test_select_unknown_city_is_ignored() {
        let mut select = CitySelect::new();
        select.repopulate(vec![city(1, "Ariquemes")]);
        assert!(!select.select(CityId::new(9)));
        assert_eq!(select.selected(), None);
    }

    #[tokio::test]
    async fn test_state_change_fetches_cities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cities/"))
            .and(query_param("state", "RO"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Ariquemes"}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cities/"))
            .and(query_param("state", "XX"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = StorefrontConfig::new(
            Url::parse(&format!("{}/api", server.uri())).unwrap(),
            "unused",
        );
        let client = ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap();

        let mut select = CitySelect::new();
        select.on_state_changed(&client, " RO ", None).await.unwrap();
        assert_eq!(select.options().len(), 1);
        assert!(!select.is_disabled());

        assert!(select.on_state_changed(&client, "XX", None).await.is_err());
        assert!(select.is_disabled());
        assert_eq!(select.options().len(), 1);

        select.on_state_changed(&client, "", None).await.unwrap();
        assert!(select.options().is_empty());
        assert!(select.is_disabled());
    }
}
