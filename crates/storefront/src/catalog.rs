//! Catalog browsing.
//!
//! The backend returns the whole (cached) catalog; the browse filter runs
//! locally over it. City options and price bounds always describe the full
//! catalog so the filter controls don't shrink as the user narrows results.

use luma_core::{Category, Event, EventQuery, PriceBounds, cities};
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::error::AppError;

/// One render of the events page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    /// Events matching the query, in display order.
    pub events: Vec<Event>,
    pub categories: Vec<Category>,
    /// Every city with at least one event, sorted.
    pub cities: Vec<String>,
    pub price_bounds: PriceBounds,
}

/// Fetch events and categories and apply `query`.
///
/// # Errors
///
/// Returns `AppError::Api` if either listing cannot be fetched.
#[instrument(skip(client))]
pub async fn browse(client: &ApiClient, query: &EventQuery) -> Result<CatalogPage, AppError> {
    let (events, categories) = tokio::try_join!(client.events(), client.categories())?;

    let matched: Vec<Event> = query.apply(&events, &categories).into_iter().cloned().collect();
    debug!(total = events.len(), matched = matched.len(), "Catalog filtered");

    Ok(CatalogPage {
        cities: cities(&events).into_iter().map(ToString::to_string).collect(),
        price_bounds: PriceBounds::from_events(&events),
        events: matched,
        categories,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use luma_core::{CategoryId, EventSort};
    use rust_decimal::Decimal;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_browse_filters_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/events/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Festa Junina", "date": "2026-06-20T22:00:00Z",
                 "price": "40.00", "category": "Festas", "city": "Porto Velho"},
                {"id": 2, "title": "Concerto de Música Clássica", "date": "2026-08-01T23:00:00Z",
                 "price": "120.00", "category": "Música", "city": "Ji-Paraná"},
                {"id": 3, "title": "Show de Rock", "date": "2026-09-12T01:00:00Z",
                 "price": "80.00", "category": "Música", "city": "Porto Velho"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/categories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Festas", "slug": "festas"},
                {"id": 2, "name": "Música", "slug": "musica"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = StorefrontConfig::new(
            Url::parse(&format!("{}/api", server.uri())).unwrap(),
            "unused",
        );
        let client = ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap();

        let query = EventQuery {
            search: Some("classica".to_string()),
            categories: vec![CategoryId::new(2)],
            sort: EventSort::LowestPrice,
            ..EventQuery::default()
        };
        let page = browse(&client, &query).await.unwrap();

        let titles: Vec<&str> = page.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Concerto de Música Clássica"]);
        assert_eq!(page.cities, vec!["Ji-Paraná", "Porto Velho"]);
        assert_eq!(page.price_bounds.min, Decimal::new(4000, 2));
        assert_eq!(page.price_bounds.max, Decimal::new(12000, 2));

        // Second render comes from the cache.
        let page = browse(&client, &EventQuery::default()).await.unwrap();
        assert_eq!(page.events.len(), 3);
    }
}
