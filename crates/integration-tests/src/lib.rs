//! End-to-end tests for the Luma Events storefront client.
//!
//! Each test runs the real [`ApiClient`] against a `wiremock` backend and a
//! [`FileStore`] in a temporary directory, so persistence across "restarts"
//! is exercised the way the CLI sees it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p luma-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use luma_storefront::api::ApiClient;
use luma_storefront::cart::CartStore;
use luma_storefront::config::StorefrontConfig;
use luma_storefront::storage::{FileStore, KeyValueStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

/// A mock backend plus a data directory, shared by every "process" a test
/// opens.
pub struct TestContext {
    pub server: MockServer,
    pub data_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            data_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(
            Url::parse(&format!("{}/api", self.server.uri())).unwrap(),
            self.data_dir.path(),
        )
    }

    /// A fresh store over the data directory, as a new process would open it.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileStore::open(self.data_dir.path()).unwrap())
    }

    /// A fresh client over the data directory.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config(), self.store()).unwrap()
    }

    pub fn cart(&self) -> CartStore {
        CartStore::load(self.store()).unwrap()
    }
}

/// An unsigned JWT-shaped token expiring at `exp` (Unix seconds).
pub fn jwt(exp: i64) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("e30.{payload}.sig")
}

/// Unix seconds, now.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn profile_json(groups: &[&str]) -> Value {
    json!({"id": 7, "username": "ana", "email": "ana@luma.com.br", "groups": groups})
}

pub fn events_json() -> Value {
    json!([
        {"id": 3, "title": "Festival de Inverno", "date": "2026-07-10T22:00:00Z",
         "price": "50.00", "category": "Festivais", "city": "Porto Velho",
         "tickets": [
            {"id": 7, "name": "Inteira", "price": "50.00"},
            {"id": 8, "name": "Meia", "price": "25.50"}
         ]}
    ])
}

/// Roster of event 3: attendee 1 pending, attendee 2 already checked in.
pub fn roster_json() -> Value {
    json!({
        "event": {"id": 3, "title": "Festival de Inverno", "date": "2026-07-10T22:00:00Z"},
        "attendees": [
            {"id": 1, "user_name": "Ana", "event_title": "Festival de Inverno",
             "event_date": "2026-07-10T22:00:00Z", "ticket_name": "Inteira",
             "checked_in": false},
            {"id": 2, "user_name": "Bruno", "event_title": "Festival de Inverno",
             "event_date": "2026-07-10T22:00:00Z", "ticket_name": "Meia",
             "checked_in": true, "check_in_time": "2026-07-10T21:40:00Z"}
        ],
        "stats": {"checked_in": 1, "total": 2}
    })
}
