//! REST API client for the Luma Events backend.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backend is the source of truth and the
//!   client keeps no copy beyond a short-lived catalog cache
//! - Bearer authentication with an access/refresh token pair persisted in
//!   the local [`KeyValueStore`](crate::storage::KeyValueStore)
//! - Access tokens are refreshed lazily, behind a single in-flight guard
//! - Events, categories, and states are cached via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use luma_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config, store)?;
//! client.login("ana", &password).await?;
//!
//! let roster = client.event_attendees(event_id).await?;
//! let outcome = client.check_in(&QrPayload::new(attendee_id).encode()).await?;
//! ```

mod admin;
mod auth;
mod cache;
mod client;
pub mod types;

pub use admin::csrf_token_from_cookies;
pub use auth::{AccessToken, REFRESH_MARGIN_SECS, TokenPair};
pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        /// `error` or `detail` field of the response body, if any.
        message: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No credentials are stored; the user must log in.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The backend rejected the credentials or the refresh token.
    #[error("Session expired")]
    SessionExpired,

    /// Authenticated, but not allowed to perform the operation.
    #[error("Permission denied: {}", .0.as_deref().unwrap_or("forbidden"))]
    PermissionDenied(Option<String>),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credentials could not be read or written.
    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Whether the caller must send the user back to login.
    #[must_use]
    pub const fn is_session_error(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }

    /// Backend-provided message, when there is one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::PermissionDenied(message) => message.as_deref(),
            _ => None,
        }
    }
}
