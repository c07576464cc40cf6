//! HTTP client for the Luma Events REST API.

use std::sync::Arc;
use std::time::Duration;

use luma_core::{
    Category, City, Email, Event, EventId, Roster, State, StateId, Ticket, UserProfile,
};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};
use url::Url;

use super::ApiError;
use super::auth::{AccessToken, REFRESH_KEY, TOKEN_KEY, TokenPair, USER_KEY};
use super::cache::{CacheKey, CacheValue};
use super::types::{
    CheckInRequest, CheckInResponse, CheckInSuccessBody, LoginRequest, PaymentIntent,
    PaymentIntentRequest, RefreshRequest, RegisterRequest, TokenResponse, error_message,
};
use crate::config::StorefrontConfig;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{KeyValueStore, StorageError};

/// Client for the Luma Events REST API.
///
/// Cheap to clone; clones share the token cache, the refresh guard, and the
/// catalog cache.
///
/// # Authentication
///
/// Login stores an access/refresh pair in the key-value store. Before each
/// authenticated call the access token is refreshed if it is missing or
/// within [`REFRESH_MARGIN_SECS`](super::REFRESH_MARGIN_SECS) of expiry. Only
/// one refresh runs at a time; callers that waited re-check the pair first.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    store: Arc<dyn KeyValueStore>,
    /// In-memory copy of the persisted token pair
    tokens: RwLock<TokenPair>,
    refresh_guard: Mutex<()>,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a client, picking up any session persisted in `store`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built, or
    /// `ApiError::Storage` if stored credentials cannot be read.
    pub fn new(
        config: &StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let tokens = TokenPair::load(store.as_ref())?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                store,
                tokens: RwLock::new(tokens),
                refresh_guard: Mutex::new(()),
                cache,
            }),
        })
    }

    /// Resolve an endpoint path.
    ///
    /// `/api/...` and `/admin/...` live at the server root; everything else
    /// hangs off the configured base URL.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        if path.starts_with("/api/") || path.starts_with("/admin/") {
            return Ok(self.inner.base_url.join(path)?);
        }

        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Send a request and return the body of a successful response.
    ///
    /// With `authenticated`, a bearer token is attached and a 401 ends the
    /// session.
    pub(super) async fn send(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<String, ApiError> {
        if !authenticated {
            return execute(request).await;
        }

        let token = self.access_token().await?;
        match execute(request.bearer_auth(token.secret().expose_secret())).await {
            Err(ApiError::Status { status: 401, .. }) => {
                warn!("Access token rejected, ending session");
                self.clear_credentials().await?;
                Err(ApiError::SessionExpired)
            }
            result => result,
        }
    }

    /// Send a request and parse the JSON body.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let body = self.send(request, authenticated).await?;
        parse_body(&body)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// Stores the token pair, then fetches and caches the user profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (typically 400/401) if the credentials are
    /// rejected.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let request = self.http().post(self.endpoint("/login/")?).json(&LoginRequest {
            username,
            password: password.expose_secret(),
        });
        let tokens: TokenResponse = self.send_json(request, false).await?;

        let pair = TokenPair::new(tokens.access, tokens.refresh);
        self.store_tokens(pair).await?;

        let profile = self.profile().await?;
        debug!(user_id = %profile.id, "Logged in");
        Ok(profile)
    }

    /// Create an account, then log into it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message if registration
    /// is refused (e.g. username taken).
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .http()
            .post(self.endpoint("/register/")?)
            .json(&RegisterRequest {
                username,
                email: email.as_str(),
                password: password.expose_secret(),
            });
        self.send(request, false).await?;

        self.login(username, password).await
    }

    /// Forget every stored credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the store cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.clear_credentials().await
    }

    /// Whether any credentials are held.
    pub async fn is_authenticated(&self) -> bool {
        !self.inner.tokens.read().await.is_empty()
    }

    /// The profile cached at login, without a network call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the stored record cannot be read.
    pub fn cached_user(&self) -> Result<Option<UserProfile>, ApiError> {
        let Some(raw) = self.inner.store.get(USER_KEY)? else {
            return Ok(None);
        };
        let profile = serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
            key: USER_KEY.to_string(),
            source,
        })?;
        Ok(Some(profile))
    }

    /// A valid access token, refreshing it first if needed.
    ///
    /// # Errors
    ///
    /// - `ApiError::NotAuthenticated` if no credentials are stored
    /// - `ApiError::SessionExpired` if the refresh token is rejected, or the
    ///   access token has expired with no refresh token to renew it
    /// - transport errors from the refresh call when no unexpired access
    ///   token remains to fall back on
    pub async fn access_token(&self) -> Result<AccessToken, ApiError> {
        {
            let tokens = self.inner.tokens.read().await;
            if tokens.is_empty() {
                return Err(ApiError::NotAuthenticated);
            }
            if !tokens.needs_refresh(now())
                && let Some(access) = &tokens.access
            {
                return Ok(access.clone());
            }
        }

        let _guard = self.inner.refresh_guard.lock().await;

        // Another caller may have refreshed or logged out while we waited.
        let tokens = self.inner.tokens.read().await.clone();
        let now = now();
        if tokens.is_empty() {
            return Err(ApiError::NotAuthenticated);
        }
        if !tokens.needs_refresh(now)
            && let Some(access) = tokens.access
        {
            return Ok(access);
        }

        let Some(refresh) = tokens.refresh.clone() else {
            return match tokens.usable_access(now) {
                Some(access) => Ok(access.clone()),
                None => {
                    self.clear_credentials().await?;
                    Err(ApiError::SessionExpired)
                }
            };
        };

        match self.refresh_tokens(&refresh).await {
            Ok(response) => {
                let access = AccessToken::new(response.access);
                let pair = TokenPair {
                    access: Some(access.clone()),
                    refresh: response.refresh.map(SecretString::from).or(Some(refresh)),
                };
                self.store_tokens(pair).await?;
                debug!("Access token refreshed");
                Ok(access)
            }
            Err(ApiError::Status {
                status: 400 | 401, ..
            }) => {
                warn!("Refresh token rejected, ending session");
                self.clear_credentials().await?;
                Err(ApiError::SessionExpired)
            }
            Err(e) => match tokens.usable_access(now) {
                Some(access) => {
                    warn!(error = %e, "Token refresh failed, using current access token");
                    Ok(access.clone())
                }
                None => Err(e),
            },
        }
    }

    #[instrument(skip_all)]
    async fn refresh_tokens(&self, refresh: &SecretString) -> Result<TokenResponse, ApiError> {
        let request = self
            .http()
            .post(self.endpoint("/api/token/refresh/")?)
            .json(&RefreshRequest {
                refresh: refresh.expose_secret(),
            });
        let body = execute(request).await?;
        parse_body(&body)
    }

    async fn store_tokens(&self, pair: TokenPair) -> Result<(), ApiError> {
        pair.save(self.inner.store.as_ref())?;
        *self.inner.tokens.write().await = pair;
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), ApiError> {
        *self.inner.tokens.write().await = TokenPair::default();
        for key in [TOKEN_KEY, REFRESH_KEY, USER_KEY] {
            self.inner.store.remove(key)?;
        }
        clear_sentry_user();
        Ok(())
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Fetch the logged-in user's profile and refresh the cached copy.
    ///
    /// # Errors
    ///
    /// Returns a session error if not logged in, or the request error.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let request = self.http().get(self.endpoint("/user/profile/")?);
        let profile: UserProfile = self.send_json(request, true).await?;

        let raw = serde_json::to_string(&profile)?;
        self.inner.store.set(USER_KEY, &raw)?;
        set_sentry_user(&profile.id, Some(profile.email.as_str()).filter(|e| !e.is_empty()));

        Ok(profile)
    }

    /// The customer's own tickets.
    ///
    /// # Errors
    ///
    /// Returns a session error if not logged in, or the request error.
    #[instrument(skip(self))]
    pub async fn user_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        let request = self.http().get(self.endpoint("/user/tickets/")?);
        self.send_json(request, true).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All published events, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn events(&self) -> Result<Vec<Event>, ApiError> {
        if let Some(CacheValue::Events(events)) = self.inner.cache.get(&CacheKey::Events).await {
            debug!("Cache hit for events");
            return Ok(events);
        }

        let request = self.http().get(self.endpoint("/events/")?);
        let events: Vec<Event> = self.send_json(request, false).await?;

        self.inner
            .cache
            .insert(CacheKey::Events, CacheValue::Events(events.clone()))
            .await;
        Ok(events)
    }

    /// All event categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.http().get(self.endpoint("/categories/")?);
        let categories: Vec<Category> = self.send_json(request, false).await?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// All states.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn states(&self) -> Result<Vec<State>, ApiError> {
        if let Some(CacheValue::States(states)) = self.inner.cache.get(&CacheKey::States).await {
            debug!("Cache hit for states");
            return Ok(states);
        }

        let request = self.http().get(self.endpoint("/states/")?);
        let states: Vec<State> = self.send_json(request, false).await?;

        self.inner
            .cache
            .insert(CacheKey::States, CacheValue::States(states.clone()))
            .await;
        Ok(states)
    }

    /// Cities of one state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(state_id = %state_id))]
    pub async fn cities(&self, state_id: StateId) -> Result<Vec<City>, ApiError> {
        let mut url = self.endpoint("/cities/")?;
        url.query_pairs_mut()
            .append_pair("state", &state_id.to_string());
        self.send_json(self.http().get(url), false).await
    }

    /// Drop cached catalog listings.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Check-in
    // =========================================================================

    /// Roster and counters of one event. Hostess only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::PermissionDenied` for non-hostess users, or
    /// `ApiError::Status` (404) for an unknown event.
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn event_attendees(&self, event_id: EventId) -> Result<Roster, ApiError> {
        let request = self
            .http()
            .get(self.endpoint(&format!("/events/{event_id}/attendees/"))?);
        self.send_json(request, true).await
    }

    /// Submit a scanned or typed QR payload.
    ///
    /// Any non-success status other than 401/403 is the backend refusing the
    /// check-in and comes back as [`CheckInResponse::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns session/permission errors, transport errors, or a parse error
    /// for a malformed success body.
    #[instrument(skip(self, qr_data))]
    pub async fn check_in(&self, qr_data: &str) -> Result<CheckInResponse, ApiError> {
        let request = self
            .http()
            .post(self.endpoint("/attendee/check-in/")?)
            .json(&CheckInRequest { qr_data });

        match self.send(request, true).await {
            Ok(body) => {
                let body: CheckInSuccessBody = if body.trim().is_empty() {
                    CheckInSuccessBody {
                        attendee: None,
                        message: None,
                    }
                } else {
                    parse_body(&body)?
                };
                Ok(CheckInResponse::Accepted {
                    attendee: body.attendee,
                    message: body.message,
                })
            }
            Err(ApiError::Status { status, message }) => {
                debug!(status, "Check-in rejected");
                Ok(CheckInResponse::Rejected { message })
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Create a payment intent for the given items.
    ///
    /// # Errors
    ///
    /// Returns a session error if not logged in, or `ApiError::Status` with
    /// the backend's `error` text.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        let http = self
            .http()
            .post(self.endpoint("/payments/create-payment-intent/")?)
            .json(request);
        self.send_json(http, true).await
    }
}

/// Send without touching credentials; a non-success status becomes an error.
async fn execute(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = error_message(&body);
    if status == StatusCode::FORBIDDEN {
        return Err(ApiError::PermissionDenied(message));
    }
    debug!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "API returned non-success status"
    );
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        warn!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse API response"
        );
        ApiError::Parse(e)
    })
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
