//! Bearer token handling.
//!
//! The backend issues JWT access/refresh pairs. The client only reads the
//! access token's `exp` claim (no signature check; the backend verifies) to
//! decide when to refresh, and persists both tokens under fixed storage keys
//! so a session survives restarts.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::storage::{KeyValueStore, StorageError};

/// Refresh the access token when it expires within this many seconds.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Storage key of the access token.
pub(crate) const TOKEN_KEY: &str = "token";
/// Storage key of the refresh token.
pub(crate) const REFRESH_KEY: &str = "refresh";
/// Storage key of the cached user profile.
pub(crate) const USER_KEY: &str = "user";

/// An access token plus its expiry, if the token carries one.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    /// Unix timestamp from the JWT `exp` claim.
    expires_at: Option<i64>,
}

impl AccessToken {
    /// Wrap a raw token, reading its expiry from the JWT payload.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let expires_at = jwt_expiry(&value);
        Self {
            value: SecretString::from(value),
            expires_at,
        }
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.value
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Whether the token expires within `seconds` of `now`.
    ///
    /// Tokens without a readable expiry never count as expiring; the backend
    /// answers 401 if they are stale.
    #[must_use]
    pub fn expires_within(&self, now: i64, seconds: i64) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp - seconds)
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_within(now, 0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The access/refresh pair of the current session.
#[derive(Clone, Default)]
pub struct TokenPair {
    pub access: Option<AccessToken>,
    pub refresh: Option<SecretString>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &self.access)
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenPair {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: Some(AccessToken::new(access)),
            refresh: refresh.map(SecretString::from),
        }
    }

    /// No credentials at all: the user has to log in.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }

    /// The access token is absent or within [`REFRESH_MARGIN_SECS`] of expiry.
    #[must_use]
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.access
            .as_ref()
            .is_none_or(|access| access.expires_within(now, REFRESH_MARGIN_SECS))
    }

    /// The access token, if it has not yet expired.
    #[must_use]
    pub fn usable_access(&self, now: i64) -> Option<&AccessToken> {
        self.access.as_ref().filter(|access| !access.is_expired(now))
    }

    /// Read the pair from storage.
    pub(crate) fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        Ok(Self {
            access: store.get(TOKEN_KEY)?.map(AccessToken::new),
            refresh: store.get(REFRESH_KEY)?.map(SecretString::from),
        })
    }

    /// Write the pair to storage, removing keys for absent tokens.
    pub(crate) fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        match &self.access {
            Some(access) => store.set(TOKEN_KEY, access.secret().expose_secret())?,
            None => store.remove(TOKEN_KEY)?,
        }
        match &self.refresh {
            Some(refresh) => store.set(REFRESH_KEY, refresh.expose_secret()),
            None => store.remove(REFRESH_KEY),
        }
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Read the `exp` claim of a JWT without verifying it.
fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice::<Claims>(&bytes)
        .ok()
        .map(|claims| claims.exp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    /// Build an unsigned JWT-shaped token expiring at `exp`.
    pub(crate) fn jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"user_id":1}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_reads_exp_claim() {
        let token = AccessToken::new(jwt(1_900_000_000));
        assert_eq!(token.expires_at(), Some(1_900_000_000));
        assert_eq!(AccessToken::new("opaque-token").expires_at(), None);
    }

    #[test]
    fn test_needs_refresh_inside_margin() {
        let now = 1_800_000_000;

        let fresh = TokenPair::new(jwt(now + 3600), Some("r".to_string()));
        assert!(!fresh.needs_refresh(now));

        let expiring = TokenPair::new(jwt(now + 120), Some("r".to_string()));
        assert!(expiring.needs_refresh(now));
        assert!(expiring.usable_access(now).is_some());

        let expired = TokenPair::new(jwt(now - 1), None);
        assert!(expired.usable_access(now).is_none());

        let refresh_only = TokenPair {
            access: None,
            refresh: Some(SecretString::from("r")),
        };
        assert!(refresh_only.needs_refresh(now));
        assert!(!refresh_only.is_empty());
    }

    #[test]
    fn test_save_and_load_use_fixed_keys() {
        let store = MemoryStore::new();
        let pair = TokenPair::new("access-token", Some("refresh-token".to_string()));
        pair.save(&store).unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("access-token"));
        assert_eq!(store.get(REFRESH_KEY).unwrap().as_deref(), Some("refresh-token"));

        TokenPair::default().save(&store).unwrap();
        assert!(TokenPair::load(&store).unwrap().is_empty());
    }
}
