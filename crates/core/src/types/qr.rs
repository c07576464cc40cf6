//! Ticket QR payloads.
//!
//! A ticket's QR code encodes a small JSON document, `{"attendee_id": 17}`.
//! Manual check-ins build the very same document so the backend can't tell
//! the two apart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::AttendeeId;

/// Why a decoded QR payload was rejected before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QrPayloadError {
    /// The payload is not a JSON document.
    #[error("payload is not valid JSON")]
    NotJson,
    /// The document has no usable `attendee_id`.
    #[error("payload has no attendee_id")]
    MissingAttendeeId,
}

/// The structured content of a ticket QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub attendee_id: AttendeeId,
}

impl QrPayload {
    #[must_use]
    pub const fn new(attendee_id: AttendeeId) -> Self {
        Self { attendee_id }
    }

    /// Parse a decoded QR string.
    ///
    /// Extra fields are ignored. The ID must be a positive JSON integer; `0`,
    /// strings, and `null` count as missing.
    ///
    /// # Errors
    ///
    /// Returns `QrPayloadError::NotJson` if the text is not JSON and
    /// `QrPayloadError::MissingAttendeeId` if no positive `attendee_id` is present.
    pub fn parse(text: &str) -> Result<Self, QrPayloadError> {
        let value: Value = serde_json::from_str(text).map_err(|_| QrPayloadError::NotJson)?;

        value
            .get("attendee_id")
            .and_then(Value::as_i64)
            .filter(|id| *id > 0)
            .map(|id| Self::new(AttendeeId::new(id)))
            .ok_or(QrPayloadError::MissingAttendeeId)
    }

    /// Encode as the JSON string printed into a ticket's QR code.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{{\"attendee_id\":{}}}", self.attendee_id)
    }
}
