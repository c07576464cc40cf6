//! Account and ticket-holder types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AttendeeId, UserId};
use super::qr::QrPayload;

/// Group whose members may operate the check-in tool.
pub const HOSTESS_GROUP: &str = "hostess";

/// The logged-in user, as returned by `/user/profile/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserProfile {
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Whether the user may use the check-in tool.
    #[must_use]
    pub fn is_hostess(&self) -> bool {
        self.in_group(HOSTESS_GROUP)
    }
}

/// One of the customer's own tickets (`/user/tickets/`).
///
/// The ticket ID is the attendee record the hostess checks in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: AttendeeId,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub ticket_name: String,
    pub checked_in: bool,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl Ticket {
    /// The string encoded in this ticket's QR code.
    #[must_use]
    pub fn qr_payload(&self) -> String {
        QrPayload::new(self.id).encode()
    }
}
