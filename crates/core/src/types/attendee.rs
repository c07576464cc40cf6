//! Check-in roster for a single event.
//!
//! The roster is loaded in bulk from `/events/{id}/attendees/` and then kept
//! in step with the backend locally: every accepted check-in flips one
//! attendee and bumps the checked-in counter by one, so the counter always
//! equals the number of checked-in attendees without refetching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AttendeeId, EventId};

/// A ticket holder tracked for event-day check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    pub user_name: String,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub ticket_name: String,
    pub checked_in: bool,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
}

/// Minimal event header shown above the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub id: EventId,
    pub title: String,
    pub date: DateTime<Utc>,
}

/// Server-derived check-in counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub checked_in: u64,
    pub total: u64,
}

/// Result of applying an accepted check-in to the local roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterUpdate {
    /// The attendee flipped to checked-in and the counter moved by one.
    CheckedIn,
    /// The attendee was already checked in locally; nothing changed.
    AlreadyCheckedIn,
    /// No attendee with that ID is on this roster; nothing changed.
    NotOnRoster,
}

/// Attendee list and counters for one event, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub event: EventDetails,
    pub attendees: Vec<Attendee>,
    pub stats: EventStats,
}

impl Roster {
    /// Look up an attendee by ID.
    #[must_use]
    pub fn get(&self, id: AttendeeId) -> Option<&Attendee> {
        self.attendees.iter().find(|attendee| attendee.id == id)
    }

    /// Whether anyone is still waiting to be checked in.
    ///
    /// Scanning is only offered while this holds.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.attendees.iter().any(|attendee| !attendee.checked_in)
    }

    /// Number of checked-in attendees counted from the list itself.
    #[must_use]
    pub fn count_checked_in(&self) -> u64 {
        self.attendees
            .iter()
            .filter(|attendee| attendee.checked_in)
            .count() as u64
    }

    /// Record a check-in the backend accepted.
    ///
    /// Check-in is one-way: an attendee already marked present keeps its
    /// original timestamp and the counter is left alone, which keeps
    /// `stats.checked_in == count_checked_in()` intact.
    pub fn apply_check_in(&mut self, id: AttendeeId, at: Option<DateTime<Utc>>) -> RosterUpdate {
        let Some(attendee) = self.attendees.iter_mut().find(|attendee| attendee.id == id) else {
            return RosterUpdate::NotOnRoster;
        };
        if attendee.checked_in {
            return RosterUpdate::AlreadyCheckedIn;
        }

        attendee.checked_in = true;
        attendee.check_in_time = at;
        self.stats.checked_in += 1;
        RosterUpdate::CheckedIn
    }

    /// Attendees matching a filter, in roster order.
    #[must_use]
    pub fn filter<'a>(&'a self, filter: &RosterFilter) -> Vec<&'a Attendee> {
        self.attendees
            .iter()
            .filter(|attendee| filter.matches(attendee))
            .collect()
    }
}

/// Check-in status selector for the roster view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckInStatusFilter {
    #[default]
    All,
    CheckedIn,
    Pending,
}

impl From<Option<bool>> for CheckInStatusFilter {
    fn from(checked_in: Option<bool>) -> Self {
        match checked_in {
            None => Self::All,
            Some(true) => Self::CheckedIn,
            Some(false) => Self::Pending,
        }
    }
}

/// Search box plus status selector over a roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// Case-insensitive substring of the attendee's name; empty matches all.
    pub name: String,
    pub status: CheckInStatusFilter,
}

impl RosterFilter {
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<CheckInStatusFilter>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }

    /// Whether an attendee passes both the name and the status condition.
    #[must_use]
    pub fn matches(&self, attendee: &Attendee) -> bool {
        let name_matches = self.name.is_empty()
            || attendee
                .user_name
                .to_lowercase()
                .contains(&self.name.to_lowercase());

        let status_matches = match self.status {
            CheckInStatusFilter::All => true,
            CheckInStatusFilter::CheckedIn => attendee.checked_in,
            CheckInStatusFilter::Pending => !attendee.checked_in,
        };

        name_matches && status_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee(id: i64, name: &str, checked_in: bool) -> Attendee {
        Attendee {
            id: AttendeeId::new(id),
            user_name: name.to_string(),
            event_title: "Arraial".to_string(),
            event_date: "2026-06-24T22:00:00Z".parse().unwrap(),
            ticket_name: "Inteira".to_string(),
            checked_in,
            check_in_time: None,
        }
    }

    fn roster(attendees: Vec<Attendee>) -> Roster {
        let total = attendees.len() as u64;
        let checked_in = attendees.iter().filter(|a| a.checked_in).count() as u64;
        Roster {
            event: EventDetails {
                id: EventId::new(9),
                title: "Arraial".to_string(),
                date: "2026-06-24T22:00:00Z".parse().unwrap(),
            },
            attendees,
            stats: EventStats { checked_in, total },
        }
    }

    #[test]
    fn test_apply_check_in_flips_one_entry_and_counts() {
        let mut roster = roster(vec![attendee(1, "Ana", false), attendee(2, "Bruno", true)]);
        let at: DateTime<Utc> = "2026-06-24T22:15:00Z".parse().unwrap();

        assert_eq!(
            roster.apply_check_in(AttendeeId::new(1), Some(at)),
            RosterUpdate::CheckedIn
        );

        assert_eq!(roster.stats, EventStats { checked_in: 2, total: 2 });
        assert_eq!(roster.get(AttendeeId::new(1)).unwrap().check_in_time, Some(at));
        assert!(!roster.has_pending());
        assert_eq!(roster.count_checked_in(), roster.stats.checked_in);
    }

    #[test]
    fn test_apply_check_in_is_one_way() {
        let mut roster = roster(vec![attendee(2, "Bruno", true)]);
        assert_eq!(
            roster.apply_check_in(AttendeeId::new(2), None),
            RosterUpdate::AlreadyCheckedIn
        );
        assert_eq!(
            roster.apply_check_in(AttendeeId::new(99), None),
            RosterUpdate::NotOnRoster
        );
        assert_eq!(roster.stats.checked_in, 1);
    }

    #[test]
    fn test_filter_by_name_and_status() {
        let roster = roster(vec![
            attendee(1, "Ana Souza", false),
            attendee(2, "Mariana", true),
            attendee(3, "Luciana", false),
            attendee(4, "Pedro", false),
        ]);

        let names: Vec<&str> = roster
            .filter(&RosterFilter::new("ANA", Some(false)))
            .iter()
            .map(|a| a.user_name.as_str())
            .collect();
        assert_eq!(names, ["Ana Souza", "Luciana"]);

        assert_eq!(roster.filter(&RosterFilter::default()).len(), 4);
        assert_eq!(roster.filter(&RosterFilter::new("", Some(true))).len(), 1);
    }

    #[test]
    fn test_roster_deserializes_backend_shape() {
        let json = serde_json::json!({
            "event": {"id": 9, "title": "Arraial", "date": "2026-06-24T22:00:00-03:00"},
            "attendees": [{
                "id": 1,
                "user_name": "Ana",
                "event_title": "Arraial",
                "event_date": "2026-06-24T22:00:00-03:00",
                "ticket_name": "Inteira",
                "checked_in": false,
                "check_in_time": null
            }],
            "stats": {"checked_in": 0, "total": 1}
        });

        let roster: Roster = serde_json::from_value(json).unwrap();
        assert_eq!(roster.attendees.len(), 1);
        assert!(roster.has_pending());
    }
}
