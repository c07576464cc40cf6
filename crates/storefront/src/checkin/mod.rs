//! Event-day check-in for hostess staff.
//!
//! # Flow
//!
//! 1. [`Reconciler::load`] checks the user is in the `hostess` group, then
//!    fetches the event roster and counters. Any failure here ends the flow.
//! 2. Payloads come from a [`Scanner`] (via [`Reconciler::scan`]) or from a
//!    manual check-in by attendee ID; both send the same `{"attendee_id": N}`
//!    document to the backend.
//! 3. An accepted check-in flips one roster entry and bumps the counter by
//!    one. A rejection leaves the roster as it was.
//!
//! While a submission is in flight the scanner is paused. It resumes after
//! [`CheckInDelays`]: longer after a backend verdict so the operator can
//! read it, shorter after a bad code or a network failure.
//!
//! Responses that land after the screen was left (see [`ViewGuard`]) are
//! discarded.

mod scanner;
mod view;

pub use scanner::{ScanSession, Scanner, ScannerError};
pub use view::ViewGuard;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use luma_core::{
    Attendee, AttendeeId, Event, EventId, EventStats, QrPayload, QrPayloadError, Roster,
    RosterFilter, RosterUpdate, UserProfile,
};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError, CheckInResponse};
use crate::error::AppError;

/// Backend operations the check-in flow depends on.
pub trait CheckInBackend: Send + Sync {
    fn profile(&self) -> impl Future<Output = Result<UserProfile, ApiError>> + Send;

    fn events(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send;

    fn event_attendees(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Roster, ApiError>> + Send;

    fn check_in(
        &self,
        qr_data: &str,
    ) -> impl Future<Output = Result<CheckInResponse, ApiError>> + Send;
}

impl CheckInBackend for ApiClient {
    fn profile(&self) -> impl Future<Output = Result<UserProfile, ApiError>> + Send {
        Self::profile(self)
    }

    fn events(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send {
        Self::events(self)
    }

    fn event_attendees(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Roster, ApiError>> + Send {
        Self::event_attendees(self, event_id)
    }

    fn check_in(
        &self,
        qr_data: &str,
    ) -> impl Future<Output = Result<CheckInResponse, ApiError>> + Send {
        Self::check_in(self, qr_data)
    }
}

impl<T: CheckInBackend> CheckInBackend for Arc<T> {
    fn profile(&self) -> impl Future<Output = Result<UserProfile, ApiError>> + Send {
        (**self).profile()
    }

    fn events(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send {
        (**self).events()
    }

    fn event_attendees(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Roster, ApiError>> + Send {
        (**self).event_attendees(event_id)
    }

    fn check_in(
        &self,
        qr_data: &str,
    ) -> impl Future<Output = Result<CheckInResponse, ApiError>> + Send {
        (**self).check_in(qr_data)
    }
}

/// How long the scanner stays paused after each kind of outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInDelays {
    /// After a payload that is not a ticket code.
    pub invalid_payload: Duration,
    /// After the backend accepted or rejected the check-in.
    pub handled_response: Duration,
    /// After the request itself failed.
    pub request_failure: Duration,
}

impl Default for CheckInDelays {
    fn default() -> Self {
        Self {
            invalid_payload: Duration::from_secs(2),
            handled_response: Duration::from_secs(3),
            request_failure: Duration::from_secs(2),
        }
    }
}

/// Severity of an operator notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A short message shown to the operator after a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Result of a single check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// The backend checked the attendee in.
    Accepted {
        attendee_id: AttendeeId,
        user_name: String,
        check_in_time: Option<DateTime<Utc>>,
        /// What happened to the local roster entry.
        update: RosterUpdate,
        message: Option<String>,
    },
    /// The backend acknowledged the call without naming an attendee.
    Processed,
    /// The backend refused, e.g. the ticket was already used.
    Rejected { message: Option<String> },
    /// The scanned text is not a ticket code; nothing was sent.
    InvalidPayload(QrPayloadError),
    /// The request failed before the backend gave a verdict.
    Failed { reason: String },
    /// The response arrived after the screen was left and was ignored.
    Discarded,
}

impl CheckInOutcome {
    /// The operator notice for this outcome, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        let notice = match self {
            Self::Accepted { message, .. } => Notice::new(
                NoticeLevel::Success,
                message
                    .clone()
                    .unwrap_or_else(|| "Check-in realizado com sucesso!".to_string()),
            ),
            Self::Processed => Notice::new(NoticeLevel::Info, "Check-in processado."),
            Self::Rejected { message } => Notice::new(
                NoticeLevel::Error,
                message
                    .clone()
                    .unwrap_or_else(|| "Falha ao fazer check-in do participante.".to_string()),
            ),
            Self::InvalidPayload(_) => Notice::new(
                NoticeLevel::Error,
                "Formato de código QR inválido. Tente novamente.",
            ),
            Self::Failed { .. } => Notice::new(
                NoticeLevel::Error,
                "Erro ao processar o código QR. Tente novamente.",
            ),
            Self::Discarded => return None,
        };
        Some(notice)
    }

    /// How long to keep the scanner paused after this outcome.
    #[must_use]
    pub const fn resume_delay(&self, delays: &CheckInDelays) -> Duration {
        match self {
            Self::Accepted { .. } | Self::Processed | Self::Rejected { .. } => {
                delays.handled_response
            }
            Self::InvalidPayload(_) => delays.invalid_payload,
            Self::Failed { .. } => delays.request_failure,
            Self::Discarded => Duration::ZERO,
        }
    }
}

/// Why a scanning run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// The operator stopped the scanner.
    Stopped,
    /// Nobody is left to check in.
    AllCheckedIn,
    /// The check-in screen was left.
    ViewLeft,
}

/// List events for the hostess event picker.
///
/// # Errors
///
/// Returns `AppError::PermissionDenied` for users outside the hostess group,
/// session errors if not logged in, or the request error.
#[instrument(skip(backend))]
pub async fn hostess_events<B: CheckInBackend>(backend: &B) -> Result<Vec<Event>, AppError> {
    require_hostess(backend).await?;
    Ok(backend.events().await?)
}

async fn require_hostess<B: CheckInBackend>(backend: &B) -> Result<UserProfile, AppError> {
    let profile = backend.profile().await?;
    if !profile.is_hostess() {
        warn!(user_id = %profile.id, "Check-in denied: user is not a hostess");
        return Err(AppError::PermissionDenied);
    }
    Ok(profile)
}

/// Keeps one event's roster in step with the backend's check-in verdicts.
pub struct Reconciler<B> {
    backend: B,
    roster: Roster,
    view: ViewGuard,
    delays: CheckInDelays,
}

impl<B: CheckInBackend> Reconciler<B> {
    /// Gate on the hostess group, then load the roster of `event_id`.
    ///
    /// # Errors
    ///
    /// - `AppError::PermissionDenied` if the user is not a hostess
    /// - session and permission errors from the backend
    /// - `AppError::EventUnavailable` if the roster cannot be fetched
    /// - `AppError::ViewLeft` if the screen was left before the roster arrived
    #[instrument(skip(backend, view), fields(event_id = %event_id))]
    pub async fn load(backend: B, event_id: EventId, view: ViewGuard) -> Result<Self, AppError> {
        require_hostess(&backend).await?;
        if !view.is_active() {
            return Err(AppError::ViewLeft);
        }

        let roster = match backend.event_attendees(event_id).await {
            Ok(roster) => roster,
            Err(e) if e.is_session_error() || matches!(e, ApiError::PermissionDenied(_)) => {
                return Err(e.into());
            }
            Err(e) => return Err(AppError::EventUnavailable(e)),
        };
        if !view.is_active() {
            debug!("Roster arrived after leaving the screen");
            return Err(AppError::ViewLeft);
        }

        if roster.stats.checked_in != roster.count_checked_in() {
            warn!(
                stats = roster.stats.checked_in,
                counted = roster.count_checked_in(),
                "Roster counter disagrees with attendee list"
            );
        }
        info!(
            attendees = roster.attendees.len(),
            checked_in = roster.stats.checked_in,
            "Roster loaded"
        );

        Ok(Self {
            backend,
            roster,
            view,
            delays: CheckInDelays::default(),
        })
    }

    /// Override the scanner resume delays.
    #[must_use]
    pub const fn with_delays(mut self, delays: CheckInDelays) -> Self {
        self.delays = delays;
        self
    }

    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub const fn stats(&self) -> EventStats {
        self.roster.stats
    }

    #[must_use]
    pub const fn view(&self) -> &ViewGuard {
        &self.view
    }

    /// Scanning is only offered while someone is still pending.
    #[must_use]
    pub fn can_scan(&self) -> bool {
        self.roster.has_pending()
    }

    /// Attendees matching `filter`. Local only.
    #[must_use]
    pub fn filter(&self, filter: &RosterFilter) -> Vec<&Attendee> {
        self.roster.filter(filter)
    }

    /// Check an attendee in by ID, as if their ticket had been scanned.
    ///
    /// # Errors
    ///
    /// Returns session and permission errors; every other failure is an
    /// outcome.
    pub async fn check_in_manual(&mut self, id: AttendeeId) -> Result<CheckInOutcome, AppError> {
        self.submit(id, QrPayload::new(id).encode()).await
    }

    /// Validate a decoded QR string and submit it unchanged.
    ///
    /// # Errors
    ///
    /// Returns session and permission errors; every other failure is an
    /// outcome.
    pub async fn check_in_scanned(&mut self, raw: &str) -> Result<CheckInOutcome, AppError> {
        match QrPayload::parse(raw) {
            Ok(payload) => self.submit(payload.attendee_id, raw.to_string()).await,
            Err(e) => {
                debug!(error = %e, "Rejected scanned payload");
                Ok(CheckInOutcome::InvalidPayload(e))
            }
        }
    }

    #[instrument(skip(self, qr_data))]
    async fn submit(
        &mut self,
        attendee_id: AttendeeId,
        qr_data: String,
    ) -> Result<CheckInOutcome, AppError> {
        let response = self.backend.check_in(&qr_data).await;

        if !self.view.is_active() {
            debug!("Check-in response arrived after leaving the screen");
            return Ok(CheckInOutcome::Discarded);
        }

        let outcome = match response {
            Ok(CheckInResponse::Accepted {
                attendee: Some(attendee),
                message,
            }) => {
                let update = self
                    .roster
                    .apply_check_in(attendee_id, attendee.check_in_time);
                info!(
                    update = ?update,
                    checked_in = self.roster.stats.checked_in,
                    "Check-in accepted"
                );
                CheckInOutcome::Accepted {
                    attendee_id,
                    user_name: attendee.user_name,
                    check_in_time: attendee.check_in_time,
                    update,
                    message,
                }
            }
            Ok(CheckInResponse::Accepted { attendee: None, .. }) => CheckInOutcome::Processed,
            Ok(CheckInResponse::Rejected { message }) => {
                info!(reason = message.as_deref().unwrap_or(""), "Check-in rejected");
                CheckInOutcome::Rejected { message }
            }
            Err(e) if e.is_session_error() || matches!(e, ApiError::PermissionDenied(_)) => {
                return Err(e.into());
            }
            Err(e) => {
                warn!(error = %e, "Check-in request failed");
                CheckInOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// Run the scanner until the operator stops, everyone is checked in, or
    /// the screen is left.
    ///
    /// `on_outcome` sees each outcome together with the updated roster. The
    /// scanner is released on every exit path.
    ///
    /// # Errors
    ///
    /// - `AppError::ScanUnavailable` if nobody is pending
    /// - `AppError::Scanner` if the surface cannot be acquired or fails
    /// - session and permission errors from a submission
    pub async fn scan<S, F>(
        &mut self,
        scanner: &mut S,
        mut on_outcome: F,
    ) -> Result<ScanEnd, AppError>
    where
        S: Scanner,
        F: FnMut(&CheckInOutcome, &Roster),
    {
        if !self.can_scan() {
            return Err(AppError::ScanUnavailable);
        }

        let mut session = ScanSession::acquire(scanner).await?;
        info!("Scanning started");

        loop {
            if !self.view.is_active() {
                return Ok(ScanEnd::ViewLeft);
            }

            let Some(payload) = session.next_payload().await? else {
                info!("Scanning stopped by operator");
                return Ok(ScanEnd::Stopped);
            };

            session.pause();
            let outcome = self.check_in_scanned(&payload).await?;
            on_outcome(&outcome, &self.roster);

            if outcome == CheckInOutcome::Discarded {
                return Ok(ScanEnd::ViewLeft);
            }
            if !self.can_scan() {
                info!("Every attendee is checked in, scanning finished");
                return Ok(ScanEnd::AllCheckedIn);
            }

            tokio::time::sleep(outcome.resume_delay(&self.delays)).await;
            session.resume();
        }
    }
}
