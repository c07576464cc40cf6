//! pt-BR date display.
//!
//! The backend stores UTC. Event times are shown in Brasília time, which has
//! had a fixed UTC-3 offset since daylight saving was abolished in 2019.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const BRASILIA_OFFSET_SECS: i32 = 3 * 3600;

/// The UTC-3 offset used for display.
#[must_use]
pub fn brasilia() -> FixedOffset {
    FixedOffset::west_opt(BRASILIA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// `dd/mm/aaaa`, e.g. `10/07/2026`.
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&brasilia()).format("%d/%m/%Y").to_string()
}

/// `dd/mm/aaaa às HH:MM`, e.g. `10/07/2026 às 19:00`.
#[must_use]
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&brasilia())
        .format("%d/%m/%Y às %H:%M")
        .to_string()
}
