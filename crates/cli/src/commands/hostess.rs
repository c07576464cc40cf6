//! Event-day check-in for the hostess group.
//!
//! # Usage
//!
//! ```bash
//! # Pick an event
//! luma hostess events
//!
//! # Show who is still pending
//! luma hostess checkin 3 --checked-in false
//!
//! # Check one attendee in by ID
//! luma hostess checkin 3 --attendee 41
//!
//! # Scan tickets until everyone is in (Ctrl-C leaves)
//! luma hostess checkin 3 --scan
//! ```

use luma_core::{AttendeeId, EventId, RosterFilter, format_date_time};
use luma_storefront::checkin::{self, Reconciler, ScanEnd, ViewGuard};

use super::{CliError, Context};
use crate::output;
use crate::scanner::StdinScanner;

pub async fn events(ctx: &Context) -> Result<(), CliError> {
    let events = checkin::hostess_events(&ctx.client).await?;
    let events: Vec<_> = events.iter().collect();
    output::events(&events);
    Ok(())
}

pub async fn checkin(
    ctx: &Context,
    event_id: EventId,
    attendee: Option<AttendeeId>,
    scan: bool,
    filter: &RosterFilter,
) -> Result<(), CliError> {
    let view = ViewGuard::new();
    let mut reconciler = Reconciler::load(ctx.client.clone(), event_id, view.clone()).await?;

    let event = &reconciler.roster().event;
    output::line(&format!("{} - {}", event.title, format_date_time(event.date)));
    output::stats(reconciler.stats());

    if let Some(id) = attendee {
        let outcome = reconciler.check_in_manual(id).await?;
        output::outcome(&outcome);
        output::stats(reconciler.stats());
        return Ok(());
    }

    if scan {
        let mut scanner = StdinScanner::new();
        let end = tokio::select! {
            end = reconciler.scan(&mut scanner, |outcome, roster| {
                output::outcome(outcome);
                output::stats(roster.stats);
            }) => end?,
            _ = tokio::signal::ctrl_c() => {
                view.leave();
                ScanEnd::ViewLeft
            }
        };
        match end {
            ScanEnd::AllCheckedIn => output::line("Todos os participantes já fizeram check-in."),
            ScanEnd::Stopped | ScanEnd::ViewLeft => output::line("Leitura encerrada."),
        }
        output::stats(reconciler.stats());
        return Ok(());
    }

    output::roster(&reconciler.filter(filter));
    Ok(())
}
