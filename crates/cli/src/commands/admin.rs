//! Admin event-form helpers.
//!
//! # Usage
//!
//! ```bash
//! # Cities the event form offers once a state is picked
//! luma admin cities --uf RO --cookie "$ADMIN_COOKIE"
//!
//! # Legacy lookup by state ID
//! luma admin cities --state-id 22
//! ```

use luma_core::StateId;
use luma_storefront::admin::CitySelect;
use luma_storefront::api::csrf_token_from_cookies;

use super::{CliError, Context};
use crate::output;

/// Name of the cookie holding the admin site's CSRF token.
const CSRF_COOKIE: &str = "csrftoken";

pub async fn cities(
    ctx: &Context,
    uf: Option<&str>,
    state_id: Option<StateId>,
    cookie: Option<&str>,
) -> Result<(), CliError> {
    let cities = if let Some(state_id) = state_id {
        ctx.client.admin_event_cities(state_id).await?
    } else {
        let csrf_token = cookie.and_then(|header| csrf_token_from_cookies(header, CSRF_COOKIE));
        if cookie.is_some() && csrf_token.is_none() {
            tracing::warn!("Cookie header has no {CSRF_COOKIE}, sending without it");
        }

        let mut select = CitySelect::new();
        select
            .on_state_changed(&ctx.client, uf.unwrap_or_default(), csrf_token.as_deref())
            .await?;
        select.options().to_vec()
    };

    if cities.is_empty() {
        output::line("Nenhuma cidade encontrada.");
    }
    for city in &cities {
        output::line(&format!("{}\t{}", city.id, city.name));
    }
    Ok(())
}
