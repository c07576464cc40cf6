//! Catalog browsing.

use luma_core::EventQuery;
use luma_storefront::catalog;

use super::{CliError, Context};
use crate::output;

pub async fn events(ctx: &Context, query: &EventQuery) -> Result<(), CliError> {
    let page = catalog::browse(&ctx.client, query).await?;

    let events: Vec<_> = page.events.iter().collect();
    output::events(&events);

    if !page.cities.is_empty() {
        output::line(&format!("\nCidades: {}", page.cities.join(", ")));
    }
    if !page.categories.is_empty() {
        let categories: Vec<String> = page
            .categories
            .iter()
            .map(|c| format!("{} (#{})", c.name, c.id))
            .collect();
        output::line(&format!("Categorias: {}", categories.join(", ")));
    }
    Ok(())
}
