//! Cart and checkout commands.
//!
//! The cart lives in the data directory, so it survives between runs the
//! same way the web storefront's cart survives page reloads.

use luma_core::{CartItem, CartLineId, EventId, TicketId};
use luma_storefront::checkout;

use super::{CliError, Context, read_line};
use crate::output;

pub fn list(ctx: &Context) -> Result<(), CliError> {
    output::cart(ctx.cart()?.cart());
    Ok(())
}

/// Add `quantity` tickets, pricing the line from the current catalog.
pub async fn add(
    ctx: &Context,
    event_id: EventId,
    ticket_id: TicketId,
    quantity: u32,
    line: Option<CartLineId>,
) -> Result<(), CliError> {
    let mut cart = ctx.cart()?;
    if let Some(line) = line
        && !cart.cart().items().iter().any(|item| item.id == line)
    {
        return Err(CliError::NotFound(format!("Item {line} não está no carrinho.")));
    }

    let events = ctx.client.events().await?;
    let event = events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or_else(|| CliError::NotFound(format!("Evento {event_id} não encontrado.")))?;
    let ticket = event
        .tickets
        .iter()
        .find(|t| t.id == ticket_id)
        .ok_or_else(|| {
            CliError::NotFound(format!("Ingresso {ticket_id} não encontrado neste evento."))
        })?;

    cart.add_item(CartItem {
        id: line.unwrap_or_else(CartLineId::generate),
        event_id: event.id,
        event_title: event.title.clone(),
        event_thumbnail: event.thumbnail.clone(),
        event_date: event.date,
        ticket_id: ticket.id,
        ticket_name: ticket.name.clone(),
        unit_price: ticket.price,
        quantity,
    })?;

    output::line(&format!(
        "{quantity}x {} ({}) adicionado ao carrinho.",
        event.title, ticket.name
    ));
    output::cart(cart.cart());
    Ok(())
}

pub fn remove(ctx: &Context, line: CartLineId) -> Result<(), CliError> {
    let mut cart = ctx.cart()?;
    cart.remove_item(line)?;
    output::cart(cart.cart());
    Ok(())
}

pub fn set_quantity(ctx: &Context, line: CartLineId, quantity: i64) -> Result<(), CliError> {
    let mut cart = ctx.cart()?;
    if quantity < 1 {
        tracing::info!(%line, quantity, "Quantity below 1 ignored");
    }
    cart.set_quantity(line, quantity)?;
    output::cart(cart.cart());
    Ok(())
}

pub fn clear(ctx: &Context) -> Result<(), CliError> {
    ctx.cart()?.clear()?;
    output::line("Carrinho esvaziado.");
    Ok(())
}

/// Create the payment intent, then clear the cart once payment is confirmed.
///
/// Card entry happens in the payment processor's UI, which this tool only
/// hands the client secret to.
pub async fn checkout(ctx: &Context, paid: bool) -> Result<(), CliError> {
    let mut cart = ctx.cart()?;
    let pending = checkout::start_checkout(&ctx.client, &cart).await?;

    output::line(&format!("Pagamento #{} criado.", pending.intent.payment_id));
    output::line(&format!("Total: {}", pending.total));
    output::line(&format!("Client secret: {}", pending.intent.client_secret));

    if !paid {
        output::prompt("Pagamento confirmado? [s/N] ");
        let answer = read_line().await?.to_lowercase();
        if !matches!(answer.as_str(), "s" | "sim") {
            output::line("Carrinho mantido. Rode `luma checkout` novamente para pagar.");
            return Ok(());
        }
    }

    checkout::confirm_paid(&mut cart, &pending)?;
    output::line(&format!(
        "Pagamento de {} confirmado! Seus ingressos aparecem em `luma tickets`.",
        pending.total
    ));
    Ok(())
}
