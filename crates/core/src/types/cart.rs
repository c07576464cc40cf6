//! Shopping cart model.
//!
//! The cart is a plain ordered list of ticket lines. Subtotal, platform fee,
//! and total are always derived from the lines; they are written out when the
//! cart is persisted but never read back, so a stored blob can't smuggle in a
//! total that disagrees with its items.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{EventId, TicketId};

/// Platform surcharge applied to every order (10%).
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Errors raised when building cart lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line must hold at least one ticket.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    /// Ticket prices can't be negative.
    #[error("unit price cannot be negative: {0}")]
    NegativePrice(Decimal),
}

/// Client-generated identifier of a cart line.
///
/// Two add-to-cart calls merge only when they carry the same line ID, so the
/// same ticket added twice with fresh IDs yields two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineId(Uuid);

impl CartLineId {
    /// Generate a fresh random line ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CartLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CartLineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// One ticket line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartLineId,
    pub event_id: EventId,
    pub event_title: String,
    #[serde(default)]
    pub event_thumbnail: Option<String>,
    pub event_date: DateTime<Utc>,
    pub ticket_id: TicketId,
    pub ticket_name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// Price of the whole line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn validate(&self) -> Result<(), CartError> {
        if self.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(CartError::NegativePrice(self.unit_price));
        }
        Ok(())
    }
}

/// The in-progress order on one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartSnapshot", into = "CartSnapshot")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of tickets across all lines.
    #[must_use]
    pub fn ticket_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Platform fee, always `subtotal * PLATFORM_FEE_RATE`.
    #[must_use]
    pub fn platform_fee(&self) -> Decimal {
        self.subtotal() * PLATFORM_FEE_RATE
    }

    /// Amount payable, always `subtotal + platform_fee`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + subtotal * PLATFORM_FEE_RATE
    }

    /// Add a line, or merge its quantity into the line with the same ID.
    ///
    /// No upper bound is enforced; the backend decides availability.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the line has a zero quantity or a negative price.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        item.validate()?;

        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        Ok(())
    }

    /// Remove the line with the given ID. Returns whether a line was removed.
    pub fn remove_item(&mut self, id: CartLineId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id != id);
        self.items.len() != before
    }

    /// Overwrite the quantity of a line.
    ///
    /// Quantities below 1 are ignored rather than treated as removal; use
    /// [`Cart::remove_item`] to drop a line. Returns whether the cart changed.
    pub fn set_quantity(&mut self, id: CartLineId, quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(quantity) else {
            return false;
        };
        if quantity < 1 {
            return false;
        }

        match self.items.iter_mut().find(|line| line.id == id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Empty the cart (after a confirmed payment).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Persisted form of a [`Cart`].
///
/// Totals are included for readers of the stored blob; they are recomputed
/// on save and discarded on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub platform_fee: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.subtotal(),
            platform_fee: cart.platform_fee(),
            total: cart.total(),
            items: cart.items,
        }
    }
}

impl From<CartSnapshot> for Cart {
    fn from(snapshot: CartSnapshot) -> Self {
        // Replayed through `add_item`: repeated line IDs merge, and lines that
        // could never have been added are dropped.
        let mut cart = Self::new();
        for item in snapshot.items {
            let _ = cart.add_item(item);
        }
        cart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(id: CartLineId, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id,
            event_id: EventId::new(1),
            event_title: "Festival de Inverno".to_string(),
            event_thumbnail: None,
            event_date: "2026-07-10T20:00:00Z".parse().unwrap(),
            ticket_id: TicketId::new(3),
            ticket_name: "Pista".to_string(),
            unit_price: d(price),
            quantity,
        }
    }

    #[test]
    fn test_totals_include_platform_fee() {
        let mut cart = Cart::new();
        cart.add_item(line(CartLineId::generate(), "50.00", 2)).unwrap();
        cart.add_item(line(CartLineId::generate(), "25.50", 1)).unwrap();

        assert_eq!(cart.subtotal(), d("125.50"));
        assert_eq!(cart.platform_fee(), d("12.55"));
        assert_eq!(cart.total(), d("138.05"));
        assert_eq!(cart.ticket_count(), 3);
    }

    #[test]
    fn test_same_line_id_merges_quantity() {
        let id = CartLineId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(id, "10", 2)).unwrap();
        cart.add_item(line(id, "10", 3)).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_fresh_line_id_for_same_ticket_creates_new_line() {
        let mut cart = Cart::new();
        cart.add_item(line(CartLineId::generate(), "10", 1)).unwrap();
        cart.add_item(line(CartLineId::generate(), "10", 1)).unwrap();

        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_add_rejects_zero_quantity_and_negative_price() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_item(line(CartLineId::generate(), "10", 0)),
            Err(CartError::InvalidQuantity)
        );
        assert!(matches!(
            cart.add_item(line(CartLineId::generate(), "-1", 1)),
            Err(CartError::NegativePrice(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_below_one_is_ignored() {
        let id = CartLineId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(id, "10", 2)).unwrap();
        let before = cart.clone();

        assert!(!cart.set_quantity(id, 0));
        assert!(!cart.set_quantity(id, -1));
        assert_eq!(cart, before);

        assert!(cart.set_quantity(id, 4));
        assert_eq!(cart.total(), d("44.0"));
    }

    #[test]
    fn test_remove_missing_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(line(CartLineId::generate(), "10", 1)).unwrap();
        assert!(!cart.remove_item(CartLineId::generate()));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut cart = Cart::new();
        cart.add_item(line(CartLineId::generate(), "10", 1)).unwrap();
        cart.clear();
        assert!(cart.items().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_stored_totals_are_ignored_on_load() {
        let id = CartLineId::generate();
        let json = serde_json::json!({
            "items": [{
                "id": id.to_string(),
                "eventId": 1,
                "eventTitle": "Show",
                "eventThumbnail": null,
                "eventDate": "2026-07-10T20:00:00Z",
                "ticketId": 2,
                "ticketName": "VIP",
                "price": "100.00",
                "quantity": 1
            }],
            "total": "9999",
            "platformFee": "0"
        });

        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.total(), d("110.00"));

        let stored = serde_json::to_value(&cart).unwrap();
        assert_eq!(stored["platformFee"], "10.0000");
    }

    #[test]
    fn test_repeated_line_ids_merge_on_load() {
        let id = CartLineId::generate();
        let other = CartLineId::generate();
        let snapshot = CartSnapshot {
            items: vec![
                line(id, "50.00", 1),
                line(other, "25.00", 1),
                line(id, "50.00", 2),
                line(other, "25.00", 0),
            ],
            subtotal: Decimal::ZERO,
            platform_fee: Decimal::ZERO,
            total: Decimal::ZERO,
        };

        let mut cart = Cart::from(snapshot);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].id, id);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.ticket_count(), 4);
        assert_eq!(cart.subtotal(), d("175.00"));

        assert!(cart.remove_item(id));
        assert!(cart.items().iter().all(|item| item.id != id));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { slot: usize, price_cents: u32, quantity: u32 },
        Remove { slot: usize },
        SetQuantity { slot: usize, quantity: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..100_000u32, 1..20u32).prop_map(|(slot, price_cents, quantity)| {
                Op::Add {
                    slot,
                    price_cents,
                    quantity,
                }
            }),
            (0..4usize).prop_map(|slot| Op::Remove { slot }),
            (0..4usize, -3..20i64).prop_map(|(slot, quantity)| Op::SetQuantity { slot, quantity }),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_is_subtotal_plus_ten_percent(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let ids: Vec<CartLineId> = (0..4).map(|_| CartLineId::generate()).collect();
            let mut cart = Cart::new();

            for op in ops {
                match op {
                    Op::Add { slot, price_cents, quantity } => {
                        let mut item = line(ids[slot], "0", quantity);
                        item.unit_price = Decimal::new(i64::from(price_cents), 2);
                        cart.add_item(item).unwrap();
                    }
                    Op::Remove { slot } => {
                        cart.remove_item(ids[slot]);
                    }
                    Op::SetQuantity { slot, quantity } => {
                        cart.set_quantity(ids[slot], quantity);
                    }
                }

                let expected: Decimal = cart
                    .items()
                    .iter()
                    .map(|item| item.unit_price * Decimal::from(item.quantity))
                    .sum::<Decimal>()
                    * Decimal::new(110, 2);
                prop_assert_eq!(cart.total(), expected);
                prop_assert_eq!(cart.platform_fee(), cart.subtotal() * PLATFORM_FEE_RATE);

                let mut seen = std::collections::HashSet::new();
                prop_assert!(cart.items().iter().all(|item| seen.insert(item.id)));
            }
        }
    }
}
