//! Persistent cart store.
//!
//! Wraps the domain [`Cart`] with load/save against a [`KeyValueStore`]. The
//! cart is written back after every mutation, so a crash never loses more
//! than the in-flight change.
//!
//! A stored blob that fails to parse is discarded: the store logs a warning,
//! starts from an empty cart, and overwrites the bad value.

use std::sync::Arc;

use luma_core::{Cart, CartItem, CartLineId};
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "cart";

/// Single source of truth for the in-progress order on this device.
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    cart: Cart,
}

impl CartStore {
    /// Rehydrate the cart from storage.
    ///
    /// A missing key yields an empty cart. A malformed value is replaced by
    /// an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the backend itself fails.
    #[instrument(skip(store))]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let cart = match store.get(CART_KEY)? {
            None => Cart::new(),
            Some(raw) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!(error = %e, "Stored cart is malformed, starting with an empty cart");
                    let empty = Cart::new();
                    save(store.as_ref(), &empty)?;
                    empty
                }
            },
        };

        debug!(lines = cart.items().len(), "Cart loaded");
        Ok(Self { store, cart })
    }

    /// Current cart state.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add a line, merging quantities when the line ID is already present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cart` for an invalid line, or `AppError::Storage`
    /// if the cart cannot be persisted.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), AppError> {
        self.cart.add_item(item)?;
        self.persist()
    }

    /// Remove a line; removing an unknown line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the cart cannot be persisted.
    pub fn remove_item(&mut self, id: CartLineId) -> Result<(), AppError> {
        self.cart.remove_item(id);
        self.persist()
    }

    /// Overwrite a line's quantity; values below 1 are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the cart cannot be persisted.
    pub fn set_quantity(&mut self, id: CartLineId, quantity: i64) -> Result<(), AppError> {
        self.cart.set_quantity(id, quantity);
        self.persist()
    }

    /// Empty the cart, typically after a confirmed payment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), AppError> {
        self.cart.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), AppError> {
        save(self.store.as_ref(), &self.cart)?;
        Ok(())
    }
}

fn save(store: &dyn KeyValueStore, cart: &Cart) -> Result<(), StorageError> {
    let raw = serde_json::to_string(cart).map_err(|source| StorageError::Malformed {
        key: CART_KEY.to_string(),
        source,
    })?;
    store.set(CART_KEY, &raw)
}
