//! Cache types for catalog responses.

use luma_core::{Category, Event, State};

/// Cache key for catalog listings.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Events,
    Categories,
    States,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Events(Vec<Event>),
    Categories(Vec<Category>),
    States(Vec<State>),
}
