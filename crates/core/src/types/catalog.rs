//! Event catalog types and the browse filter.
//!
//! The catalog is small enough that the backend returns it whole; searching,
//! filtering, and sorting all happen client-side over the fetched list.

use core::str::FromStr;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::id::{CategoryId, CityId, EventId, StateId, TicketId};

/// A purchasable ticket type of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOption {
    pub id: TicketId,
    pub name: String,
    pub price: Decimal,
}

/// An event as listed by `/events/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub tickets: Vec<TicketOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A Brazilian state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub name: String,
    /// Two-letter code (e.g. `RO`).
    #[serde(default)]
    pub uf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventSort {
    /// Server order.
    #[default]
    Relevance,
    /// Latest date first.
    Recent,
    LowestPrice,
    HighestPrice,
}

impl FromStr for EventSort {
    type Err = String;

    /// Accepts the storefront's query values (`relevancia`, `recentes`,
    /// `menor-preco`, `maior-preco`) and their English names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevancia" | "relevance" => Ok(Self::Relevance),
            "recentes" | "recent" => Ok(Self::Recent),
            "menor-preco" | "lowest-price" => Ok(Self::LowestPrice),
            "maior-preco" | "highest-price" => Ok(Self::HighestPrice),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Browse filter over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Accent- and case-insensitive match on title, description, category, or city.
    pub search: Option<String>,
    /// Exact city name.
    pub city: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Selected categories; an event must belong to one of them.
    pub categories: Vec<CategoryId>,
    pub sort: EventSort,
}

impl EventQuery {
    /// Filter and sort `events`.
    ///
    /// Category IDs are resolved to names through `categories`, since events
    /// carry their category by name. IDs that don't resolve select nothing.
    #[must_use]
    pub fn apply<'a>(&self, events: &'a [Event], categories: &[Category]) -> Vec<&'a Event> {
        let selected_categories: Vec<&str> = self
            .categories
            .iter()
            .filter_map(|id| categories.iter().find(|c| c.id == *id))
            .map(|c| c.name.as_str())
            .collect();
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(fold_accents);

        let mut matched: Vec<&Event> = events
            .iter()
            .filter(|event| {
                if let Some(term) = &search {
                    let hit = [&event.title, &event.description, &event.category, &event.city]
                        .iter()
                        .any(|field| fold_accents(field).contains(term.as_str()));
                    if !hit {
                        return false;
                    }
                }
                if self.city.as_ref().is_some_and(|city| &event.city != city) {
                    return false;
                }
                if self.min_price.is_some_and(|min| event.price < min) {
                    return false;
                }
                if self.max_price.is_some_and(|max| event.price > max) {
                    return false;
                }
                self.categories.is_empty() || selected_categories.contains(&event.category.as_str())
            })
            .collect();

        match self.sort {
            EventSort::Relevance => {}
            EventSort::Recent => matched.sort_by(|a, b| b.date.cmp(&a.date)),
            EventSort::LowestPrice => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            EventSort::HighestPrice => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        matched
    }
}

/// Cheapest and most expensive listed price, for the price slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    /// Bounds over all events, or `0..1000` for an empty catalog.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let min = events.iter().map(|e| e.price).min();
        let max = events.iter().map(|e| e.price).max();
        match (min, max) {
            (Some(min), Some(max)) => Self { min, max },
            _ => Self {
                min: Decimal::ZERO,
                max: Decimal::ONE_THOUSAND,
            },
        }
    }
}

/// Distinct city names across the catalog, sorted.
#[must_use]
pub fn cities(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .map(|e| e.city.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lowercase and strip diacritics, for accent-insensitive search.
///
/// Text is decomposed (NFD) first, so precomposed and combining-mark
/// spellings of the same word fold alike.
#[must_use]
pub fn fold_accents(text: &str) -> String {
    text.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}
