//! Core types for the Luma Events client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod attendee;
pub mod cart;
pub mod catalog;
pub mod datetime;
pub mod email;
pub mod id;
pub mod price;
pub mod qr;
pub mod user;

pub use attendee::{
    Attendee, CheckInStatusFilter, EventDetails, EventStats, Roster, RosterFilter, RosterUpdate,
};
pub use cart::{Cart, CartError, CartItem, CartLineId, CartSnapshot, PLATFORM_FEE_RATE};
pub use catalog::{
    Category, City, Event, EventQuery, EventSort, PriceBounds, State, TicketOption, cities,
    fold_accents,
};
pub use datetime::{format_date, format_date_time};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use qr::{QrPayload, QrPayloadError};
pub use user::{HOSTESS_GROUP, Ticket, UserProfile};
