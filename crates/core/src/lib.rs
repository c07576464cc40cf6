//! Luma Core - Shared types library.
//!
//! This crate provides the domain types used across the Luma Events client:
//! - `storefront` - API client, cart store, and hostess check-in logic
//! - `cli` - Command-line front end for customers and hostesses
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage,
//! no HTTP clients. Cart totals and roster reconciliation live here so they
//! can be tested without any backend.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, emails, cart, roster, catalog, and
//!   pt-BR date formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
