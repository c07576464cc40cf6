//! Luma Events storefront and hostess client library.
//!
//! Everything a front end needs to sell tickets and run event-day check-in,
//! behind three narrow seams: a [`storage::KeyValueStore`] for the cart and
//! credentials, the REST backend reached through [`api::ApiClient`], and a
//! [`checkin::Scanner`] for the QR scanning surface.
//!
//! # Modules
//!
//! - [`cart`] - Persistent cart store with derived totals
//! - [`catalog`] - Event browsing and filtering
//! - [`checkout`] - Payment intent creation and cart clearing
//! - [`checkin`] - Hostess check-in reconciler
//! - [`admin`] - State-dependent city selector of the admin event form
//! - [`api`] - REST client with bearer-token refresh
//! - [`storage`] - Key-value persistence backends
//! - [`config`] - Environment configuration
//! - [`error`] - Unified error type with localized messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkin;
pub mod checkout;
pub mod config;
pub mod error;
pub mod storage;
