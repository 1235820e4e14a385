//! Opal Core - storefront domain logic.
//!
//! This crate holds everything the Opal binaries share:
//! - `storefront` - Public catalog, cart and checkout API
//! - `admin` - Back-office API for catalog, orders and settings
//! - `cli` - Migrations, backups and catalog imports
//!
//! # Architecture
//!
//! Core is pure domain logic: no HTTP and no SQL. Storage is reached through
//! the async traits in [`store`], implemented on `PostgreSQL` by `opal-store`
//! and in memory by [`store::MemoryStore`].
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices and statuses
//! - [`catalog`] - Products and the category tree
//! - [`settings`] - Store-wide shipping and currency settings
//! - [`cart`] - Cart state over an injected [`cart::CartStore`]
//! - [`pricing`] - Unit price resolution, cart totals and shipping
//! - [`order`] - Order records and order numbers
//! - [`checkout`] - The [`checkout::OrderMaterializer`]
//! - [`lifecycle`] - Status transitions and revenue reporting
//! - [`import`] - JSON/CSV catalog import normalization
//! - [`backup`] - Full export and journaled restore

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backup;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod import;
pub mod lifecycle;
pub mod order;
pub mod pricing;
pub mod settings;
pub mod store;
pub mod types;

pub use types::*;
