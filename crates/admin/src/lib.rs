//! Opal Admin library.
//!
//! The back-office JSON API: catalog and category management, catalog
//! import, order status and deletion, store settings, backups and the
//! dashboard. Exposed as a library so the CLI can reuse password hashing.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
