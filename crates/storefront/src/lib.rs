//! Opal Storefront library.
//!
//! The public JSON API: catalog browsing, a session-backed cart, checkout and
//! order tracking. Exposed as a library so handlers and middleware can be
//! tested without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
