//! Request and session models for the storefront API.

pub mod session;

pub use session::keys as session_keys;
