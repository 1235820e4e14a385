//! Session-stored state.
//!
//! The cart lives in the session as the same JSON blob a
//! [`opal_core::cart::MemoryCartStore`] reads and writes.

/// Session keys.
pub mod keys {
    /// Key for the serialized cart entries.
    pub const CART: &str = "cart";
}
