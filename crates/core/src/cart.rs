//! Client-scoped cart state.
//!
//! A [`Cart`] holds the buyer's selections and writes the full entry list
//! through its [`CartStore`] after every mutation. Storage is injected so the
//! storefront can back a cart with the session while tests and the CLI use
//! memory or a JSON file.
//!
//! Reading never fails: a missing or corrupted blob yields an empty cart.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Largest quantity a single priced line will carry.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Optional colour and size chosen for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl Selection {
    #[must_use]
    pub const fn new(color: Option<String>, size: Option<String>) -> Self {
        Self { color, size }
    }

    #[must_use]
    pub fn sized(size: impl Into<String>) -> Self {
        Self {
            color: None,
            size: Some(size.into()),
        }
    }
}

/// One line in the cart. Keyed by product, colour and size together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

impl CartEntry {
    fn matches(&self, product_id: &ProductId, selection: &Selection) -> bool {
        &self.product_id == product_id
            && self.color == selection.color
            && self.size == selection.size
    }
}

/// Persistence for a single client's cart entries.
pub trait CartStore {
    /// Load the persisted entries, or an empty list if nothing usable exists.
    fn load(&self) -> Vec<CartEntry>;

    /// Replace the persisted entries.
    fn save(&mut self, entries: &[CartEntry]);
}

/// Decode a persisted cart blob, degrading to empty on any error.
#[must_use]
pub fn decode_entries(blob: &str) -> Vec<CartEntry> {
    if blob.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<CartEntry>>(blob) {
        Ok(entries) => entries.into_iter().filter(|e| e.quantity > 0).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart blob");
            Vec::new()
        }
    }
}

/// Encode entries into the persisted blob form.
#[must_use]
pub fn encode_entries(entries: &[CartEntry]) -> String {
    // Vec<CartEntry> has only string and integer fields; this cannot fail.
    serde_json::to_string(entries).unwrap_or_else(|_| String::from("[]"))
}

/// Cart store held entirely in memory.
///
/// The storefront seeds one from the session blob per request and writes
/// [`MemoryCartStore::to_blob`] back afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    entries: Vec<CartEntry>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_blob(blob: &str) -> Self {
        Self {
            entries: decode_entries(blob),
        }
    }

    #[must_use]
    pub fn to_blob(&self) -> String {
        encode_entries(&self.entries)
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Vec<CartEntry> {
        self.entries.clone()
    }

    fn save(&mut self, entries: &[CartEntry]) {
        self.entries = entries.to_vec();
    }
}

/// Cart store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    path: PathBuf,
}

impl JsonFileCartStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self) -> Vec<CartEntry> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => decode_entries(&blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read cart file");
                Vec::new()
            }
        }
    }

    fn save(&mut self, entries: &[CartEntry]) {
        let tmp = self.path.with_extension("tmp");
        let result = std::fs::write(&tmp, encode_entries(entries))
            .and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist cart file");
        }
    }
}

/// A buyer's cart over an injected store.
#[derive(Debug)]
pub struct Cart<S: CartStore> {
    store: S,
    entries: Vec<CartEntry>,
}

impl<S: CartStore> Cart<S> {
    /// Open the cart, loading whatever the store holds.
    pub fn open(store: S) -> Self {
        let entries = store.load();
        Self { store, entries }
    }

    /// Add `quantity` of a selection, merging with an identical line.
    ///
    /// A zero quantity is treated as one.
    pub fn add(&mut self, product_id: &ProductId, quantity: u32, selection: &Selection) {
        let quantity = quantity.max(1);
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.matches(product_id, selection))
        {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            self.entries.push(CartEntry {
                product_id: product_id.clone(),
                color: selection.color.clone(),
                size: selection.size.clone(),
                quantity,
            });
        }
        self.persist();
    }

    /// Remove the line for exactly this selection.
    pub fn remove(&mut self, product_id: &ProductId, selection: &Selection) {
        self.entries.retain(|e| !e.matches(product_id, selection));
        self.persist();
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32, selection: &Selection) {
        if quantity == 0 {
            self.remove(product_id, selection);
            return;
        }
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.matches(product_id, selection))
        {
            entry.quantity = quantity;
        } else {
            self.entries.push(CartEntry {
                product_id: product_id.clone(),
                color: selection.color.clone(),
                size: selection.size.clone(),
                quantity,
            });
        }
        self.persist();
    }

    #[must_use]
    pub fn list(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Total units across all lines, for the cart badge.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the cart. Call only after an order write has been confirmed.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        self.store.save(&self.entries);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_merges_identical_selection() {
        let mut cart = Cart::open(MemoryCartStore::new());
        let tee = product("tee");
        cart.add(&tee, 1, &Selection::sized("M"));
        cart.add(&tee, 2, &Selection::sized("M"));

        assert_eq!(cart.list().len(), 1);
        assert_eq!(cart.list()[0].quantity, 3);
    }

    #[test]
    fn test_different_sizes_are_distinct_lines() {
        let mut cart = Cart::open(MemoryCartStore::new());
        let tee = product("tee");
        cart.add(&tee, 1, &Selection::sized("S"));
        cart.add(&tee, 1, &Selection::sized("M"));
        assert_eq!(cart.list().len(), 2);

        cart.set_quantity(&tee, 5, &Selection::sized("S"));
        cart.remove(&tee, &Selection::sized("M"));

        assert_eq!(cart.list().len(), 1);
        assert_eq!(cart.list()[0].size.as_deref(), Some("S"));
        assert_eq!(cart.list()[0].quantity, 5);
    }

    #[test]
    fn test_set_quantity_roundtrip_and_zero_removes() {
        let mut cart = Cart::open(MemoryCartStore::new());
        let tee = product("tee");

        cart.set_quantity(&tee, 3, &Selection::default());
        let lines: Vec<_> = cart.list().iter().filter(|e| e.product_id == tee).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);

        cart.set_quantity(&tee, 0, &Selection::default());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_count_sums_quantities() {
        let mut cart = Cart::open(MemoryCartStore::new());
        cart.add(&product("a"), 2, &Selection::default());
        cart.add(&product("b"), 3, &Selection::default());
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut cart = Cart::open(MemoryCartStore::new());
        cart.add(&product("a"), 2, &Selection::default());

        let reopened = Cart::open(MemoryCartStore::from_blob(&cart.store().to_blob()));
        assert_eq!(reopened.list(), cart.list());

        cart.clear();
        assert_eq!(cart.store().to_blob(), "[]");
    }

    #[test]
    fn test_corrupted_blob_degrades_to_empty() {
        let cart = Cart::open(MemoryCartStore::from_blob("{not json"));
        assert!(cart.is_empty());

        let cart = Cart::open(MemoryCartStore::from_blob(r#"[{"product_id":1}]"#));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_file_store_persists_and_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");

        let mut cart = Cart::open(JsonFileCartStore::new(&path));
        assert!(cart.is_empty());
        cart.add(&product("a"), 1, &Selection::new(Some("red".into()), None));

        let reopened = Cart::open(JsonFileCartStore::new(&path));
        assert_eq!(reopened.list(), cart.list());

        std::fs::write(&path, "garbage").unwrap();
        let reopened = Cart::open(JsonFileCartStore::new(&path));
        assert!(reopened.is_empty());
    }
}
