//! Catalog product documents.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{CategoryId, CurrencyCode, ProductId};

/// Errors raised when a product violates a catalog invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    /// Title is empty after trimming.
    #[error("product title cannot be empty")]
    MissingTitle,
    /// Base price is negative.
    #[error("price cannot be negative")]
    NegativePrice,
    /// Discount price is negative or not lower than the base price.
    #[error("discount price {discount} must be lower than price {price}")]
    DiscountNotLower {
        /// Offending discount.
        discount: Decimal,
        /// Base price it was compared against.
        price: Decimal,
    },
    /// A size override price is negative.
    #[error("price for size {0} cannot be negative")]
    NegativeSizePrice(String),
    /// A size key is blank.
    #[error("size names cannot be empty")]
    EmptySize,
}

/// A catalog entry.
///
/// `sizes` maps a size name to the quantity available; `size_prices` maps a
/// size name to a price that replaces both `price` and `discount_price` when
/// that size is selected. Both maps are keyed uniquely by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: BTreeMap<String, u32>,
    #[serde(default)]
    pub size_prices: BTreeMap<String, Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Create an available product with no options.
    #[must_use]
    pub fn new(title: impl Into<String>, price: Decimal, currency: CurrencyCode) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            title: title.into(),
            description: String::new(),
            price,
            discount_price: None,
            currency,
            in_stock: true,
            category_id: None,
            thumbnail: None,
            gallery: Vec::new(),
            highlights: Vec::new(),
            colors: Vec::new(),
            sizes: BTreeMap::new(),
            size_prices: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.title.trim().is_empty() {
            return Err(ProductError::MissingTitle);
        }
        if self.price.is_sign_negative() {
            return Err(ProductError::NegativePrice);
        }
        if let Some(discount) = self.discount_price
            && (discount.is_sign_negative() || discount >= self.price)
        {
            return Err(ProductError::DiscountNotLower {
                discount,
                price: self.price,
            });
        }
        if self
            .sizes
            .keys()
            .chain(self.size_prices.keys())
            .any(|size| size.trim().is_empty())
        {
            return Err(ProductError::EmptySize);
        }
        if let Some((size, _)) = self
            .size_prices
            .iter()
            .find(|(_, price)| price.is_sign_negative())
        {
            return Err(ProductError::NegativeSizePrice(size.clone()));
        }
        Ok(())
    }

    /// Whether a colour selection is acceptable for this product.
    ///
    /// Products that list no colours accept no colour selection at all.
    #[must_use]
    pub fn offers_color(&self, color: Option<&str>) -> bool {
        match color {
            None => true,
            Some(color) => self.colors.iter().any(|c| c.eq_ignore_ascii_case(color)),
        }
    }

    /// Whether a size selection is acceptable for this product.
    #[must_use]
    pub fn offers_size(&self, size: Option<&str>) -> bool {
        match size {
            None => true,
            Some(size) => self.sizes.contains_key(size) || self.size_prices.contains_key(size),
        }
    }

    /// Apply a partial update and re-validate.
    ///
    /// The product is left untouched when the patched result is invalid.
    ///
    /// # Errors
    ///
    /// Returns the violated invariant of the patched product.
    pub fn apply_patch(&mut self, patch: &ProductPatch) -> Result<(), ProductError> {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            next.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(discount) = patch.discount_price {
            next.discount_price = discount;
        }
        if let Some(currency) = patch.currency {
            next.currency = currency;
        }
        if let Some(in_stock) = patch.in_stock {
            next.in_stock = in_stock;
        }
        if let Some(category_id) = &patch.category_id {
            next.category_id.clone_from(category_id);
        }
        if let Some(thumbnail) = &patch.thumbnail {
            next.thumbnail.clone_from(thumbnail);
        }
        if let Some(gallery) = &patch.gallery {
            next.gallery.clone_from(gallery);
        }
        if let Some(highlights) = &patch.highlights {
            next.highlights.clone_from(highlights);
        }
        if let Some(colors) = &patch.colors {
            next.colors.clone_from(colors);
        }
        if let Some(sizes) = &patch.sizes {
            next.sizes.clone_from(sizes);
        }
        if let Some(size_prices) = &patch.size_prices {
            next.size_prices.clone_from(size_prices);
        }
        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }
}

/// Partial product update.
///
/// Absent fields are left unchanged. For nullable fields, an explicit `null`
/// clears the value (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<Decimal>>,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail: Option<Option<String>>,
    #[serde(default)]
    pub gallery: Option<Vec<String>>,
    #[serde(default)]
    pub highlights: Option<Vec<String>>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub sizes: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub size_prices: Option<BTreeMap<String, Decimal>>,
}

/// Distinguish an explicit `null` from an absent field.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tee() -> Product {
        Product::new("Tee", Decimal::new(2000, 2), CurrencyCode::USD)
    }

    #[test]
    fn test_new_product_is_valid() {
        assert_eq!(tee().validate(), Ok(()));
    }

    #[test]
    fn test_discount_must_be_lower_than_price() {
        let mut product = tee();
        product.discount_price = Some(Decimal::new(2000, 2));
        assert!(matches!(
            product.validate(),
            Err(ProductError::DiscountNotLower { .. })
        ));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut product = tee();
        product.title = "  ".to_string();
        assert_eq!(product.validate(), Err(ProductError::MissingTitle));
    }

    #[test]
    fn test_patch_applies_and_clears_discount() {
        let mut product = tee();
        product.discount_price = Some(Decimal::new(1500, 2));

        let patch: ProductPatch =
            serde_json::from_str(r#"{"title":"Vintage Tee","discountPrice":null}"#).unwrap();
        product.apply_patch(&patch).unwrap();

        assert_eq!(product.title, "Vintage Tee");
        assert_eq!(product.discount_price, None);
    }

    #[test]
    fn test_absent_patch_field_is_untouched() {
        let mut product = tee();
        product.discount_price = Some(Decimal::new(1500, 2));

        let patch: ProductPatch = serde_json::from_str(r#"{"inStock":false}"#).unwrap();
        product.apply_patch(&patch).unwrap();

        assert!(!product.in_stock);
        assert_eq!(product.discount_price, Some(Decimal::new(1500, 2)));
    }

    #[test]
    fn test_invalid_patch_leaves_product_unchanged() {
        let mut product = tee();
        let patch = ProductPatch {
            price: Some(Decimal::new(-1, 0)),
            ..ProductPatch::default()
        };
        assert_eq!(
            product.apply_patch(&patch),
            Err(ProductError::NegativePrice)
        );
        assert_eq!(product.price, Decimal::new(2000, 2));
    }

    #[test]
    fn test_offers_color_and_size() {
        let mut product = tee();
        assert!(product.offers_color(None));
        assert!(!product.offers_color(Some("red")));

        product.colors = vec!["Red".to_string()];
        product.sizes.insert("M".to_string(), 3);
        assert!(product.offers_color(Some("red")));
        assert!(product.offers_size(Some("M")));
        assert!(!product.offers_size(Some("XL")));
    }
}
