//! Source-key to product-field mapping.
//!
//! Keys are normalized before lookup: camelCase is split, `_`, `-` and `.`
//! become spaces, and case is ignored. Supporting a new synonym means adding a
//! row to [`FIELD_SYNONYMS`].

/// Canonical product fields an import can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Title,
    Description,
    Price,
    DiscountPrice,
    Currency,
    InStock,
    Category,
    Thumbnail,
    Gallery,
    Highlights,
    Colors,
    Sizes,
    SizePrices,
}

impl Field {
    /// Fields whose value may legitimately be a JSON object.
    #[must_use]
    pub const fn accepts_map(self) -> bool {
        matches!(self, Self::Sizes | Self::SizePrices)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Price => "price",
            Self::DiscountPrice => "discount price",
            Self::Currency => "currency",
            Self::InStock => "in stock",
            Self::Category => "category",
            Self::Thumbnail => "thumbnail",
            Self::Gallery => "gallery",
            Self::Highlights => "highlights",
            Self::Colors => "colors",
            Self::Sizes => "sizes",
            Self::SizePrices => "size prices",
        }
    }
}

/// Normalized source key → canonical field.
pub const FIELD_SYNONYMS: &[(&str, Field)] = &[
    ("id", Field::Id),
    ("product id", Field::Id),
    ("title", Field::Title),
    ("name", Field::Title),
    ("product name", Field::Title),
    ("product title", Field::Title),
    ("description", Field::Description),
    ("desc", Field::Description),
    ("product description", Field::Description),
    ("price", Field::Price),
    ("base price", Field::Price),
    ("regular price", Field::Price),
    ("mrp", Field::Price),
    ("discount price", Field::DiscountPrice),
    ("discounted price", Field::DiscountPrice),
    ("discount", Field::DiscountPrice),
    ("sale price", Field::DiscountPrice),
    ("offer price", Field::DiscountPrice),
    ("currency", Field::Currency),
    ("currency code", Field::Currency),
    ("in stock", Field::InStock),
    ("instock", Field::InStock),
    ("stock", Field::InStock),
    ("stock status", Field::InStock),
    ("availability", Field::InStock),
    ("available", Field::InStock),
    ("category", Field::Category),
    ("category id", Field::Category),
    ("thumbnail", Field::Thumbnail),
    ("image", Field::Thumbnail),
    ("image url", Field::Thumbnail),
    ("main image", Field::Thumbnail),
    ("gallery", Field::Gallery),
    ("images", Field::Gallery),
    ("gallery images", Field::Gallery),
    ("image urls", Field::Gallery),
    ("highlights", Field::Highlights),
    ("features", Field::Highlights),
    ("key features", Field::Highlights),
    ("colors", Field::Colors),
    ("colours", Field::Colors),
    ("color", Field::Colors),
    ("colour", Field::Colors),
    ("sizes", Field::Sizes),
    ("size", Field::Sizes),
    ("size quantities", Field::Sizes),
    ("size stock", Field::Sizes),
    ("size prices", Field::SizePrices),
    ("size pricing", Field::SizePrices),
    ("price by size", Field::SizePrices),
    ("prices by size", Field::SizePrices),
];

/// Normalize a header or JSON key for lookup.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.trim().chars() {
        if matches!(c, '_' | '-' | '.') || c.is_whitespace() {
            out.push(' ');
        } else {
            if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push(' ');
            }
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look up the canonical field for a raw key.
#[must_use]
pub fn resolve_field(key: &str) -> Option<Field> {
    let normalized = normalize_key(key);
    FIELD_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == normalized)
        .map(|&(_, field)| field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Product Name"), "product name");
        assert_eq!(normalize_key("product_name"), "product name");
        assert_eq!(normalize_key("productName"), "product name");
        assert_eq!(normalize_key("  DISCOUNT-PRICE "), "discount price");
        assert_eq!(normalize_key("inStock"), "in stock");
    }

    #[test]
    fn test_title_synonyms() {
        for key in ["title", "Name", "PRODUCT NAME", "productTitle", "product_name"] {
            assert_eq!(resolve_field(key), Some(Field::Title), "{key}");
        }
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(resolve_field("warehouse"), None);
    }

    #[test]
    fn test_synonyms_are_normalized_and_unique() {
        for (i, (synonym, _)) in FIELD_SYNONYMS.iter().enumerate() {
            assert_eq!(normalize_key(synonym), *synonym);
            assert!(
                FIELD_SYNONYMS
                    .iter()
                    .skip(i + 1)
                    .all(|(other, _)| other != synonym),
                "duplicate synonym {synonym}"
            );
        }
    }
}
