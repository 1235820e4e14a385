//! Typed coercions from loosely-typed import values.
//!
//! Tabular cells arrive as JSON strings, so every function here accepts a
//! [`serde_json::Value`] and copes with both native JSON types and text.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Availability strings that mean "in stock". Compared case-insensitively.
pub const AVAILABLE_VOCABULARY: &[&str] = &["true", "yes", "1", "in stock", "available"];

/// Whether a value carries no data (null or blank text).
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Plain text of a scalar value.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a money amount.
///
/// Text may carry a currency symbol, code or thousands separators
/// (`"$1,299.00"`, `"1299 INR"`). Blank values yield `Ok(None)`.
///
/// # Errors
///
/// Returns a message when the value is present but not a number, or uses a
/// comma as the decimal separator.
pub fn decimal(value: &Value) -> Result<Option<Decimal>, String> {
    if is_blank(value) {
        return Ok(None);
    }
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        other => return Err(format!("expected a number, got {other}")),
    };
    // Skip any prefix like "Rs." so its dot is not read as a decimal point.
    let start = raw
        .char_indices()
        .find(|&(i, c)| {
            c.is_ascii_digit()
                || (matches!(c, '.' | '-')
                    && raw
                        .get(i + 1..)
                        .is_some_and(|rest| rest.starts_with(|n: char| n.is_ascii_digit())))
        })
        .map_or(raw.len(), |(i, _)| i);
    let amount = raw.get(start..).unwrap_or_default();
    // "1.299,50": a comma after the last dot is a decimal comma, not grouping.
    if let (Some(dot), Some(comma)) = (amount.rfind('.'), amount.rfind(','))
        && comma > dot
    {
        return Err(format!(
            "\"{raw}\" uses a decimal comma; write amounts as 1299.50"
        ));
    }
    let cleaned: String = amount
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map(Some)
        .map_err(|_| format!("\"{raw}\" is not a valid amount"))
}

/// Normalize an availability value. Absent or blank means available.
#[must_use]
pub fn availability(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) if is_blank(v) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| (f - 1.0).abs() < f64::EPSILON),
        Some(Value::String(s)) => {
            let s = s.trim();
            AVAILABLE_VOCABULARY
                .iter()
                .any(|word| word.eq_ignore_ascii_case(s))
        }
        Some(_) => false,
    }
}

/// Split a list field.
///
/// A JSON array (native or as text) is taken element by element; other text
/// is split on commas and newlines. Items are trimmed and blanks dropped.
#[must_use]
pub fn list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[')
                && let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed)
            {
                return items.iter().filter_map(text).collect();
            }
            trimmed
                .split([',', '\n'])
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect()
        }
        other => text(other).into_iter().collect(),
    }
}

/// Entries of a `"S:10, M:20"` style value as `(size, raw value)` pairs.
///
/// JSON objects and arrays (native or as text) are accepted too.
fn size_entries(value: &Value) -> Vec<(String, Option<Value>)> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(size, v)| (size.trim().to_owned(), Some(v.clone())))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(text)
            .flat_map(|token| split_size_tokens(&token))
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if (trimmed.starts_with('{') || trimmed.starts_with('['))
                && let Ok(parsed) = serde_json::from_str::<Value>(trimmed)
            {
                return size_entries(&parsed);
            }
            split_size_tokens(trimmed)
        }
        _ => Vec::new(),
    }
}

fn split_size_tokens(raw: &str) -> Vec<(String, Option<Value>)> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once(':') {
            Some((size, amount)) => (
                size.trim().to_owned(),
                Some(Value::String(amount.trim().to_owned())),
            ),
            None => (token.to_owned(), None),
        })
        .filter(|(size, _)| !size.is_empty())
        .collect()
}

/// Parse a size → quantity mapping. A bare size means quantity zero.
///
/// Returns the mapping plus warnings for quantities that could not be read.
#[must_use]
pub fn size_quantities(value: &Value) -> (BTreeMap<String, u32>, Vec<String>) {
    let mut sizes = BTreeMap::new();
    let mut warnings = Vec::new();
    for (size, raw) in size_entries(value) {
        let quantity = match raw.as_ref().and_then(text) {
            None => 0,
            Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
                warnings.push(format!(
                    "quantity \"{raw}\" for size {size} is not a whole number, using 0"
                ));
                0
            }),
        };
        sizes.entry(size).or_insert(quantity);
    }
    (sizes, warnings)
}

/// Parse a size → price mapping. Entries without a usable price are skipped
/// with a warning.
#[must_use]
pub fn size_prices(value: &Value) -> (BTreeMap<String, Decimal>, Vec<String>) {
    let mut prices = BTreeMap::new();
    let mut warnings = Vec::new();
    for (size, raw) in size_entries(value) {
        let Some(raw) = raw else {
            warnings.push(format!("size {size} has no price, skipped"));
            continue;
        };
        match decimal(&raw) {
            Ok(Some(price)) if !price.is_sign_negative() => {
                prices.entry(size).or_insert(price);
            }
            Ok(Some(price)) => warnings.push(format!("negative price {price} for size {size} skipped")),
            Ok(None) => warnings.push(format!("size {size} has no price, skipped")),
            Err(e) => warnings.push(format!("price for size {size} skipped: {e}")),
        }
    }
    (prices, warnings)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decimal_strips_symbols() {
        assert_eq!(decimal(&json!("$1,299.50")), Ok(Some(Decimal::new(129_950, 2))));
        assert_eq!(decimal(&json!("499 INR")), Ok(Some(Decimal::from(499))));
        assert_eq!(decimal(&json!("Rs. 499")), Ok(Some(Decimal::from(499))));
        assert_eq!(decimal(&json!(19.99)), Ok(Some(Decimal::new(1999, 2))));
        assert_eq!(decimal(&json!("")), Ok(None));
        assert!(decimal(&json!("free")).is_err());
        assert!(decimal(&json!(true)).is_err());
    }

    #[test]
    fn test_decimal_comma_is_rejected() {
        assert!(decimal(&json!("1.299,50")).is_err());
        assert!(decimal(&json!("€ 12.000,00")).is_err());
        assert_eq!(decimal(&json!("1,299")), Ok(Some(Decimal::from(1299))));
    }

    #[test]
    fn test_availability_vocabulary() {
        for yes in ["true", "YES", "1", "In Stock", " available "] {
            assert!(availability(Some(&json!(yes))), "{yes}");
        }
        for no in ["false", "no", "0", "sold out", "maybe"] {
            assert!(!availability(Some(&json!(no))), "{no}");
        }
        assert!(availability(None));
        assert!(availability(Some(&json!(""))));
        assert!(availability(Some(&json!(true))));
        assert!(!availability(Some(&json!(0))));
    }

    #[test]
    fn test_list_split_and_json_precedence() {
        assert_eq!(list(&json!("red, blue\ngreen,")), ["red", "blue", "green"]);
        assert_eq!(list(&json!(r#"["a, b", "c"]"#)), ["a, b", "c"]);
        assert_eq!(list(&json!(["x", " y "])), ["x", "y"]);
        assert!(list(&json!(null)).is_empty());
    }

    #[test]
    fn test_size_quantities() {
        let (sizes, warnings) = size_quantities(&json!("S:10, M:20, L"));
        assert_eq!(sizes.get("S"), Some(&10));
        assert_eq!(sizes.get("M"), Some(&20));
        assert_eq!(sizes.get("L"), Some(&0));
        assert!(warnings.is_empty());

        let (sizes, warnings) = size_quantities(&json!({"XL": 3, "XXL": "lots"}));
        assert_eq!(sizes.get("XL"), Some(&3));
        assert_eq!(sizes.get("XXL"), Some(&0));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_size_prices_skip_bare_tokens() {
        let (prices, warnings) = size_prices(&json!("S:10.50, M, L:$12"));
        assert_eq!(prices.get("S"), Some(&Decimal::new(1050, 2)));
        assert_eq!(prices.get("L"), Some(&Decimal::from(12)));
        assert!(!prices.contains_key("M"));
        assert_eq!(warnings.len(), 1);
    }
}
