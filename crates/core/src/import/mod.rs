//! Catalog import normalization.
//!
//! Turns JSON documents or CSV exports into [`Product`]s. Keys and headers go
//! through the declarative [`mapping`] table and values through the typed
//! [`coerce`] functions.
//!
//! A bad row never aborts the batch: it is reported in
//! [`ImportReport::errors`] with its row number and skipped. Only a document
//! that cannot be read at all (malformed JSON, no CSV header) is an
//! [`ImportError`].
//!
//! ```
//! use opal_core::import::{ImportFormat, parse};
//!
//! let csv = "Product Name,Price,In Stock\nTee,20,yes\nMug,,yes\n";
//! let report = parse(csv, ImportFormat::Csv).unwrap();
//!
//! assert_eq!(report.products.len(), 1);
//! assert_eq!(report.errors[0].to_string(), "Row 3: missing required field: price");
//! ```

pub mod coerce;
mod json;
pub mod mapping;
mod tabular;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Product;
use crate::store::CatalogStore;
use crate::types::{CategoryId, CurrencyCode, ProductId};
use mapping::Field;

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// Guess the format from the first non-whitespace character.
    #[must_use]
    pub fn detect(input: &str) -> Self {
        match input.trim_start().chars().next() {
            Some('{' | '[') => Self::Json,
            _ => Self::Csv,
        }
    }
}

impl FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported import format: {other}")),
        }
    }
}

/// The whole document could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid CSV: {0}")]
    Csv(#[source] csv::Error),

    #[error("import file is empty")]
    Empty,
}

/// An error or warning, optionally tied to a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportIssue {
    pub row: Option<usize>,
    pub message: String,
}

impl ImportIssue {
    pub(crate) fn at(row: usize, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            message: message.into(),
        }
    }

    pub(crate) fn document(message: impl Into<String>) -> Self {
        Self {
            row: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {row}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of parsing an import document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Parsed products, in input order.
    pub products: Vec<Product>,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

/// Options for [`parse_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Currency for rows that do not name one.
    pub default_currency: CurrencyCode,
}

/// Field values gathered for one row. The first value for a field wins.
#[derive(Debug, Default)]
pub(crate) struct RawRecord {
    pub(crate) row: usize,
    values: Vec<(Field, Value)>,
}

impl RawRecord {
    pub(crate) const fn new(row: usize) -> Self {
        Self {
            row,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, field: Field, value: Value) {
        if self.get(field).is_none() {
            self.values.push((field, value));
        }
    }

    pub(crate) fn get(&self, field: Field) -> Option<&Value> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value)
    }
}

/// Records read from a document before conversion to products.
#[derive(Debug, Default)]
pub(crate) struct RawDocument {
    pub(crate) records: Vec<Result<RawRecord, ImportIssue>>,
    /// Source keys that matched no field, each listed once.
    pub(crate) unrecognized: Vec<String>,
}

/// Parse with default options.
///
/// # Errors
///
/// Returns [`ImportError`] only when the document as a whole is unreadable.
pub fn parse(input: &str, format: ImportFormat) -> Result<ImportReport, ImportError> {
    parse_with(input, format, ImportOptions::default())
}

/// Parse an import document into products plus per-row issues.
///
/// # Errors
///
/// Returns [`ImportError`] only when the document as a whole is unreadable.
#[tracing::instrument(skip(input), fields(bytes = input.len()))]
pub fn parse_with(
    input: &str,
    format: ImportFormat,
    options: ImportOptions,
) -> Result<ImportReport, ImportError> {
    if input.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let document = match format {
        ImportFormat::Json => json::read(input)?,
        ImportFormat::Csv => tabular::read(input)?,
    };

    let now = Utc::now();
    let mut report = ImportReport::default();
    for name in &document.unrecognized {
        report
            .warnings
            .push(ImportIssue::document(format!("Unrecognized field \"{name}\" ignored")));
    }

    for record in document.records {
        let record = match record {
            Ok(record) => record,
            Err(issue) => {
                report.errors.push(issue);
                continue;
            }
        };
        let row = record.row;
        match build_product(&record, options, now) {
            Ok((product, warnings)) => {
                report
                    .warnings
                    .extend(warnings.into_iter().map(|w| ImportIssue::at(row, w)));
                report.products.push(product);
            }
            Err(message) => report.errors.push(ImportIssue::at(row, message)),
        }
    }

    tracing::info!(
        products = report.products.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Import parsed"
    );
    Ok(report)
}

fn build_product(
    record: &RawRecord,
    options: ImportOptions,
    now: DateTime<Utc>,
) -> Result<(Product, Vec<String>), String> {
    let title = record.get(Field::Title).and_then(coerce::text);
    let price = record
        .get(Field::Price)
        .map(coerce::decimal)
        .transpose()
        .map_err(|e| format!("invalid price: {e}"))?
        .flatten();

    let (title, price) = match (title, price) {
        (Some(title), Some(price)) => (title, price),
        (None, Some(_)) => return Err("missing required field: title".to_owned()),
        (Some(_), None) => return Err("missing required field: price".to_owned()),
        (None, None) => return Err("missing required fields: title, price".to_owned()),
    };
    if price.is_sign_negative() {
        return Err(format!("invalid price: {price} is negative"));
    }

    let mut warnings = Vec::new();

    let discount_price = match record.get(Field::DiscountPrice).map(coerce::decimal) {
        None | Some(Ok(None)) => None,
        Some(Ok(Some(discount))) if !discount.is_sign_negative() && discount < price => {
            Some(discount)
        }
        Some(Ok(Some(discount))) => {
            warnings.push(format!(
                "discount price {discount} ignored: must be lower than price {price}"
            ));
            None
        }
        Some(Err(e)) => {
            warnings.push(format!("discount price ignored: {e}"));
            None
        }
    };

    let currency = match record.get(Field::Currency).and_then(coerce::text) {
        None => options.default_currency,
        Some(code) => code.parse().unwrap_or_else(|e| {
            warnings.push(format!("{e}, using {}", options.default_currency));
            options.default_currency
        }),
    };

    let (sizes, size_warnings) = record
        .get(Field::Sizes)
        .map(coerce::size_quantities)
        .unwrap_or_default();
    warnings.extend(size_warnings);

    let (size_prices, price_warnings) = record
        .get(Field::SizePrices)
        .map(coerce::size_prices)
        .unwrap_or_default();
    warnings.extend(price_warnings);

    let list = |field| record.get(field).map(coerce::list).unwrap_or_default();
    let mut gallery = list(Field::Gallery);
    let thumbnail = record
        .get(Field::Thumbnail)
        .and_then(coerce::text)
        .or_else(|| gallery.first().cloned());
    gallery.retain(|url| Some(url) != thumbnail.as_ref());

    let product = Product {
        id: record
            .get(Field::Id)
            .and_then(coerce::text)
            .map_or_else(ProductId::generate, ProductId::new),
        title,
        description: record
            .get(Field::Description)
            .and_then(coerce::text)
            .unwrap_or_default(),
        price,
        discount_price,
        currency,
        in_stock: coerce::availability(record.get(Field::InStock)),
        category_id: record
            .get(Field::Category)
            .and_then(coerce::text)
            .map(CategoryId::new),
        thumbnail,
        gallery,
        highlights: list(Field::Highlights),
        colors: list(Field::Colors),
        sizes,
        size_prices,
        created_at: now,
        updated_at: now,
    };

    product.validate().map_err(|e| e.to_string())?;
    Ok((product, warnings))
}

/// Write parsed products to the catalog.
///
/// Each failed write is appended to `report.errors` and the rest continue.
/// Returns how many products were written.
#[tracing::instrument(skip(store, report), fields(products = report.products.len()))]
pub async fn commit<S: CatalogStore + ?Sized>(store: &S, report: &mut ImportReport) -> usize {
    let mut written = 0;
    for product in &report.products {
        match store.create_product(product).await {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(product_id = %product.id, error = %e, "Imported product not saved");
                report.errors.push(ImportIssue::document(format!(
                    "{} ({}): {e}",
                    product.title, product.id
                )));
            }
        }
    }
    tracing::info!(written, "Import committed");
    written
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_missing_price_reports_row_with_header_offset() {
        let csv = "title,price\nA,1\nB,2\nC,\nD,4\nE,5\n";
        let report = parse(csv, ImportFormat::Csv).unwrap();

        assert_eq!(report.products.len(), 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, Some(4));
        assert!(report.errors[0].message.contains("price"));
    }

    #[test]
    fn test_json_row_numbers_are_one_based() {
        let json = r#"[{"title":"A","price":1},{"title":"B","price":2},{"title":"C"},{"title":"D","price":4},{"title":"E","price":5}]"#;
        let report = parse(json, ImportFormat::Json).unwrap();

        assert_eq!(report.products.len(), 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].to_string(), "Row 3: missing required field: price");
    }

    #[test]
    fn test_blank_line_keeps_error_on_its_source_line() {
        let report = parse("title,price\nA,1\n\nC,\n", ImportFormat::Csv).unwrap();
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.errors[0].to_string(), "Row 4: missing required field: price");
    }

    #[test]
    fn test_nested_keys_do_not_override_top_level_fields() {
        let json = r#"[{"id":"p1","title":"Linen Tee","price":20,"seo":{"title":"Buy cheap tees"},"category":{"id":"c-shirts","name":"Shirts"}}]"#;
        let report = parse(json, ImportFormat::Json).unwrap();
        let tee = &report.products[0];

        assert_eq!(tee.id.as_str(), "p1");
        assert_eq!(tee.title, "Linen Tee");
        assert_eq!(tee.category_id.as_ref().map(CategoryId::as_str), Some("c-shirts"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("seo.title"));
    }

    #[test]
    fn test_products_preserve_input_order() {
        let report = parse("name,price\nZ,1\nA,2\nM,3\n", ImportFormat::Csv).unwrap();
        let titles: Vec<_> = report.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Z", "A", "M"]);
    }

    #[test]
    fn test_flat_and_nested_json_agree() {
        let flat = r#"[{"id":"p1","title":"Tee","price":"20","discountPrice":"15","colors":"red, blue","sizes":"S:1, M:2","inStock":"yes"}]"#;
        let nested = r#"{"products":[{"id":"p1","details":{"title":"Tee"},"pricing":{"price":20,"discountPrice":15},"attributes":{"colors":["red","blue"]},"inventory":{"sizes":{"S":1,"M":2},"inStock":true}}]}"#;

        let a = parse(flat, ImportFormat::Json).unwrap().products;
        let b = parse(nested, ImportFormat::Json).unwrap().products;

        let strip = |mut p: Product| {
            p.created_at = DateTime::<Utc>::MIN_UTC;
            p.updated_at = DateTime::<Utc>::MIN_UTC;
            p
        };
        assert_eq!(a.len(), 1);
        assert_eq!(
            a.into_iter().map(strip).collect::<Vec<_>>(),
            b.into_iter().map(strip).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_invalid_discount_dropped_with_warning() {
        let report = parse("title,price,sale price\nTee,10,12\n", ImportFormat::Csv).unwrap();
        assert_eq!(report.products[0].discount_price, None);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].row, Some(2));
    }

    #[test]
    fn test_unrecognized_columns_warned_once() {
        let report = parse("title,price,warehouse\nA,1,x\nB,2,y\n", ImportFormat::Csv).unwrap();
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].row, None);
    }

    #[test]
    fn test_coercions_applied() {
        let csv = "title,price,availability,colours,size,size prices,images\n\
                   Tee,$20.00,sold out,\"red,blue\",\"S:3,M\",\"XL:25\",\"a.jpg\nb.jpg\"\n";
        let report = parse(csv, ImportFormat::Csv).unwrap();
        let tee = &report.products[0];

        assert_eq!(tee.price, Decimal::from(20));
        assert!(!tee.in_stock);
        assert_eq!(tee.colors, ["red", "blue"]);
        assert_eq!(tee.sizes.get("M"), Some(&0));
        assert_eq!(tee.size_prices.get("XL"), Some(&Decimal::from(25)));
        assert_eq!(tee.thumbnail.as_deref(), Some("a.jpg"));
        assert_eq!(tee.gallery, ["b.jpg"]);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let report = parse("title,price\nA,1\nB,1\n", ImportFormat::Csv).unwrap();
        assert_ne!(report.products[0].id, report.products[1].id);
    }

    #[test]
    fn test_unknown_currency_falls_back() {
        let options = ImportOptions {
            default_currency: CurrencyCode::EUR,
        };
        let report = parse_with("title,price,currency\nA,1,XYZ\nB,1,\n", ImportFormat::Csv, options)
            .unwrap();
        assert!(report.products.iter().all(|p| p.currency == CurrencyCode::EUR));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ImportFormat::detect("  [{}]"), ImportFormat::Json);
        assert_eq!(ImportFormat::detect("title,price"), ImportFormat::Csv);
    }

    #[tokio::test]
    async fn test_commit_reports_failed_writes() {
        use crate::store::MemoryStore;

        let store = MemoryStore::new();
        let mut report = parse("id,title,price\np-1,A,1\np-1,B,2\n", ImportFormat::Csv).unwrap();

        let written = commit(&store, &mut report).await;

        assert_eq!(written, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with("B (p-1)"));
        assert_eq!(store.list_products().await.unwrap().len(), 1);
    }
}
