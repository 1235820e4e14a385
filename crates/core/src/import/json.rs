//! JSON documents.
//!
//! Accepted shapes: an array of product objects, an object wrapping such an
//! array under `products`/`items`/`data`, or a single product object. Product
//! objects may be flat or group fields into nested objects
//! (`{"pricing": {"price": 10}}`); nesting is flattened before mapping, so
//! both shapes produce the same product. Top-level keys take precedence over
//! nested ones.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use super::mapping::resolve_field;
use super::{ImportError, ImportIssue, RawDocument, RawRecord};

const WRAPPER_KEYS: &[&str] = &["products", "items", "data"];

pub(super) fn read(input: &str) -> Result<RawDocument, ImportError> {
    let root: Value = serde_json::from_str(input).map_err(ImportError::InvalidJson)?;

    let items: Vec<Value> = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match WRAPPER_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array))
                .and_then(|key| map.remove(*key))
            {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            }
        }
        _ => {
            return Err(ImportError::UnexpectedShape(
                "expected an array of products or an object".to_owned(),
            ));
        }
    };

    let mut document = RawDocument::default();
    for (index, item) in items.into_iter().enumerate() {
        let row = index + 1;
        match item {
            Value::Object(map) => {
                let mut record = RawRecord::new(row);
                flatten(&map, &mut record, &mut document.unrecognized);
                document.records.push(Ok(record));
            }
            other => document.records.push(Err(ImportIssue::at(
                row,
                format!("expected a product object, got {}", kind(&other)),
            ))),
        }
    }
    Ok(document)
}

/// Keys tried, in order, when a known field holds an object
/// (`"category": {"id": "c-1", "name": "Shirts"}`).
const OBJECT_VALUE_KEYS: &[&str] = &["id", "value", "amount"];

/// Walk the object level by level so a shallower key always beats a nested
/// one mapping to the same field. Shadowed nested keys are reported.
fn flatten(map: &Map<String, Value>, record: &mut RawRecord, unknown: &mut Vec<String>) {
    let mut levels: VecDeque<(String, &Map<String, Value>)> = VecDeque::new();
    levels.push_back((String::new(), map));

    while let Some((path, map)) = levels.pop_front() {
        for (key, value) in map {
            let name = join(&path, key);
            let (field, value) = match (resolve_field(key), value) {
                (None, Value::Object(inner)) => {
                    levels.push_back((name, inner));
                    continue;
                }
                (None, _) => {
                    note(unknown, name);
                    continue;
                }
                (Some(field), Value::Object(inner)) if !field.accepts_map() => {
                    match OBJECT_VALUE_KEYS.iter().find_map(|k| inner.get(*k)) {
                        Some(value) => (field, value),
                        None => {
                            note(unknown, name);
                            continue;
                        }
                    }
                }
                (Some(field), value) => (field, value),
            };

            if record.get(field).is_some() {
                note(unknown, format!("{name} (duplicate of {})", field.name()));
            } else {
                record.push(field, value.clone());
            }
        }
    }
}

fn note(unknown: &mut Vec<String>, name: String) {
    if !unknown.contains(&name) {
        unknown.push(name);
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::import::mapping::Field;

    #[test]
    fn test_wrapped_array() {
        let doc = read(r#"{"products": [{"title": "A", "price": 1}, {"name": "B", "price": 2}]}"#)
            .unwrap();
        assert_eq!(doc.records.len(), 2);
        let second = doc.records[1].as_ref().unwrap();
        assert_eq!(second.row, 2);
        assert!(second.get(Field::Title).is_some());
    }

    #[test]
    fn test_nested_groups_are_flattened() {
        let doc = read(
            r#"[{"name": "A", "pricing": {"price": 10, "salePrice": 8}, "inventory": {"sizes": {"S": 1}}}]"#,
        )
        .unwrap();
        let record = doc.records[0].as_ref().unwrap();
        assert!(record.get(Field::Price).is_some());
        assert!(record.get(Field::DiscountPrice).is_some());
        assert!(record.get(Field::Sizes).is_some_and(Value::is_object));
        assert!(doc.unrecognized.is_empty());
    }

    #[test]
    fn test_unknown_keys_reported_once_with_path() {
        let doc = read(r#"[{"title": "A", "meta": {"sku": 1}}, {"title": "B", "meta": {"sku": 2}}]"#)
            .unwrap();
        assert_eq!(doc.unrecognized, ["meta.sku"]);
    }

    #[test]
    fn test_top_level_keys_beat_nested_synonyms() {
        let doc = read(
            r#"[{"id": "p1", "title": "Linen Tee", "price": 20,
                 "seo": {"title": "Buy cheap tees"},
                 "category": {"id": "c-shirts", "name": "Shirts"}}]"#,
        )
        .unwrap();
        let record = doc.records[0].as_ref().unwrap();
        assert_eq!(record.get(Field::Id), Some(&Value::from("p1")));
        assert_eq!(record.get(Field::Title), Some(&Value::from("Linen Tee")));
        assert_eq!(record.get(Field::Category), Some(&Value::from("c-shirts")));
        assert_eq!(doc.unrecognized, ["seo.title (duplicate of title)"]);
    }

    #[test]
    fn test_nested_value_fills_missing_field() {
        let doc = read(r#"[{"seo": {"title": "Tee"}, "pricing": {"price": 5}}]"#).unwrap();
        let record = doc.records[0].as_ref().unwrap();
        assert_eq!(record.get(Field::Title), Some(&Value::from("Tee")));
        assert!(doc.unrecognized.is_empty());
    }

    #[test]
    fn test_known_field_object_without_id_is_reported() {
        let doc = read(r#"[{"title": "A", "category": {"name": "Shirts"}}]"#).unwrap();
        let record = doc.records[0].as_ref().unwrap();
        assert!(record.get(Field::Category).is_none());
        assert_eq!(record.get(Field::Title), Some(&Value::from("A")));
        assert_eq!(doc.unrecognized, ["category"]);
    }

    #[test]
    fn test_non_object_item_is_row_error() {
        let doc = read(r#"[{"title": "A"}, 42]"#).unwrap();
        let err = doc.records[1].as_ref().unwrap_err();
        assert_eq!(err.row, Some(2));
    }

    #[test]
    fn test_malformed_json_aborts() {
        assert!(matches!(read("[{"), Err(ImportError::InvalidJson(_))));
        assert!(matches!(read("42"), Err(ImportError::UnexpectedShape(_))));
    }
}
