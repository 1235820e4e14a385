//! CSV rows with a header line.
//!
//! Row numbers are source line numbers: the header is line 1, the first data
//! row line 2. Blank lines still count, so a reported row is where the editor
//! shows it.

use serde_json::Value;

use super::mapping::{Field, resolve_field};
use super::{ImportError, ImportIssue, RawDocument, RawRecord};

pub(super) fn read(input: &str) -> Result<RawDocument, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let headers = reader.headers().map_err(ImportError::Csv)?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty);
    }

    let mut document = RawDocument::default();
    let mut columns: Vec<Option<Field>> = Vec::with_capacity(headers.len());
    for header in &headers {
        let field = resolve_field(header);
        match field {
            Some(field) if columns.contains(&Some(field)) => {
                document.unrecognized.push(format!("{header} (duplicate of {})", field.name()));
                columns.push(None);
            }
            Some(_) => columns.push(field),
            None => {
                if !header.is_empty() {
                    document.unrecognized.push(header.to_owned());
                }
                columns.push(None);
            }
        }
    }

    for (index, result) in reader.records().enumerate() {
        let fallback = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let row = e.position().map_or(fallback, |pos| line_of(pos, fallback));
                document
                    .records
                    .push(Err(ImportIssue::at(row, format!("unreadable row: {e}"))));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row = record.position().map_or(fallback, |pos| line_of(pos, fallback));
        let mut raw = RawRecord::new(row);
        for (cell, column) in record.iter().zip(&columns) {
            if let Some(field) = column
                && !cell.is_empty()
            {
                raw.push(*field, Value::String(cell.to_owned()));
            }
        }
        document.records.push(Ok(raw));
    }

    Ok(document)
}

fn line_of(position: &csv::Position, fallback: usize) -> usize {
    usize::try_from(position.line()).unwrap_or(fallback)
}
