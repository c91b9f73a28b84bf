//! Spreadsheet column mapping
//!
//! Header labels from the legacy export format and plain English names map
//! onto the five canonical fields. All five are required; validation runs
//! before any data row is read and reports every missing field at once.

use std::collections::HashMap;

use thiserror::Error;

/// Canonical import fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Brand,
    Price,
    Quantity,
    Unit,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Brand,
        Field::Price,
        Field::Quantity,
        Field::Unit,
    ];

    pub fn canonical(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Brand => "brand",
            Field::Price => "price",
            Field::Quantity => "quantity",
            Field::Unit => "unit",
        }
    }
}

/// Raw header label to canonical field. Lookup lowercases and trims the
/// label. The Uzbek labels carry the apostrophe spellings seen in the wild
/// (ASCII, U+2018 and U+02BB).
const COLUMN_LABELS: &[(&str, Field)] = &[
    ("nomi", Field::Name),
    ("name", Field::Name),
    ("brend", Field::Brand),
    ("brand", Field::Brand),
    ("narx (so'm)", Field::Price),
    ("narx (so\u{2018}m)", Field::Price),
    ("narx (so\u{02bb}m)", Field::Price),
    ("narx", Field::Price),
    ("price", Field::Price),
    ("dona", Field::Quantity),
    ("miqdor", Field::Quantity),
    ("quantity", Field::Quantity),
    ("qty", Field::Quantity),
    ("o'lchov birligi", Field::Unit),
    ("o\u{2018}lchov birligi", Field::Unit),
    ("o\u{02bb}lchov birligi", Field::Unit),
    ("unit", Field::Unit),
];

#[derive(Debug, Error, PartialEq)]
#[error("required columns missing from import file: {}", missing.join(", "))]
pub struct MissingColumns {
    pub missing: Vec<String>,
}

/// Look a single header label up in the table
pub fn lookup(label: &str) -> Option<Field> {
    let needle = label.trim().to_lowercase();
    COLUMN_LABELS
        .iter()
        .find(|(candidate, _)| *candidate == needle)
        .map(|(_, field)| *field)
}

/// Map a header row to field -> column index. When two columns map to the
/// same field, the first one wins.
pub fn map_columns(headers: &[String]) -> Result<HashMap<Field, usize>, MissingColumns> {
    let mut map = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(field) = lookup(header) {
            map.entry(field).or_insert(idx);
        }
    }

    let missing: Vec<String> = Field::ALL
        .iter()
        .filter(|field| !map.contains_key(field))
        .map(|field| field.canonical().to_string())
        .collect();

    if missing.is_empty() {
        Ok(map)
    } else {
        Err(MissingColumns { missing })
    }
}

/// True when a cell merely repeats a label for the given field. Sheets
/// pasted together sometimes carry their header row again in the data.
pub fn is_label(field: Field, value: &str) -> bool {
    let needle = value.trim().to_lowercase();
    COLUMN_LABELS
        .iter()
        .any(|(candidate, candidate_field)| *candidate_field == field && *candidate == needle)
}
