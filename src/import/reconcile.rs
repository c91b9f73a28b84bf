//! Import preview reconciliation
//!
//! Turns a parsed sheet into a staged plan: every surviving data row becomes
//! an `ImportRow` with a create or update disposition. Planning reads the
//! store for identity lookups but writes nothing. A single bad numeric cell
//! fails the whole preview; there is no partial plan.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::product::Unit;
use crate::core::store::{ProductStore, StoreError};
use crate::import::columns::{self, Field, MissingColumns};
use crate::sheet::Sheet;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    MissingColumns(#[from] MissingColumns),

    #[error("row {row}: {field} '{value}' is not a number")]
    RowParse {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One planned action, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    /// 1-based row number in the source file, header row included
    pub row: usize,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub quantity: f64,
    pub unit: Unit,
    #[serde(flatten)]
    pub disposition: Disposition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Disposition {
    /// No identity match; commit inserts a new record
    Create,
    /// Matched an existing record. Commit re-loads it by id, adds the row's
    /// quantity, and overwrites price and unit; the current values here are
    /// a snapshot for preview display only.
    Update {
        id: i64,
        current_price: f64,
        current_quantity: f64,
        current_unit: Unit,
    },
}

/// Reconcile a sheet against the store into a staged plan
pub fn reconcile(store: &ProductStore, sheet: &Sheet) -> Result<Vec<ImportRow>, ImportError> {
    let cols = columns::map_columns(&sheet.headers)?;

    let mut plan = Vec::new();
    for (idx, cells) in sheet.rows.iter().enumerate() {
        // 1-based position in the file, offset past the header row
        let row = idx + 2;

        let raw_name = cell(cells, &cols, Field::Name);
        let raw_brand = cell(cells, &cols, Field::Brand);
        if raw_name.is_empty() || raw_brand.is_empty() {
            continue;
        }
        if columns::is_label(Field::Name, raw_name) || columns::is_label(Field::Brand, raw_brand) {
            continue;
        }

        let name = raw_name.trim().to_string();
        let brand = raw_brand.trim().to_string();
        let price = parse_number(row, "price", cell(cells, &cols, Field::Price))?;
        let quantity = parse_number(row, "quantity", cell(cells, &cols, Field::Quantity))?;
        let unit = Unit::resolve(cell(cells, &cols, Field::Unit));

        let disposition = match store.find_by_identity(&name, &brand)? {
            Some(existing) => Disposition::Update {
                id: existing.id,
                current_price: existing.price,
                current_quantity: existing.quantity,
                current_unit: existing.unit,
            },
            None => Disposition::Create,
        };

        plan.push(ImportRow {
            row,
            name,
            brand,
            price,
            quantity,
            unit,
            disposition,
        });
    }

    Ok(plan)
}

/// The cell mapped to `field`, or empty when the row is too short
fn cell<'a>(cells: &'a [String], cols: &HashMap<Field, usize>, field: Field) -> &'a str {
    cols.get(&field)
        .and_then(|idx| cells.get(*idx))
        .map(String::as_str)
        .unwrap_or("")
}

fn parse_number(row: usize, field: &'static str, raw: &str) -> Result<f64, ImportError> {
    raw.trim().parse::<f64>().map_err(|_| ImportError::RowParse {
        row,
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::ProductFields;

    const HEADERS: [&str; 5] = ["Nomi", "Brend", "Narx (so'm)", "Miqdor", "O'lchov birligi"];

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet {
            headers: HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    fn store_with_bolt() -> ProductStore {
        let store = ProductStore::open_in_memory().unwrap();
        store
            .create(&ProductFields {
                name: "Bolt".to_string(),
                brand: "AcmeCo".to_string(),
                price: 5.0,
                quantity: 10.0,
                unit: Unit::Dona,
            })
            .unwrap();
        store
    }

    #[test]
    fn unmatched_rows_plan_creates() {
        let store = ProductStore::open_in_memory().unwrap();
        let plan = reconcile(&store, &sheet(&[&["Pipe", "PVC", "12500", "40", "metr"]])).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].row, 2);
        assert_eq!(plan[0].disposition, Disposition::Create);
        assert_eq!(plan[0].unit, Unit::Metr);
    }

    #[test]
    fn matched_rows_plan_updates_with_snapshot() {
        let store = store_with_bolt();
        let plan = reconcile(&store, &sheet(&[&["bolt", "ACMECO", "7", "4", "dona"]])).unwrap();
        assert_eq!(plan.len(), 1);
        match &plan[0].disposition {
            Disposition::Update {
                current_price,
                current_quantity,
                ..
            } => {
                assert_eq!(*current_price, 5.0);
                assert_eq!(*current_quantity, 10.0);
            }
            other => panic!("expected update, got {:?}", other),
        }
        // row fields keep the incoming values
        assert_eq!(plan[0].price, 7.0);
        assert_eq!(plan[0].quantity, 4.0);
    }

    #[test]
    fn blank_name_or_brand_skips_the_row() {
        let store = ProductStore::open_in_memory().unwrap();
        let plan = reconcile(
            &store,
            &sheet(&[
                &["", "PVC", "1", "1", "dona"],
                &["Pipe", "", "1", "1", "dona"],
                &["Pipe", "PVC", "1", "1", "dona"],
            ]),
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        // surviving row keeps its original file position
        assert_eq!(plan[0].row, 4);
    }

    #[test]
    fn repeated_header_rows_are_skipped() {
        let store = ProductStore::open_in_memory().unwrap();
        let plan = reconcile(
            &store,
            &sheet(&[
                &["Nomi", "Brend", "Narx (so'm)", "Miqdor", "O'lchov birligi"],
                &["Pipe", "PVC", "1", "1", "dona"],
            ]),
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].name, "Pipe");
    }

    #[test]
    fn bad_number_fails_the_whole_preview() {
        let store = ProductStore::open_in_memory().unwrap();
        let err = reconcile(
            &store,
            &sheet(&[
                &["Pipe", "PVC", "1", "1", "dona"],
                &["Nut", "AcmeCo", "abc", "1", "dona"],
            ]),
        )
        .unwrap_err();
        match err {
            ImportError::RowParse { row, field, value } => {
                assert_eq!(row, 3);
                assert_eq!(field, "price");
                assert_eq!(value, "abc");
            }
            other => panic!("expected row parse error, got {:?}", other),
        }
    }

    #[test]
    fn empty_numeric_cell_is_a_parse_error() {
        let store = ProductStore::open_in_memory().unwrap();
        let err = reconcile(&store, &sheet(&[&["Pipe", "PVC", "", "1", "dona"]])).unwrap_err();
        assert!(matches!(err, ImportError::RowParse { field: "price", .. }));
    }

    #[test]
    fn unknown_unit_defaults_instead_of_failing() {
        let store = ProductStore::open_in_memory().unwrap();
        let plan = reconcile(&store, &sheet(&[&["Pipe", "PVC", "1", "1", "paket"]])).unwrap();
        assert_eq!(plan[0].unit, Unit::Dona);
    }

    #[test]
    fn missing_columns_fail_before_any_row() {
        let store = ProductStore::open_in_memory().unwrap();
        let bad = Sheet {
            headers: vec!["Nomi".to_string(), "Brend".to_string()],
            rows: vec![vec!["Pipe".to_string(), "PVC".to_string()]],
        };
        let err = reconcile(&store, &bad).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns(_)));
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let store = ProductStore::open_in_memory().unwrap();
        // quantity and unit cells absent: quantity fails to parse
        let err = reconcile(&store, &sheet(&[&["Pipe", "PVC", "5"]])).unwrap_err();
        assert!(matches!(
            err,
            ImportError::RowParse {
                field: "quantity",
                ..
            }
        ));
    }

    #[test]
    fn plan_serializes_with_action_tags() {
        let store = store_with_bolt();
        let plan = reconcile(
            &store,
            &sheet(&[
                &["Bolt", "AcmeCo", "7", "4", "dona"],
                &["Pipe", "PVC", "1", "1", "metr"],
            ]),
        )
        .unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"action\":\"update\""));
        assert!(json.contains("\"action\":\"create\""));

        let back: Vec<ImportRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
