//! Commit application
//!
//! Applies a staged plan row by row. Rows are independent: a failed row is
//! tallied with a message and the rest still apply. There is no cross-row
//! transaction to roll back.

use serde::Serialize;
use thiserror::Error;

use crate::core::product::ProductFields;
use crate::core::store::{ProductStore, StoreError};
use crate::import::reconcile::{Disposition, ImportRow};

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The matched record was deleted between preview and commit
    #[error("product {0} no longer exists")]
    RecordGone(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tally of an applied plan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitOutcome {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    /// One line per failed row, carrying its source row number and name
    pub messages: Vec<String>,
}

/// Apply a staged plan against the store
pub fn apply(store: &ProductStore, plan: &[ImportRow]) -> CommitOutcome {
    let mut outcome = CommitOutcome::default();
    for row in plan {
        match apply_row(store, row) {
            Ok(Applied::Created) => outcome.created += 1,
            Ok(Applied::Updated) => outcome.updated += 1,
            Err(e) => {
                outcome.failed += 1;
                outcome
                    .messages
                    .push(format!("Row {}: {} - {}", row.row, row.name, e));
            }
        }
    }
    outcome
}

enum Applied {
    Created,
    Updated,
}

fn apply_row(store: &ProductStore, row: &ImportRow) -> Result<Applied, ApplyError> {
    match row.disposition {
        Disposition::Update { id, .. } => {
            // Work from the live record, not the preview snapshot: quantity
            // adds to whatever is stored now, price and unit overwrite.
            let mut product = store.get(id)?.ok_or(ApplyError::RecordGone(id))?;
            product.price = row.price;
            product.quantity += row.quantity;
            product.unit = row.unit;
            store.update(&product)?;
            Ok(Applied::Updated)
        }
        Disposition::Create => {
            store.create(&ProductFields {
                name: row.name.clone(),
                brand: row.brand.clone(),
                price: row.price,
                quantity: row.quantity,
                unit: row.unit,
            })?;
            Ok(Applied::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::Unit;

    fn create_row(row: usize, name: &str, brand: &str, price: f64, quantity: f64) -> ImportRow {
        ImportRow {
            row,
            name: name.to_string(),
            brand: brand.to_string(),
            price,
            quantity,
            unit: Unit::Dona,
            disposition: Disposition::Create,
        }
    }

    fn update_row(row: usize, name: &str, id: i64, price: f64, quantity: f64) -> ImportRow {
        ImportRow {
            row,
            name: name.to_string(),
            brand: "AcmeCo".to_string(),
            price,
            quantity,
            unit: Unit::Kg,
            disposition: Disposition::Update {
                id,
                current_price: 0.0,
                current_quantity: 0.0,
                current_unit: Unit::Dona,
            },
        }
    }

    fn seeded_bolt(store: &ProductStore) -> i64 {
        store
            .create(&ProductFields {
                name: "Bolt".to_string(),
                brand: "AcmeCo".to_string(),
                price: 5.0,
                quantity: 10.0,
                unit: Unit::Dona,
            })
            .unwrap()
            .id
    }

    #[test]
    fn creates_and_updates_are_tallied() {
        let store = ProductStore::open_in_memory().unwrap();
        let bolt = seeded_bolt(&store);
        let plan = vec![
            create_row(2, "Pipe", "PVC", 12500.0, 40.0),
            update_row(3, "Bolt", bolt, 7.0, 4.0),
        ];

        let outcome = apply(&store, &plan);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn update_adds_quantity_but_overwrites_price_and_unit() {
        let store = ProductStore::open_in_memory().unwrap();
        let bolt = seeded_bolt(&store);

        apply(&store, &[update_row(2, "Bolt", bolt, 7.0, 4.0)]);

        let stored = store.get(bolt).unwrap().unwrap();
        assert_eq!(stored.quantity, 14.0);
        assert_eq!(stored.price, 7.0);
        assert_eq!(stored.unit, Unit::Kg);
    }

    #[test]
    fn update_lands_on_the_live_quantity_not_the_snapshot() {
        let store = ProductStore::open_in_memory().unwrap();
        let bolt = seeded_bolt(&store);

        // stock moved between preview and commit
        let mut product = store.get(bolt).unwrap().unwrap();
        product.quantity = 20.0;
        store.update(&product).unwrap();

        apply(&store, &[update_row(2, "Bolt", bolt, 7.0, 4.0)]);
        assert_eq!(store.get(bolt).unwrap().unwrap().quantity, 24.0);
    }

    #[test]
    fn gone_record_fails_only_its_own_row() {
        let store = ProductStore::open_in_memory().unwrap();
        let plan = vec![
            update_row(2, "Bolt", 999, 7.0, 4.0),
            create_row(3, "Pipe", "PVC", 1.0, 1.0),
        ];

        let outcome = apply(&store, &plan);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.messages[0].starts_with("Row 2: Bolt"));
        assert!(outcome.messages[0].contains("no longer exists"));
    }

    #[test]
    fn duplicate_create_fails_only_its_own_row() {
        let store = ProductStore::open_in_memory().unwrap();
        seeded_bolt(&store);
        let plan = vec![
            create_row(2, "Bolt", "AcmeCo", 9.0, 1.0),
            create_row(3, "Pipe", "PVC", 1.0, 1.0),
        ];

        let outcome = apply(&store, &plan);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.messages[0].contains("already exists"));
    }

    #[test]
    fn empty_plan_is_a_clean_no_op() {
        let store = ProductStore::open_in_memory().unwrap();
        let outcome = apply(&store, &[]);
        assert_eq!(outcome, CommitOutcome::default());
    }
}
