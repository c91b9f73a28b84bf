//! SQLite-backed product store
//!
//! The store owns the `products` table inside the workspace database. The
//! `(name, brand)` pair is the natural identity: commands intercept
//! duplicates with a case-insensitive lookup before inserting, and the
//! table's UNIQUE constraint backstops anything that slips through. A
//! constraint violation always surfaces as `StoreError::Duplicate`, never
//! as a raw SQLite error.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::core::product::{Product, ProductFields, Unit};
use crate::core::query::FilterSpec;

/// Current schema version for migrations
const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a product named '{name}' by '{brand}' already exists")]
    Duplicate { name: String, brand: String },

    #[error("product {0} not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(String),
}

/// Aggregates over the whole inventory, fetched in one query
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoreTotals {
    pub count: u64,
    pub total_value: f64,
    pub avg_price: f64,
    pub avg_quantity: f64,
}

/// The product store backed by SQLite
pub struct ProductStore {
    conn: Connection,
}

impl ProductStore {
    /// Open or create the store at the given database path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version for migrations
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                price REAL NOT NULL,
                quantity REAL NOT NULL,
                unit TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(name, brand)
            );
            CREATE INDEX IF NOT EXISTS idx_products_identity
                ON products(LOWER(name), LOWER(brand));
            CREATE INDEX IF NOT EXISTS idx_products_created ON products(created_at);
            "#,
        )?;

        let current: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        // Migrations will gate on the stored version once the schema moves
        // past v1; for now only stamp fresh databases.
        if current.is_none() {
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }

        Ok(())
    }

    /// Insert a new product, returning the stored row with its assigned id
    pub fn create(&self, fields: &ProductFields) -> Result<Product, StoreError> {
        let now = Utc::now();
        let ts = now.to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO products (name, brand, price, quantity, unit, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    fields.name,
                    fields.brand,
                    fields.price,
                    fields.quantity,
                    fields.unit.to_string(),
                    ts,
                    ts
                ],
            )
            .map_err(|e| map_constraint(e, &fields.name, &fields.brand))?;

        Ok(Product {
            id: self.conn.last_insert_rowid(),
            name: fields.name.clone(),
            brand: fields.brand.clone(),
            price: fields.price,
            quantity: fields.quantity,
            unit: fields.unit,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let product = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_PRODUCT),
                params![id],
                row_to_product,
            )
            .optional()?;
        Ok(product)
    }

    /// Case-insensitive identity lookup. Takes the first match by id when
    /// legacy data holds case-variant duplicates.
    pub fn find_by_identity(&self, name: &str, brand: &str) -> Result<Option<Product>, StoreError> {
        let product = self
            .conn
            .query_row(
                &format!(
                    "{} WHERE LOWER(name) = LOWER(?1) AND LOWER(brand) = LOWER(?2)
                     ORDER BY id LIMIT 1",
                    SELECT_PRODUCT
                ),
                params![name.trim(), brand.trim()],
                row_to_product,
            )
            .optional()?;
        Ok(product)
    }

    /// Write every caller-controlled field back, refreshing `updated_at`.
    /// Returns the stored row.
    pub fn update(&self, product: &Product) -> Result<Product, StoreError> {
        let now = Utc::now();
        let changed = self
            .conn
            .execute(
                "UPDATE products
                 SET name = ?1, brand = ?2, price = ?3, quantity = ?4, unit = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    product.name,
                    product.brand,
                    product.price,
                    product.quantity,
                    product.unit.to_string(),
                    now.to_rfc3339(),
                    product.id
                ],
            )
            .map_err(|e| map_constraint(e, &product.name, &product.brand))?;

        if changed == 0 {
            return Err(StoreError::NotFound(product.id));
        }
        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    /// Delete by id. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// List products matching the search and unit filters, in the requested
    /// order. Stock-level bucketing happens downstream over the returned set.
    pub fn list(&self, filter: &FilterSpec) -> Result<Vec<Product>, StoreError> {
        let mut sql = String::from(SELECT_PRODUCT);
        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                clauses.push("(LOWER(name) LIKE ? OR LOWER(brand) LIKE ?)");
                let pattern = format!("%{}%", search.to_lowercase());
                params_vec.push(Box::new(pattern.clone()));
                params_vec.push(Box::new(pattern));
            }
        }
        if let Some(unit) = filter.unit {
            clauses.push("unit = ?");
            params_vec.push(Box::new(unit.to_string()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(filter.sort.order_expr());
        sql.push(' ');
        sql.push_str(filter.dir.keyword());
        if filter.sort.order_expr() != "id" {
            sql.push_str(", id ASC");
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), row_to_product)?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Count, total value, and averages in one pass
    pub fn totals(&self) -> Result<StoreTotals, StoreError> {
        let totals = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(price * quantity), 0.0),
                    COALESCE(AVG(price), 0.0),
                    COALESCE(AVG(quantity), 0.0)
             FROM products",
            [],
            |row| {
                Ok(StoreTotals {
                    count: row.get::<_, i64>(0)? as u64,
                    total_value: row.get(1)?,
                    avg_price: row.get(2)?,
                    avg_quantity: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }

    pub fn count_quantity_below(&self, threshold: f64) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE quantity < ?1",
            params![threshold],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_price_above(&self, threshold: f64) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE price > ?1",
            params![threshold],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Products created in the half-open window `[from, to)`
    pub fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE created_at >= ?1 AND created_at < ?2",
            params![from.to_rfc3339(), to.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Most recent update across the inventory
    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let ts: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM products", [], |row| row.get(0))
            .optional()?
            .flatten();
        match ts {
            Some(ts) => Ok(Some(parse_timestamp(&ts)?)),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    pub fn set_created_at(&self, id: i64, at: DateTime<Utc>) {
        self.conn
            .execute(
                "UPDATE products SET created_at = ?1 WHERE id = ?2",
                params![at.to_rfc3339(), id],
            )
            .unwrap();
    }

    #[cfg(test)]
    pub fn break_schema(&self) {
        self.conn.execute_batch("DROP TABLE products").unwrap();
    }
}

const SELECT_PRODUCT: &str =
    "SELECT id, name, brand, price, quantity, unit, created_at, updated_at FROM products";

fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let unit: String = row.get(5)?;
    let created: String = row.get(6)?;
    let updated: String = row.get(7)?;
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        unit: Unit::resolve(&unit),
        created_at: parse_timestamp(&created)?,
        updated_at: parse_timestamp(&updated)?,
    })
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_constraint(e: rusqlite::Error, name: &str, brand: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate {
                name: name.to_string(),
                brand: brand.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::{SortDir, SortField};
    use chrono::Duration;

    fn fields(name: &str, brand: &str, price: f64, quantity: f64, unit: Unit) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            brand: brand.to_string(),
            price,
            quantity,
            unit,
        }
    }

    fn seeded() -> ProductStore {
        let store = ProductStore::open_in_memory().unwrap();
        store
            .create(&fields("Bolt", "AcmeCo", 5.0, 10.0, Unit::Dona))
            .unwrap();
        store
            .create(&fields("Pipe 20mm", "PVC", 12500.0, 40.0, Unit::Metr))
            .unwrap();
        store
            .create(&fields("Cement", "Asia", 45000.0, 2.5, Unit::Kg))
            .unwrap();
        store
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let store = ProductStore::open_in_memory().unwrap();
        let product = store
            .create(&fields("Bolt", "AcmeCo", 5.0, 10.0, Unit::Dona))
            .unwrap();
        assert!(product.id > 0);
        assert_eq!(product.created_at, product.updated_at);

        let loaded = store.get(product.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Bolt");
        assert_eq!(loaded.unit, Unit::Dona);
    }

    #[test]
    fn duplicate_insert_maps_to_duplicate_error() {
        let store = ProductStore::open_in_memory().unwrap();
        store
            .create(&fields("Bolt", "AcmeCo", 5.0, 10.0, Unit::Dona))
            .unwrap();
        let err = store
            .create(&fields("Bolt", "AcmeCo", 9.0, 1.0, Unit::Dona))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn find_by_identity_ignores_case() {
        let store = seeded();
        let found = store.find_by_identity("bolt", "ACMECO").unwrap().unwrap();
        assert_eq!(found.name, "Bolt");
        assert_eq!(found.brand, "AcmeCo");
        assert!(store.find_by_identity("Bolt", "Nowhere").unwrap().is_none());
    }

    #[test]
    fn update_persists_and_refreshes_updated_at() {
        let store = seeded();
        let mut product = store.find_by_identity("Bolt", "AcmeCo").unwrap().unwrap();
        product.price = 7.0;
        product.quantity += 4.0;
        let updated = store.update(&product).unwrap();
        assert!(updated.updated_at >= updated.created_at);

        let loaded = store.get(product.id).unwrap().unwrap();
        assert_eq!(loaded.price, 7.0);
        assert_eq!(loaded.quantity, 14.0);
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let store = ProductStore::open_in_memory().unwrap();
        let ghost = Product {
            id: 99,
            name: "Ghost".to_string(),
            brand: "None".to_string(),
            price: 1.0,
            quantity: 1.0,
            unit: Unit::Dona,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            store.update(&ghost).unwrap_err(),
            StoreError::NotFound(99)
        ));
    }

    #[test]
    fn rename_onto_existing_identity_is_duplicate() {
        let store = seeded();
        let mut cement = store.find_by_identity("Cement", "Asia").unwrap().unwrap();
        cement.name = "Bolt".to_string();
        cement.brand = "AcmeCo".to_string();
        assert!(matches!(
            store.update(&cement).unwrap_err(),
            StoreError::Duplicate { .. }
        ));
    }

    #[test]
    fn delete_reports_whether_a_row_went() {
        let store = seeded();
        let bolt = store.find_by_identity("Bolt", "AcmeCo").unwrap().unwrap();
        assert!(store.delete(bolt.id).unwrap());
        assert!(!store.delete(bolt.id).unwrap());
        assert!(store.get(bolt.id).unwrap().is_none());
    }

    #[test]
    fn list_searches_name_and_brand() {
        let store = seeded();
        let spec = FilterSpec {
            search: Some("acme".to_string()),
            ..FilterSpec::default()
        };
        let products = store.list(&spec).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Bolt");

        let spec = FilterSpec {
            search: Some("PIPE".to_string()),
            ..FilterSpec::default()
        };
        assert_eq!(store.list(&spec).unwrap().len(), 1);
    }

    #[test]
    fn list_filters_by_unit() {
        let store = seeded();
        let spec = FilterSpec {
            unit: Some(Unit::Kg),
            ..FilterSpec::default()
        };
        let products = store.list(&spec).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Cement");
    }

    #[test]
    fn list_sorts_by_requested_field() {
        let store = seeded();
        let spec = FilterSpec {
            sort: SortField::Price,
            dir: SortDir::Desc,
            ..FilterSpec::default()
        };
        let products = store.list(&spec).unwrap();
        let prices: Vec<f64> = products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![45000.0, 12500.0, 5.0]);
    }

    #[test]
    fn list_defaults_to_id_ascending() {
        let store = seeded();
        let products = store.list(&FilterSpec::default()).unwrap();
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn totals_cover_value_and_averages() {
        let store = ProductStore::open_in_memory().unwrap();
        store
            .create(&fields("A", "X", 10.0, 2.0, Unit::Dona))
            .unwrap();
        store
            .create(&fields("B", "Y", 30.0, 4.0, Unit::Dona))
            .unwrap();
        let totals = store.totals().unwrap();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.total_value, 10.0 * 2.0 + 30.0 * 4.0);
        assert_eq!(totals.avg_price, 20.0);
        assert_eq!(totals.avg_quantity, 3.0);
    }

    #[test]
    fn totals_on_empty_store_are_zero() {
        let store = ProductStore::open_in_memory().unwrap();
        assert_eq!(store.totals().unwrap(), StoreTotals::default());
        assert!(store.last_updated().unwrap().is_none());
    }

    #[test]
    fn created_between_is_half_open() {
        let store = ProductStore::open_in_memory().unwrap();
        let a = store
            .create(&fields("A", "X", 1.0, 1.0, Unit::Dona))
            .unwrap();
        let b = store
            .create(&fields("B", "Y", 1.0, 1.0, Unit::Dona))
            .unwrap();
        let now = Utc::now();
        store.set_created_at(a.id, now - Duration::days(10));
        store.set_created_at(b.id, now - Duration::days(40));

        let recent = store.created_between(now - Duration::days(30), now).unwrap();
        let previous = store
            .created_between(now - Duration::days(60), now - Duration::days(30))
            .unwrap();
        assert_eq!(recent, 1);
        assert_eq!(previous, 1);
    }

    #[test]
    fn count_thresholds() {
        let store = ProductStore::open_in_memory().unwrap();
        store
            .create(&fields("A", "X", 10.0, 2.0, Unit::Dona))
            .unwrap();
        store
            .create(&fields("B", "Y", 100.0, 50.0, Unit::Dona))
            .unwrap();
        assert_eq!(store.count_quantity_below(10.0).unwrap(), 1);
        assert_eq!(store.count_price_above(50.0).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 2);
    }
}
