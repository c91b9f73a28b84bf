//! Listing filters, sort keys, and stock-level bucketing

use serde::{Deserialize, Serialize};

use crate::core::product::{Product, Unit};
use crate::core::store::{ProductStore, StoreError};

/// Sort keys accepted by list and export commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Id,
    Name,
    Brand,
    Price,
    Quantity,
    Created,
}

impl SortField {
    /// Parse a sort key from user input. Unknown keys fall back to `id`
    /// rather than erroring, so a stray value still produces a listing.
    pub fn parse(raw: &str) -> SortField {
        match raw.trim().to_lowercase().as_str() {
            "id" => SortField::Id,
            "name" => SortField::Name,
            "brand" => SortField::Brand,
            "price" => SortField::Price,
            "quantity" | "qty" => SortField::Quantity,
            "created" | "created_at" => SortField::Created,
            _ => SortField::Id,
        }
    }

    /// ORDER BY expression for this key
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name COLLATE NOCASE",
            SortField::Brand => "brand COLLATE NOCASE",
            SortField::Price => "price",
            SortField::Quantity => "quantity",
            SortField::Created => "created_at",
        }
    }
}

impl Default for SortField {
    fn default() -> Self {
        SortField::Id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

impl Default for SortDir {
    fn default() -> Self {
        SortDir::Asc
    }
}

/// Stock buckets, relative to the average quantity of the set being
/// classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Low,
    Medium,
    High,
}

impl StockLevel {
    /// Classify a quantity against the set average: low below 10% of the
    /// average, medium from 10% up to 50%, high at 50% and above. With a
    /// zero average every non-negative quantity classifies high.
    pub fn classify(quantity: f64, average: f64) -> StockLevel {
        if quantity < 0.10 * average {
            StockLevel::Low
        } else if quantity < 0.50 * average {
            StockLevel::Medium
        } else {
            StockLevel::High
        }
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockLevel::Low => write!(f, "low"),
            StockLevel::Medium => write!(f, "medium"),
            StockLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for StockLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(StockLevel::Low),
            "medium" => Ok(StockLevel::Medium),
            "high" => Ok(StockLevel::High),
            _ => Err(format!(
                "Invalid stock level: {}. Use 'low', 'medium' or 'high'",
                s
            )),
        }
    }
}

/// Filter for listing products, built per invocation and never persisted
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub search: Option<String>,
    pub unit: Option<Unit>,
    pub stock: Option<StockLevel>,
    pub sort: SortField,
    pub dir: SortDir,
}

/// A product listing plus the stock average it was classified against
#[derive(Debug)]
pub struct Listing {
    pub products: Vec<Product>,
    /// Average quantity of the search/unit-filtered set, taken before any
    /// stock-level filter is applied
    pub average_quantity: f64,
}

/// Run a listing: search, unit filter, and sort happen in SQL; stock
/// bucketing is computed over the returned set.
pub fn run(store: &ProductStore, spec: &FilterSpec) -> Result<Listing, StoreError> {
    let products = store.list(spec)?;
    let average = average_quantity(&products);
    let products = match spec.stock {
        Some(level) => products
            .into_iter()
            .filter(|p| StockLevel::classify(p.quantity, average) == level)
            .collect(),
        None => products,
    };
    Ok(Listing {
        products,
        average_quantity: average,
    })
}

/// Average quantity across a set of products; zero for an empty set
pub fn average_quantity(products: &[Product]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(|p| p.quantity).sum::<f64>() / products.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::ProductFields;

    #[test]
    fn sort_field_parses_known_keys() {
        assert_eq!(SortField::parse("name"), SortField::Name);
        assert_eq!(SortField::parse("  QTY "), SortField::Quantity);
        assert_eq!(SortField::parse("created_at"), SortField::Created);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_id() {
        assert_eq!(SortField::parse("color"), SortField::Id);
        assert_eq!(SortField::parse(""), SortField::Id);
    }

    #[test]
    fn classify_buckets_against_the_average() {
        // avg 100: low below 10, medium from 10 up to 50, high from 50
        assert_eq!(StockLevel::classify(9.99, 100.0), StockLevel::Low);
        assert_eq!(StockLevel::classify(10.0, 100.0), StockLevel::Medium);
        assert_eq!(StockLevel::classify(49.99, 100.0), StockLevel::Medium);
        assert_eq!(StockLevel::classify(50.0, 100.0), StockLevel::High);
        assert_eq!(StockLevel::classify(500.0, 100.0), StockLevel::High);
    }

    #[test]
    fn classify_with_zero_average_is_high() {
        assert_eq!(StockLevel::classify(0.0, 0.0), StockLevel::High);
    }

    #[test]
    fn every_product_lands_in_exactly_one_bucket() {
        let quantities = [0.0, 1.0, 9.0, 25.0, 60.0, 300.0];
        let average = 100.0;
        for quantity in quantities {
            let level = StockLevel::classify(quantity, average);
            let matches = [StockLevel::Low, StockLevel::Medium, StockLevel::High]
                .iter()
                .filter(|l| **l == level)
                .count();
            assert_eq!(matches, 1);
        }
    }

    #[test]
    fn stock_filter_on_empty_set_is_empty() {
        let store = ProductStore::open_in_memory().unwrap();
        let spec = FilterSpec {
            stock: Some(StockLevel::Low),
            ..FilterSpec::default()
        };
        let listing = run(&store, &spec).unwrap();
        assert!(listing.products.is_empty());
        assert_eq!(listing.average_quantity, 0.0);
    }

    #[test]
    fn stock_filter_uses_the_filtered_set_average() {
        let store = ProductStore::open_in_memory().unwrap();
        let create = |name: &str, quantity: f64| {
            store
                .create(&ProductFields {
                    name: name.to_string(),
                    brand: "X".to_string(),
                    price: 1.0,
                    quantity,
                    unit: Unit::Dona,
                })
                .unwrap();
        };
        // avg 50.5: low below 5.05
        create("Scarce", 1.0);
        create("Plenty", 100.0);

        let spec = FilterSpec {
            stock: Some(StockLevel::Low),
            ..FilterSpec::default()
        };
        let listing = run(&store, &spec).unwrap();
        assert_eq!(listing.products.len(), 1);
        assert_eq!(listing.products[0].name, "Scarce");
        assert_eq!(listing.average_quantity, 50.5);
    }

    #[test]
    fn sort_dir_keywords() {
        assert_eq!(SortDir::Asc.keyword(), "ASC");
        assert_eq!(SortDir::Desc.keyword(), "DESC");
    }
}
