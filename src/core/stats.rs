//! Inventory statistics
//!
//! Metrics are computed from store aggregates. A failure anywhere degrades
//! to an all-zero `Statistics` carried inside the error, so the dashboard
//! always has something to render.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::store::{ProductStore, StoreError};

/// Absolute low-stock threshold used when the average quantity is zero
const LOW_STOCK_FALLBACK: f64 = 10.0;

/// Absolute high-value threshold used when the average price is zero
const HIGH_VALUE_FALLBACK: f64 = 10_000.0;

/// Growth window length in days
const GROWTH_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_products: u64,
    /// Sum of price times quantity across the inventory
    pub total_value: f64,
    pub average_price: f64,
    pub average_quantity: f64,
    /// Products with quantity below half the average quantity
    pub low_stock_count: u64,
    pub low_stock_pct: f64,
    /// Products priced above 1.5 times the average price
    pub high_value_count: u64,
    pub high_value_pct: f64,
    /// Created in the trailing 30-day window
    pub recent_count: u64,
    /// Created in the 30 days before that
    pub previous_count: u64,
    /// recent_count minus previous_count; negative when additions slowed
    pub net_growth: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Statistics collection failed; `fallback` still carries a renderable
/// all-zero value.
#[derive(Debug, Error)]
#[error("statistics unavailable: {reason}")]
pub struct StatsDegraded {
    pub reason: String,
    pub fallback: Statistics,
}

/// Collect inventory statistics as of `now`
pub fn collect(store: &ProductStore, now: DateTime<Utc>) -> Result<Statistics, StatsDegraded> {
    gather(store, now).map_err(|e| StatsDegraded {
        reason: e.to_string(),
        fallback: Statistics::default(),
    })
}

/// Low-stock cutoff: half the average quantity, or an absolute fallback
/// when the average is zero
pub fn low_stock_threshold(avg_quantity: f64) -> f64 {
    if avg_quantity > 0.0 {
        avg_quantity / 2.0
    } else {
        LOW_STOCK_FALLBACK
    }
}

/// High-value cutoff: 1.5 times the average price, or an absolute fallback
/// when the average is zero
pub fn high_value_threshold(avg_price: f64) -> f64 {
    if avg_price > 0.0 {
        avg_price * 1.5
    } else {
        HIGH_VALUE_FALLBACK
    }
}

fn gather(store: &ProductStore, now: DateTime<Utc>) -> Result<Statistics, StoreError> {
    let totals = store.totals()?;
    if totals.count == 0 {
        return Ok(Statistics::default());
    }

    let low_threshold = low_stock_threshold(totals.avg_quantity);
    let high_threshold = high_value_threshold(totals.avg_price);
    let low_stock = store.count_quantity_below(low_threshold)?;
    let high_value = store.count_price_above(high_threshold)?;

    let window_start = now - Duration::days(GROWTH_WINDOW_DAYS);
    let previous_start = now - Duration::days(2 * GROWTH_WINDOW_DAYS);
    let recent = store.created_between(window_start, now)?;
    let previous = store.created_between(previous_start, window_start)?;

    Ok(Statistics {
        total_products: totals.count,
        total_value: totals.total_value,
        average_price: totals.avg_price,
        average_quantity: totals.avg_quantity,
        low_stock_count: low_stock,
        low_stock_pct: pct(low_stock, totals.count),
        high_value_count: high_value,
        high_value_pct: pct(high_value, totals.count),
        recent_count: recent,
        previous_count: previous,
        net_growth: recent as i64 - previous as i64,
        last_updated: store.last_updated()?,
    })
}

fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::{ProductFields, Unit};

    fn create(store: &ProductStore, name: &str, price: f64, quantity: f64) -> i64 {
        store
            .create(&ProductFields {
                name: name.to_string(),
                brand: "X".to_string(),
                price,
                quantity,
                unit: Unit::Dona,
            })
            .unwrap()
            .id
    }

    #[test]
    fn empty_store_yields_all_zero_metrics() {
        let store = ProductStore::open_in_memory().unwrap();
        let stats = collect(&store, Utc::now()).unwrap();
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.low_stock_pct, 0.0);
        assert!(stats.last_updated.is_none());
    }

    #[test]
    fn thresholds_follow_the_averages() {
        let store = ProductStore::open_in_memory().unwrap();
        // avg price 30 -> high-value above 45; avg qty 10 -> low-stock below 5
        create(&store, "Cheap", 10.0, 2.0);
        create(&store, "Dear", 50.0, 18.0);

        let stats = collect(&store, Utc::now()).unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_value, 10.0 * 2.0 + 50.0 * 18.0);
        assert_eq!(stats.average_price, 30.0);
        assert_eq!(stats.average_quantity, 10.0);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.low_stock_pct, 50.0);
        assert_eq!(stats.high_value_count, 1);
        assert_eq!(stats.high_value_pct, 50.0);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn zero_averages_use_absolute_fallbacks() {
        let store = ProductStore::open_in_memory().unwrap();
        // all prices and quantities zero
        create(&store, "A", 0.0, 0.0);
        create(&store, "B", 0.0, 0.0);

        let stats = collect(&store, Utc::now()).unwrap();
        // fallback thresholds: quantity < 10, price > 10000
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.high_value_count, 0);
    }

    #[test]
    fn growth_compares_adjacent_windows() {
        let store = ProductStore::open_in_memory().unwrap();
        let now = Utc::now();
        let fresh = create(&store, "Fresh", 1.0, 1.0);
        let old = create(&store, "Old", 1.0, 1.0);
        let ancient = create(&store, "Ancient", 1.0, 1.0);
        store.set_created_at(fresh, now - Duration::days(5));
        store.set_created_at(old, now - Duration::days(45));
        store.set_created_at(ancient, now - Duration::days(90));

        let stats = collect(&store, now).unwrap();
        assert_eq!(stats.recent_count, 1);
        assert_eq!(stats.previous_count, 1);
        assert_eq!(stats.net_growth, 0);
    }

    #[test]
    fn net_growth_can_be_negative() {
        let store = ProductStore::open_in_memory().unwrap();
        let now = Utc::now();
        let a = create(&store, "A", 1.0, 1.0);
        let b = create(&store, "B", 1.0, 1.0);
        store.set_created_at(a, now - Duration::days(40));
        store.set_created_at(b, now - Duration::days(50));

        let stats = collect(&store, now).unwrap();
        assert_eq!(stats.recent_count, 0);
        assert_eq!(stats.previous_count, 2);
        assert_eq!(stats.net_growth, -2);
    }

    #[test]
    fn failures_degrade_to_the_zero_fallback() {
        let store = ProductStore::open_in_memory().unwrap();
        create(&store, "A", 1.0, 1.0);
        store.break_schema();

        let err = collect(&store, Utc::now()).unwrap_err();
        assert_eq!(err.fallback, Statistics::default());
        assert!(!err.reason.is_empty());
    }
}
