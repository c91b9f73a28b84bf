//! Product records and measurement units

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measurement unit for product quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Kilograms
    Kg,
    /// Pieces (the count unit)
    Dona,
    /// Meters
    Metr,
    /// Cubic meters
    Kub,
    /// Liters
    Litr,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Kg, Unit::Dona, Unit::Metr, Unit::Kub, Unit::Litr];

    /// Resolve a raw spreadsheet cell to a unit. The cell is trimmed and
    /// lowercased, then looked up in a fixed synonym table. Anything
    /// unrecognized resolves to `dona`; resolution never fails.
    pub fn resolve(raw: &str) -> Unit {
        match raw.trim().to_lowercase().as_str() {
            "kg" | "kilo" | "kilogram" | "kilogramm" => Unit::Kg,
            "dona" | "pc" | "pcs" | "piece" | "count" => Unit::Dona,
            "metr" | "m" | "meter" | "metre" => Unit::Metr,
            "kub" | "m3" | "cube" | "cubic" => Unit::Kub,
            "litr" | "l" | "liter" | "litre" => Unit::Litr,
            _ => Unit::Dona,
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::Dona
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Kg => write!(f, "kg"),
            Unit::Dona => write!(f, "dona"),
            Unit::Metr => write!(f, "metr"),
            Unit::Kub => write!(f, "kub"),
            Unit::Litr => write!(f, "litr"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "dona" => Ok(Unit::Dona),
            "metr" => Ok(Unit::Metr),
            "kub" => Ok(Unit::Kub),
            "litr" => Ok(Unit::Litr),
            _ => Err(format!(
                "Invalid unit: {}. Use 'kg', 'dona', 'metr', 'kub' or 'litr'",
                s
            )),
        }
    }
}

/// A single inventory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Storage-assigned identifier
    pub id: i64,
    /// Product name
    pub name: String,
    /// Brand or manufacturer
    pub brand: String,
    /// Unit price in local currency
    pub price: f64,
    /// Quantity on hand, in `unit`s (divisible units allow fractions)
    pub quantity: f64,
    /// Measurement unit
    pub unit: Unit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-controlled fields of a product, used when inserting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub quantity: f64,
    pub unit: Unit,
}
