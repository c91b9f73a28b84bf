//! Core module - workspace, configuration, records, plans, and queries

pub mod config;
pub mod plan;
pub mod product;
pub mod query;
pub mod stats;
pub mod store;
pub mod workspace;

pub use config::Config;
pub use plan::{PlanError, PlanStore};
pub use product::{Product, ProductFields, Unit};
pub use query::{FilterSpec, Listing, SortDir, SortField, StockLevel};
pub use stats::{Statistics, StatsDegraded};
pub use store::{ProductStore, StoreError, StoreTotals};
pub use workspace::{Workspace, WorkspaceError};
