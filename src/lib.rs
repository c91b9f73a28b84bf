//! Stocktake: shop inventory CLI
//!
//! Manages a product inventory as a local SQLite database inside a
//! discoverable workspace, with two-phase spreadsheet import, export,
//! duplicate handling, and a statistics dashboard.

pub mod cli;
pub mod core;
pub mod import;
pub mod sheet;
