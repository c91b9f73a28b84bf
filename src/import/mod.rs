//! Two-phase spreadsheet import: reconcile a sheet into a staged plan,
//! then apply the plan row by row

pub mod apply;
pub mod columns;
pub mod reconcile;

pub use apply::{apply, ApplyError, CommitOutcome};
pub use columns::{Field, MissingColumns};
pub use reconcile::{reconcile, Disposition, ImportError, ImportRow};
