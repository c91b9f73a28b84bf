//! Shared helpers for CLI commands

use clap::ValueEnum;
use miette::Result;

use crate::cli::args::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::store::ProductStore;
use crate::core::workspace::Workspace;

/// Locate the workspace, honoring the global --workspace override
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::at(path),
        None => Workspace::discover(),
    };
    workspace.map_err(|e| miette::miette!("{}", e))
}

/// Open the product store inside a workspace
pub fn open_store(workspace: &Workspace) -> Result<ProductStore> {
    ProductStore::open(&workspace.db_path()).map_err(|e| miette::miette!("{}", e))
}

/// Resolve the effective output format: the explicit flag, then the
/// configured default, then the human table
pub fn resolve_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    match global.format {
        OutputFormat::Auto => config
            .default_format
            .as_deref()
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .unwrap_or(OutputFormat::Tsv),
        format => format,
    }
}

/// Truncate a string to a maximum display length, appending "..." when cut
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a field for CSV output (RFC 4180)
pub fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a number without a fractional part when it is whole
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
