//! Workspace discovery and initialization
//!
//! A workspace is any directory containing a `.stocktake/` marker. Commands
//! discover it by walking up from the current directory, so they work from
//! anywhere inside the tree.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const WORKSPACE_DIR: &str = ".stocktake";
const DB_FILE: &str = "inventory.db";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a stocktake workspace (searched from {searched_from:?}). Run 'stocktake init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("stocktake workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(String),
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Discover the workspace by walking up from the current directory.
    pub fn discover() -> Result<Self, WorkspaceError> {
        let cwd = std::env::current_dir().map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Self::discover_from(&cwd)
    }

    /// Discover the workspace by walking up from `start`.
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let start = start
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        let mut current = start.clone();
        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Workspace { root: current });
            }
            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start,
                });
            }
        }
    }

    /// Open the workspace rooted at an explicit path (the `--workspace`
    /// flag). No upward search happens here.
    pub fn at(root: &Path) -> Result<Self, WorkspaceError> {
        let root = root
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        if root.join(WORKSPACE_DIR).is_dir() {
            Ok(Workspace { root })
        } else {
            Err(WorkspaceError::NotFound {
                searched_from: root,
            })
        }
    }

    /// Initialize a new workspace at `path`. Fails if one already exists.
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        if path.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(path.to_path_buf()));
        }
        Self::create_skeleton(path)
    }

    /// Initialize a workspace at `path`, reusing whatever is already there.
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        Self::create_skeleton(path)
    }

    fn create_skeleton(path: &Path) -> Result<Self, WorkspaceError> {
        let marker = path.join(WORKSPACE_DIR);
        fs::create_dir_all(&marker).map_err(|e| WorkspaceError::Io(e.to_string()))?;

        let config = marker.join(CONFIG_FILE);
        if !config.exists() {
            fs::write(&config, default_config()).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }

        let root = path
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Ok(Workspace { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the SQLite database holding products and staged plans.
    pub fn db_path(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR).join(DB_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR).join(CONFIG_FILE)
    }
}

fn default_config() -> &'static str {
    r#"# stocktake workspace configuration
# Values here override the global config (~/.config/stocktake/config.yaml).

# Session key for staged imports (defaults to $STOCKTAKE_SESSION, then your
# user name)
# session: counter-1

# Default output format for list commands when --format is auto
# (yaml, tsv, json, csv, md, id)
# default_format: tsv

# Default export file name
# export_file: mahsulotlar.csv
"#
}
