//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::workspace::Workspace;

/// Stocktake configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session key used for staged imports
    pub session: Option<String>,

    /// Default output format when --format is auto
    pub default_format: Option<String>,

    /// Default export file name
    pub export_file: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/stocktake/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_config(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.stocktake/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read_config(&ws.config_path()) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(session) = std::env::var("STOCKTAKE_SESSION") {
            if !session.is_empty() {
                config.session = Some(session);
            }
        }
        if let Ok(format) = std::env::var("STOCKTAKE_FORMAT") {
            if !format.is_empty() {
                config.default_format = Some(format);
            }
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stocktake")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_config(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        serde_yml::from_str(&contents).ok()
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.export_file.is_some() {
            self.export_file = other.export_file;
        }
    }

    /// Get the session key, falling back to the login name
    pub fn session(&self) -> String {
        if let Some(ref session) = self.session {
            return session.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|user| !user.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }

    /// Get the export file name, falling back to the legacy default
    pub fn export_file(&self) -> String {
        self.export_file
            .clone()
            .unwrap_or_else(|| "mahsulotlar.csv".to_string())
    }
}
