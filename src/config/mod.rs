// VisitLog - GPL-3.0-or-later
// This file is part of VisitLog.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// VisitLog is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// VisitLog is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with VisitLog.  If not, see <https://www.gnu.org/licenses/>.

use crate::parser::FieldSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration stored in config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Where each field sits in a log line
    pub schema: FieldSchema,

    /// Origin of the site the logs belong to; referrers from it are internal
    pub app_origin: Option<String>,

    /// File extensions accepted for loading (without the dot)
    pub accepted_extensions: Vec<String>,

    /// Keep records with unreadable timestamps visible under a date filter
    pub retain_unparsed_dates: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            schema: FieldSchema::default(),
            app_origin: None,
            accepted_extensions: vec!["log".to_string(), "txt".to_string()],
            retain_unparsed_dates: true,
        }
    }
}

impl GlobalConfig {
    /// Get the path to the global config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("visitlog").join("config.json"))
    }

    /// Load global config from disk, returning defaults if not found
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring config {}: {e}", path.display());
                Self::default()
            }),
            _ => {
                tracing::info!("No global config found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {e}"))?;
        tracing::info!(
            "Loaded config from {} (full tier at {} tokens)",
            path.display(),
            config.schema.min_tokens
        );
        Ok(config)
    }

    /// Save global config to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path().ok_or("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e}"))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {e}"))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write config file: {e}"))?;

        tracing::info!("Saved global config to {}", path.display());
        Ok(())
    }
}
