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

use crate::config::GlobalConfig;
use crate::error::LoadError;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Loaded content of one log file
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// File name used to tag the records (not the full path)
    pub name: String,
    pub content: String,
}

/// Reads log files from disk without blocking the caller
#[derive(Debug, Clone)]
pub struct LogFileLoader {
    accepted_extensions: Vec<String>,
}

impl Default for LogFileLoader {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

/// Display name for a path: its file name, or the whole path if it has none
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

impl LogFileLoader {
    pub const fn new(accepted_extensions: Vec<String>) -> Self {
        Self {
            accepted_extensions,
        }
    }

    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.accepted_extensions.clone())
    }

    /// Whether `path` has one of the accepted extensions (case-insensitive)
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.accepted_extensions
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(ext))
            })
    }

    fn check_extension(&self, path: &Path) -> Result<(), LoadError> {
        if self.accepts(path) {
            Ok(())
        } else {
            Err(LoadError::UnsupportedExtension {
                path: path.to_path_buf(),
                accepted: self.accepted_extensions.join(", "),
            })
        }
    }

    /// Read the whole file into memory.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so a stray binary byte
    /// costs one line instead of the whole file.
    pub async fn read(&self, path: PathBuf) -> Result<LoadedFile, LoadError> {
        self.check_extension(&path)?;

        let start = Instant::now();
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            tracing::error!("Cannot read {}: {source}", path.display());
            LoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        tracing::info!(
            "File I/O took {:?} to read {} bytes from {}",
            start.elapsed(),
            bytes.len(),
            path.display()
        );

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("{} is not valid UTF-8, decoding lossily", path.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        Ok(LoadedFile {
            name: display_name(&path),
            content,
        })
    }
}
