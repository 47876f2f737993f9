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

//! A viewing session: the record store together with the active filters.

use crate::config::GlobalConfig;
use crate::core::filter::{DateRange, Query};
use crate::core::log_store::{LogStore, SourceInfo};
use crate::parser::{LineParser, LogRecord};
use serde::Serialize;
use std::fmt;

/// User-facing outcome of a session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    FileProcessed { file: String, count: usize },
    EmptyFile { file: String },
    NoValidEntries { file: String },
    FileRemoved { file: String, count: usize },
    Cleared,
    ReadFailed { file: String, error: String },
}

impl Status {
    /// Whether this should be shown as an error
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyFile { .. } | Self::NoValidEntries { .. } | Self::ReadFailed { .. }
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileProcessed { file, count } => {
                write!(f, "Processed {count} entries from {file}")
            }
            Self::EmptyFile { file } => write!(f, "Empty file content: {file}"),
            Self::NoValidEntries { file } => write!(f, "No valid log entries found in {file}"),
            Self::FileRemoved { file, count } => write!(f, "Removed {count} entries from {file}"),
            Self::Cleared => f.write_str("Cleared all log data"),
            Self::ReadFailed { file, error } => write!(f, "Failed to read {file}: {error}"),
        }
    }
}

/// Point-in-time view of a session for presentation
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub visible: Vec<LogRecord>,
    pub total: usize,
    pub files: Vec<SourceInfo>,
    pub query: Query,
}

impl Snapshot {
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// "Showing V of T log entries"
    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} log entries",
            self.visible.len(),
            self.total
        )
    }
}

/// Records plus filters. The visible set is always derived, never stored.
#[derive(Debug, Default)]
pub struct Session {
    store: LogStore,
    query: Query,
}

impl Session {
    pub fn new(parser: LineParser) -> Self {
        Self {
            store: LogStore::new(parser),
            query: Query::default(),
        }
    }

    pub fn from_config(config: &GlobalConfig) -> Self {
        let parser = LineParser::new(config.schema.clone())
            .with_app_origin(config.app_origin.as_deref());
        let mut session = Self::new(parser);
        session.query.retain_unparsed_dates = config.retain_unparsed_dates;
        session
    }

    pub const fn store(&self) -> &LogStore {
        &self.store
    }

    pub const fn query(&self) -> &Query {
        &self.query
    }

    // ========================================================================
    // File Management
    // ========================================================================

    /// Ingest one file's content and report the outcome
    pub fn ingest(&mut self, file_name: &str, content: &str) -> Status {
        if content.is_empty() {
            tracing::warn!("{file_name} is empty");
            return Status::EmptyFile {
                file: file_name.to_string(),
            };
        }
        match self.store.ingest(file_name, content) {
            0 => Status::NoValidEntries {
                file: file_name.to_string(),
            },
            count => Status::FileProcessed {
                file: file_name.to_string(),
                count,
            },
        }
    }

    pub fn remove(&mut self, file_name: &str) -> Status {
        Status::FileRemoved {
            file: file_name.to_string(),
            count: self.store.remove(file_name),
        }
    }

    /// Drop all records and reset the filters
    pub fn clear(&mut self) -> Status {
        self.store.clear();
        self.query.reset();
        Status::Cleared
    }

    // ========================================================================
    // Filters
    // ========================================================================

    pub fn set_search_term(&mut self, term: &str) {
        term.clone_into(&mut self.query.search_term);
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.query.date_range = range;
    }

    pub fn set_landing_only(&mut self, landing_only: bool) {
        self.query.landing_only = landing_only;
    }

    /// Records passing the current filters, in stored order
    pub fn visible(&self) -> Vec<&LogRecord> {
        self.query.apply(self.store.records())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            visible: self.visible().into_iter().cloned().collect(),
            total: self.store.total_records(),
            files: self.store.get_source_info(),
            query: self.query.clone(),
        }
    }
}
