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

use crate::parser::{BatchId, LineParser, LogRecord, RecordKey};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Information about a loaded file for UI display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    /// File name as given at ingestion
    pub name: String,
    /// Number of records the file contributed
    pub records: usize,
}

/// Provenance of one ingested file
#[derive(Debug)]
struct SourceData {
    batch: BatchId,
    /// Keys of the records this file produced
    keys: HashSet<RecordKey>,
}

/// Central storage for records from one or more files.
///
/// Records are kept in ingestion order: each file's batch is sorted on its
/// own and appended. The provenance map partitions the stored keys by file,
/// so a file can be removed without touching anything else.
///
/// Not synchronized. All mutation goes through one owner, see
/// [`SessionWorker`](crate::core::SessionWorker).
#[derive(Debug, Default)]
pub struct LogStore {
    parser: LineParser,
    records: Vec<LogRecord>,
    sources: IndexMap<String, SourceData>,
    next_batch: u64,
}

/// Landing pages first, then by raw timestamp text
pub fn batch_order(a: &LogRecord, b: &LogRecord) -> Ordering {
    b.is_landing_page
        .cmp(&a.is_landing_page)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

impl LogStore {
    /// Create a new empty `LogStore`
    pub fn new(parser: LineParser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    pub const fn parser(&self) -> &LineParser {
        &self.parser
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Parse a file's content and append its records.
    ///
    /// Returns the number of records added. A file that yields no records is
    /// not tracked. Ingesting a name that is already loaded replaces the
    /// earlier records of that name.
    pub fn ingest(&mut self, file_name: &str, content: &str) -> usize {
        profiling::scope!("LogStore::ingest");
        if self.sources.contains_key(file_name) {
            let replaced = self.remove(file_name);
            tracing::info!("Reloading {file_name}, replaced {replaced} existing records");
        }

        let batch = BatchId(self.next_batch);
        self.next_batch += 1;

        let mut records = self.parser.parse_content(content, batch);
        if records.is_empty() {
            tracing::warn!("No valid log entries found in {file_name}");
            return 0;
        }

        {
            profiling::scope!("sort_batch");
            // Stable: landing pages keep their file order among equal timestamps
            records.sort_by(batch_order);
        }

        let keys: HashSet<RecordKey> = records.iter().map(|r| r.key).collect();
        let count = records.len();
        let landing = records.iter().filter(|r| r.is_landing_page).count();
        self.records.extend(records);
        self.sources
            .insert(file_name.to_string(), SourceData { batch, keys });

        tracing::info!(
            "Ingested {count} records ({landing} landing pages) from {file_name} as batch {}",
            batch.0
        );
        count
    }

    /// Drop every record that came from `file_name`.
    ///
    /// Returns how many records were removed (0 for an unknown file).
    pub fn remove(&mut self, file_name: &str) -> usize {
        profiling::scope!("LogStore::remove");
        let Some(source) = self.sources.shift_remove(file_name) else {
            tracing::debug!("Remove requested for unknown file {file_name}");
            return 0;
        };

        let before = self.records.len();
        self.records.retain(|r| !source.keys.contains(&r.key));
        let removed = before - self.records.len();

        tracing::info!(
            "Removed {removed} records from {file_name} (batch {})",
            source.batch.0
        );
        removed
    }

    /// Forget all files and records
    pub fn clear(&mut self) {
        let total = self.records.len();
        self.records.clear();
        self.sources.clear();
        tracing::info!("Cleared {total} records");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All records, in ingestion order
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Get total number of records across all files
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_file(&self, file_name: &str) -> bool {
        self.sources.contains_key(file_name)
    }

    /// Loaded files in load order, with their record counts
    pub fn get_source_info(&self) -> Vec<SourceInfo> {
        self.sources
            .iter()
            .map(|(name, source)| SourceInfo {
                name: name.clone(),
                records: source.keys.len(),
            })
            .collect()
    }

    /// Records that came from `file_name`, in stored order
    pub fn records_of(&self, file_name: &str) -> Vec<&LogRecord> {
        self.sources.get(file_name).map_or_else(Vec::new, |source| {
            self.records
                .iter()
                .filter(|r| source.keys.contains(&r.key))
                .collect()
        })
    }
}
