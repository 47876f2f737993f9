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

//! The canonical record produced for every accepted access-log line.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Placeholder for a timestamp or action that could not be recovered
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder for a missing or non-URL referrer
pub const NO_REFERRER: &str = "-";
/// Placeholder for a line without an email address
pub const ANONYMOUS: &str = "anonymous";
/// Placeholder for a line without a client address
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identifier of one ingestion batch, issued by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct BatchId(pub u64);

/// Identity of a record: the batch it was ingested in plus its line index in
/// the source file. Unique across every record held by one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordKey {
    pub batch: BatchId,
    pub line: usize,
}

impl RecordKey {
    pub const fn new(batch: BatchId, line: usize) -> Self {
        Self { batch, line }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.batch.0, self.line)
    }
}

/// Which extraction tier produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    /// Every positional field was available
    Full,
    /// Too few tokens; only client address and a leading referrer were recovered
    Degraded,
}

/// One parsed access-log line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub key: RecordKey,
    /// Timestamp tokens exactly as they appeared, or `N/A`
    pub timestamp: String,
    /// Parsed timestamp. Set to the parse time when `timestamp_parsed` is false.
    pub formatted_date: DateTime<Local>,
    pub timestamp_parsed: bool,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    pub email: String,
    pub action: String,
    /// Request path the action was built from (None for degraded records)
    #[serde(skip)]
    pub uri: Option<String>,
    pub referrer: String,
    pub is_landing_page: bool,
    pub tier: ParseTier,
}

impl LogRecord {
    /// Whether the record came from the best-effort path
    pub fn is_degraded(&self) -> bool {
        self.tier == ParseTier::Degraded
    }

    /// The parsed date, if the raw timestamp was actually understood
    pub fn reliable_date(&self) -> Option<DateTime<Local>> {
        if self.timestamp_parsed {
            Some(self.formatted_date)
        } else {
            None
        }
    }
}
