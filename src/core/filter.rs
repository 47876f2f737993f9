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

//! Query engine: text and date-range filtering over stored records.
//!
//! Everything here is a pure function of the records and the filter values,
//! so the visible set can be recomputed from scratch whenever anything changes.

use crate::parser::LogRecord;
use chrono::{DateTime, Duration, Local, SubsecRound};
use serde::Serialize;

/// An inclusive range of whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DateRange {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// True if `date` lies within the start second through the end of the end second.
    ///
    /// Both bounds are inclusive at one-second granularity: a visit logged at
    /// exactly the start second is kept, even when `start` carries a fraction.
    pub fn contains(&self, date: DateTime<Local>) -> bool {
        let start = self.start.trunc_subsecs(0);
        let end = self.end.trunc_subsecs(0) + Duration::seconds(1);
        start <= date && date < end
    }
}

/// Current filter values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    /// Case-insensitive substring matched against email and client address
    pub search_term: String,
    pub date_range: Option<DateRange>,
    /// Keep records with unparsed timestamps when a date range is active
    pub retain_unparsed_dates: bool,
    pub landing_only: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            date_range: None,
            retain_unparsed_dates: true,
            landing_only: false,
        }
    }
}

impl Query {
    pub fn new(search_term: &str, date_range: Option<DateRange>) -> Self {
        Self {
            search_term: search_term.to_string(),
            date_range,
            ..Self::default()
        }
    }

    /// Whether any filter would hide records
    pub const fn is_active(&self) -> bool {
        !self.search_term.is_empty() || self.date_range.is_some() || self.landing_only
    }

    /// Reset to the state of a fresh session, keeping the date policy
    pub fn reset(&mut self) {
        *self = Self {
            retain_unparsed_dates: self.retain_unparsed_dates,
            ..Self::default()
        };
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.matches_text(record) && self.matches_date(record) && self.matches_landing(record)
    }

    fn matches_text(&self, record: &LogRecord) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        record.email.to_lowercase().contains(&needle)
            || record.client_ip.to_lowercase().contains(&needle)
    }

    fn matches_date(&self, record: &LogRecord) -> bool {
        let Some(range) = &self.date_range else {
            return true;
        };
        match record.reliable_date() {
            Some(date) => range.contains(date),
            None if self.retain_unparsed_dates => true,
            None => range.contains(record.formatted_date),
        }
    }

    const fn matches_landing(&self, record: &LogRecord) -> bool {
        !self.landing_only || record.is_landing_page
    }

    /// Visible subset of `records`, preserving order
    pub fn apply<'a>(&self, records: &'a [LogRecord]) -> Vec<&'a LogRecord> {
        profiling::scope!("Query::apply");
        if !self.is_active() {
            return records.iter().collect();
        }
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Filter `records` by search term and optional date range
pub fn query<'a>(
    records: &'a [LogRecord],
    search_term: &str,
    date_range: Option<DateRange>,
) -> Vec<&'a LogRecord> {
    Query::new(search_term, date_range).apply(records)
}
