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

//! # VisitLog
//!
//! Parses web server access logs into structured records and answers the
//! question "where did visitors land from?".
//!
//! Each line becomes a [`LogRecord`]: timestamp, client address, email, a
//! readable action (`GET /products?id=4`), the referrer, and whether the visit
//! was a landing page, i.e. reached from an external site. Lines that are too
//! short still produce a best-effort record; lines that are hopeless are
//! dropped without failing the file.
//!
//! Records from several files are held in a [`LogStore`] that remembers which
//! file produced which record, so a file can be unloaded again. A [`Query`]
//! narrows them down by visitor (email or IP substring) and time range.
//!
//! ```
//! use visitlog::{LogStore, Query};
//!
//! let mut store = LogStore::default();
//! let added = store.ingest(
//!     "u_ex240115.log",
//!     "2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1\n",
//! );
//! assert_eq!(added, 1);
//!
//! let visible = Query::new("192.168", None).apply(store.records());
//! assert!(visible[0].is_landing_page);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod parser;

pub use config::GlobalConfig;
pub use crate::core::{
    query, DateRange, LogFileLoader, LogStore, Query, Session, SessionHandle, SessionWorker,
    Snapshot, SourceInfo, Status,
};
pub use error::{LineError, LoadError};
pub use parser::{
    extract_email, extract_referrer, tokenize, FieldSchema, LineParser, LogRecord, RecordKey,
};
