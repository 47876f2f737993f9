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

//! Error types for file loading and line parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the content of one log file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type {} (accepted: {accepted})", path.display())]
    UnsupportedExtension { path: PathBuf, accepted: String },
}

/// Why a single line did not yield a record.
///
/// Never leaves the parser: rejected lines are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("too few tokens: got {got}, need at least {need}")]
    TooFewTokens { got: usize, need: usize },

    #[error("no token for field '{field}'")]
    MissingField { field: &'static str },
}
