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

//! Declarative description of where each field lives in a tokenized line.
//!
//! Log layouts differ between servers and configurations. Instead of
//! hardcoding column indices, the parser reads them from a [`FieldSchema`],
//! which can be loaded from the config file.

use serde::{Deserialize, Serialize};

/// Position of a token in a whitespace-split line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPos {
    /// Zero-based index from the start
    Index(usize),
    /// One-based offset from the end (`FromEnd(1)` is the last token)
    FromEnd(usize),
}

impl TokenPos {
    /// Resolve against a token slice; `None` if out of range
    pub fn get<'a>(self, tokens: &[&'a str]) -> Option<&'a str> {
        let idx = match self {
            Self::Index(i) => i,
            Self::FromEnd(0) => return None,
            Self::FromEnd(n) => tokens.len().checked_sub(n)?,
        };
        tokens.get(idx).copied()
    }
}

/// How the referrer of a full-tier line is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "pos")]
pub enum ReferrerRule {
    /// First http(s) URL anywhere in the raw line
    Pattern,
    /// A fixed token, accepted only if it is an absolute URL
    Token(TokenPos),
}

/// Mapping from semantic fields to token positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    /// Lines with at least this many tokens use full extraction
    pub min_tokens: usize,
    /// Lines with fewer tokens than this are rejected
    pub degraded_min_tokens: usize,
    pub date: TokenPos,
    pub time: TokenPos,
    pub method: TokenPos,
    pub uri: TokenPos,
    pub query: TokenPos,
    pub referrer: ReferrerRule,
    pub client_ip: TokenPos,
    /// Label shown instead of `/` in the action column
    pub home_page_label: Option<String>,
}

impl FieldSchema {
    /// W3C extended layout (`date time s-ip cs-method cs-uri-stem cs-uri-query ...`)
    /// with the referrer found by pattern and the client address last.
    pub const fn w3c() -> Self {
        Self {
            min_tokens: 10,
            degraded_min_tokens: 2,
            date: TokenPos::Index(0),
            time: TokenPos::Index(1),
            method: TokenPos::Index(3),
            uri: TokenPos::Index(4),
            query: TokenPos::Index(5),
            referrer: ReferrerRule::Pattern,
            client_ip: TokenPos::FromEnd(1),
            home_page_label: None,
        }
    }

    /// Same layout, but requires 12 tokens, takes the referrer from the
    /// second-to-last column and renders the root path as "Home Page".
    pub fn strict() -> Self {
        Self {
            min_tokens: 12,
            referrer: ReferrerRule::Token(TokenPos::FromEnd(2)),
            home_page_label: Some("Home Page".to_string()),
            ..Self::w3c()
        }
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::w3c()
    }
}
