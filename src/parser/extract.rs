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

//! Pattern-based field extractors.
//!
//! These scan the whole raw line and never look at token positions, so they
//! keep working when the positional layout of a line is off.

use super::record::{ANONYMOUS, NO_REFERRER};
use fancy_regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._-]+@[a-z0-9._-]+\.[a-z0-9_-]+").expect("valid regex literal")
});

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").expect("valid regex literal"));

fn first_match<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    // A backtracking limit error counts as no match
    pattern.find(line).ok().flatten().map(|m| m.as_str())
}

/// Return the first email address in `line`, or `anonymous`
pub fn extract_email(line: &str) -> &str {
    first_match(&EMAIL_PATTERN, line).unwrap_or(ANONYMOUS)
}

/// Return the first `http://` or `https://` URL in `line`, or `-`
pub fn extract_referrer(line: &str) -> &str {
    first_match(&URL_PATTERN, line).unwrap_or(NO_REFERRER)
}

/// Check whether a single token is an absolute http(s) URL
pub fn is_absolute_url(token: &str) -> bool {
    let lower = token.get(..8).unwrap_or(token).to_ascii_lowercase();
    (lower.starts_with("http://") && token.len() > 7)
        || (lower.starts_with("https://") && token.len() > 8)
}

/// Scheme and authority of an absolute URL, lowercased (`https://example.com:8080`)
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if scheme.is_empty() || authority.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{authority}").to_ascii_lowercase())
}
