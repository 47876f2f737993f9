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

//! Access-log line parsing.
//!
//! Raw file text goes through [`tokenize`], and every surviving line is turned
//! into a [`LogRecord`] by a [`LineParser`] configured with a [`FieldSchema`].

pub mod extract;
pub mod record;
pub mod schema;

use crate::error::LineError;
use chrono::{DateTime, Local, NaiveDateTime};
use extract::{is_absolute_url, origin_of};
use record::{ANONYMOUS, NOT_AVAILABLE, NO_REFERRER, UNKNOWN_CLIENT};

pub use extract::{extract_email, extract_referrer};
pub use record::{BatchId, LogRecord, ParseTier, RecordKey};
pub use schema::{FieldSchema, ReferrerRule, TokenPos};

/// Format of the joined date and time tokens
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Split file content into parseable lines.
///
/// Yields `(line_index, line)` where `line_index` is the zero-based position of
/// the line in the file. Blank lines and lines starting with `#` are skipped.
pub fn tokenize(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp in local time
pub fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()?
        .and_local_timezone(Local)
        .earliest()
}

/// Turns raw lines into records according to a field schema
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    schema: FieldSchema,
    /// Origin of the application serving the pages (e.g. `https://shop.example.com`)
    app_origin: Option<String>,
}

impl LineParser {
    pub const fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            app_origin: None,
        }
    }

    /// Treat referrers from this origin as internal navigation
    #[must_use]
    pub fn with_app_origin(mut self, origin: Option<&str>) -> Self {
        self.app_origin = origin.and_then(origin_of);
        self
    }

    pub const fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Parse every line of a file's content into records for one batch.
    ///
    /// Rejected lines are dropped; the result may be empty.
    pub fn parse_content(&self, content: &str, batch: BatchId) -> Vec<LogRecord> {
        profiling::scope!("LineParser::parse_content");
        let mut rejected = 0usize;
        let records: Vec<LogRecord> = tokenize(content)
            .filter_map(|(index, line)| {
                let record = self.parse_line(line, RecordKey::new(batch, index));
                if record.is_none() {
                    rejected += 1;
                }
                record
            })
            .collect();

        if rejected > 0 {
            tracing::debug!(
                "Batch {}: {} lines parsed, {rejected} rejected",
                batch.0,
                records.len()
            );
        }
        records
    }

    /// Parse a single line, or `None` if it is rejected
    pub fn parse_line(&self, line: &str, key: RecordKey) -> Option<LogRecord> {
        match self.try_parse_line(line, key) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping malformed line {key} ({e}): {line:?}");
                None
            }
        }
    }

    fn try_parse_line(&self, line: &str, key: RecordKey) -> Result<LogRecord, LineError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        // A record needs at least one token, whatever the schema says
        let degraded_floor = self.schema.degraded_min_tokens.max(1);
        if tokens.len() >= self.schema.min_tokens {
            self.parse_full(line, &tokens, key)
        } else if tokens.len() >= degraded_floor {
            Ok(self.parse_degraded(&tokens, key))
        } else {
            Err(LineError::TooFewTokens {
                got: tokens.len(),
                need: degraded_floor,
            })
        }
    }

    fn parse_full(
        &self,
        line: &str,
        tokens: &[&str],
        key: RecordKey,
    ) -> Result<LogRecord, LineError> {
        let field = |pos: TokenPos, field: &'static str| {
            pos.get(tokens).ok_or(LineError::MissingField { field })
        };

        let timestamp = format!(
            "{} {}",
            field(self.schema.date, "date")?,
            field(self.schema.time, "time")?
        );
        let method = field(self.schema.method, "method")?;
        let uri = field(self.schema.uri, "uri")?;
        let query = match self.schema.query.get(tokens) {
            Some(q) if q != "-" => format!("?{q}"),
            _ => String::new(),
        };
        let client_ip = self.schema.client_ip.get(tokens).unwrap_or(UNKNOWN_CLIENT);

        let referrer = match self.schema.referrer {
            ReferrerRule::Pattern => extract_referrer(line),
            ReferrerRule::Token(pos) => pos
                .get(tokens)
                .filter(|t| is_absolute_url(t))
                .unwrap_or(NO_REFERRER),
        };

        let shown_uri = match &self.schema.home_page_label {
            Some(label) if uri == "/" => label.as_str(),
            _ => uri,
        };
        let action = format!("{method} {shown_uri}{query}");
        // Self-references are judged on the path as the action shows it
        let shown_path = shown_uri
            .split_once(' ')
            .map_or(shown_uri, |(first, _)| first);

        let parsed = parse_timestamp(&timestamp);
        Ok(LogRecord {
            key,
            formatted_date: parsed.unwrap_or_else(Local::now),
            timestamp_parsed: parsed.is_some(),
            timestamp,
            client_ip: client_ip.to_string(),
            email: extract_email(line).to_string(),
            action,
            is_landing_page: self.is_landing_page(referrer, Some(shown_path)),
            uri: Some(uri.to_string()),
            referrer: referrer.to_string(),
            tier: ParseTier::Full,
        })
    }

    fn parse_degraded(&self, tokens: &[&str], key: RecordKey) -> LogRecord {
        let client_ip = tokens.last().copied().unwrap_or(UNKNOWN_CLIENT);
        let referrer = tokens
            .first()
            .copied()
            .filter(|t| is_absolute_url(t))
            .unwrap_or(NO_REFERRER);

        LogRecord {
            key,
            timestamp: NOT_AVAILABLE.to_string(),
            formatted_date: Local::now(),
            timestamp_parsed: false,
            client_ip: client_ip.to_string(),
            email: ANONYMOUS.to_string(),
            action: NOT_AVAILABLE.to_string(),
            uri: None,
            is_landing_page: self.is_landing_page(referrer, None),
            referrer: referrer.to_string(),
            tier: ParseTier::Degraded,
        }
    }

    /// A visit is a landing page when it was reached from an external URL that
    /// does not point at the requested resource itself.
    ///
    /// `uri` is the requested path as shown in the action. With a home page
    /// label that is its first word, so `/` is not matched by every URL.
    pub fn is_landing_page(&self, referrer: &str, uri: Option<&str>) -> bool {
        if referrer == NO_REFERRER || !is_absolute_url(referrer) {
            return false;
        }
        if uri.is_some_and(|uri| referrer.contains(uri)) {
            return false;
        }
        match (&self.app_origin, origin_of(referrer)) {
            (Some(app), Some(origin)) => *app != origin,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const BATCH: BatchId = BatchId(7);

    fn parse(line: &str) -> Option<LogRecord> {
        LineParser::default().parse_line(line, RecordKey::new(BATCH, 0))
    }

    #[test]
    fn test_tokenize_skips_blank_and_comments() {
        let content = "#Software: IIS\n\n   \nfirst line\r\n#Fields: date time\nsecond line";
        let lines: Vec<_> = tokenize(content).collect();
        assert_eq!(lines, vec![(3, "first line\r"), (5, "second line")]);
    }

    #[test]
    fn test_tokenize_keeps_indented_hash() {
        let lines: Vec<_> = tokenize("  #not a comment").collect();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_full_line_external_referrer() {
        let line = "2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1";
        let rec = parse(line).expect("should parse full line");
        assert_eq!(rec.tier, ParseTier::Full);
        assert_eq!(rec.client_ip, "192.168.1.1");
        assert!(rec.action.contains('/'));
        assert_eq!(rec.referrer, "http://external.com/page");
        assert!(rec.is_landing_page);
        assert_eq!(rec.timestamp, "2024-01-15 10:30:00");
        assert!(rec.timestamp_parsed);
        assert_eq!(rec.formatted_date.year(), 2024);
        assert_eq!(rec.formatted_date.hour(), 10);
        assert_eq!(rec.email, "anonymous");
    }

    #[test]
    fn test_w3c_action_with_query() {
        let line = "2024-03-02 08:00:01 10.0.0.5 GET /products/42 color=red 443 bob@shop.io \
                    198.51.100.7 Mozilla/5.0 https://www.google.com/search 200 0 0 31 198.51.100.7";
        let rec = parse(line).expect("should parse");
        assert_eq!(rec.action, "GET /products/42?color=red");
        assert_eq!(rec.email, "bob@shop.io");
        assert_eq!(rec.referrer, "https://www.google.com/search");
        assert!(rec.is_landing_page);
    }

    #[test]
    fn test_w3c_action_without_query() {
        let line = "2024-03-02 08:00:01 10.0.0.5 POST /login - 443 - 203.0.113.9 curl/8 - 302 0 0 5 203.0.113.9";
        let rec = parse(line).expect("should parse");
        assert_eq!(rec.action, "POST /login");
        assert_eq!(rec.referrer, "-");
        assert!(!rec.is_landing_page);
    }

    #[test]
    fn test_referrer_pointing_at_same_uri_is_not_landing() {
        let line = "2024-03-02 08:00:01 10.0.0.5 GET /docs/intro - 443 - 1.1.1.1 UA \
                    http://other.site/docs/intro 200 1.1.1.1";
        let rec = parse(line).expect("should parse");
        assert_eq!(rec.referrer, "http://other.site/docs/intro");
        assert!(!rec.is_landing_page);
    }

    #[test]
    fn test_same_origin_referrer_is_not_landing() {
        let parser = LineParser::default().with_app_origin(Some("https://shop.example.com/"));
        let line = "2024-03-02 08:00:01 10.0.0.5 GET /cart - 443 - 1.1.1.1 UA \
                    https://SHOP.example.com/products 200 1.1.1.1";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 3)).expect("should parse");
        assert!(!rec.is_landing_page);

        let external = line.replace("SHOP.example.com", "news.example.org");
        let rec = parser.parse_line(&external, RecordKey::new(BATCH, 4)).expect("should parse");
        assert!(rec.is_landing_page);
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let line = "15/Jan/2024 10:30:00 x GET /a - 1 2 3 4 5.5.5.5";
        let before = Local::now();
        let rec = parse(line).expect("should parse");
        assert!(!rec.timestamp_parsed);
        assert_eq!(rec.timestamp, "15/Jan/2024 10:30:00");
        assert!(rec.formatted_date >= before);
        assert_eq!(rec.reliable_date(), None);
    }

    #[test]
    fn test_degraded_line() {
        let rec = parse("something odd 10.9.8.7").expect("should produce degraded record");
        assert_eq!(rec.tier, ParseTier::Degraded);
        assert_eq!(rec.timestamp, "N/A");
        assert_eq!(rec.action, "N/A");
        assert_eq!(rec.referrer, "-");
        assert_eq!(rec.client_ip, "10.9.8.7");
        assert_eq!(rec.email, "anonymous");
        assert!(!rec.is_landing_page);
        assert!(!rec.timestamp_parsed);
    }

    #[test]
    fn test_degraded_line_with_leading_url() {
        let rec = parse("https://ads.example.net/c 10.9.8.7").expect("should parse");
        assert_eq!(rec.tier, ParseTier::Degraded);
        assert_eq!(rec.referrer, "https://ads.example.net/c");
        assert!(rec.is_landing_page);
    }

    #[test]
    fn test_single_token_rejected() {
        assert!(parse("lonely").is_none());
        assert!(parse("   ").is_none());
    }

    #[test]
    fn test_strict_schema() {
        let parser = LineParser::new(FieldSchema::strict());
        let line = "2024-01-15 10:30:00 10.0.0.1 GET / - 443 - 1.2.3.4 UA http://ext.com/x 1.2.3.4";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 0)).expect("should parse");
        assert_eq!(rec.tier, ParseTier::Full);
        assert_eq!(rec.action, "GET Home Page");
        assert_eq!(rec.referrer, "http://ext.com/x");
        assert!(rec.is_landing_page);

        // Eleven tokens are not enough for the strict layout
        let short = "2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1";
        let rec = parser.parse_line(short, RecordKey::new(BATCH, 1)).expect("should parse");
        assert_eq!(rec.tier, ParseTier::Degraded);
    }

    #[test]
    fn test_strict_schema_home_page_from_external_referrer() {
        let parser = LineParser::new(FieldSchema::strict());
        let line = "2024-01-15 10:30:00 10.0.0.1 GET / - 443 - 1.2.3.4 UA http://external.com/page 192.168.1.1";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 0)).expect("should parse");
        assert_eq!(rec.action, "GET Home Page");
        assert_eq!(rec.uri.as_deref(), Some("/"));
        assert!(rec.is_landing_page);

        // A referrer naming the rendered page is a self-reference
        let line = "2024-01-15 10:30:00 10.0.0.1 GET / - 443 - 1.2.3.4 UA http://ext.com/Home 192.168.1.1";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 1)).expect("should parse");
        assert!(!rec.is_landing_page);

        // Other paths still use the raw URI
        let line = "2024-01-15 10:30:00 10.0.0.1 GET /shop - 443 - 1.2.3.4 UA http://ext.com/shop/x 192.168.1.1";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 2)).expect("should parse");
        assert_eq!(rec.action, "GET /shop");
        assert!(!rec.is_landing_page);
    }

    #[test]
    fn test_zero_degraded_threshold_still_needs_a_token() {
        let schema = FieldSchema {
            degraded_min_tokens: 0,
            ..FieldSchema::w3c()
        };
        let parser = LineParser::new(schema);
        let err = parser
            .try_parse_line("   ", RecordKey::new(BATCH, 0))
            .expect_err("blank line has no tokens");
        assert!(matches!(err, LineError::TooFewTokens { got: 0, need: 1 }));
        assert!(parser.parse_line("x", RecordKey::new(BATCH, 1)).is_some());
    }

    #[test]
    fn test_strict_schema_rejects_non_url_referrer_token() {
        let parser = LineParser::new(FieldSchema::strict());
        let line = "2024-01-15 10:30:00 10.0.0.1 GET /a - 443 - 1.2.3.4 UA www.ext.com 1.2.3.4";
        let rec = parser.parse_line(line, RecordKey::new(BATCH, 0)).expect("should parse");
        assert_eq!(rec.referrer, "-");
        assert!(!rec.is_landing_page);
    }

    #[test]
    fn test_schema_field_out_of_range_rejects_line() {
        let schema = FieldSchema {
            method: TokenPos::Index(40),
            ..FieldSchema::w3c()
        };
        let parser = LineParser::new(schema);
        let line = "2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1";
        assert!(parser.parse_line(line, RecordKey::new(BATCH, 0)).is_none());
    }

    #[test]
    fn test_parse_content_keys_and_rejections() {
        let content = "#Version: 1.0\n\
                       2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1\n\
                       x\n\
                       odd line 10.0.0.2\n";
        let records = LineParser::default().parse_content(content, BATCH);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, RecordKey::new(BATCH, 1));
        assert_eq!(records[1].key, RecordKey::new(BATCH, 3));
    }
}
