//! Line-level parsing and validation of JSONL usage logs.
//!
//! Each raw line maps to a tagged [`LineOutcome`] so validation failures are
//! structured data rather than silent drops: blank lines are skipped quietly,
//! everything else either becomes a [`UsageRecord`] or a rejection carrying
//! the reason. The schema is forward-compatible: unknown fields never cause
//! rejection.

use crate::models::{TokenUsage, UsageRecord};
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Result of parsing one raw log line.
#[derive(Debug)]
pub enum LineOutcome {
    /// A structurally valid record with a parseable timestamp.
    Record(Box<UsageRecord>),
    /// Empty or whitespace-only line; skipped without a warning.
    Blank,
    /// Malformed JSON or a structurally invalid record. Recoverable; the
    /// caller logs the reason with file and line context and continues.
    Rejected(String),
}

/// Wire shape of one log line. Only `timestamp` and `message.usage` with
/// numeric input/output counts are required; everything else is optional.
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    message: RawMessage,
    #[serde(rename = "requestId")]
    request_id: Option<String>,
    #[serde(rename = "costUSD")]
    cost_usd: Option<f64>,
    #[serde(rename = "isApiErrorMessage")]
    is_api_error_message: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    usage: RawUsage,
    model: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUsage {
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

/// Parse one raw line into a [`LineOutcome`]. Never fails the caller.
pub fn parse_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }

    let raw: RawRecord = match serde_json::from_str(trimmed) {
        Ok(raw) => raw,
        Err(err) => return LineOutcome::Rejected(format!("invalid record: {err}")),
    };

    let timestamp = match parse_timestamp(&raw.timestamp) {
        Ok(ts) => ts,
        Err(err) => return LineOutcome::Rejected(err.to_string()),
    };

    LineOutcome::Record(Box::new(UsageRecord {
        timestamp,
        message_id: raw.message.id,
        request_id: raw.request_id,
        model: raw.message.model,
        is_api_error: raw.is_api_error_message.unwrap_or(false),
        cost_usd: raw.cost_usd,
        usage: TokenUsage {
            input_tokens: raw.message.usage.input_tokens,
            output_tokens: raw.message.usage.output_tokens,
            cache_creation_tokens: raw.message.usage.cache_creation_input_tokens.unwrap_or(0),
            cache_read_tokens: raw.message.usage.cache_read_input_tokens.unwrap_or(0),
        },
    }))
}

/// Parse a timestamp string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with a `Z` suffix or an explicit offset, and naive
/// datetimes (assumed UTC) as a fallback.
pub fn parse_timestamp(timestamp_str: &str) -> Result<DateTime<Utc>> {
    let timestamp = if timestamp_str.ends_with('Z') {
        timestamp_str.replace('Z', "+00:00")
    } else {
        timestamp_str.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    anyhow::bail!("unparseable timestamp: {timestamp_str}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_line() -> String {
        concat!(
            r#"{"timestamp":"2025-01-15T10:30:00.000Z","#,
            r#""message":{"id":"msg_1","model":"claude-sonnet-4-20250514","#,
            r#""usage":{"input_tokens":100,"output_tokens":50,"#,
            r#""cache_creation_input_tokens":10,"cache_read_input_tokens":20}},"#,
            r#""requestId":"req_1"}"#
        )
        .to_string()
    }

    #[test]
    fn parses_complete_record() {
        let LineOutcome::Record(rec) = parse_line(&valid_line()) else {
            panic!("expected record");
        };
        assert_eq!(rec.message_id.as_deref(), Some("msg_1"));
        assert_eq!(rec.request_id.as_deref(), Some("req_1"));
        assert_eq!(rec.model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert_eq!(rec.usage.input_tokens, 100);
        assert_eq!(rec.usage.output_tokens, 50);
        assert_eq!(rec.usage.cache_creation_tokens, 10);
        assert_eq!(rec.usage.cache_read_tokens, 20);
        assert!(!rec.is_api_error);
    }

    #[test]
    fn blank_lines_are_skipped_silently() {
        assert!(matches!(parse_line(""), LineOutcome::Blank));
        assert!(matches!(parse_line("   \t  "), LineOutcome::Blank));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse_line("{broken"), LineOutcome::Rejected(_)));
    }

    #[test]
    fn missing_usage_is_rejected() {
        let line = r#"{"timestamp":"2025-01-15T10:30:00Z","message":{"id":"msg_1"}}"#;
        assert!(matches!(parse_line(line), LineOutcome::Rejected(_)));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let line = r#"{"message":{"usage":{"input_tokens":1,"output_tokens":1}}}"#;
        assert!(matches!(parse_line(line), LineOutcome::Rejected(_)));
    }

    #[test]
    fn unparseable_timestamp_is_rejected() {
        let line =
            r#"{"timestamp":"not-a-date","message":{"usage":{"input_tokens":1,"output_tokens":1}}}"#;
        assert!(matches!(parse_line(line), LineOutcome::Rejected(_)));
    }

    #[test]
    fn non_numeric_tokens_are_rejected() {
        let line = r#"{"timestamp":"2025-01-15T10:30:00Z","message":{"usage":{"input_tokens":"a","output_tokens":1}}}"#;
        assert!(matches!(parse_line(line), LineOutcome::Rejected(_)));
    }

    #[test]
    fn negative_tokens_are_rejected() {
        let line = r#"{"timestamp":"2025-01-15T10:30:00Z","message":{"usage":{"input_tokens":-5,"output_tokens":1}}}"#;
        assert!(matches!(parse_line(line), LineOutcome::Rejected(_)));
    }

    #[test]
    fn unknown_fields_are_accepted() {
        let line = concat!(
            r#"{"timestamp":"2025-01-15T10:30:00Z","version":"1.2.3","extra":{"a":1},"#,
            r#""message":{"usage":{"input_tokens":1,"output_tokens":2,"surprise":true}}}"#
        );
        assert!(matches!(parse_line(line), LineOutcome::Record(_)));
    }

    #[test]
    fn optional_cache_tokens_default_to_zero() {
        let line = r#"{"timestamp":"2025-01-15T10:30:00Z","message":{"usage":{"input_tokens":1,"output_tokens":2}}}"#;
        let LineOutcome::Record(rec) = parse_line(line) else {
            panic!("expected record");
        };
        assert_eq!(rec.usage.cache_creation_tokens, 0);
        assert_eq!(rec.usage.cache_read_tokens, 0);
    }

    #[test]
    fn timestamp_accepts_z_offset_and_naive_forms() {
        assert!(parse_timestamp("2024-01-01T12:00:00.000Z").is_ok());
        assert!(parse_timestamp("2024-01-01T12:00:00.000+02:00").is_ok());
        assert!(parse_timestamp("2024-01-01T12:00:00.000").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
