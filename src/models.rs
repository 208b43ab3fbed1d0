//! Core data models for the usage pipeline.
//!
//! Data flows through these types in sequence:
//!
//! 1. [`UsageRecord`] - a single validated log line
//! 2. [`UsageReport`] - totals folded over a set of records, with a
//!    per-model breakdown whose pointwise sum equals the totals
//! 3. [`SessionReport`] - a report plus the timestamp bounds of the
//!    rolling session it covers
//!
//! Records are immutable once loaded; reports are freshly constructed
//! snapshots and safe to hand out to any number of views.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One validated usage event from a JSONL log.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub message_id: Option<String>,
    pub request_id: Option<String>,
    pub model: Option<String>,
    pub is_api_error: bool,
    /// Pre-computed cost some writers emit. Accepted for forward
    /// compatibility; aggregation always re-derives cost from tokens.
    pub cost_usd: Option<f64>,
    pub usage: TokenUsage,
}

/// Token counts for a single model invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}

impl UsageRecord {
    /// Key used to discard repeated log entries for the same logical event.
    ///
    /// Either missing half is replaced by a literal placeholder so a record
    /// with only one id still participates in dedup. A record with neither
    /// id has no key and is always kept.
    pub fn dedup_key(&self) -> Option<String> {
        if self.message_id.is_none() && self.request_id.is_none() {
            return None;
        }
        Some(format!(
            "{}-{}",
            self.message_id.as_deref().unwrap_or("no-msg"),
            self.request_id.as_deref().unwrap_or("no-req"),
        ))
    }
}

/// Per-token-class cost rates for one model. A missing rate means that
/// token class contributes zero cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_cost_per_token: Option<f64>,
    pub output_cost_per_token: Option<f64>,
    pub cache_creation_cost_per_token: Option<f64>,
    pub cache_read_cost_per_token: Option<f64>,
}

/// Folded summary over a set of records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageReport {
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
    #[serde(rename = "cacheCreationTokens")]
    pub cache_creation_tokens: u64,
    #[serde(rename = "cacheReadTokens")]
    pub cache_read_tokens: u64,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "messageCount")]
    pub message_count: u64,
    #[serde(rename = "modelBreakdown")]
    pub model_breakdown: HashMap<String, ModelUsage>,
}

impl UsageReport {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }
}

/// Per-model slice of a [`UsageReport`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelUsage {
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
    #[serde(rename = "cacheCreationTokens")]
    pub cache_creation_tokens: u64,
    #[serde(rename = "cacheReadTokens")]
    pub cache_read_tokens: u64,
    pub cost: f64,
    pub count: u64,
}

/// A [`UsageReport`] bounded by the earliest and latest record included
/// in the rolling session window.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    #[serde(flatten)]
    pub usage: UsageReport,
    #[serde(rename = "sessionStart")]
    pub session_start: DateTime<Utc>,
    #[serde(rename = "sessionEnd")]
    pub session_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(message_id: Option<&str>, request_id: Option<&str>) -> UsageRecord {
        UsageRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            message_id: message_id.map(String::from),
            request_id: request_id.map(String::from),
            model: Some("claude-sonnet-4-20250514".to_string()),
            is_api_error: false,
            cost_usd: None,
            usage: TokenUsage::default(),
        }
    }

    #[test]
    fn dedup_key_combines_both_ids() {
        let rec = record(Some("msg_1"), Some("req_1"));
        assert_eq!(rec.dedup_key(), Some("msg_1-req_1".to_string()));
    }

    #[test]
    fn dedup_key_substitutes_placeholder_for_missing_half() {
        assert_eq!(
            record(Some("msg_1"), None).dedup_key(),
            Some("msg_1-no-req".to_string())
        );
        assert_eq!(
            record(None, Some("req_1")).dedup_key(),
            Some("no-msg-req_1".to_string())
        );
    }

    #[test]
    fn dedup_key_absent_when_both_ids_missing() {
        assert_eq!(record(None, None).dedup_key(), None);
    }

    #[test]
    fn token_usage_total_sums_all_classes() {
        let usage = TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
            cache_creation_tokens: 3,
            cache_read_tokens: 4,
        };
        assert_eq!(usage.total(), 10);
    }
}
