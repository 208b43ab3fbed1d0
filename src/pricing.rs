//! Static pricing table and cost computation.
//!
//! Resolution is a pure function of the model string and the table: exact
//! match first, then a fixed list of normalized variants, then the default
//! schedule with a warning. It never fails the caller; a missing model name
//! simply yields no schedule (zero cost).

use crate::models::{ModelPricing, TokenUsage};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

/// Model whose schedule backs unknown-model fallback.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

fn per_million(dollars: f64) -> f64 {
    dollars / 1_000_000.0
}

fn schedule(input: f64, output: f64, cache_creation: f64, cache_read: f64) -> ModelPricing {
    ModelPricing {
        input_cost_per_token: Some(per_million(input)),
        output_cost_per_token: Some(per_million(output)),
        cache_creation_cost_per_token: Some(per_million(cache_creation)),
        cache_read_cost_per_token: Some(per_million(cache_read)),
    }
}

/// Immutable cost-per-token rates keyed by model identifier.
#[derive(Debug)]
pub struct PricingTable {
    models: HashMap<&'static str, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingTable {
    /// Published per-token rates, dollars per million tokens.
    pub fn new() -> Self {
        let mut models = HashMap::new();

        models.insert("claude-sonnet-4-20250514", schedule(3.0, 15.0, 3.75, 0.3));
        models.insert("claude-opus-4-20250514", schedule(15.0, 75.0, 18.75, 1.5));
        models.insert("claude-opus-4-1-20250805", schedule(15.0, 75.0, 18.75, 1.5));
        models.insert("claude-opus-4-1", schedule(15.0, 75.0, 18.75, 1.5));
        models.insert("claude-opus-4-5-20251101", schedule(5.0, 25.0, 6.0, 0.5));
        models.insert("claude-opus-4-5", schedule(5.0, 25.0, 6.0, 0.5));
        models.insert("claude-3-5-sonnet-20241022", schedule(3.0, 15.0, 3.75, 0.3));
        models.insert("claude-3-5-haiku-20241022", schedule(0.8, 4.0, 1.6, 0.08));
        models.insert("claude-haiku-4-5-20251001", schedule(1.0, 5.0, 1.25, 0.1));

        Self { models }
    }

    /// Look up the schedule for a model.
    ///
    /// `None` model means no schedule (the caller treats the record as
    /// zero-cost). An unknown model falls back to the default schedule with
    /// a warning rather than an error.
    pub fn resolve(&self, model: Option<&str>) -> Option<&ModelPricing> {
        let name = model?;

        if let Some(pricing) = self.models.get(name) {
            return Some(pricing);
        }

        // Shorthand identifiers seen in the wild, tried in priority order.
        let variants = [
            format!("anthropic/{name}"),
            format!("claude-3-5-{name}"),
            format!("claude-3-{name}"),
            format!("claude-{name}"),
        ];
        for variant in &variants {
            if let Some(pricing) = self.models.get(variant.as_str()) {
                return Some(pricing);
            }
        }

        warn!(model = %name, fallback = DEFAULT_MODEL, "unknown model, using fallback pricing");
        self.models.get(DEFAULT_MODEL)
    }
}

/// Process-wide table, constructed once.
pub fn pricing_table() -> &'static PricingTable {
    static TABLE: OnceLock<PricingTable> = OnceLock::new();
    TABLE.get_or_init(PricingTable::new)
}

/// Cost of one usage record under one schedule. Absent rates contribute
/// zero; the result is never negative or NaN.
pub fn calculate_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    let mut cost = 0.0;

    if let Some(rate) = pricing.input_cost_per_token {
        cost += usage.input_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.output_cost_per_token {
        cost += usage.output_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.cache_creation_cost_per_token {
        cost += usage.cache_creation_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.cache_read_cost_per_token {
        cost += usage.cache_read_tokens as f64 * rate;
    }

    cost
}
