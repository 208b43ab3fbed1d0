//! Claude usage metering library.
//!
//! Ingests append-only JSONL logs describing Claude API usage from one or
//! more directory trees and turns them into deduplicated, cost-annotated
//! records aggregated over several time windows.
//!
//! ## Pipeline
//!
//! 1. [`file_discovery`] - enumerate `*.jsonl` files and order them by the
//!    first parseable timestamp in their content
//! 2. [`loader`] - parse every line ([`parser`]), deduplicate on
//!    message/request ids, produce the canonical record list
//! 3. [`aggregator`] - fold records into session/day/month/all-time reports
//!    with a per-model cost breakdown ([`pricing`])
//!
//! The pipeline never aborts: empty roots, malformed logs and unknown
//! models all degrade to empty or partial reports, with diagnostics emitted
//! through `tracing`. Aggregates are recomputed from the raw logs on every
//! run; nothing is persisted.
//!
//! ```no_run
//! use claude_meter::{aggregator, load_usage_records, pricing};
//!
//! let records = load_usage_records(&[std::path::PathBuf::from("/data/projects")]);
//! let report = aggregator::all_time_report(&records, pricing::pricing_table());
//! println!("total cost: ${:.2}", report.total_cost);
//! ```

pub mod aggregator;
pub mod config;
pub mod display;
pub mod file_discovery;
pub mod loader;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pricing;

pub use models::{
    ModelPricing, ModelUsage, SessionReport, TokenUsage, UsageRecord, UsageReport,
};

use std::path::PathBuf;

/// Run the full ingestion pipeline: discover, order, load, deduplicate.
pub fn load_usage_records(roots: &[PathBuf]) -> Vec<UsageRecord> {
    let files = file_discovery::find_log_files(roots);
    let sorted = file_discovery::sort_by_earliest_timestamp(files);
    loader::load_records(&sorted)
}
