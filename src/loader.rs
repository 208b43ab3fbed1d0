//! Deduplicating loader: files in, canonical record list out.
//!
//! Files are read and parsed in parallel, but the dedup fold runs strictly
//! sequentially in file order then line order, because first-occurrence-wins
//! only means something under a deterministic processing order. The output
//! preserves that order and is NOT globally timestamp-sorted; consumers that
//! need a global sort (the rolling session view) re-sort themselves.

use crate::models::UsageRecord;
use crate::parser::{self, LineOutcome};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load and deduplicate records from files already in chronological order
/// (see [`crate::file_discovery::sort_by_earliest_timestamp`]).
///
/// The dedup set is local to this invocation, so concurrent pipeline runs
/// never contaminate each other. Per-file failures skip the file; per-line
/// failures skip the line. Nothing here aborts the load.
pub fn load_records(sorted_files: &[PathBuf]) -> Vec<UsageRecord> {
    let per_file: Vec<Vec<UsageRecord>> = sorted_files
        .par_iter()
        .map(|path| read_file_records(path))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates = 0usize;

    for file_records in per_file {
        for record in file_records {
            if let Some(key) = record.dedup_key() {
                if !seen.insert(key) {
                    duplicates += 1;
                    continue;
                }
            }
            records.push(record);
        }
    }

    debug!(
        records = records.len(),
        duplicates, "loaded deduplicated records"
    );
    records
}

/// Parse every line of one file, keeping line order.
fn read_file_records(path: &Path) -> Vec<UsageRecord> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "skipping unreadable log file");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                // Read error mid-file: keep what we have, skip the rest.
                warn!(file = %path.display(), error = %err, "read error, truncating file");
                break;
            }
        };

        match parser::parse_line(&line) {
            LineOutcome::Record(record) => records.push(*record),
            LineOutcome::Blank => {}
            LineOutcome::Rejected(reason) => {
                warn!(file = %path.display(), line = index + 1, %reason, "skipping invalid line");
            }
        }
    }

    records
}
