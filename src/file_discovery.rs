//! Discovery and chronological ordering of JSONL log files.
//!
//! Files are ordered by the first parseable timestamp found in their
//! content. Lines are processed oldest-first downstream, so this ordering
//! decides which copy of a duplicated entry survives dedup.

use crate::parser;
use chrono::{DateTime, Utc};
use glob::glob;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Recursively enumerate `*.jsonl` files under each root.
///
/// Unreadable entries and subtrees are skipped with a warning; discovery
/// itself never fails.
pub fn find_log_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        let pattern = root.join("**").join("*.jsonl");
        let pattern = pattern.to_string_lossy();
        match glob(&pattern) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(path) => {
                            if path.is_file() {
                                files.push(path);
                            }
                        }
                        Err(err) => {
                            warn!(root = %root.display(), error = %err, "skipping unreadable path");
                        }
                    }
                }
            }
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping root with invalid pattern");
            }
        }
    }

    debug!(count = files.len(), "discovered log files");
    files
}

/// First line with a parseable `timestamp` field, or `None`.
///
/// Scans raw JSON values rather than full records so a file whose first
/// valid record appears late still sorts by its earliest timestamped line.
pub fn earliest_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "cannot open file for ordering");
            return None;
        }
    };

    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
            continue;
        };
        if let Some(raw_ts) = value.get("timestamp").and_then(|v| v.as_str()) {
            if let Ok(ts) = parser::parse_timestamp(raw_ts) {
                return Some(ts);
            }
        }
    }

    None
}

/// Sort files ascending by their earliest content timestamp.
///
/// A file with no parseable timestamp sorts at the Unix epoch, i.e. the
/// oldest position. That pushes unknown-dated files to the front instead of
/// dropping them, so their entries win any duplicate-id race downstream.
/// Ties keep discovery order (stable sort).
pub fn sort_by_earliest_timestamp(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut keyed: Vec<(DateTime<Utc>, PathBuf)> = files
        .into_iter()
        .map(|path| {
            let key = earliest_timestamp(&path).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            (key, path)
        })
        .collect();

    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn line(ts: &str) -> String {
        format!(
            r#"{{"timestamp":"{ts}","message":{{"usage":{{"input_tokens":1,"output_tokens":1}}}}}}"#
        )
    }

    #[test]
    fn finds_jsonl_files_recursively() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a/one.jsonl", "");
        write_file(dir.path(), "a/b/two.jsonl", "");
        write_file(dir.path(), "a/ignored.txt", "");

        let files = find_log_files(&[dir.path().to_path_buf()]);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "jsonl"));
    }

    #[test]
    #[cfg(unix)]
    fn unreadable_subdirectory_is_skipped_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let readable = write_file(dir.path(), "open/log.jsonl", "");
        write_file(dir.path(), "locked/hidden.jsonl", "");

        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running as root; the permission bit has no effect here.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = find_log_files(&[dir.path().to_path_buf()]);

        // Restore before TempDir cleanup runs.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(files, vec![readable]);
    }

    #[test]
    fn earliest_timestamp_skips_unparseable_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "log.jsonl",
            &format!(
                "not json\n{{\"timestamp\":\"garbage\"}}\n{}\n{}\n",
                line("2025-02-01T08:00:00Z"),
                line("2025-01-01T08:00:00Z")
            ),
        );

        let ts = earliest_timestamp(&path).unwrap();
        assert_eq!(ts, parser::parse_timestamp("2025-02-01T08:00:00Z").unwrap());
    }

    #[test]
    fn sorts_ascending_with_untimestamped_files_first() {
        let dir = TempDir::new().unwrap();
        let newer = write_file(dir.path(), "newer.jsonl", &line("2025-03-01T00:00:00Z"));
        let older = write_file(dir.path(), "older.jsonl", &line("2025-01-01T00:00:00Z"));
        let unknown = write_file(dir.path(), "unknown.jsonl", "not json at all\n");

        let sorted = sort_by_earliest_timestamp(vec![newer.clone(), older.clone(), unknown.clone()]);
        assert_eq!(sorted, vec![unknown, older, newer]);
    }
}
