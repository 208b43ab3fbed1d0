//! Benchmarks for line parsing and report aggregation.
//!
//! Run with: cargo bench

use claude_meter::aggregator;
use claude_meter::parser::{parse_line, LineOutcome};
use claude_meter::pricing::pricing_table;
use claude_meter::UsageRecord;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate test JSONL lines, optionally with malformed entries mixed in.
fn generate_lines(count: usize, include_errors: bool) -> Vec<String> {
    (0..count)
        .map(|i| {
            if include_errors && i % 10 == 5 {
                "{broken json}".to_string()
            } else {
                format!(
                    concat!(
                        r#"{{"timestamp":"2025-01-15T10:{:02}:{:02}Z","#,
                        r#""message":{{"id":"msg_{}","model":"claude-sonnet-4-20250514","#,
                        r#""usage":{{"input_tokens":{},"output_tokens":{},"#,
                        r#""cache_creation_input_tokens":{},"cache_read_input_tokens":{}}}}},"#,
                        r#""requestId":"req_{}"}}"#
                    ),
                    (i / 60) % 60,
                    i % 60,
                    i,
                    100 + i,
                    200 + i,
                    i % 50,
                    i % 100,
                    i
                )
            }
        })
        .collect()
}

fn parse_all(lines: &[String]) -> Vec<UsageRecord> {
    lines
        .iter()
        .filter_map(|line| match parse_line(line) {
            LineOutcome::Record(record) => Some(*record),
            _ => None,
        })
        .collect()
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    for size in [100, 1_000, 10_000] {
        let clean = generate_lines(size, false);
        let dirty = generate_lines(size, true);

        group.bench_with_input(BenchmarkId::new("clean", size), &clean, |b, lines| {
            b.iter(|| parse_all(black_box(lines)))
        });
        group.bench_with_input(BenchmarkId::new("with_errors", size), &dirty, |b, lines| {
            b.iter(|| parse_all(black_box(lines)))
        });
    }

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let pricing = pricing_table();

    for size in [100, 1_000, 10_000] {
        let records = parse_all(&generate_lines(size, false));

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| aggregator::all_time_report(black_box(records), pricing))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parsing, benchmark_aggregation);
criterion_main!(benches);
