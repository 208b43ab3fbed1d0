//! Terminal and JSON rendering of reports.
//!
//! Everything here consumes reports as read-only snapshots; no view ever
//! feeds back into the pipeline.

use crate::models::{SessionReport, UsageReport};
use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use serde::Serialize;

/// One bucket row in JSON output.
#[derive(Serialize)]
struct BucketRow<'a> {
    key: &'a str,
    #[serde(flatten)]
    report: &'a UsageReport,
}

pub fn render_session(session: Option<&SessionReport>, json: bool) -> Result<()> {
    match session {
        None => {
            if json {
                println!("null");
            } else {
                println!("No active session in the last 5 hours.");
            }
        }
        Some(session) => {
            if json {
                println!("{}", serde_json::to_string_pretty(session)?);
            } else {
                let start = session.session_start.with_timezone(&Local);
                let end = session.session_end.with_timezone(&Local);
                println!("{}", "Current session".bold());
                println!(
                    "  {} -> {}",
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%Y-%m-%d %H:%M")
                );
                print_report_body(&session.usage);
            }
        }
    }
    Ok(())
}

pub fn render_report(title: &str, report: &UsageReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", title.bold());
        print_report_body(report);
    }
    Ok(())
}

pub fn render_buckets(title: &str, buckets: &[(String, UsageReport)], json: bool) -> Result<()> {
    if json {
        let rows: Vec<BucketRow> = buckets
            .iter()
            .map(|(key, report)| BucketRow { key, report })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", title.bold());
    if buckets.is_empty() {
        println!("  (no data)");
        return Ok(());
    }
    for (key, report) in buckets {
        println!(
            "  {}  {:>12} tokens  {:>5} msgs  {}",
            key.cyan(),
            format_count(report.total_tokens()),
            report.message_count,
            format_cost(report.total_cost).green()
        );
    }
    Ok(())
}

fn print_report_body(report: &UsageReport) {
    println!("  Input tokens:          {:>14}", format_count(report.input_tokens));
    println!("  Output tokens:         {:>14}", format_count(report.output_tokens));
    println!(
        "  Cache creation tokens: {:>14}",
        format_count(report.cache_creation_tokens)
    );
    println!(
        "  Cache read tokens:     {:>14}",
        format_count(report.cache_read_tokens)
    );
    println!("  Messages:              {:>14}", format_count(report.message_count));
    println!(
        "  Cost:                  {:>14}",
        format_cost(report.total_cost).green()
    );

    if report.model_breakdown.is_empty() {
        return;
    }
    println!("  {}", "By model".bold());
    let mut models: Vec<_> = report.model_breakdown.iter().collect();
    models.sort_by(|a, b| b.1.cost.total_cmp(&a.1.cost));
    for (model, usage) in models {
        println!(
            "    {:<32} {:>5} msgs  {}",
            model.cyan(),
            usage.count,
            format_cost(usage.cost).green()
        );
    }
}

fn format_cost(cost: f64) -> String {
    format!("${cost:.4}")
}

fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
