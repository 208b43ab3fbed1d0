use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use claude_meter::config::get_config;
use claude_meter::pricing::pricing_table;
use claude_meter::{aggregator, display, load_usage_records, logging};

#[derive(Parser)]
#[command(name = "claude-meter")]
#[command(about = "Aggregate Claude Code usage logs into cost and token reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rolling 5-hour session report
    Session {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Today's usage
    Today {
        #[arg(long)]
        json: bool,
    },
    /// This calendar month's usage
    Month {
        #[arg(long)]
        json: bool,
    },
    /// All-time usage
    Total {
        #[arg(long)]
        json: bool,
    },
    /// Per-day buckets for the current month, or for --month YYYY-MM
    Daily {
        #[arg(long)]
        json: bool,
        /// Specific month (YYYY-MM); days print oldest first
        #[arg(long)]
        month: Option<String>,
    },
    /// Per-month buckets across all data, newest first
    Monthly {
        #[arg(long)]
        json: bool,
    },
    /// Per-hour buckets for today, or for --date YYYY-MM-DD
    Hourly {
        #[arg(long)]
        json: bool,
        /// Specific day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Session { json }
            | Commands::Today { json }
            | Commands::Month { json }
            | Commands::Total { json }
            | Commands::Daily { json, .. }
            | Commands::Monthly { json }
            | Commands::Hourly { json, .. } => *json,
        }
    }
}

fn main() -> Result<()> {
    logging::init_logging();

    let command = Cli::parse()
        .command
        .unwrap_or(Commands::Total { json: false });
    let json = command.json();

    let config = get_config();
    let records = load_usage_records(&config.paths.data_dirs);

    if records.is_empty() {
        if json {
            println!("null");
        } else {
            println!("No Claude usage data found.");
        }
        return Ok(());
    }

    let pricing = pricing_table();
    let now = Utc::now();

    match command {
        Commands::Session { json } => {
            let session = aggregator::current_session(&records, pricing, now);
            display::render_session(session.as_ref(), json)?;
        }
        Commands::Today { json } => {
            let report = aggregator::today_report(&records, pricing, now);
            display::render_report("Today", &report, json)?;
        }
        Commands::Month { json } => {
            let report = aggregator::month_report(&records, pricing, now);
            display::render_report("This month", &report, json)?;
        }
        Commands::Total { json } => {
            let report = aggregator::all_time_report(&records, pricing);
            display::render_report("All time", &report, json)?;
        }
        Commands::Daily { json, month } => match month {
            Some(month) => {
                let (year, month_number) = parse_month(&month)?;
                let buckets =
                    aggregator::daily_buckets_for_month(&records, pricing, year, month_number);
                display::render_buckets(&format!("Days in {year}-{month_number:02}"), &buckets, json)?;
            }
            None => {
                let buckets = aggregator::daily_buckets_for_current_month(&records, pricing, now);
                display::render_buckets("Days this month", &buckets, json)?;
            }
        },
        Commands::Monthly { json } => {
            let buckets = aggregator::monthly_buckets_all_time(&records, pricing);
            display::render_buckets("Months", &buckets, json)?;
        }
        Commands::Hourly { json, date } => match date {
            Some(date) => {
                let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .with_context(|| format!("invalid date: {date}, expected YYYY-MM-DD"))?;
                let buckets = aggregator::hourly_buckets_for_date(&records, pricing, day);
                display::render_buckets(&format!("Hours on {day}"), &buckets, json)?;
            }
            None => {
                let buckets = aggregator::hourly_buckets_for_today(&records, pricing, now);
                display::render_buckets("Hours today", &buckets, json)?;
            }
        },
    }

    Ok(())
}

fn parse_month(month: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .with_context(|| format!("invalid month: {month}, expected YYYY-MM"))?;
    Ok((date.year(), date.month()))
}
