//! Folding records into reports and time-bucketed views.
//!
//! Every function here is a pure fold over a record slice plus the pricing
//! table (and a reference instant where a window is involved). Reports are
//! independent snapshots; computing one view never affects another.
//!
//! All calendar bucketing uses the local calendar, uniformly across day,
//! hour and month views. Mixing timezones between views would make the
//! displayed breakdowns disagree with the displayed totals.

use crate::models::{SessionReport, UsageRecord, UsageReport};
use crate::pricing::{self, PricingTable};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Width of the rolling "current session" window.
pub const SESSION_WINDOW_HOURS: i64 = 5;

/// Model name the API substitutes for synthesized (non-billable) messages.
const SYNTHETIC_MODEL: &str = "<synthetic>";

/// Presentation order for bucketed views. Each call site picks one
/// explicitly; it is part of the view's contract, not an accident of the
/// underlying map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOrder {
    Ascending,
    Descending,
}

/// Fold records into a single report.
///
/// Records with no model, the synthetic placeholder model, an API error
/// marker, or all four token counts zero are noise and excluded entirely:
/// they contribute to neither totals nor message count.
pub fn aggregate<'a, I>(records: I, pricing: &PricingTable) -> UsageReport
where
    I: IntoIterator<Item = &'a UsageRecord>,
{
    let mut report = UsageReport::default();

    for record in records {
        let Some(model) = record.model.as_deref() else {
            continue;
        };
        if model == SYNTHETIC_MODEL || record.is_api_error {
            continue;
        }
        let usage = &record.usage;
        if usage.total() == 0 {
            continue;
        }

        let cost = pricing
            .resolve(Some(model))
            .map(|schedule| pricing::calculate_cost(usage, schedule))
            .unwrap_or(0.0);

        report.input_tokens += usage.input_tokens;
        report.output_tokens += usage.output_tokens;
        report.cache_creation_tokens += usage.cache_creation_tokens;
        report.cache_read_tokens += usage.cache_read_tokens;
        report.total_cost += cost;
        report.message_count += 1;

        let slot = report.model_breakdown.entry(model.to_string()).or_default();
        slot.input_tokens += usage.input_tokens;
        slot.output_tokens += usage.output_tokens;
        slot.cache_creation_tokens += usage.cache_creation_tokens;
        slot.cache_read_tokens += usage.cache_read_tokens;
        slot.cost += cost;
        slot.count += 1;
    }

    report
}

/// Records within the rolling window of `now`, as a bounded session.
///
/// The loader's output is only file-chronological, so this re-sorts before
/// selecting the window suffix. A record ages out of the session on the
/// next evaluation once it falls behind `now` by more than the window.
pub fn current_session(
    records: &[UsageRecord],
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> Option<SessionReport> {
    let mut sorted: Vec<&UsageRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.timestamp);

    let window = Duration::hours(SESSION_WINDOW_HOURS);
    let selected: Vec<&UsageRecord> = sorted
        .into_iter()
        .filter(|record| now.signed_duration_since(record.timestamp) <= window)
        .collect();

    let first = selected.first()?;
    let last = selected.last()?;
    let (session_start, session_end) = (first.timestamp, last.timestamp);

    Some(SessionReport {
        usage: aggregate(selected.iter().copied(), pricing),
        session_start,
        session_end,
    })
}

/// Aggregate only the records satisfying a calendar predicate.
pub fn windowed<F>(records: &[UsageRecord], pricing: &PricingTable, predicate: F) -> UsageReport
where
    F: Fn(&UsageRecord) -> bool,
{
    aggregate(records.iter().filter(|record| predicate(record)), pricing)
}

/// Group records by a derived key and aggregate each group independently.
pub fn bucket_by<F>(
    records: &[UsageRecord],
    pricing: &PricingTable,
    key_fn: F,
    order: BucketOrder,
) -> Vec<(String, UsageReport)>
where
    F: Fn(&UsageRecord) -> String,
{
    let mut groups: BTreeMap<String, Vec<&UsageRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record);
    }

    let buckets = groups
        .into_iter()
        .map(|(key, group)| (key, aggregate(group.into_iter(), pricing)));

    match order {
        BucketOrder::Ascending => buckets.collect(),
        BucketOrder::Descending => {
            let mut out: Vec<_> = buckets.collect();
            out.reverse();
            out
        }
    }
}

fn local_date(record: &UsageRecord) -> NaiveDate {
    record.timestamp.with_timezone(&Local).date_naive()
}

fn date_key(record: &UsageRecord) -> String {
    local_date(record).format("%Y-%m-%d").to_string()
}

fn month_key(record: &UsageRecord) -> String {
    local_date(record).format("%Y-%m").to_string()
}

fn hour_key(record: &UsageRecord) -> String {
    record
        .timestamp
        .with_timezone(&Local)
        .format("%H:00")
        .to_string()
}

/// Everything ever loaded.
pub fn all_time_report(records: &[UsageRecord], pricing: &PricingTable) -> UsageReport {
    aggregate(records.iter(), pricing)
}

/// Records dated today, local calendar.
pub fn today_report(
    records: &[UsageRecord],
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> UsageReport {
    let today = now.with_timezone(&Local).date_naive();
    windowed(records, pricing, |record| local_date(record) == today)
}

/// Records within the current local calendar month.
pub fn month_report(
    records: &[UsageRecord],
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> UsageReport {
    let local_now = now.with_timezone(&Local).date_naive();
    windowed(records, pricing, |record| {
        let date = local_date(record);
        date.year() == local_now.year() && date.month() == local_now.month()
    })
}

/// Day buckets for the current local month, newest day first.
pub fn daily_buckets_for_current_month(
    records: &[UsageRecord],
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> Vec<(String, UsageReport)> {
    let local_now = now.with_timezone(&Local).date_naive();
    let in_month: Vec<UsageRecord> = records
        .iter()
        .filter(|record| {
            let date = local_date(record);
            date.year() == local_now.year() && date.month() == local_now.month()
        })
        .cloned()
        .collect();
    bucket_by(&in_month, pricing, date_key, BucketOrder::Descending)
}

/// Day buckets for a specific month, oldest day first.
pub fn daily_buckets_for_month(
    records: &[UsageRecord],
    pricing: &PricingTable,
    year: i32,
    month: u32,
) -> Vec<(String, UsageReport)> {
    let in_month: Vec<UsageRecord> = records
        .iter()
        .filter(|record| {
            let date = local_date(record);
            date.year() == year && date.month() == month
        })
        .cloned()
        .collect();
    bucket_by(&in_month, pricing, date_key, BucketOrder::Ascending)
}

/// Month buckets across all loaded data, newest month first.
pub fn monthly_buckets_all_time(
    records: &[UsageRecord],
    pricing: &PricingTable,
) -> Vec<(String, UsageReport)> {
    bucket_by(records, pricing, month_key, BucketOrder::Descending)
}

/// Hour buckets for today, earliest hour first.
pub fn hourly_buckets_for_today(
    records: &[UsageRecord],
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> Vec<(String, UsageReport)> {
    hourly_buckets_for_date(records, pricing, now.with_timezone(&Local).date_naive())
}

/// Hour buckets for a specific local date, earliest hour first.
pub fn hourly_buckets_for_date(
    records: &[UsageRecord],
    pricing: &PricingTable,
    date: NaiveDate,
) -> Vec<(String, UsageReport)> {
    let on_date: Vec<UsageRecord> = records
        .iter()
        .filter(|record| local_date(record) == date)
        .cloned()
        .collect();
    bucket_by(&on_date, pricing, hour_key, BucketOrder::Ascending)
}
