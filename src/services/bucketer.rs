//! Period bucketing service
//!
//! Re-aggregates raw daily observations into month, quarter, or year buckets
//! before pivoting. One algorithm serves all three granularities: group rows
//! by (event_code, period label), then average each measure's valid values.

use crate::types::{Bucketing, Measure, Observation};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fixed 3-letter English month abbreviations, calendar order.
pub const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Quarter labels, calendar order.
pub const QUARTER_LABELS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Extract the month number from a `DD/MM/YYYY` or ISO `YYYY-MM-DD` string.
fn month_number(date: &str) -> Option<u32> {
    let field = if date.contains('/') {
        date.split('/').nth(1)?
    } else if date.len() >= 7 && date.as_bytes().get(4) == Some(&b'-') {
        &date[5..7]
    } else {
        return None;
    };
    let month: u32 = field.parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// Extract the year label from a `DD/MM/YYYY` or ISO `YYYY-MM-DD` string.
fn year_label(date: &str) -> Option<String> {
    if date.contains('/') {
        let last = date.split('/').next_back()?;
        (!last.is_empty()).then(|| last.to_string())
    } else if date.len() >= 10 && date.as_bytes().get(4) == Some(&b'-') {
        Some(date[..4].to_string())
    } else {
        None
    }
}

/// Derive the bucket label for a raw date string.
///
/// A date matching neither format yields an empty label. Such rows are not
/// discarded: they group under `""` and surface as their own column.
// TODO: drop or quarantine the empty-label bucket once the service stops
// emitting malformed dates
pub fn period_label(date: &str, bucketing: Bucketing) -> String {
    match bucketing {
        Bucketing::Year => year_label(date).unwrap_or_default(),
        Bucketing::Month => month_number(date)
            .map(|m| MONTH_ABBREV[(m - 1) as usize].to_string())
            .unwrap_or_default(),
        Bucketing::Quarter => month_number(date)
            .map(|m| {
                let q = (m as usize).div_ceil(3).clamp(1, 4);
                QUARTER_LABELS[q - 1].to_string()
            })
            .unwrap_or_default(),
    }
}

/// Parse a raw observation date in either accepted format.
pub fn parse_flexible_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

/// Rank of a bucket label within its period ordering:
/// years descending (most recent first), months and quarters in calendar
/// order. Unknown or empty labels sort last.
pub fn label_rank(label: &str, bucketing: Bucketing) -> i64 {
    match bucketing {
        Bucketing::Year => label.parse::<i64>().map(|y| -y).unwrap_or(i64::MAX),
        Bucketing::Month => MONTH_ABBREV
            .iter()
            .position(|m| *m == label)
            .map(|p| p as i64)
            .unwrap_or(i64::MAX),
        Bucketing::Quarter => QUARTER_LABELS
            .iter()
            .position(|q| *q == label)
            .map(|p| p as i64)
            .unwrap_or(i64::MAX),
    }
}

/// Sort bucket labels per the ordering rules above.
pub fn sort_labels(labels: &mut [String], bucketing: Bucketing) {
    labels.sort_by(|a, b| {
        label_rank(a, bucketing)
            .cmp(&label_rank(b, bucketing))
            .then_with(|| a.cmp(b))
    });
}

/// Mean of a measure's valid values within one group, None when empty.
/// Validity re-applies the (0, 10000] event-number filter because bucketing
/// derives from raw rows, not from already-normalized lookups.
fn group_mean(group: &[&Observation], measure: Measure) -> Option<f64> {
    let valid: Vec<f64> = group
        .iter()
        .filter_map(|obs| measure.value_of(obs))
        .filter(|v| measure.accepts(*v))
        .collect();
    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// Bucket raw observations into the requested granularity.
///
/// Output rows carry the bucket label in `event_date` and are sorted by
/// period rank, then event code, so downstream consumers see a stable order
/// regardless of input permutation.
pub fn bucket(observations: &[Observation], bucketing: Bucketing) -> Vec<Observation> {
    let mut groups: HashMap<(String, String), Vec<&Observation>> = HashMap::new();
    for obs in observations {
        let label = period_label(&obs.event_date, bucketing);
        groups
            .entry((obs.event_code.clone(), label))
            .or_default()
            .push(obs);
    }

    let mut result: Vec<Observation> = groups
        .into_iter()
        .map(|((code, label), group)| {
            let mut bucketed = Observation::empty(&code, &group[0].event_name, &label);
            for &measure in Measure::all() {
                measure.set_on(&mut bucketed, group_mean(&group, measure));
            }
            bucketed
        })
        .collect();

    result.sort_by(|a, b| {
        label_rank(&a.event_date, bucketing)
            .cmp(&label_rank(&b.event_date, bucketing))
            .then_with(|| a.event_date.cmp(&b.event_date))
            .then_with(|| a.event_code.cmp(&b.event_code))
    });
    result
}
