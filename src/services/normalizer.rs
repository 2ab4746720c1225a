//! Row normalization service
//!
//! Maps heterogeneous raw backend records into canonical observations.
//! The service has drifted field names over the years (`first_timers_count`
//! vs `first_timer_count`, `super_tourist_count` vs `super_tourist`), so each
//! measure is resolved through an ordered candidate list: the first candidate
//! holding a number (or a string-encoded number) wins.

use crate::types::{is_valid_event_number, Observation};
use serde_json::Value;

/// A raw record as returned by the results service.
pub type RawRecord = serde_json::Map<String, Value>;

const EVENT_CODE_KEYS: &[&str] = &["event_code", "code"];
const EVENT_NAME_KEYS: &[&str] = &["event_name", "name"];
const EVENT_DATE_KEYS: &[&str] = &["event_date", "date"];

const PARTICIPANT_KEYS: &[&str] = &["last_position", "participants"];
const VOLUNTEER_KEYS: &[&str] = &["volunteers", "volunteer_count"];
const TOURIST_KEYS: &[&str] = &["tourist_count", "tourists"];
const SUPER_TOURIST_KEYS: &[&str] = &["super_tourist_count", "super_tourist"];
const FIRST_TIMER_KEYS: &[&str] = &["first_timers_count", "first_timer_count"];
const REGULARS_KEYS: &[&str] = &["regulars", "regs"];
const AVG_TIME_KEYS: &[&str] = &["average_time", "avg_time"];
const AVG_TIME_12_KEYS: &[&str] = &["average_time_12", "avg_time_12"];
const AVG_TIME_5_KEYS: &[&str] = &["average_time_5", "avg_time_5"];
const AVG_AGE_KEYS: &[&str] = &["average_age", "avg_age"];
const COEFF_KEYS: &[&str] = &["coeff", "coefficient"];
const EVENT_NUMBER_KEYS: &[&str] = &["event_number", "event_no"];

/// Coerce a JSON value to a finite number. Accepts numbers and
/// string-encoded numbers; everything else is not numeric.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Resolve a measure by trying candidate field names in preference order.
/// Returns the first numeric hit, or None when no candidate is numeric.
pub fn resolve_numeric(record: &RawRecord, candidates: &[&str]) -> Option<f64> {
    candidates.iter().find_map(|key| record.get(*key).and_then(as_number))
}

/// A count measure: missing or non-numeric defaults to zero.
fn count_field(record: &RawRecord, candidates: &[&str]) -> Option<f64> {
    Some(resolve_numeric(record, candidates).unwrap_or(0.0))
}

/// A rate/time measure: missing or non-numeric stays absent.
fn rate_field(record: &RawRecord, candidates: &[&str]) -> Option<f64> {
    resolve_numeric(record, candidates)
}

/// Resolve a text field, coercing numeric codes to their string form.
fn text_field(record: &RawRecord, candidates: &[&str]) -> String {
    for key in candidates {
        match record.get(*key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

/// Normalize one raw backend record into a canonical observation.
///
/// `event_number` values outside (0, 10000] are data-entry artifacts and are
/// treated as absent, which downstream reads as "no event happened".
pub fn normalize_row(record: &RawRecord) -> Observation {
    let event_number =
        resolve_numeric(record, EVENT_NUMBER_KEYS).filter(|v| is_valid_event_number(*v));

    Observation {
        event_code: text_field(record, EVENT_CODE_KEYS),
        event_name: text_field(record, EVENT_NAME_KEYS),
        event_date: text_field(record, EVENT_DATE_KEYS),
        last_position: count_field(record, PARTICIPANT_KEYS),
        volunteers: count_field(record, VOLUNTEER_KEYS),
        tourists: count_field(record, TOURIST_KEYS),
        super_tourists: count_field(record, SUPER_TOURIST_KEYS),
        first_timers: count_field(record, FIRST_TIMER_KEYS),
        regulars: count_field(record, REGULARS_KEYS),
        avg_time: rate_field(record, AVG_TIME_KEYS),
        avg_time_12: rate_field(record, AVG_TIME_12_KEYS),
        avg_time_5: rate_field(record, AVG_TIME_5_KEYS),
        avg_age: rate_field(record, AVG_AGE_KEYS),
        coeff: rate_field(record, COEFF_KEYS),
        event_number,
    }
}

/// Normalize a whole fetched payload.
pub fn normalize_rows(records: &[RawRecord]) -> Vec<Observation> {
    records.iter().map(normalize_row).collect()
}
