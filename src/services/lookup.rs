//! Lookup table construction
//!
//! Projects the (bucketed) observation set into per-measure two-dimensional
//! tables keyed by (period label, event code), bundled in one context struct
//! that the evaluator takes by reference. Tables are built fresh on every
//! render and never mutated afterwards.

use crate::services::bucketer::{self, parse_flexible_date};
use crate::types::{Measure, Observation, PeriodChoice};
use std::collections::HashMap;

/// `period → event_code → value` for one measure.
pub type MeasureTable = HashMap<String, HashMap<String, f64>>;

/// A distinct event appearing in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub code: String,
    pub name: String,
}

/// All lookup tables plus the ordered axes of the pivot grid.
///
/// The `event_number` table is special: entries exist only for values in
/// (0, 10000], so a missing entry doubles as the "no event happened" signal
/// for granular periods. Every other table stores whatever value is present,
/// including 0 — zero volunteers is data, not absence.
#[derive(Debug, Default)]
pub struct PivotLookups {
    pub participants: MeasureTable,
    pub volunteers: MeasureTable,
    pub tourists: MeasureTable,
    pub super_tourists: MeasureTable,
    pub first_timers: MeasureTable,
    pub regulars: MeasureTable,
    pub coeff: MeasureTable,
    pub event_number: MeasureTable,
    pub avg_time: MeasureTable,
    pub avg_time_12: MeasureTable,
    pub avg_time_5: MeasureTable,
    pub avg_age: MeasureTable,
    /// Period labels in display order: dates latest-first for granular
    /// periods, years descending, months/quarters in calendar order.
    pub periods: Vec<String>,
    /// Events in display order (by name, then code).
    pub events: Vec<EventEntry>,
}

impl PivotLookups {
    /// Build the full lookup context for the current period selection.
    /// Applies bucketing first when the period calls for it.
    pub fn build(observations: &[Observation], period: PeriodChoice) -> Self {
        match period.bucketing() {
            Some(bucketing) => {
                let bucketed = bucketer::bucket(observations, bucketing);
                Self::from_rows(&bucketed, period)
            }
            None => Self::from_rows(observations, period),
        }
    }

    fn from_rows(rows: &[Observation], period: PeriodChoice) -> Self {
        let mut lookups = PivotLookups::default();

        for obs in rows {
            for &measure in Measure::all() {
                let Some(value) = measure.value_of(obs) else {
                    continue;
                };
                if !measure.accepts(value) {
                    continue;
                }
                lookups
                    .table_mut(measure)
                    .entry(obs.event_date.clone())
                    .or_default()
                    .insert(obs.event_code.clone(), value);
            }
        }

        lookups.periods = ordered_periods(rows, period);
        lookups.events = ordered_events(rows);
        lookups
    }

    /// The lookup table for a measure.
    pub fn table(&self, measure: Measure) -> &MeasureTable {
        match measure {
            Measure::Participants => &self.participants,
            Measure::Volunteers => &self.volunteers,
            Measure::Tourists => &self.tourists,
            Measure::SuperTourists => &self.super_tourists,
            Measure::FirstTimers => &self.first_timers,
            Measure::Regulars => &self.regulars,
            Measure::Coeff => &self.coeff,
            Measure::EventNumber => &self.event_number,
            Measure::AvgTime => &self.avg_time,
            Measure::AvgTime12 => &self.avg_time_12,
            Measure::AvgTime5 => &self.avg_time_5,
            Measure::AvgAge => &self.avg_age,
        }
    }

    fn table_mut(&mut self, measure: Measure) -> &mut MeasureTable {
        match measure {
            Measure::Participants => &mut self.participants,
            Measure::Volunteers => &mut self.volunteers,
            Measure::Tourists => &mut self.tourists,
            Measure::SuperTourists => &mut self.super_tourists,
            Measure::FirstTimers => &mut self.first_timers,
            Measure::Regulars => &mut self.regulars,
            Measure::Coeff => &mut self.coeff,
            Measure::EventNumber => &mut self.event_number,
            Measure::AvgTime => &mut self.avg_time,
            Measure::AvgTime12 => &mut self.avg_time_12,
            Measure::AvgTime5 => &mut self.avg_time_5,
            Measure::AvgAge => &mut self.avg_age,
        }
    }

    /// One measure value for a cell, if present.
    pub fn value(&self, measure: Measure, period: &str, code: &str) -> Option<f64> {
        self.table(measure)
            .get(period)
            .and_then(|row| row.get(code))
            .copied()
    }

    /// Whether an event took place in this period. Only meaningful under
    /// granular periods; bucketed rows carry no raw event number.
    pub fn has_event_number(&self, period: &str, code: &str) -> bool {
        self.value(Measure::EventNumber, period, code).is_some()
    }
}

/// Distinct period labels in display order.
fn ordered_periods(rows: &[Observation], period: PeriodChoice) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for obs in rows {
        if !labels.contains(&obs.event_date) {
            labels.push(obs.event_date.clone());
        }
    }

    match period.bucketing() {
        Some(bucketing) => bucketer::sort_labels(&mut labels, bucketing),
        None => {
            // Raw dates: latest first; unparseable dates sort last
            labels.sort_by(|a, b| {
                let ka = parse_flexible_date(a);
                let kb = parse_flexible_date(b);
                match (ka, kb) {
                    (Some(da), Some(db)) => db.cmp(&da),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.cmp(b),
                }
            });
        }
    }
    labels
}

/// Distinct events sorted by display name, then code.
fn ordered_events(rows: &[Observation]) -> Vec<EventEntry> {
    let mut events: Vec<EventEntry> = Vec::new();
    for obs in rows {
        if !events.iter().any(|e| e.code == obs.event_code) {
            events.push(EventEntry {
                code: obs.event_code.clone(),
                name: obs.event_name.clone(),
            });
        }
    }
    events.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(code: &str, name: &str, date: &str) -> Observation {
        Observation {
            last_position: Some(100.0),
            volunteers: Some(0.0),
            event_number: Some(12.0),
            ..Observation::empty(code, name, date)
        }
    }

    // ========== Table construction ==========

    #[test]
    fn test_zero_is_stored_for_plain_measures() {
        let rows = vec![obs("1", "Riverside", "05/01/2022")];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.value(Measure::Volunteers, "05/01/2022", "1"), Some(0.0));
    }

    #[test]
    fn test_event_number_zero_is_not_stored() {
        let mut row = obs("1", "Riverside", "05/01/2022");
        row.event_number = Some(0.0);
        let lookups = PivotLookups::build(&[row], PeriodChoice::Recent);
        assert!(!lookups.has_event_number("05/01/2022", "1"));
    }

    #[test]
    fn test_event_number_above_limit_is_not_stored() {
        let mut row = obs("1", "Riverside", "05/01/2022");
        row.event_number = Some(15_000.0);
        let lookups = PivotLookups::build(&[row], PeriodChoice::Recent);
        assert!(!lookups.has_event_number("05/01/2022", "1"));
        // Other measures on the same row are unaffected
        assert_eq!(
            lookups.value(Measure::Participants, "05/01/2022", "1"),
            Some(100.0)
        );
    }

    #[test]
    fn test_absent_measure_has_no_entry() {
        let rows = vec![obs("1", "Riverside", "05/01/2022")];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.value(Measure::AvgTime, "05/01/2022", "1"), None);
    }

    // ========== Axis ordering ==========

    #[test]
    fn test_granular_periods_latest_first() {
        let rows = vec![
            obs("1", "Riverside", "05/01/2022"),
            obs("1", "Riverside", "19/01/2022"),
            obs("1", "Riverside", "12/01/2022"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.periods, vec!["19/01/2022", "12/01/2022", "05/01/2022"]);
    }

    #[test]
    fn test_granular_mixed_formats_ordered_by_date() {
        let rows = vec![
            obs("1", "Riverside", "2022-01-05"),
            obs("1", "Riverside", "12/01/2022"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.periods, vec!["12/01/2022", "2022-01-05"]);
    }

    #[test]
    fn test_unparseable_dates_sort_last() {
        let rows = vec![
            obs("1", "Riverside", "garbled"),
            obs("1", "Riverside", "05/01/2022"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.periods, vec!["05/01/2022", "garbled"]);
    }

    #[test]
    fn test_annual_build_buckets_years_descending() {
        let rows = vec![
            obs("1", "Riverside", "05/01/2020"),
            obs("1", "Riverside", "05/01/2022"),
            obs("1", "Riverside", "05/01/2021"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Annual);
        assert_eq!(lookups.periods, vec!["2022", "2021", "2020"]);
        // Bucketed rows carry no raw event number suppression signal;
        // the table is still populated from the bucketed means
        assert_eq!(
            lookups.value(Measure::Participants, "2021", "1"),
            Some(100.0)
        );
    }

    #[test]
    fn test_events_sorted_by_name() {
        let rows = vec![
            obs("9", "Seafront", "05/01/2022"),
            obs("2", "Abbey Fields", "05/01/2022"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        let names: Vec<&str> = lookups.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Abbey Fields", "Seafront"]);
    }

    #[test]
    fn test_duplicate_events_collapse() {
        let rows = vec![
            obs("1", "Riverside", "05/01/2022"),
            obs("1", "Riverside", "12/01/2022"),
        ];
        let lookups = PivotLookups::build(&rows, PeriodChoice::Recent);
        assert_eq!(lookups.events.len(), 1);
    }
}
