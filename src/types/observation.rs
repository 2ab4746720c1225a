//! Observation types for the pivot engine

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) for a legitimate event sequence number.
/// Values outside (0, 10000] are data-entry artifacts and treated as absent.
pub const EVENT_NUMBER_MAX: f64 = 10_000.0;

/// Whether a raw value is a usable event sequence number.
pub fn is_valid_event_number(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= EVENT_NUMBER_MAX
}

/// One canonical row per (event, date).
///
/// Measures are `Option<f64>`: `None` means "no value recorded", which must
/// stay distinct from `Some(0.0)` — zero volunteers is a real observation,
/// a missing `event_number` means no event took place that day.
///
/// After period bucketing, `event_date` holds a bucket label (a year string,
/// `Jan`..`Dec`, or `Q1`..`Q4`) instead of a raw date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub event_code: String,
    pub event_name: String,
    pub event_date: String,
    pub last_position: Option<f64>,
    pub volunteers: Option<f64>,
    pub tourists: Option<f64>,
    pub super_tourists: Option<f64>,
    pub first_timers: Option<f64>,
    pub regulars: Option<f64>,
    pub avg_time: Option<f64>,
    pub avg_time_12: Option<f64>,
    pub avg_time_5: Option<f64>,
    pub avg_age: Option<f64>,
    pub coeff: Option<f64>,
    pub event_number: Option<f64>,
}

impl Observation {
    /// An observation with identity fields set and every measure absent.
    pub fn empty(code: &str, name: &str, date: &str) -> Self {
        Self {
            event_code: code.to_string(),
            event_name: name.to_string(),
            event_date: date.to_string(),
            last_position: None,
            volunteers: None,
            tourists: None,
            super_tourists: None,
            first_timers: None,
            regulars: None,
            avg_time: None,
            avg_time_12: None,
            avg_time_5: None,
            avg_age: None,
            coeff: None,
            event_number: None,
        }
    }
}

/// The numeric measures carried by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Participants,
    Volunteers,
    Tourists,
    SuperTourists,
    FirstTimers,
    Regulars,
    Coeff,
    EventNumber,
    AvgTime,
    AvgTime12,
    AvgTime5,
    AvgAge,
}

impl Measure {
    /// All measures, in lookup-table construction order.
    pub fn all() -> &'static [Measure] {
        &[
            Measure::Participants,
            Measure::Volunteers,
            Measure::Tourists,
            Measure::SuperTourists,
            Measure::FirstTimers,
            Measure::Regulars,
            Measure::Coeff,
            Measure::EventNumber,
            Measure::AvgTime,
            Measure::AvgTime12,
            Measure::AvgTime5,
            Measure::AvgAge,
        ]
    }

    /// Read this measure off an observation.
    pub fn value_of(self, obs: &Observation) -> Option<f64> {
        match self {
            Measure::Participants => obs.last_position,
            Measure::Volunteers => obs.volunteers,
            Measure::Tourists => obs.tourists,
            Measure::SuperTourists => obs.super_tourists,
            Measure::FirstTimers => obs.first_timers,
            Measure::Regulars => obs.regulars,
            Measure::Coeff => obs.coeff,
            Measure::EventNumber => obs.event_number,
            Measure::AvgTime => obs.avg_time,
            Measure::AvgTime12 => obs.avg_time_12,
            Measure::AvgTime5 => obs.avg_time_5,
            Measure::AvgAge => obs.avg_age,
        }
    }

    /// Write this measure on an observation (used by the bucketer).
    pub fn set_on(self, obs: &mut Observation, value: Option<f64>) {
        match self {
            Measure::Participants => obs.last_position = value,
            Measure::Volunteers => obs.volunteers = value,
            Measure::Tourists => obs.tourists = value,
            Measure::SuperTourists => obs.super_tourists = value,
            Measure::FirstTimers => obs.first_timers = value,
            Measure::Regulars => obs.regulars = value,
            Measure::Coeff => obs.coeff = value,
            Measure::EventNumber => obs.event_number = value,
            Measure::AvgTime => obs.avg_time = value,
            Measure::AvgTime12 => obs.avg_time_12 = value,
            Measure::AvgTime5 => obs.avg_time_5 = value,
            Measure::AvgAge => obs.avg_age = value,
        }
    }

    /// Whether a value is usable for aggregation and bucketing.
    /// Only the event sequence number carries a range restriction.
    pub fn accepts(self, value: f64) -> bool {
        match self {
            Measure::EventNumber => is_valid_event_number(value),
            _ => value.is_finite(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_number_validity() {
        assert!(is_valid_event_number(1.0));
        assert!(is_valid_event_number(10_000.0));
        assert!(!is_valid_event_number(0.0));
        assert!(!is_valid_event_number(-3.0));
        assert!(!is_valid_event_number(10_001.0));
        assert!(!is_valid_event_number(15_000.0));
        assert!(!is_valid_event_number(f64::NAN));
    }

    #[test]
    fn test_measure_roundtrip() {
        let mut obs = Observation::empty("1", "Riverside", "05/01/2022");
        for &m in Measure::all() {
            assert_eq!(m.value_of(&obs), None);
            m.set_on(&mut obs, Some(7.0));
            assert_eq!(m.value_of(&obs), Some(7.0));
        }
    }

    #[test]
    fn test_accepts_filters_only_event_number() {
        assert!(Measure::Volunteers.accepts(0.0));
        assert!(!Measure::EventNumber.accepts(0.0));
        assert!(!Measure::EventNumber.accepts(15_000.0));
        assert!(Measure::EventNumber.accepts(250.0));
        assert!(!Measure::Coeff.accepts(f64::INFINITY));
    }
}
