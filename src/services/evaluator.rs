//! Cell and aggregate evaluation
//!
//! Pure functions over the lookup tables plus the current selection state.
//! Three query surfaces feed the renderer: a single cell value, a row
//! aggregate (one event across all periods), and a column aggregate (one
//! period across all events). There is no fatal path here: every edge case
//! (missing entries, zero denominators, empty value lists) degrades to a
//! blank cell.

use crate::services::format::{
    display_decimals, format_coeff, format_decimals, format_percent, format_signed, format_time,
    is_milestone,
};
use crate::services::lookup::PivotLookups;
use crate::types::{Aggregation, Analysis, CellStat, Filter, Measure, Selection};

/// One evaluated value: the formatted display string, the raw numeric it was
/// formatted from (for comparison/highlighting), and a milestone flag.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutput {
    pub display: String,
    pub raw: Option<f64>,
    pub emphasized: bool,
}

impl CellOutput {
    /// "No data" — renders as an empty cell, never as an error.
    pub fn blank() -> Self {
        Self {
            display: String::new(),
            raw: None,
            emphasized: false,
        }
    }

    fn plain(raw: f64, display: String) -> Self {
        Self {
            display,
            raw: Some(raw),
            emphasized: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw.is_none()
    }
}

/// Evaluator over one lookup context and one selection.
///
/// The lookups are taken by reference and never mutated; the selection is
/// defensively re-snapped so that any illegal combination handed in by a
/// caller evaluates as its nearest legal one.
pub struct Evaluator<'a> {
    lookups: &'a PivotLookups,
    selection: Selection,
}

impl<'a> Evaluator<'a> {
    pub fn new(lookups: &'a PivotLookups, selection: Selection) -> Self {
        let mut selection = selection;
        selection.snap();
        Self { lookups, selection }
    }

    /// The count measure addressed by a cohort filter.
    fn filter_measure(filter: Filter) -> Measure {
        match filter {
            Filter::All => Measure::Participants,
            Filter::Tourists => Measure::Tourists,
            Filter::SuperTourists => Measure::SuperTourists,
            Filter::Volunteers => Measure::Volunteers,
            Filter::Regulars => Measure::Regulars,
            Filter::FirstTimers => Measure::FirstTimers,
            Filter::EventNumber => Measure::EventNumber,
            Filter::Coeff => Measure::Coeff,
        }
    }

    /// The measure whose lookup table drives the current selection.
    fn active_measure(&self) -> Measure {
        match self.selection.analysis {
            Analysis::Participants | Analysis::PctParticipants | Analysis::PctTotal => {
                Self::filter_measure(self.selection.filter)
            }
            Analysis::Times => match self.selection.cell_stat {
                CellStat::Average => Measure::AvgTime,
                CellStat::Within12 => Measure::AvgTime12,
                CellStat::Within5 => Measure::AvgTime5,
            },
            Analysis::Age => Measure::AvgAge,
        }
    }

    /// "No event happened" check. Granular periods suppress cells whose
    /// event number is absent; bucketed periods never suppress, since
    /// bucketed rows legitimately carry no raw event number.
    fn event_happened(&self, period: &str, code: &str) -> bool {
        !self.selection.period.is_granular() || self.lookups.has_event_number(period, code)
    }

    /// Sum of the active filter's counts across all events for one period.
    fn column_total(&self, period: &str) -> f64 {
        self.lookups
            .table(Self::filter_measure(self.selection.filter))
            .get(period)
            .map(|row| row.values().sum())
            .unwrap_or(0.0)
    }

    /// Grand total of the active filter's counts over every period and event.
    fn grand_total(&self) -> f64 {
        self.lookups
            .table(Self::filter_measure(self.selection.filter))
            .values()
            .flat_map(|row| row.values())
            .sum()
    }

    // ========================================================================
    // Single cell
    // ========================================================================

    /// Display value for one (period, event) cell.
    pub fn cell_value(&self, period: &str, code: &str) -> CellOutput {
        if !self.event_happened(period, code) {
            return CellOutput::blank();
        }

        match self.selection.analysis {
            Analysis::Age => match self.lookups.value(Measure::AvgAge, period, code) {
                Some(age) => CellOutput::plain(
                    age,
                    format_decimals(age, display_decimals(Analysis::Age, self.selection.filter)),
                ),
                None => CellOutput::blank(),
            },
            Analysis::Times => match self.lookups.value(self.active_measure(), period, code) {
                Some(secs) if secs.is_finite() => CellOutput::plain(secs, format_time(secs)),
                _ => CellOutput::blank(),
            },
            Analysis::PctParticipants => match self.pct_of_participants(period, code) {
                Some(pct) => CellOutput::plain(pct, self.format_pct(pct)),
                None => CellOutput::blank(),
            },
            Analysis::PctTotal => match self.pct_of_column(period, code) {
                Some(pct) => CellOutput::plain(pct, self.format_pct(pct)),
                None => CellOutput::blank(),
            },
            Analysis::Participants => self.participants_cell(period, code),
        }
    }

    /// Share of this cell's participants taken by the filtered cohort.
    fn pct_of_participants(&self, period: &str, code: &str) -> Option<f64> {
        let numerator =
            self.lookups
                .value(Self::filter_measure(self.selection.filter), period, code)?;
        let denominator = self.lookups.value(Measure::Participants, period, code)?;
        if denominator == 0.0 {
            return None;
        }
        Some(numerator / denominator * 100.0)
    }

    /// Share of the period's column total taken by this cell.
    fn pct_of_column(&self, period: &str, code: &str) -> Option<f64> {
        let numerator =
            self.lookups
                .value(Self::filter_measure(self.selection.filter), period, code)?;
        let total = self.column_total(period);
        if total == 0.0 {
            return None;
        }
        Some(numerator / total * 100.0)
    }

    fn format_pct(&self, pct: f64) -> String {
        format_percent(
            pct,
            display_decimals(self.selection.analysis, self.selection.filter),
        )
    }

    fn participants_cell(&self, period: &str, code: &str) -> CellOutput {
        let Some(value) = self.lookups.value(self.active_measure(), period, code) else {
            return CellOutput::blank();
        };
        match self.selection.filter {
            Filter::Coeff => CellOutput::plain(value, format_coeff(value)),
            Filter::EventNumber => CellOutput {
                display: format_decimals(value, 0),
                raw: Some(value),
                emphasized: is_milestone(value),
            },
            Filter::All => CellOutput::plain(
                value,
                format_decimals(value, display_decimals(self.selection.analysis, Filter::All)),
            ),
            // Cohort counts: a zero renders blank, unlike plain participants
            _ => {
                if value == 0.0 {
                    CellOutput::blank()
                } else {
                    CellOutput::plain(
                        value,
                        format_decimals(
                            value,
                            display_decimals(self.selection.analysis, self.selection.filter),
                        ),
                    )
                }
            }
        }
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// The raw numeric a cell contributes to aggregation, if valid.
    fn cell_number(&self, period: &str, code: &str) -> Option<f64> {
        if !self.event_happened(period, code) {
            return None;
        }
        match self.selection.analysis {
            Analysis::PctParticipants => self.pct_of_participants(period, code),
            Analysis::PctTotal => self.pct_of_column(period, code),
            _ => {
                let measure = self.active_measure();
                self.lookups
                    .value(measure, period, code)
                    .filter(|v| measure.accepts(*v))
            }
        }
    }

    /// Aggregate one event's values across all periods.
    pub fn row_aggregate(&self, code: &str) -> CellOutput {
        if self.is_pct_total_share() {
            let table = self.lookups.table(Self::filter_measure(self.selection.filter));
            let event_sum: f64 = table.values().filter_map(|row| row.get(code)).sum();
            let grand = self.grand_total();
            if grand == 0.0 {
                return CellOutput::blank();
            }
            let pct = event_sum / grand * 100.0;
            return CellOutput::plain(pct, self.format_pct(pct));
        }

        let values: Vec<f64> = self
            .lookups
            .periods
            .iter()
            .filter_map(|p| self.cell_number(p, code))
            .collect();
        self.aggregate_output(&values)
    }

    /// Aggregate one period's values across all events.
    pub fn column_aggregate(&self, period: &str) -> CellOutput {
        if self.is_pct_total_share() {
            let column_sum: f64 = self
                .lookups
                .table(Self::filter_measure(self.selection.filter))
                .get(period)
                .map(|row| row.values().sum())
                .unwrap_or(0.0);
            let total = self.column_total(period);
            if total == 0.0 {
                return CellOutput::blank();
            }
            let pct = column_sum / total * 100.0;
            return CellOutput::plain(pct, self.format_pct(pct));
        }

        let values: Vec<f64> = self
            .lookups
            .events
            .iter()
            .filter_map(|e| self.cell_number(period, &e.code))
            .collect();
        self.aggregate_output(&values)
    }

    /// %Total × Total is a share of summed numerators, not a sum of
    /// per-period percentages.
    fn is_pct_total_share(&self) -> bool {
        self.selection.analysis == Analysis::PctTotal
            && self.selection.aggregation == Aggregation::Total
    }

    /// Apply the selected aggregation to an ordered (latest-first) value
    /// list and format the result for the active measure family.
    fn aggregate_output(&self, values: &[f64]) -> CellOutput {
        let Some(result) = apply_aggregation(self.selection.aggregation, values) else {
            return CellOutput::blank();
        };

        // Growth is a signed delta in every measure family
        if self.selection.aggregation == Aggregation::Growth {
            return CellOutput::plain(result, format_signed(result));
        }

        match self.selection.analysis {
            Analysis::Times => CellOutput::plain(result, format_time(result)),
            Analysis::Age | Analysis::PctParticipants | Analysis::PctTotal => {
                let decimals = display_decimals(self.selection.analysis, self.selection.filter);
                let display = if self.selection.analysis == Analysis::Age {
                    format_decimals(result, decimals)
                } else {
                    format_percent(result, decimals)
                };
                CellOutput::plain(result, display)
            }
            Analysis::Participants => self.participants_aggregate(result),
        }
    }

    fn participants_aggregate(&self, result: f64) -> CellOutput {
        match self.selection.filter {
            Filter::Coeff => {
                let adjusted = match self.selection.aggregation {
                    // Averaged coefficients keep 4 decimal places
                    Aggregation::Avg => (result * 10_000.0).round() / 10_000.0,
                    // Range is re-based onto 1.0 so it formats as a
                    // positive percent spread
                    Aggregation::Range => result + 1.0,
                    _ => result,
                };
                CellOutput::plain(adjusted, format_coeff(adjusted))
            }
            Filter::EventNumber => CellOutput::plain(result, format_decimals(result, 0)),
            _ => CellOutput::plain(
                result,
                format_decimals(
                    result,
                    display_decimals(self.selection.analysis, self.selection.filter),
                ),
            ),
        }
    }
}

/// Apply an aggregation to values stored latest-first.
/// Returns None for the "no data" cases that render blank.
fn apply_aggregation(aggregation: Aggregation, values: &[f64]) -> Option<f64> {
    match aggregation {
        Aggregation::Avg => {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        }
        Aggregation::Total => (!values.is_empty()).then(|| values.iter().sum()),
        Aggregation::Max => {
            if values.is_empty() {
                Some(0.0)
            } else {
                Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
        }
        Aggregation::Min => {
            if values.is_empty() {
                Some(0.0)
            } else {
                Some(values.iter().copied().fold(f64::INFINITY, f64::min))
            }
        }
        Aggregation::Range => {
            if values.is_empty() {
                Some(0.0)
            } else {
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                Some(max - min)
            }
        }
        Aggregation::Growth => Some(slope_latest_first(values)),
    }
}

/// Least-squares slope over values stored latest-first. The list is reversed
/// into chronological order and regressed against index 0..n-1; fewer than
/// two points yield 0.
fn slope_latest_first(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let chronological: Vec<f64> = values.iter().rev().copied().collect();
    let count = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = chronological.iter().sum();
    let sum_xy: f64 = chronological
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum();
    let sum_x2: f64 = (0..n).map(|i| (i as f64) * (i as f64)).sum();
    let denominator = count * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (count * sum_xy - sum_x * sum_y) / denominator
}
