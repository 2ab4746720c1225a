//! Selection state: the five UI-controlled pivot parameters
//!
//! Each parameter has an enumerated set of legal values; `filter` and
//! `aggregation` are constrained by the current `analysis` and snap to the
//! first legal value whenever the constraint would be violated.

use serde::Serialize;

/// Measure family shown in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Analysis {
    #[default]
    Participants,
    PctParticipants,
    PctTotal,
    Times,
    Age,
}

impl Analysis {
    pub fn label(self) -> &'static str {
        match self {
            Self::Participants => "Participants",
            Self::PctParticipants => "%Participants",
            Self::PctTotal => "%Total",
            Self::Times => "Times",
            Self::Age => "Age",
        }
    }

    pub fn all() -> &'static [Analysis] {
        &[
            Analysis::Participants,
            Analysis::PctParticipants,
            Analysis::PctTotal,
            Analysis::Times,
            Analysis::Age,
        ]
    }

    pub fn next(self) -> Self {
        cycle(Self::all(), self)
    }

    /// Parse a CLI key like "participants" or "pct-total".
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "participants" => Some(Self::Participants),
            "pct-participants" => Some(Self::PctParticipants),
            "pct-total" => Some(Self::PctTotal),
            "times" => Some(Self::Times),
            "age" => Some(Self::Age),
            _ => None,
        }
    }

    /// Legal sub-measure filters for this measure family.
    pub fn allowed_filters(self) -> &'static [Filter] {
        use Filter::*;
        match self {
            Self::Participants => &[
                All,
                Tourists,
                SuperTourists,
                Volunteers,
                Regulars,
                FirstTimers,
                EventNumber,
                Coeff,
            ],
            Self::PctParticipants => &[Tourists, SuperTourists, Volunteers, Regulars, FirstTimers],
            Self::PctTotal => &[All, Tourists, SuperTourists, Volunteers, Regulars, FirstTimers],
            Self::Times | Self::Age => &[All],
        }
    }
}

/// Sub-measure / cohort filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Filter {
    #[default]
    All,
    Tourists,
    SuperTourists,
    Volunteers,
    Regulars,
    FirstTimers,
    EventNumber,
    Coeff,
}

impl Filter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Tourists => "Tourists",
            Self::SuperTourists => "Super-tourists",
            Self::Volunteers => "Volunteers",
            Self::Regulars => "Regulars",
            Self::FirstTimers => "First-timers",
            Self::EventNumber => "Event number",
            Self::Coeff => "Coefficient",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "all" => Some(Self::All),
            "tourists" => Some(Self::Tourists),
            "super-tourists" => Some(Self::SuperTourists),
            "volunteers" => Some(Self::Volunteers),
            "regulars" => Some(Self::Regulars),
            "first-timers" => Some(Self::FirstTimers),
            "event-number" => Some(Self::EventNumber),
            "coeff" => Some(Self::Coeff),
            _ => None,
        }
    }
}

/// Aggregation applied across a row (one event) or column (one period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Aggregation {
    #[default]
    Avg,
    Total,
    Max,
    Min,
    Range,
    Growth,
}

impl Aggregation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Avg => "Avg",
            Self::Total => "Total",
            Self::Max => "Max",
            Self::Min => "Min",
            Self::Range => "Range",
            Self::Growth => "Growth",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "avg" => Some(Self::Avg),
            "total" => Some(Self::Total),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "range" => Some(Self::Range),
            "growth" => Some(Self::Growth),
            _ => None,
        }
    }
}

/// Legal aggregations for an (analysis, filter) pair.
pub fn allowed_aggregations(analysis: Analysis, filter: Filter) -> &'static [Aggregation] {
    use Aggregation::*;
    match analysis {
        Analysis::Times => &[Avg, Max, Min, Growth],
        Analysis::PctParticipants => &[Avg, Max, Min, Range, Growth],
        Analysis::PctTotal => &[Avg, Total, Max, Min, Range],
        Analysis::Age => &[Avg, Max, Min, Range, Growth],
        Analysis::Participants => match filter {
            // No meaningful total for sequence numbers or ratio coefficients
            Filter::EventNumber | Filter::Coeff => &[Avg, Max, Min, Range, Growth],
            _ => &[Avg, Total, Max, Min, Range, Growth],
        },
    }
}

/// Time span / bucketing choice; also the fetch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PeriodChoice {
    #[default]
    Recent,
    LastFifty,
    SinceDate,
    All,
    Annual,
    MonthSeasonality,
    QuarterSeasonality,
}

/// Bucketing granularity applied before pivoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucketing {
    Year,
    Month,
    Quarter,
}

impl PeriodChoice {
    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "Recent",
            Self::LastFifty => "Last 50",
            Self::SinceDate => "Since date",
            Self::All => "All",
            Self::Annual => "Annual",
            Self::MonthSeasonality => "Months",
            Self::QuarterSeasonality => "Quarters",
        }
    }

    /// Query-string key sent to the results service.
    pub fn query_key(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::LastFifty => "last50",
            Self::SinceDate => "since",
            Self::All => "all",
            Self::Annual => "annual",
            Self::MonthSeasonality => "monthseason",
            Self::QuarterSeasonality => "quarterseason",
        }
    }

    pub fn all() -> &'static [PeriodChoice] {
        &[
            PeriodChoice::Recent,
            PeriodChoice::LastFifty,
            PeriodChoice::SinceDate,
            PeriodChoice::All,
            PeriodChoice::Annual,
            PeriodChoice::MonthSeasonality,
            PeriodChoice::QuarterSeasonality,
        ]
    }

    pub fn next(self) -> Self {
        cycle(Self::all(), self)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.query_key() == key)
    }

    /// Bucketing applied to raw rows under this period, if any.
    pub fn bucketing(self) -> Option<Bucketing> {
        match self {
            Self::Annual => Some(Bucketing::Year),
            Self::MonthSeasonality => Some(Bucketing::Month),
            Self::QuarterSeasonality => Some(Bucketing::Quarter),
            _ => None,
        }
    }

    /// Granular periods keep raw dates as columns; bucketed ones do not.
    /// The "no event happened" suppression only applies to granular periods,
    /// since bucketed rows legitimately carry no raw event number.
    pub fn is_granular(self) -> bool {
        self.bucketing().is_none()
    }
}

/// Which time variant a single Times cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CellStat {
    #[default]
    Average,
    Within12,
    Within5,
}

impl CellStat {
    pub fn label(self) -> &'static str {
        match self {
            Self::Average => "Avg time",
            Self::Within12 => "Avg \u{2264}12%",
            Self::Within5 => "Avg \u{2264}5%",
        }
    }

    pub fn all() -> &'static [CellStat] {
        &[CellStat::Average, CellStat::Within12, CellStat::Within5]
    }

    pub fn next(self) -> Self {
        cycle(Self::all(), self)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "avg" => Some(Self::Average),
            "within12" => Some(Self::Within12),
            "within5" => Some(Self::Within5),
            _ => None,
        }
    }
}

/// Times-only modifier. A single option is active today; the variant exists
/// so the selection surface matches the full control set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimeAdjustment {
    #[default]
    None,
}

impl TimeAdjustment {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Unadjusted",
        }
    }
}

/// The five independent pivot controls, kept mutually legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub analysis: Analysis,
    pub filter: Filter,
    pub aggregation: Aggregation,
    pub period: PeriodChoice,
    pub cell_stat: CellStat,
    pub time_adjustment: TimeAdjustment,
}

impl Selection {
    /// Force `filter` and `aggregation` into their legal sets, snapping each
    /// to the first allowed value when out of range. Never an error.
    pub fn snap(&mut self) {
        let filters = self.analysis.allowed_filters();
        if !filters.contains(&self.filter) {
            self.filter = filters[0];
        }
        let aggs = allowed_aggregations(self.analysis, self.filter);
        if !aggs.contains(&self.aggregation) {
            self.aggregation = aggs[0];
        }
    }

    /// Switch measure family, re-deriving dependent defaults.
    pub fn set_analysis(&mut self, analysis: Analysis) {
        self.analysis = analysis;
        self.snap();
    }

    pub fn cycle_analysis(&mut self) {
        self.set_analysis(self.analysis.next());
    }

    /// Advance to the next legal filter for the current analysis.
    pub fn cycle_filter(&mut self) {
        let filters = self.analysis.allowed_filters();
        let pos = filters.iter().position(|f| *f == self.filter).unwrap_or(0);
        self.filter = filters[(pos + 1) % filters.len()];
        self.snap();
    }

    /// Advance to the next legal aggregation for the current pair.
    pub fn cycle_aggregation(&mut self) {
        let aggs = allowed_aggregations(self.analysis, self.filter);
        let pos = aggs.iter().position(|a| *a == self.aggregation).unwrap_or(0);
        self.aggregation = aggs[(pos + 1) % aggs.len()];
    }

    pub fn cycle_period(&mut self) {
        self.period = self.period.next();
    }

    pub fn cycle_cell_stat(&mut self) {
        self.cell_stat = self.cell_stat.next();
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(pos + 1) % all.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Allowed sets ==========

    #[test]
    fn test_times_has_no_total_or_range() {
        let aggs = allowed_aggregations(Analysis::Times, Filter::All);
        assert!(!aggs.contains(&Aggregation::Total));
        assert!(!aggs.contains(&Aggregation::Range));
        assert!(aggs.contains(&Aggregation::Growth));
    }

    #[test]
    fn test_pct_total_has_no_growth() {
        let aggs = allowed_aggregations(Analysis::PctTotal, Filter::Tourists);
        assert!(aggs.contains(&Aggregation::Total));
        assert!(!aggs.contains(&Aggregation::Growth));
    }

    #[test]
    fn test_event_number_and_coeff_forbid_total() {
        for filter in [Filter::EventNumber, Filter::Coeff] {
            let aggs = allowed_aggregations(Analysis::Participants, filter);
            assert!(!aggs.contains(&Aggregation::Total), "{filter:?}");
            assert_eq!(aggs.len(), 5);
        }
    }

    #[test]
    fn test_plain_counts_allow_all_six() {
        let aggs = allowed_aggregations(Analysis::Participants, Filter::Volunteers);
        assert_eq!(aggs.len(), 6);
    }

    #[test]
    fn test_times_and_age_only_allow_all_filter() {
        assert_eq!(Analysis::Times.allowed_filters(), &[Filter::All]);
        assert_eq!(Analysis::Age.allowed_filters(), &[Filter::All]);
    }

    // ========== Snapping ==========

    #[test]
    fn test_set_analysis_rederives_filter() {
        let mut sel = Selection {
            analysis: Analysis::Participants,
            filter: Filter::EventNumber,
            aggregation: Aggregation::Range,
            ..Selection::default()
        };
        sel.set_analysis(Analysis::PctParticipants);
        // EventNumber is illegal for %Participants: snaps to first allowed
        assert_eq!(sel.filter, Filter::Tourists);
        assert!(allowed_aggregations(sel.analysis, sel.filter).contains(&sel.aggregation));
    }

    #[test]
    fn test_snap_fixes_illegal_aggregation() {
        let mut sel = Selection {
            analysis: Analysis::Times,
            filter: Filter::All,
            aggregation: Aggregation::Total,
            ..Selection::default()
        };
        sel.snap();
        assert_eq!(sel.aggregation, Aggregation::Avg);
    }

    #[test]
    fn test_snap_keeps_legal_state_untouched() {
        let mut sel = Selection {
            analysis: Analysis::PctTotal,
            filter: Filter::Volunteers,
            aggregation: Aggregation::Total,
            ..Selection::default()
        };
        let before = sel;
        sel.snap();
        assert_eq!(sel, before);
    }

    #[test]
    fn test_cycle_filter_wraps_within_allowed_set() {
        let mut sel = Selection {
            analysis: Analysis::PctParticipants,
            filter: Filter::FirstTimers,
            ..Selection::default()
        };
        sel.snap();
        sel.cycle_filter();
        assert_eq!(sel.filter, Filter::Tourists);
    }

    #[test]
    fn test_cycle_aggregation_skips_illegal_values() {
        let mut sel = Selection {
            analysis: Analysis::Times,
            filter: Filter::All,
            aggregation: Aggregation::Min,
            ..Selection::default()
        };
        sel.cycle_aggregation();
        assert_eq!(sel.aggregation, Aggregation::Growth);
        sel.cycle_aggregation();
        assert_eq!(sel.aggregation, Aggregation::Avg);
    }

    // ========== Period choice ==========

    #[test]
    fn test_bucketing_only_for_seasonality_periods() {
        assert_eq!(PeriodChoice::Annual.bucketing(), Some(Bucketing::Year));
        assert_eq!(
            PeriodChoice::MonthSeasonality.bucketing(),
            Some(Bucketing::Month)
        );
        assert_eq!(
            PeriodChoice::QuarterSeasonality.bucketing(),
            Some(Bucketing::Quarter)
        );
        assert_eq!(PeriodChoice::Recent.bucketing(), None);
        assert!(PeriodChoice::Recent.is_granular());
        assert!(!PeriodChoice::Annual.is_granular());
    }

    #[test]
    fn test_period_from_key_roundtrip() {
        for &p in PeriodChoice::all() {
            assert_eq!(PeriodChoice::from_key(p.query_key()), Some(p));
        }
        assert_eq!(PeriodChoice::from_key("bogus"), None);
    }

    #[test]
    fn test_analysis_from_key() {
        assert_eq!(Analysis::from_key("pct-total"), Some(Analysis::PctTotal));
        assert_eq!(Analysis::from_key("times"), Some(Analysis::Times));
        assert_eq!(Analysis::from_key("nope"), None);
    }

    #[test]
    fn test_default_selection_is_legal() {
        let mut sel = Selection::default();
        let before = sel;
        sel.snap();
        assert_eq!(sel, before);
    }
}
