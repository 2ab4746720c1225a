//! Pivot table widget - the event × period grid
//!
//! A thin presentation layer over the evaluator's three query surfaces:
//! `cell_value`, `row_aggregate`, and `column_aggregate`. All numbers are
//! computed by the evaluator; this widget only lays them out.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::services::{Evaluator, PivotLookups};
use crate::tui::theme::Theme;
use crate::types::Selection;

/// Width of the event-name column (includes 2 chars for selection marker)
const NAME_WIDTH: u16 = 22;

/// Width of one period column
const PERIOD_WIDTH: u16 = 11;

/// Width of the trailing aggregate column
const AGGREGATE_WIDTH: u16 = 11;

/// Rows consumed by the header and the column-aggregate summary line
const HEADER_ROWS: u16 = 2;

/// How many period columns fit beside the fixed columns.
fn visible_period_count(width: u16) -> usize {
    let fixed = NAME_WIDTH + AGGREGATE_WIDTH;
    if width <= fixed {
        return 0;
    }
    ((width - fixed) / PERIOD_WIDTH) as usize
}

/// Truncate a label to fit its column, keeping the tail readable.
fn fit(label: &str, width: usize) -> String {
    if label.len() <= width {
        label.to_string()
    } else {
        let mut out: String = label.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Pivot grid widget
pub struct PivotTable<'a> {
    lookups: &'a PivotLookups,
    evaluator: &'a Evaluator<'a>,
    selection: Selection,
    row_scroll: usize,
    col_scroll: usize,
    theme: Theme,
}

impl<'a> PivotTable<'a> {
    pub fn new(
        lookups: &'a PivotLookups,
        evaluator: &'a Evaluator<'a>,
        selection: Selection,
        row_scroll: usize,
        col_scroll: usize,
        theme: Theme,
    ) -> Self {
        Self {
            lookups,
            evaluator,
            selection,
            row_scroll,
            col_scroll,
            theme,
        }
    }

    /// Visible rows for a given widget height.
    pub fn visible_rows(area_height: u16) -> usize {
        area_height.saturating_sub(HEADER_ROWS) as usize
    }
}

impl Widget for PivotTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < NAME_WIDTH + PERIOD_WIDTH || area.height <= HEADER_ROWS {
            return;
        }

        let periods = &self.lookups.periods;
        let events = &self.lookups.events;

        let visible_cols = visible_period_count(area.width);
        let col_scroll = self
            .col_scroll
            .min(periods.len().saturating_sub(visible_cols));
        let visible_periods: Vec<&String> =
            periods.iter().skip(col_scroll).take(visible_cols).collect();

        let visible_rows = Self::visible_rows(area.height);
        let row_scroll = self
            .row_scroll
            .min(events.len().saturating_sub(visible_rows));

        let header_style = Style::default()
            .fg(self.theme.header())
            .add_modifier(Modifier::BOLD);
        let summary_style = Style::default().fg(self.theme.summary());
        let muted = Style::default().fg(self.theme.muted());

        // Header row: event column label, period labels, aggregate label
        let y = area.y;
        buf.set_string(area.x, y, fit("Event", NAME_WIDTH as usize - 1), header_style);
        let mut x = area.x + NAME_WIDTH;
        for period in &visible_periods {
            let label = if period.is_empty() { "?" } else { period.as_str() };
            buf.set_string(x, y, fit(label, PERIOD_WIDTH as usize - 1), header_style);
            x += PERIOD_WIDTH;
        }
        buf.set_string(
            x,
            y,
            fit(self.selection.aggregation.label(), AGGREGATE_WIDTH as usize),
            header_style,
        );

        // Summary row: column aggregates across all events
        let y = area.y + 1;
        buf.set_string(area.x, y, fit("All events", NAME_WIDTH as usize - 1), muted);
        let mut x = area.x + NAME_WIDTH;
        for period in &visible_periods {
            let aggregate = self.evaluator.column_aggregate(period.as_str());
            buf.set_string(x, y, fit(&aggregate.display, PERIOD_WIDTH as usize - 1), summary_style);
            x += PERIOD_WIDTH;
        }

        // One row per event: name, cells, trailing row aggregate
        for (offset, event) in events.iter().skip(row_scroll).take(visible_rows).enumerate() {
            let y = area.y + HEADER_ROWS + offset as u16;
            buf.set_string(
                area.x,
                y,
                fit(&event.name, NAME_WIDTH as usize - 1),
                Style::default().fg(self.theme.text()),
            );

            let mut x = area.x + NAME_WIDTH;
            for period in &visible_periods {
                let cell = self.evaluator.cell_value(period.as_str(), &event.code);
                let style = if cell.emphasized {
                    Style::default()
                        .fg(self.theme.milestone())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.text())
                };
                buf.set_string(x, y, fit(&cell.display, PERIOD_WIDTH as usize - 1), style);
                x += PERIOD_WIDTH;
            }

            let aggregate = self.evaluator.row_aggregate(&event.code);
            buf.set_string(
                x,
                y,
                fit(&aggregate.display, AGGREGATE_WIDTH as usize),
                summary_style,
            );
        }
    }
}
