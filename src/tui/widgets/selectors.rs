//! Selector bar widget showing the five pivot controls

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;
use crate::types::{Analysis, Selection};

/// One line of `[key] label` pairs for the current selection state.
pub struct SelectorBar {
    selection: Selection,
    theme: Theme,
}

impl SelectorBar {
    pub fn new(selection: Selection, theme: Theme) -> Self {
        Self { selection, theme }
    }

    /// The (hotkey, value) pairs in display order. The cell-stat control is
    /// dimmed unless Times is active, matching its effect.
    fn controls(&self) -> Vec<(char, String, bool)> {
        vec![
            ('a', self.selection.analysis.label().to_string(), true),
            ('f', self.selection.filter.label().to_string(), true),
            ('g', self.selection.aggregation.label().to_string(), true),
            ('p', self.selection.period.label().to_string(), true),
            (
                't',
                self.selection.cell_stat.label().to_string(),
                self.selection.analysis == Analysis::Times,
            ),
        ]
    }
}

impl Widget for SelectorBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut spans: Vec<Span> = Vec::new();
        for (key, value, active) in self.controls() {
            let (key_color, value_style) = if active {
                (
                    self.theme.accent(),
                    Style::default()
                        .fg(self.theme.text())
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (self.theme.muted(), Style::default().fg(self.theme.muted()))
            };
            spans.push(Span::styled(
                format!("[{}] ", key),
                Style::default().fg(key_color),
            ));
            spans.push(Span::styled(value, value_style));
            spans.push(Span::raw("  "));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
