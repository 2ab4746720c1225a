//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Width and height of the help popup
const POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 17;

/// Help popup widget showing keyboard shortcuts
pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear the area first (for overlay effect)
        Clear.render(area, buf);

        let title = format!(" runstat v{} ", VERSION);
        let block = Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1), // [0] Padding
            Constraint::Length(1), // [1] Controls header
            Constraint::Length(1), // [2] Separator
            Constraint::Length(1), // [3] a
            Constraint::Length(1), // [4] f
            Constraint::Length(1), // [5] g
            Constraint::Length(1), // [6] p
            Constraint::Length(1), // [7] t
            Constraint::Length(1), // [8] Padding
            Constraint::Length(1), // [9] General header
            Constraint::Length(1), // [10] Separator
            Constraint::Length(1), // [11] Arrows
            Constraint::Length(1), // [12] r
            Constraint::Length(1), // [13] q/Esc
            Constraint::Min(0),    // Remaining
        ])
        .split(inner);

        let controls_header = Line::from(vec![Span::styled(
            "Pivot controls",
            Style::default()
                .fg(self.theme.header())
                .add_modifier(Modifier::BOLD),
        )]);
        Paragraph::new(controls_header)
            .alignment(Alignment::Left)
            .render(chunks[1], buf);

        let sep = "─".repeat(inner.width as usize);
        buf.set_string(
            chunks[2].x,
            chunks[2].y,
            &sep,
            Style::default().fg(self.theme.muted()),
        );

        render_keybinding(chunks[3], buf, "a", "Cycle analysis", self.theme);
        render_keybinding(chunks[4], buf, "f", "Cycle filter", self.theme);
        render_keybinding(chunks[5], buf, "g", "Cycle aggregation", self.theme);
        render_keybinding(chunks[6], buf, "p", "Cycle period", self.theme);
        render_keybinding(chunks[7], buf, "t", "Cycle time stat (Times)", self.theme);

        let general_header = Line::from(vec![Span::styled(
            "General",
            Style::default()
                .fg(self.theme.header())
                .add_modifier(Modifier::BOLD),
        )]);
        Paragraph::new(general_header)
            .alignment(Alignment::Left)
            .render(chunks[9], buf);

        buf.set_string(
            chunks[10].x,
            chunks[10].y,
            &sep,
            Style::default().fg(self.theme.muted()),
        );

        render_keybinding(chunks[11], buf, "Arrows or h/j/k/l", "Scroll grid", self.theme);
        render_keybinding(chunks[12], buf, "r", "Reload data", self.theme);
        render_keybinding(chunks[13], buf, "q / Esc", "Quit, ? toggles help", self.theme);
    }
}

/// Render a single keybinding line
fn render_keybinding(area: Rect, buf: &mut Buffer, key: &str, desc: &str, theme: Theme) {
    let line = Line::from(vec![
        Span::styled(
            format!("  {:<20}", key),
            Style::default().fg(theme.accent()),
        ),
        Span::styled(desc, Style::default().fg(theme.text())),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Left)
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_popup_centered_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup_area = HelpPopup::centered_area(area);

        assert_eq!(popup_area.width, POPUP_WIDTH);
        assert_eq!(popup_area.height, POPUP_HEIGHT);
        assert_eq!(popup_area.x, (100 - POPUP_WIDTH) / 2);
        assert_eq!(popup_area.y, (50 - POPUP_HEIGHT) / 2);
    }

    #[test]
    fn test_help_popup_small_terminal() {
        // Terminal smaller than popup
        let area = Rect::new(0, 0, 30, 10);
        let popup_area = HelpPopup::centered_area(area);

        assert_eq!(popup_area.width, 30);
        assert_eq!(popup_area.height, 10);
    }
}
