//! Application state and event loop
//!
//! The pivot grid is recomputed from the raw observation set on every draw;
//! the only state held between frames is the observation set itself, the
//! selection parameters, and the scroll offsets. Fetches run on a background
//! thread and are tagged with a monotonic generation so a slow response for
//! an old period selection can never overwrite newer data.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    DefaultTerminal, Frame,
};

use crate::services::{DataSource, Evaluator, PivotLookups};
use crate::types::{Observation, Selection};

use super::theme::Theme;
use super::widgets::{
    help::HelpPopup,
    pivot::PivotTable,
    selectors::SelectorBar,
    spinner::{LoadingStage, Spinner},
};

/// A fetch result tagged with the generation that requested it.
type FetchMessage = (u64, Result<Vec<Observation>, String>);

/// Application state
pub enum AppState {
    /// Fetching data with spinner animation
    Loading {
        spinner_frame: usize,
        stage: LoadingStage,
    },
    /// Ready with the current observation set
    Ready { rows: Vec<Observation> },
    /// Fetch failed; a later selection change retries naturally
    Error { message: String },
}

/// Main application
pub struct App {
    state: AppState,
    selection: Selection,
    should_quit: bool,
    show_help: bool,
    row_scroll: usize,
    col_scroll: usize,
    /// Bumped on every fetch request; stale responses are discarded
    fetch_generation: u64,
    theme: Theme,
}

impl App {
    /// Create a new app in loading state
    pub fn new(theme: Theme) -> Self {
        Self {
            state: AppState::Loading {
                spinner_frame: 0,
                stage: LoadingStage::Fetching,
            },
            selection: Selection::default(),
            should_quit: false,
            show_help: false,
            row_scroll: 0,
            col_scroll: 0,
            fetch_generation: 0,
            theme,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn fetch_generation(&self) -> u64 {
        self.fetch_generation
    }

    /// Apply a tagged fetch result. Responses from a superseded request are
    /// dropped: the latest issued generation wins, regardless of arrival
    /// order.
    pub fn apply_fetch_result(&mut self, generation: u64, result: Result<Vec<Observation>, String>) {
        if generation != self.fetch_generation {
            return;
        }
        match result {
            Ok(rows) => {
                self.row_scroll = 0;
                self.col_scroll = 0;
                self.state = AppState::Ready { rows };
            }
            Err(message) => self.state = AppState::Error { message },
        }
    }

    /// Begin a new fetch cycle, invalidating any in-flight response.
    pub fn begin_fetch(&mut self) -> u64 {
        self.fetch_generation += 1;
        self.state = AppState::Loading {
            spinner_frame: 0,
            stage: LoadingStage::Fetching,
        };
        self.fetch_generation
    }

    /// Current grid dimensions, for scroll clamping.
    fn grid_size(&self) -> (usize, usize) {
        match &self.state {
            AppState::Ready { rows } => {
                let lookups = PivotLookups::build(rows, self.selection.period);
                (lookups.events.len(), lookups.periods.len())
            }
            _ => (0, 0),
        }
    }

    /// Handle keyboard events. Returns true when a new fetch is needed.
    pub fn handle_event(&mut self, event: Event) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        if key.kind != KeyEventKind::Press {
            return false;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('a') => {
                self.selection.cycle_analysis();
            }
            KeyCode::Char('f') => {
                self.selection.cycle_filter();
            }
            KeyCode::Char('g') => {
                self.selection.cycle_aggregation();
            }
            KeyCode::Char('t') => {
                self.selection.cycle_cell_stat();
            }
            KeyCode::Char('p') => {
                self.selection.cycle_period();
                self.row_scroll = 0;
                self.col_scroll = 0;
                return true;
            }
            KeyCode::Char('r') => {
                return true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.row_scroll = self.row_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let (rows, _) = self.grid_size();
                self.row_scroll = (self.row_scroll + 1).min(rows.saturating_sub(1));
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.col_scroll = self.col_scroll.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let (_, cols) = self.grid_size();
                self.col_scroll = (self.col_scroll + 1).min(cols.saturating_sub(1));
            }
            _ => {}
        }
        false
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading {
            spinner_frame,
            stage,
        } = &self.state
        {
            self.state = AppState::Loading {
                spinner_frame: Spinner::next_frame(*spinner_frame),
                stage: *stage,
            };
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                let spinner = Spinner::new(*spinner_frame, *stage);
                spinner.render(area, buf);
            }
            AppState::Ready { rows } => {
                let chunks = Layout::vertical([
                    Constraint::Length(1), // [0] Selector bar
                    Constraint::Min(0),    // [1] Pivot grid
                    Constraint::Length(1), // [2] Key hints
                ])
                .split(area);

                SelectorBar::new(self.selection, self.theme).render(chunks[0], buf);

                // The grid is a pure function of (rows, selection): lookups
                // and evaluator are rebuilt from scratch on every frame
                let lookups = PivotLookups::build(rows, self.selection.period);
                let evaluator = Evaluator::new(&lookups, self.selection);
                PivotTable::new(
                    &lookups,
                    &evaluator,
                    self.selection,
                    self.row_scroll,
                    self.col_scroll,
                    self.theme,
                )
                .render(chunks[1], buf);

                let hints = Line::from(vec![Span::styled(
                    " a/f/g/p/t controls  arrows scroll  r reload  ? help  q quit",
                    Style::default().fg(self.theme.muted()),
                )]);
                Paragraph::new(hints).render(chunks[2], buf);

                if self.show_help {
                    let popup_area = HelpPopup::centered_area(area);
                    HelpPopup::new(self.theme).render(popup_area, buf);
                }
            }
            AppState::Error { message } => {
                let y = area.y + area.height / 2;
                let text = format!("Error: {} (change a selector to retry)", message);
                let x = area.x + (area.width.saturating_sub(text.len() as u16)) / 2;
                buf.set_string(x, y, &text, Style::default().fg(self.theme.error()));
            }
        }
    }
}

/// Spawn a background fetch for the given generation.
fn spawn_fetch(
    source: &DataSource,
    selection: Selection,
    generation: u64,
    tx: mpsc::Sender<FetchMessage>,
) {
    let source = source.clone();
    thread::spawn(move || {
        let result = source.load(selection.period).map_err(|e| e.to_string());
        let _ = tx.send((generation, result));
    });
}

/// Run the TUI application
pub fn run(source: DataSource) -> anyhow::Result<()> {
    let theme = Theme::detect();
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, source, theme);
    ratatui::restore();
    result
}

fn run_app(terminal: &mut DefaultTerminal, source: DataSource, theme: Theme) -> anyhow::Result<()> {
    let mut app = App::new(theme);

    let (tx, rx) = mpsc::channel::<FetchMessage>();
    let generation = app.begin_fetch();
    spawn_fetch(&source, app.selection(), generation, tx.clone());

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Non-blocking check for fetch completion; stale generations are
        // dropped inside apply_fetch_result
        if let Ok((generation, result)) = rx.try_recv() {
            app.apply_fetch_result(generation, result);
        }

        if event::poll(Duration::from_millis(100))? {
            let needs_fetch = app.handle_event(event::read()?);
            if needs_fetch {
                let generation = app.begin_fetch();
                spawn_fetch(&source, app.selection(), generation, tx.clone());
            }
        }

        app.tick();
    }

    Ok(())
}
