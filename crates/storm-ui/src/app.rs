//! Application state and TUI event loop for the storm report.
//!
//! [`App`] owns the theme and which chart(s) are on screen. The report is
//! computed before the UI starts, so the loop only redraws and handles keys.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Frame, Terminal,
};

use storm_core::models::Measure;
use storm_data::analysis::{Ranking, ReportAnalysis};

use crate::chart_view::{self, ChartSpec};
use crate::themes::Theme;

/// Rows reserved below the charts for the totals footer.
const FOOTER_HEIGHT: u16 = 4;

// ── ChartView ─────────────────────────────────────────────────────────────────

/// Which chart(s) the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    /// Both rankings, stacked.
    Both,
    Fatalities,
    Damage,
}

impl ChartView {
    /// The next view in `Both → Fatalities → Damage → Both` order.
    pub fn next(self) -> Self {
        match self {
            ChartView::Both => ChartView::Fatalities,
            ChartView::Fatalities => ChartView::Damage,
            ChartView::Damage => ChartView::Both,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            ChartView::Both => ChartView::Damage,
            ChartView::Fatalities => ChartView::Both,
            ChartView::Damage => ChartView::Fatalities,
        }
    }

    /// Initial view for a report computed over `measures`.
    pub fn for_measures(measures: &[Measure]) -> Self {
        match measures {
            [Measure::Fatalities] => ChartView::Fatalities,
            [Measure::Damage] => ChartView::Damage,
            _ => ChartView::Both,
        }
    }

    fn shows(self, measure: Measure) -> bool {
        match self {
            ChartView::Both => true,
            ChartView::Fatalities => measure == Measure::Fatalities,
            ChartView::Damage => measure == Measure::Damage,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the storm report TUI.
pub struct App {
    pub theme: Theme,
    pub view: ChartView,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, view: ChartView) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view,
            should_quit: false,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Show `analysis` until the user quits with `q`, `Esc` or `Ctrl+C`.
    ///
    /// The terminal is restored even when setup, drawing or reading events
    /// fails.
    pub fn run(mut self, analysis: &ReportAnalysis) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_after_failed_setup(&mut io::stdout());
                return Err(e);
            }
        };

        let result = self.event_loop(&mut terminal, analysis);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        analysis: &ReportAnalysis,
    ) -> io::Result<()> {
        let tick_rate = Duration::from_millis(250);

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame, analysis))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Apply one key press to the application state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right | KeyCode::Down => self.view = self.view.next(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Up => self.view = self.view.previous(),
            KeyCode::Char('1') | KeyCode::Char('f') => self.view = ChartView::Fatalities,
            KeyCode::Char('2') | KeyCode::Char('d') => self.view = ChartView::Damage,
            KeyCode::Char('b') => self.view = ChartView::Both,
            _ => {}
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Rankings visible in the current view.
    ///
    /// Falls back to every ranking when the view selects a measure the report
    /// was not computed for.
    pub fn visible_rankings<'a>(&self, analysis: &'a ReportAnalysis) -> Vec<&'a Ranking> {
        let selected: Vec<&Ranking> = analysis
            .rankings
            .iter()
            .filter(|r| self.view.shows(r.measure))
            .collect();
        if selected.is_empty() {
            analysis.rankings.iter().collect()
        } else {
            selected
        }
    }

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame, analysis: &ReportAnalysis) {
        let [charts_area, footer_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
                .areas(frame.area());

        let rankings = self.visible_rankings(analysis);
        if rankings.is_empty() {
            chart_view::render_no_data(frame, charts_area, "Storm Report", &self.theme);
        } else {
            let areas = split_evenly(charts_area, rankings.len());
            for (ranking, area) in rankings.iter().zip(areas) {
                chart_view::render_ranking_chart(
                    frame,
                    area,
                    &ChartSpec::for_measure(ranking.measure),
                    &ranking.rows,
                    &self.theme,
                );
            }
        }

        chart_view::render_footer(frame, footer_area, analysis, &self.theme);
    }
}

/// Undo raw mode and the alternate screen after setup failed part-way.
///
/// Errors are ignored so the original failure is the one reported.
fn restore_after_failed_setup<W: io::Write>(out: &mut W) {
    let _ = disable_raw_mode();
    let _ = execute!(out, LeaveAlternateScreen);
}

/// Split `area` into `count` stacked rows of (nearly) equal height.
fn split_evenly(area: Rect, count: usize) -> Vec<Rect> {
    let count = count.max(1) as u32;
    let constraints = (0..count).map(|_| Constraint::Ratio(1, count));
    Layout::vertical(constraints).split(area).to_vec()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
