//! Horizontal bar chart views for the storm report TUI.
//!
//! Each ranking is drawn as a bordered [`ratatui::widgets::BarChart`] laid
//! out horizontally: one bar per event type, largest at the top, the event
//! type on the left and the formatted total on the bar.

use ratatui::{
    layout::{Direction, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use storm_core::formatting::{format_compact_dollars, format_count, format_measure};
use storm_core::models::{AggregateRow, Measure};
use storm_data::analysis::ReportAnalysis;

use crate::text_chart::{truncate_label, MAX_LABEL_WIDTH};
use crate::themes::Theme;

/// What a chart shows and how it is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: &'static str,
    /// Axis caption describing the bar values.
    pub value_label: &'static str,
    pub measure: Measure,
}

impl ChartSpec {
    pub fn fatalities() -> Self {
        Self {
            title: "Fatalities by Event Type",
            value_label: "total fatalities",
            measure: Measure::Fatalities,
        }
    }

    pub fn damage() -> Self {
        Self {
            title: "Property Damage by Event Type",
            value_label: "total property damage, USD",
            measure: Measure::Damage,
        }
    }

    pub fn for_measure(measure: Measure) -> Self {
        match measure {
            Measure::Fatalities => Self::fatalities(),
            Measure::Damage => Self::damage(),
        }
    }
}

/// Render one ranking as a horizontal bar chart into `area`.
///
/// Rows are drawn in the order given, so a ranking sorted descending puts the
/// largest bar at the top. An empty slice renders [`render_no_data`].
pub fn render_ranking_chart(
    frame: &mut Frame,
    area: Rect,
    spec: &ChartSpec,
    rows: &[AggregateRow],
    theme: &Theme,
) {
    if rows.is_empty() {
        render_no_data(frame, area, spec.title, theme);
        return;
    }

    let bar_style = match spec.measure {
        Measure::Fatalities => theme.bar_fatalities,
        Measure::Damage => theme.bar_damage,
    };

    let bars: Vec<Bar> = rows
        .iter()
        .map(|row| {
            let value = row.measure_value(spec.measure);
            Bar::default()
                .value(bar_value(value))
                .label(Line::from(truncate_label(&row.event_type, MAX_LABEL_WIDTH)))
                .text_value(format_measure(spec.measure, value))
                .style(bar_style)
        })
        .collect();

    let title = Line::from(vec![
        Span::styled(format!(" {} ", spec.title), theme.header),
        Span::styled(format!("({}) ", spec.value_label), theme.dim),
    ]);

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(bar_style)
        .value_style(theme.bar_value)
        .label_style(theme.bar_label)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

/// Render the totals footer beneath the charts.
///
/// The second line flags records whose damage was zeroed by an unrecognised
/// unit code, or shows the key help when there are none.
pub fn render_footer(frame: &mut Frame, area: Rect, analysis: &ReportAnalysis, theme: &Theme) {
    let totals = &analysis.totals;
    let summary = Line::from(vec![
        Span::styled("Records: ", theme.label),
        Span::styled(format_count(analysis.metadata.records_read as u64), theme.value),
        Span::styled("  │  ", theme.separator),
        Span::styled("Event types: ", theme.label),
        Span::styled(format_count(totals.event_types as u64), theme.value),
        Span::styled("  │  ", theme.separator),
        Span::styled("Fatalities: ", theme.label),
        Span::styled(format_count(totals.fatalities), theme.table_total),
        Span::styled("  │  ", theme.separator),
        Span::styled("Damage: ", theme.label),
        Span::styled(format_compact_dollars(totals.damage), theme.table_total),
    ]);

    let mut lines = vec![summary];
    if let Some(note) = unmapped_note(analysis) {
        lines.push(Line::from(Span::styled(note, theme.warning)));
    }
    lines.push(Line::from(Span::styled(
        "Tab/←/→: switch view  1: fatalities  2: damage  b: both  q: quit",
        theme.dim,
    )));

    frame.render_widget(
        Paragraph::new(lines).style(theme.text).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.separator),
        ),
        area,
    );
}

/// One-line warning describing unmapped unit codes, if any were seen.
pub fn unmapped_note(analysis: &ReportAnalysis) -> Option<String> {
    let records = analysis.unmapped_records();
    if records == 0 {
        return None;
    }
    let codes: Vec<String> = analysis
        .unmapped_units
        .keys()
        .map(|code| format!("{:?}", code))
        .collect();
    Some(format!(
        "⚠ {} records with unrecognised unit codes ({}) counted as $0",
        format_count(records as u64),
        codes.join(", ")
    ))
}

/// Render a placeholder when a ranking has no rows.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No storm events found", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the input file and the column names.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(text).style(theme.text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        ),
        area,
    );
}

/// Bar length for a measure value; bars are integral.
fn bar_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
