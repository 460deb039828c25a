//! Plain-text horizontal bar charts for non-interactive output.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use storm_core::formatting::format_measure;
use storm_core::models::AggregateRow;

use crate::chart_view::ChartSpec;

/// Widest event-type label drawn before it gets cut with an ellipsis.
pub const MAX_LABEL_WIDTH: usize = 24;

const BAR_CHAR: &str = "█";

/// Render one ranking as text, one line per row, largest bar first.
///
/// `width` is the total line width to fill; the bar area shrinks to fit the
/// labels and value labels but never drops below one column.
pub fn render_text_chart(spec: &ChartSpec, rows: &[AggregateRow], width: usize) -> String {
    let mut out = String::new();
    out.push_str(spec.title);
    out.push('\n');
    out.push_str(&"─".repeat(spec.title.width()));
    out.push('\n');

    if rows.is_empty() {
        out.push_str("No storm events found\n");
        return out;
    }

    let labels: Vec<String> = rows
        .iter()
        .map(|r| truncate_label(&r.event_type, MAX_LABEL_WIDTH))
        .collect();
    let values: Vec<String> = rows
        .iter()
        .map(|r| format_measure(spec.measure, r.measure_value(spec.measure)))
        .collect();

    let label_width = labels.iter().map(|l| l.width()).max().unwrap_or(0);
    let value_width = values.iter().map(|v| v.width()).max().unwrap_or(0);
    let bar_area = width.saturating_sub(label_width + value_width + 2).max(1);

    let max_value = rows
        .iter()
        .map(|r| r.measure_value(spec.measure))
        .fold(0.0_f64, f64::max);

    for ((label, value), row) in labels.iter().zip(&values).zip(rows) {
        let bar_len = bar_length(row.measure_value(spec.measure), max_value, bar_area);
        out.push_str(label);
        out.push_str(&" ".repeat(label_width - label.width() + 1));
        out.push_str(&BAR_CHAR.repeat(bar_len));
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }

    out.push_str(&format!("({})\n", spec.value_label));
    out
}

/// Number of bar cells for `value` when `max` fills `area` cells.
///
/// Non-zero values always get at least one cell.
fn bar_length(value: f64, max: f64, area: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let cells = (value / max * area as f64).round() as usize;
    cells.clamp(1, area)
}

/// Cut `label` to at most `max_width` display columns, ending in `…` if cut.
pub fn truncate_label(label: &str, max_width: usize) -> String {
    if label.width() <= max_width {
        return label.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in label.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_type: &str, fatalities: u64, damage: f64) -> AggregateRow {
        AggregateRow {
            event_type: event_type.to_string(),
            fatalities_total: fatalities,
            damage_total: damage,
        }
    }

    #[test]
    fn test_render_text_chart_fatalities() {
        let rows = vec![row("TORNADO", 6, 10_000.0), row("FLOOD", 2, 3_000_000.0)];
        let chart = render_text_chart(&ChartSpec::fatalities(), &rows, 40);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines[0], ChartSpec::fatalities().title);
        assert!(lines[2].starts_with("TORNADO "));
        assert!(lines[2].ends_with(" 6"));
        assert!(lines[3].starts_with("FLOOD   "));
        assert!(lines[3].ends_with(" 2"));

        let full = lines[2].matches(BAR_CHAR).count();
        let partial = lines[3].matches(BAR_CHAR).count();
        assert!(full > partial);
        assert!(partial >= 1);
    }

    #[test]
    fn test_render_text_chart_damage_uses_compact_dollars() {
        let rows = vec![row("FLOOD", 2, 3_000_000.0), row("TORNADO", 6, 10_000.0)];
        let chart = render_text_chart(&ChartSpec::damage(), &rows, 60);
        assert!(chart.contains("$3.0M"));
        assert!(chart.contains("$10.0K"));
    }

    #[test]
    fn test_render_text_chart_fits_width() {
        let rows = vec![row("THUNDERSTORM WIND", 900, 0.0), row("HEAT", 50, 0.0)];
        let chart = render_text_chart(&ChartSpec::fatalities(), &rows, 50);
        for line in chart.lines().skip(2).take(2) {
            assert!(line.width() <= 50, "{line:?} is wider than 50");
        }
    }

    #[test]
    fn test_render_text_chart_zero_value_has_no_bar() {
        let rows = vec![row("TORNADO", 6, 0.0), row("HAIL", 0, 0.0)];
        let chart = render_text_chart(&ChartSpec::fatalities(), &rows, 40);
        let hail = chart.lines().find(|l| l.starts_with("HAIL")).unwrap();
        assert_eq!(hail.matches(BAR_CHAR).count(), 0);
    }

    #[test]
    fn test_render_text_chart_empty() {
        let chart = render_text_chart(&ChartSpec::damage(), &[], 40);
        assert!(chart.contains("No storm events found"));
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("HAIL", 10), "HAIL");
        assert_eq!(truncate_label("THUNDERSTORM WINDS/HAIL", 10), "THUNDERST…");
        assert_eq!(truncate_label("THUNDERSTORM WINDS/HAIL", 10).width(), 10);
    }

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(10.0, 10.0, 20), 20);
        assert_eq!(bar_length(5.0, 10.0, 20), 10);
        assert_eq!(bar_length(0.001, 10.0, 20), 1);
        assert_eq!(bar_length(0.0, 10.0, 20), 0);
        assert_eq!(bar_length(3.0, 0.0, 20), 0);
    }
}
