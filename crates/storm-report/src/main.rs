mod bootstrap;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use storm_core::formatting::{format_compact_dollars, format_count};
use storm_core::settings::Settings;
use storm_data::analysis::{analyze_file, ReportAnalysis};
use storm_data::export::write_rankings;
use storm_ui::app::{App, ChartView};
use storm_ui::chart_view::{unmapped_note, ChartSpec};
use storm_ui::text_chart::render_text_chart;

/// Line width used for `--output text`.
const TEXT_CHART_WIDTH: usize = 80;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Storm report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Top: {}, Measure: {}, Unit table: {}, Output: {}",
        settings.top_n,
        settings.measure,
        settings.unit_table,
        settings.output
    );

    let options = settings.report_options()?;

    let input = settings
        .input
        .clone()
        .or_else(bootstrap::discover_input_path)
        .with_context(|| {
            format!(
                "No --input given and none of {} found in the working directory",
                bootstrap::INPUT_CANDIDATES.join(", ")
            )
        })?;

    let analysis = analyze_file(&input, &options)
        .with_context(|| format!("Failed to build report from {}", input.display()))?;

    if let Some(path) = &settings.export {
        write_rankings(&analysis, path)
            .with_context(|| format!("Failed to export rankings to {}", path.display()))?;
    }

    match settings.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&analysis)?),
        "text" => print!("{}", text_report(&analysis)),
        _ => {
            if std::io::stdout().is_terminal() {
                let app = App::new(&settings.theme, ChartView::for_measures(&options.measures));
                app.run(&analysis)?;
            } else {
                tracing::info!("stdout is not a terminal; writing text charts instead");
                print!("{}", text_report(&analysis));
            }
        }
    }

    Ok(())
}

/// Every ranking as a plain-text chart, followed by totals.
fn text_report(analysis: &ReportAnalysis) -> String {
    let mut out = String::new();

    if let Some(input) = &analysis.metadata.input {
        out.push_str(&format!(
            "Storm report for {} ({} records, {} event types)\n\n",
            input,
            format_count(analysis.metadata.records_read as u64),
            format_count(analysis.totals.event_types as u64)
        ));
    }

    for ranking in &analysis.rankings {
        let spec = ChartSpec::for_measure(ranking.measure);
        out.push_str(&render_text_chart(&spec, &ranking.rows, TEXT_CHART_WIDTH));
        out.push('\n');
    }

    out.push_str(&format!(
        "Totals: {} fatalities, {} property damage\n",
        format_count(analysis.totals.fatalities),
        format_compact_dollars(analysis.totals.damage)
    ));
    if let Some(note) = unmapped_note(analysis) {
        out.push_str(&note);
        out.push('\n');
    }
    out
}
