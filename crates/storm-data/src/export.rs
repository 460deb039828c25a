//! Writing rankings to CSV or JSON files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use storm_core::error::{Result, StormError};
use storm_core::models::Measure;
use tracing::info;

use crate::analysis::ReportAnalysis;

/// File format chosen from the export path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            _ => Err(StormError::Config(format!(
                "export path {} must end in .csv or .json",
                path.display()
            ))),
        }
    }
}

/// One line of an exported ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    /// 1-based position within its ranking.
    pub rank: usize,
    pub measure: Measure,
    pub event_type: String,
    pub fatalities_total: u64,
    pub damage_total: f64,
}

/// Flatten every ranking into rows, rankings in report order.
pub fn export_rows(analysis: &ReportAnalysis) -> Vec<ExportRow> {
    analysis
        .rankings
        .iter()
        .flat_map(|ranking| {
            ranking.rows.iter().enumerate().map(move |(i, row)| ExportRow {
                rank: i + 1,
                measure: ranking.measure,
                event_type: row.event_type.clone(),
                fatalities_total: row.fatalities_total,
                damage_total: row.damage_total,
            })
        })
        .collect()
}

/// Write the rankings to `path` in the format implied by its extension.
pub fn write_rankings(analysis: &ReportAnalysis, path: &Path) -> Result<ExportFormat> {
    let format = ExportFormat::from_path(path)?;
    let rows = export_rows(analysis);

    let file = File::create(path).map_err(|source| StormError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            for row in &rows {
                writer
                    .serialize(row)
                    .map_err(|e| StormError::Csv(e.to_string()))?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    info!("Exported {} ranking rows to {}", rows.len(), path.display());
    Ok(format)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_events;
    use storm_core::models::StormEvent;
    use storm_core::settings::ReportOptions;
    use tempfile::TempDir;

    fn sample_analysis() -> ReportAnalysis {
        let events = vec![
            StormEvent {
                event_type: "TORNADO".to_string(),
                fatalities: 6,
                damage_value: 10.0,
                damage_unit: "K".to_string(),
            },
            StormEvent {
                event_type: "FLOOD".to_string(),
                fatalities: 2,
                damage_value: 3.0,
                damage_unit: "M".to_string(),
            },
        ];
        analyze_events(&events, &ReportOptions::default())
    }

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/top.csv")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("top.JSON")).unwrap(),
            ExportFormat::Json
        );
        assert!(ExportFormat::from_path(Path::new("top.txt")).is_err());
        assert!(ExportFormat::from_path(Path::new("top")).is_err());
    }

    #[test]
    fn test_export_rows_ranks_restart_per_measure() {
        let rows = export_rows(&sample_analysis());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].measure, Measure::Fatalities);
        assert_eq!(rows[0].event_type, "TORNADO");
        assert_eq!(rows[2].rank, 1);
        assert_eq!(rows[2].measure, Measure::Damage);
        assert_eq!(rows[2].event_type, "FLOOD");
    }

    #[test]
    fn test_write_rankings_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");

        let format = write_rankings(&sample_analysis(), &path).unwrap();
        assert_eq!(format, ExportFormat::Csv);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("rank,measure,event_type,fatalities_total,damage_total")
        );
        assert_eq!(lines.next(), Some("1,fatalities,TORNADO,6,10000.0"));
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_write_rankings_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.json");

        write_rankings(&sample_analysis(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3]["event_type"], "TORNADO");
        assert_eq!(rows[3]["measure"], "damage");
    }

    #[test]
    fn test_write_rankings_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.xlsx");
        assert!(matches!(
            write_rankings(&sample_analysis(), &path),
            Err(StormError::Config(_))
        ));
        assert!(!path.exists());
    }
}
