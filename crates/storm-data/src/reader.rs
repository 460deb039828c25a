//! Storm data CSV loading.
//!
//! Reads the four columns the report needs from a plain, gzip or bzip2
//! compressed CSV file and converts each row into a [`StormEvent`]. Any bad
//! row aborts the whole load; there is no partial-result mode.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Serialize;
use storm_core::error::{Result, StormError};
use storm_core::models::StormEvent;
use storm_core::settings::ColumnMapping;
use tracing::debug;

// ── Compression ───────────────────────────────────────────────────────────────

/// Container format of the input file, detected from its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Identify the format from the first bytes of a file.
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(b"BZh") {
            Compression::Bzip2
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "plain"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Result of [`load_events`].
#[derive(Debug, Clone)]
pub struct LoadedEvents {
    pub events: Vec<StormEvent>,
    pub compression: Compression,
}

/// Open `path`, detect compression, and parse every row into a [`StormEvent`].
pub fn load_events(path: &Path, columns: &ColumnMapping) -> Result<LoadedEvents> {
    let file = File::open(path).map_err(|source| StormError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buffered = BufReader::new(file);
    let header = buffered.fill_buf().map_err(|source| StormError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let compression = Compression::detect(header);

    let source: Box<dyn Read> = match compression {
        Compression::None => Box::new(buffered),
        Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(buffered)),
        Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(buffered)),
    };

    let events = load_events_from_reader(source, columns)?;

    debug!(
        "Loaded {} events from {} ({})",
        events.len(),
        path.display(),
        compression
    );

    Ok(LoadedEvents {
        events,
        compression,
    })
}

/// Parse CSV text from any reader. The first row must be the header.
pub fn load_events_from_reader<R: Read>(
    reader: R,
    columns: &ColumnMapping,
) -> Result<Vec<StormEvent>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut events = Vec::new();
    let mut record = csv::StringRecord::new();
    while csv_reader.read_record(&mut record).map_err(csv_error)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        events.push(parse_record(&record, &index, columns, line)?);
    }

    Ok(events)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Positions of the required columns within each record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnIndex {
    event_type: usize,
    fatalities: usize,
    damage_value: usize,
    damage_unit: usize,
}

impl ColumnIndex {
    /// Locate every configured column, matching names case-insensitively.
    fn resolve(headers: &csv::StringRecord, columns: &ColumnMapping) -> Result<Self> {
        let find = |wanted: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| {
                    h.trim_start_matches('\u{feff}')
                        .trim()
                        .eq_ignore_ascii_case(wanted.trim())
                })
                .ok_or_else(|| StormError::MissingColumn {
                    column: wanted.to_string(),
                })
        };

        Ok(Self {
            event_type: find(&columns.event_type)?,
            fatalities: find(&columns.fatalities)?,
            damage_value: find(&columns.damage_value)?,
            damage_unit: find(&columns.damage_unit)?,
        })
    }

    /// Number of fields a record needs to reach every required column.
    fn min_len(&self) -> usize {
        [
            self.event_type,
            self.fatalities,
            self.damage_value,
            self.damage_unit,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

fn parse_record(
    record: &csv::StringRecord,
    index: &ColumnIndex,
    columns: &ColumnMapping,
    line: u64,
) -> Result<StormEvent> {
    if record.len() < index.min_len() {
        return Err(StormError::InvalidRow {
            line,
            message: format!(
                "expected at least {} fields, found {}",
                index.min_len(),
                record.len()
            ),
        });
    }

    let field = |i: usize| record.get(i).unwrap_or_default();

    let raw_fatalities = field(index.fatalities);
    let fatalities =
        parse_fatalities(raw_fatalities).ok_or_else(|| StormError::InvalidField {
            line,
            column: columns.fatalities.clone(),
            value: raw_fatalities.to_string(),
        })?;

    let raw_damage = field(index.damage_value);
    let damage_value = parse_damage(raw_damage).ok_or_else(|| StormError::InvalidField {
        line,
        column: columns.damage_value.clone(),
        value: raw_damage.to_string(),
    })?;

    Ok(StormEvent {
        event_type: field(index.event_type).to_string(),
        fatalities,
        damage_value,
        damage_unit: field(index.damage_unit).to_string(),
    })
}

/// Whole, non-negative count. Integral decimals such as `"5.00"` are accepted.
fn parse_fatalities(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Finite, non-negative magnitude.
fn parse_damage(raw: &str) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        // Fold -0.0 into 0.0.
        Some(value + 0.0)
    } else {
        None
    }
}

fn csv_error(err: csv::Error) -> StormError {
    StormError::Csv(err.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HEADER: &str = "STATE__,BGN_DATE,EVTYPE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP";

    fn sample_csv() -> String {
        [
            HEADER,
            "1,4/18/1950 0:00:00,TORNADO,5,15,10,K",
            "1,4/18/1950 0:00:00,FLOOD,2,0,3,M",
            "1,4/18/1950 0:00:00,TORNADO,1,2,0,",
        ]
        .join("\n")
    }

    fn write_plain(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn write_gzip(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    fn write_bzip2(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    fn parse(body: &str) -> Result<Vec<StormEvent>> {
        load_events_from_reader(body.as_bytes(), &ColumnMapping::default())
    }

    // ── Compression ───────────────────────────────────────────────────────────

    #[test]
    fn test_detect_compression() {
        assert_eq!(Compression::detect(b"BZh91AY&SY"), Compression::Bzip2);
        assert_eq!(Compression::detect(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(Compression::detect(b"\"STATE__\","), Compression::None);
        assert_eq!(Compression::detect(b""), Compression::None);
    }

    // ── load_events_from_reader ───────────────────────────────────────────────

    #[test]
    fn test_parses_required_columns() {
        let events = parse(&sample_csv()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StormEvent {
                event_type: "TORNADO".to_string(),
                fatalities: 5,
                damage_value: 10.0,
                damage_unit: "K".to_string(),
            }
        );
        assert_eq!(events[2].damage_unit, "");
    }

    #[test]
    fn test_header_only_yields_no_events() {
        let events = parse(HEADER).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let body = "evtype,fatalities,propdmg,propdmgexp\nHAIL,0,1.5,K";
        let events = parse(body).unwrap();
        assert_eq!(events[0].event_type, "HAIL");
        assert_eq!(events[0].damage_value, 1.5);
    }

    #[test]
    fn test_quoted_fields_and_whitespace_trimmed() {
        let body = "\"EVTYPE\",\"FATALITIES\",\"PROPDMG\",\"PROPDMGEXP\"\n\"   HIGH SURF ADVISORY\",\"0\",\"200\",\"K\"";
        let events = parse(body).unwrap();
        assert_eq!(events[0].event_type, "HIGH SURF ADVISORY");
    }

    #[test]
    fn test_multiline_quoted_field_is_one_record() {
        let body = "EVTYPE,REMARKS,FATALITIES,PROPDMG,PROPDMGEXP\nFLOOD,\"river rose\nquickly\",1,2,M\nHAIL,,0,0,";
        let events = parse(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, "HAIL");
    }

    #[test]
    fn test_integral_decimal_fatalities_coerced() {
        let body = "EVTYPE,FATALITIES,PROPDMG,PROPDMGEXP\nHEAT,5.00,0,";
        assert_eq!(parse(body).unwrap()[0].fatalities, 5);
    }

    #[test]
    fn test_custom_column_mapping() {
        let columns = ColumnMapping {
            event_type: "kind".to_string(),
            fatalities: "deaths".to_string(),
            damage_value: "dmg".to_string(),
            damage_unit: "exp".to_string(),
        };
        let body = "kind,deaths,dmg,exp\nSTORM,3,4,B";
        let events = load_events_from_reader(body.as_bytes(), &columns).unwrap();
        assert_eq!(events[0].fatalities, 3);
        assert_eq!(events[0].damage_unit, "B");
    }

    // ── Failure modes ─────────────────────────────────────────────────────────

    #[test]
    fn test_missing_column_is_fatal() {
        let body = "EVTYPE,FATALITIES,PROPDMG\nFLOOD,1,2";
        match parse(body) {
            Err(StormError::MissingColumn { column }) => assert_eq!(column, "PROPDMGEXP"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_fatalities_is_fatal() {
        let body = "EVTYPE,FATALITIES,PROPDMG,PROPDMGEXP\nFLOOD,1,2,K\nFLOOD,many,2,K";
        match parse(body) {
            Err(StormError::InvalidField {
                line,
                column,
                value,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "FATALITIES");
                assert_eq!(value, "many");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_or_negative_fatalities_is_fatal() {
        for bad in ["1.5", "-1", ""] {
            let body = format!("EVTYPE,FATALITIES,PROPDMG,PROPDMGEXP\nFLOOD,{},0,", bad);
            assert!(
                matches!(parse(&body), Err(StormError::InvalidField { .. })),
                "value {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bad_damage_is_fatal() {
        for bad in ["abc", "-3", "NaN", "inf", ""] {
            let body = format!("EVTYPE,FATALITIES,PROPDMG,PROPDMGEXP\nFLOOD,0,{},K", bad);
            assert!(
                matches!(parse(&body), Err(StormError::InvalidField { .. })),
                "damage {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_short_row_is_fatal() {
        let body = "EVTYPE,FATALITIES,PROPDMG,PROPDMGEXP\nFLOOD,0";
        assert!(matches!(parse(body), Err(StormError::InvalidRow { .. })));
    }

    // ── load_events ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(dir.path(), "storm.csv", &sample_csv());

        let loaded = load_events(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(loaded.compression, Compression::None);
        assert_eq!(loaded.events.len(), 3);
    }

    #[test]
    fn test_load_gzip_file() {
        let dir = TempDir::new().unwrap();
        let path = write_gzip(dir.path(), "storm.csv.gz", &sample_csv());

        let loaded = load_events(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(loaded.compression, Compression::Gzip);
        assert_eq!(loaded.events.len(), 3);
        assert_eq!(loaded.events[1].event_type, "FLOOD");
    }

    #[test]
    fn test_load_bzip2_file() {
        let dir = TempDir::new().unwrap();
        let path = write_bzip2(dir.path(), "storm.csv.bz2", &sample_csv());

        let loaded = load_events(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(loaded.compression, Compression::Bzip2);
        assert_eq!(loaded.events.len(), 3);
    }

    #[test]
    fn test_compression_detected_by_content_not_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_gzip(dir.path(), "storm.csv", &sample_csv());

        let loaded = load_events(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(loaded.compression, Compression::Gzip);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_events(
            Path::new("/tmp/does-not-exist-storm-report-xyz.csv"),
            &ColumnMapping::default(),
        );
        assert!(matches!(result, Err(StormError::FileRead { .. })));
    }

    #[test]
    fn test_load_empty_file_reports_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(dir.path(), "empty.csv", "");
        let result = load_events(&path, &ColumnMapping::default());
        assert!(matches!(result, Err(StormError::MissingColumn { .. })));
    }
}
