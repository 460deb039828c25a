//! Main analysis pipeline for the storm report.
//!
//! Loads the storm data file, normalizes damage units, aggregates by event
//! type, and ranks the top contributors for each requested measure.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use storm_core::error::Result;
use storm_core::models::{AggregateRow, Measure, StormEvent};
use storm_core::settings::ReportOptions;
use tracing::{debug, info, warn};

use crate::aggregator::{EventAggregator, ReportTotals};
use crate::normalizer::{normalize_all, UnmappedUnit};
use crate::reader::{load_events, Compression};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Input file, when the events came from disk.
    pub input: Option<String>,
    pub compression: Option<Compression>,
    /// Number of data rows read.
    pub records_read: usize,
    /// Unit table in effect, code → multiplier.
    pub unit_table: BTreeMap<String, f64>,
    pub load_time_seconds: f64,
    pub transform_time_seconds: f64,
}

/// The top event types for one measure, largest first.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub measure: Measure,
    /// Requested size; `rows.len()` may be smaller.
    pub top_n: usize,
    pub rows: Vec<AggregateRow>,
}

/// The complete output of [`analyze_file`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportAnalysis {
    pub metadata: AnalysisMetadata,
    pub totals: ReportTotals,
    pub rankings: Vec<Ranking>,
    /// Unit codes that zeroed non-zero damage, with counts.
    pub unmapped_units: BTreeMap<String, UnmappedUnit>,
}

impl ReportAnalysis {
    pub fn ranking(&self, measure: Measure) -> Option<&Ranking> {
        self.rankings.iter().find(|r| r.measure == measure)
    }

    /// Total records whose damage magnitude was discarded.
    pub fn unmapped_records(&self) -> usize {
        self.unmapped_units.values().map(|u| u.records).sum()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline against a file on disk.
///
/// 1. Load events (any load failure aborts).
/// 2. Normalize, aggregate and rank via [`analyze_events`].
/// 3. Stamp file metadata and timings.
pub fn analyze_file(path: &Path, options: &ReportOptions) -> Result<ReportAnalysis> {
    info!("Loading storm data from {}", path.display());

    let load_start = Instant::now();
    let loaded = load_events(path, &options.columns)?;
    let load_time = load_start.elapsed().as_secs_f64();

    info!(
        "Read {} records ({}) in {:.2}s",
        loaded.events.len(),
        loaded.compression,
        load_time
    );

    let mut analysis = analyze_events(&loaded.events, options);
    analysis.metadata.input = Some(path.display().to_string());
    analysis.metadata.compression = Some(loaded.compression);
    analysis.metadata.load_time_seconds = load_time;

    Ok(analysis)
}

/// Normalize, aggregate and rank already-loaded events.
pub fn analyze_events(events: &[StormEvent], options: &ReportOptions) -> ReportAnalysis {
    let transform_start = Instant::now();

    let normalized = normalize_all(events, &options.units);
    for (code, unmapped) in &normalized.unmapped_units {
        warn!(
            "Unit code {:?} is not in the unit table; {} records ({} raw) counted as $0",
            code, unmapped.records, unmapped.raw_value
        );
    }

    let rows = EventAggregator::aggregate(&normalized.events);
    let totals = EventAggregator::calculate_totals(&rows);

    let rankings: Vec<Ranking> = options
        .measures
        .iter()
        .map(|&measure| Ranking {
            measure,
            top_n: options.top_n,
            rows: EventAggregator::rank(rows.clone(), measure, options.top_n),
        })
        .collect();

    let transform_time = transform_start.elapsed().as_secs_f64();
    debug!(
        "Aggregated {} event types in {:.3}s",
        totals.event_types, transform_time
    );

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        input: None,
        compression: None,
        records_read: events.len(),
        unit_table: options
            .units
            .entries()
            .map(|(code, mult)| (code.to_string(), mult))
            .collect(),
        load_time_seconds: 0.0,
        transform_time_seconds: transform_time,
    };

    ReportAnalysis {
        metadata,
        totals,
        rankings,
        unmapped_units: normalized.unmapped_units,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
