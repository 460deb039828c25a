//! Per-event-type aggregation and top-N ranking.

use std::collections::HashMap;

use serde::Serialize;
use storm_core::models::{AggregateRow, Measure, NormalizedEvent};

// ── ReportTotals ──────────────────────────────────────────────────────────────

/// Grand totals across every aggregate row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub fatalities: u64,
    pub damage: f64,
    /// Number of distinct event types.
    pub event_types: usize,
}

// ── EventAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups normalized events by event type.
pub struct EventAggregator;

impl EventAggregator {
    /// Sum both measures per event type.
    ///
    /// Rows come back in the order each event type was first seen, which is
    /// what makes ties in [`rank`](Self::rank) deterministic.
    pub fn aggregate(events: &[NormalizedEvent]) -> Vec<AggregateRow> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<AggregateRow> = Vec::new();

        for event in events {
            let idx = *positions.entry(event.event_type.as_str()).or_insert_with(|| {
                rows.push(AggregateRow::new(event.event_type.as_str()));
                rows.len() - 1
            });
            rows[idx].add_event(event);
        }

        rows
    }

    /// Sort `rows` descending by `measure` and keep the first `top_n`.
    ///
    /// The sort is stable, so equal values keep their input order. Asking for
    /// more rows than exist returns all of them.
    pub fn rank(mut rows: Vec<AggregateRow>, measure: Measure, top_n: usize) -> Vec<AggregateRow> {
        rows.sort_by(|a, b| {
            b.measure_value(measure)
                .total_cmp(&a.measure_value(measure))
        });
        rows.truncate(top_n);
        rows
    }

    /// Aggregate then rank: the top `top_n` event types by `measure`.
    pub fn top_n(events: &[NormalizedEvent], measure: Measure, top_n: usize) -> Vec<AggregateRow> {
        Self::rank(Self::aggregate(events), measure, top_n)
    }

    /// Sum both measures over all rows. Fatalities saturate at `u64::MAX`.
    pub fn calculate_totals(rows: &[AggregateRow]) -> ReportTotals {
        let mut totals = ReportTotals::default();
        for row in rows {
            totals.fatalities = totals.fatalities.saturating_add(row.fatalities_total);
            totals.damage += row.damage_total;
        }
        totals.event_types = rows.len();
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
