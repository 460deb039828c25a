//! Damage unit normalization.
//!
//! Converts each [`StormEvent`] into a [`NormalizedEvent`] whose damage is in
//! whole dollars. Codes missing from the unit table contribute zero; those
//! misses are tallied so the report can flag the lost magnitude.

use std::collections::BTreeMap;

use serde::Serialize;
use storm_core::models::{NormalizedEvent, StormEvent};
use storm_core::units::UnitMultipliers;

/// Records dropped to zero damage because their unit code was not recognised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnmappedUnit {
    /// Number of records carrying this code with a non-zero raw value.
    pub records: usize,
    /// Sum of the raw (unscaled) damage values that were discarded.
    pub raw_value: f64,
}

/// Output of [`normalize_all`].
#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    pub events: Vec<NormalizedEvent>,
    /// Unrecognised codes, keyed by the code exactly as it appeared.
    pub unmapped_units: BTreeMap<String, UnmappedUnit>,
}

/// Scale one event's damage by its unit multiplier.
pub fn normalize(event: &StormEvent, units: &UnitMultipliers) -> NormalizedEvent {
    NormalizedEvent {
        event_type: event.event_type.clone(),
        fatalities: event.fatalities,
        damage_total: event.damage_value * units.multiplier(&event.damage_unit),
    }
}

/// Normalize every event and tally unit codes that zeroed real damage.
///
/// A record with `damage_value == 0` is not counted as unmapped whatever its
/// code, since no magnitude is lost.
pub fn normalize_all(events: &[StormEvent], units: &UnitMultipliers) -> NormalizationOutcome {
    let mut outcome = NormalizationOutcome {
        events: Vec::with_capacity(events.len()),
        unmapped_units: BTreeMap::new(),
    };

    for event in events {
        if event.damage_value > 0.0 && !units.contains(&event.damage_unit) {
            let entry = outcome
                .unmapped_units
                .entry(event.damage_unit.clone())
                .or_default();
            entry.records += 1;
            entry.raw_value += event.damage_value;
        }
        outcome.events.push(normalize(event, units));
    }

    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────
