use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The quantity a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Human fatalities attributed to the event.
    Fatalities,
    /// Property damage in US dollars after unit normalization.
    Damage,
}

impl Measure {
    /// Both measures, in the order the report presents them.
    pub const ALL: [Measure; 2] = [Measure::Fatalities, Measure::Damage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Fatalities => "fatalities",
            Measure::Damage => "damage",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatalities" => Ok(Measure::Fatalities),
            "damage" => Ok(Measure::Damage),
            other => Err(format!("unknown measure: {}", other)),
        }
    }
}

/// One observed severe-weather event as read from the storm data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormEvent {
    /// Free-text event category, e.g. `"TORNADO"`. Not normalized.
    pub event_type: String,
    /// Number of deaths attributed to the event.
    pub fatalities: u64,
    /// Raw property-damage magnitude, to be scaled by `damage_unit`.
    pub damage_value: f64,
    /// Order-of-magnitude code for `damage_value` (`"K"`, `"M"`, `"B"`, ...).
    #[serde(default)]
    pub damage_unit: String,
}

/// A [`StormEvent`] with its damage converted to whole dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub event_type: String,
    pub fatalities: u64,
    /// `damage_value × multiplier(damage_unit)`; always non-negative.
    pub damage_total: f64,
}

/// Per-event-type totals of both measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub event_type: String,
    pub fatalities_total: u64,
    pub damage_total: f64,
}

impl AggregateRow {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            fatalities_total: 0,
            damage_total: 0.0,
        }
    }

    /// Accumulate one normalized event into the row.
    ///
    /// The fatality count saturates at `u64::MAX` instead of overflowing.
    pub fn add_event(&mut self, event: &NormalizedEvent) {
        self.fatalities_total = self.fatalities_total.saturating_add(event.fatalities);
        self.damage_total += event.damage_total;
    }

    /// Value of `measure` for this row, as a float for uniform comparison.
    pub fn measure_value(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Fatalities => self.fatalities_total as f64,
            Measure::Damage => self.damage_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_from_str() {
        assert_eq!("fatalities".parse::<Measure>(), Ok(Measure::Fatalities));
        assert_eq!("Damage".parse::<Measure>(), Ok(Measure::Damage));
        assert!("injuries".parse::<Measure>().is_err());
    }

    #[test]
    fn test_measure_display_round_trips_through_from_str() {
        for measure in Measure::ALL {
            assert_eq!(measure.to_string().parse::<Measure>(), Ok(measure));
        }
    }

    #[test]
    fn test_measure_serde_lowercase() {
        let json = serde_json::to_string(&Measure::Damage).unwrap();
        assert_eq!(json, "\"damage\"");
    }

    #[test]
    fn test_aggregate_row_add_event() {
        let mut row = AggregateRow::new("TORNADO");
        row.add_event(&NormalizedEvent {
            event_type: "TORNADO".to_string(),
            fatalities: 5,
            damage_total: 10_000.0,
        });
        row.add_event(&NormalizedEvent {
            event_type: "TORNADO".to_string(),
            fatalities: 1,
            damage_total: 0.0,
        });
        assert_eq!(row.fatalities_total, 6);
        assert_eq!(row.damage_total, 10_000.0);
        assert_eq!(row.measure_value(Measure::Fatalities), 6.0);
        assert_eq!(row.measure_value(Measure::Damage), 10_000.0);
    }

    #[test]
    fn test_aggregate_row_add_event_saturates() {
        let mut row = AggregateRow::new("X");
        for fatalities in [u64::MAX, 1] {
            row.add_event(&NormalizedEvent {
                event_type: "X".to_string(),
                fatalities,
                damage_total: 0.0,
            });
        }
        assert_eq!(row.fatalities_total, u64::MAX);
    }

    #[test]
    fn test_storm_event_deserialize_defaults_unit() {
        let event: StormEvent = serde_json::from_str(
            r#"{"event_type":"FLOOD","fatalities":2,"damage_value":3.0}"#,
        )
        .unwrap();
        assert_eq!(event.damage_unit, "");
    }
}
