//! Damage unit codes and their dollar multipliers.
//!
//! Storm data records property damage as a magnitude plus a one-character
//! exponent code. The default table recognises exactly `K`, `M` and `B`
//! (case-sensitive); every other code, including an empty one, maps to zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StormError};

/// Codes recognised by the strict preset.
pub const DEFAULT_UNIT_MULTIPLIERS: &[(&str, f64)] = &[
    ("K", 1_000.0),
    ("M", 1_000_000.0),
    ("B", 1_000_000_000.0),
];

/// NOAA-documented codes, matched case-insensitively by the extended preset.
///
/// Numeric exponents `0`-`8` are read as "tens", `+` as a plain dollar value,
/// and `-` / `?` as explicitly unknown (zero, but not reported as unmapped).
pub const EXTENDED_UNIT_MULTIPLIERS: &[(&str, f64)] = &[
    ("H", 100.0),
    ("K", 1_000.0),
    ("M", 1_000_000.0),
    ("B", 1_000_000_000.0),
    ("0", 10.0),
    ("1", 10.0),
    ("2", 10.0),
    ("3", 10.0),
    ("4", 10.0),
    ("5", 10.0),
    ("6", 10.0),
    ("7", 10.0),
    ("8", 10.0),
    ("+", 1.0),
    ("-", 0.0),
    ("?", 0.0),
];

// ── UnitTablePreset ───────────────────────────────────────────────────────────

/// Which built-in table to start from before applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitTablePreset {
    /// `K`, `M`, `B` only, exact case.
    #[default]
    Strict,
    /// NOAA-documented codes, any case.
    Extended,
}

impl fmt::Display for UnitTablePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitTablePreset::Strict => write!(f, "strict"),
            UnitTablePreset::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for UnitTablePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(UnitTablePreset::Strict),
            "extended" => Ok(UnitTablePreset::Extended),
            other => Err(format!("unknown unit table: {}", other)),
        }
    }
}

// ── UnitMultipliers ───────────────────────────────────────────────────────────

/// Immutable lookup from unit code to dollar multiplier.
///
/// A miss always yields `0.0`. The table is built once per run and shared by
/// reference; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitMultipliers {
    table: BTreeMap<String, f64>,
    case_insensitive: bool,
}

impl Default for UnitMultipliers {
    fn default() -> Self {
        Self::strict()
    }
}

impl UnitMultipliers {
    /// The `{K: 1e3, M: 1e6, B: 1e9}` table with exact-case matching.
    pub fn strict() -> Self {
        Self::from_entries(DEFAULT_UNIT_MULTIPLIERS, false)
    }

    /// The NOAA-documented table with case-insensitive matching.
    pub fn extended() -> Self {
        Self::from_entries(EXTENDED_UNIT_MULTIPLIERS, true)
    }

    pub fn from_preset(preset: UnitTablePreset) -> Self {
        match preset {
            UnitTablePreset::Strict => Self::strict(),
            UnitTablePreset::Extended => Self::extended(),
        }
    }

    fn from_entries(entries: &[(&str, f64)], case_insensitive: bool) -> Self {
        let table = entries
            .iter()
            .map(|(code, mult)| (code.to_string(), *mult))
            .collect();
        Self {
            table,
            case_insensitive,
        }
    }

    /// Return a copy of the table with `code` mapped to `multiplier`.
    ///
    /// Fails when the multiplier is negative or not finite, since damage
    /// totals must stay non-negative.
    pub fn with_override(mut self, code: &str, multiplier: f64) -> Result<Self> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(StormError::Config(format!(
                "multiplier for unit code {:?} must be a non-negative number, got {}",
                code, multiplier
            )));
        }
        let key = self.key_for(code);
        self.table.insert(key, multiplier);
        Ok(self)
    }

    /// Multiplier for `code`, or `0.0` when the code is not in the table.
    pub fn multiplier(&self, code: &str) -> f64 {
        self.lookup(code).unwrap_or(0.0)
    }

    /// `true` when `code` has an explicit entry (even one mapped to zero).
    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    /// All entries in code order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.table.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn lookup(&self, code: &str) -> Option<f64> {
        if self.case_insensitive {
            self.table.get(&code.to_ascii_uppercase()).copied()
        } else {
            self.table.get(code).copied()
        }
    }

    fn key_for(&self, code: &str) -> String {
        if self.case_insensitive {
            code.to_ascii_uppercase()
        } else {
            code.to_string()
        }
    }
}

/// Parse a `CODE=MULTIPLIER` override such as `H=100` or `k=1e3`.
pub fn parse_unit_override(spec: &str) -> Result<(String, f64)> {
    let Some((code, value)) = spec.split_once('=') else {
        return Err(StormError::Config(format!(
            "unit override {:?} must have the form CODE=MULTIPLIER",
            spec
        )));
    };
    let code = code.trim();
    if code.is_empty() {
        return Err(StormError::Config(format!(
            "unit override {:?} has an empty code",
            spec
        )));
    }
    let multiplier: f64 = value.trim().parse().map_err(|_| {
        StormError::Config(format!(
            "unit override {:?} has a non-numeric multiplier",
            spec
        ))
    })?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(StormError::Config(format!(
            "unit override {:?} must use a non-negative multiplier",
            spec
        )));
    }
    Ok((code.to_string(), multiplier))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
