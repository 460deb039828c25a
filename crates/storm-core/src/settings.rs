use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, StormError};
use crate::models::Measure;
use crate::units::{parse_unit_override, UnitMultipliers, UnitTablePreset};

pub const DEFAULT_EVENT_COLUMN: &str = "EVTYPE";
pub const DEFAULT_FATALITIES_COLUMN: &str = "FATALITIES";
pub const DEFAULT_DAMAGE_COLUMN: &str = "PROPDMG";
pub const DEFAULT_UNIT_COLUMN: &str = "PROPDMGEXP";
pub const DEFAULT_TOP_N: usize = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Rank severe-weather event types by fatalities and property damage
#[derive(Parser, Debug, Clone)]
#[command(
    name = "storm-report",
    about = "Rank severe-weather event types by fatalities and property damage",
    version
)]
pub struct Settings {
    /// Storm data CSV file (plain, gzip or bzip2)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Number of event types shown per chart
    #[arg(long = "top", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Which ranking to produce
    #[arg(long, default_value = "both", value_parser = ["fatalities", "damage", "both"])]
    pub measure: String,

    /// Built-in damage unit table
    #[arg(long, default_value = "strict", value_parser = ["strict", "extended"])]
    pub unit_table: String,

    /// Unit multiplier override, e.g. `--unit H=100` (repeatable)
    #[arg(long = "unit", value_name = "CODE=MULTIPLIER")]
    pub units: Vec<String>,

    /// Column holding the event type label
    #[arg(long, default_value = DEFAULT_EVENT_COLUMN)]
    pub event_column: String,

    /// Column holding the fatality count
    #[arg(long, default_value = DEFAULT_FATALITIES_COLUMN)]
    pub fatalities_column: String,

    /// Column holding the raw damage magnitude
    #[arg(long, default_value = DEFAULT_DAMAGE_COLUMN)]
    pub damage_column: String,

    /// Column holding the damage unit code
    #[arg(long, default_value = DEFAULT_UNIT_COLUMN)]
    pub unit_column: String,

    /// Output mode
    #[arg(long, default_value = "tui", value_parser = ["tui", "text", "json"])]
    pub output: String,

    /// Write the rankings to a .csv or .json file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Config file path (defaults to ~/.storm-report/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the effective options to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Resolved options ───────────────────────────────────────────────────────────

/// Names of the four columns the loader reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub event_type: String,
    pub fatalities: String,
    pub damage_value: String,
    pub damage_unit: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            event_type: DEFAULT_EVENT_COLUMN.to_string(),
            fatalities: DEFAULT_FATALITIES_COLUMN.to_string(),
            damage_value: DEFAULT_DAMAGE_COLUMN.to_string(),
            damage_unit: DEFAULT_UNIT_COLUMN.to_string(),
        }
    }
}

/// Everything the analysis pipeline needs, validated and typed.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub columns: ColumnMapping,
    pub units: UnitMultipliers,
    pub top_n: usize,
    pub measures: Vec<Measure>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            units: UnitMultipliers::default(),
            top_n: DEFAULT_TOP_N,
            measures: Measure::ALL.to_vec(),
        }
    }
}

// ── ReportConfig ───────────────────────────────────────────────────────────────

/// Optional defaults persisted to `~/.storm-report/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_table: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub units: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl ReportConfig {
    /// Default config location, `~/.storm-report/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".storm-report").join("config.json")
    }

    /// Load from `path`. Returns `Default` when the file is absent or cannot
    /// be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Atomically write to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge the config file underneath them.
    pub fn load() -> Self {
        Self::load_impl(std::env::args_os().collect(), &ReportConfig::config_path())
    }

    /// Full implementation with explicit args and fallback config path.
    pub fn load_impl(args: Vec<std::ffi::OsString>, default_config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(|| default_config_path.to_path_buf());
        let config = ReportConfig::load_from(&config_path);
        settings.merge_config(config, &matches);

        if settings.save_config {
            let to_save = ReportConfig::from(&settings);
            match to_save.save_to(&config_path) {
                Ok(()) => tracing::info!("Saved config to {}", config_path.display()),
                Err(e) => tracing::warn!("Failed to save config {}: {}", config_path.display(), e),
            }
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Apply config values for every option not given on the command line.
    fn merge_config(&mut self, config: ReportConfig, matches: &clap::ArgMatches) {
        if self.input.is_none() {
            self.input = config.input;
        }
        if !is_arg_explicitly_set(matches, "top_n") {
            if let Some(v) = config.top_n {
                self.top_n = v;
            }
        }
        if !is_arg_explicitly_set(matches, "measure") {
            if let Some(v) = config.measure {
                self.measure = v;
            }
        }
        if !is_arg_explicitly_set(matches, "unit_table") {
            if let Some(v) = config.unit_table {
                self.unit_table = v;
            }
        }
        if !is_arg_explicitly_set(matches, "output") {
            if let Some(v) = config.output {
                self.output = v;
            }
        }
        if !is_arg_explicitly_set(matches, "theme") {
            if let Some(v) = config.theme {
                self.theme = v;
            }
        }
        if let Some(columns) = config.columns {
            if !is_arg_explicitly_set(matches, "event_column") {
                self.event_column = columns.event_type;
            }
            if !is_arg_explicitly_set(matches, "fatalities_column") {
                self.fatalities_column = columns.fatalities;
            }
            if !is_arg_explicitly_set(matches, "damage_column") {
                self.damage_column = columns.damage_value;
            }
            if !is_arg_explicitly_set(matches, "unit_column") {
                self.unit_column = columns.damage_unit;
            }
        }

        // Config overrides go first so that `--unit` on the CLI wins.
        let mut units: Vec<String> = config
            .units
            .into_iter()
            .map(|(code, mult)| format!("{}={}", code, mult))
            .collect();
        units.append(&mut self.units);
        self.units = units;
    }

    /// Measures selected by `--measure`.
    pub fn measures(&self) -> Result<Vec<Measure>> {
        if self.measure == "both" {
            return Ok(Measure::ALL.to_vec());
        }
        self.measure
            .parse::<Measure>()
            .map(|m| vec![m])
            .map_err(StormError::Config)
    }

    /// Build the unit table: preset first, then each override in order.
    pub fn unit_multipliers(&self) -> Result<UnitMultipliers> {
        let preset: UnitTablePreset = self.unit_table.parse().map_err(StormError::Config)?;
        let mut units = UnitMultipliers::from_preset(preset);
        for spec in &self.units {
            let (code, multiplier) = parse_unit_override(spec)?;
            units = units.with_override(&code, multiplier)?;
        }
        Ok(units)
    }

    pub fn columns(&self) -> ColumnMapping {
        ColumnMapping {
            event_type: self.event_column.clone(),
            fatalities: self.fatalities_column.clone(),
            damage_value: self.damage_column.clone(),
            damage_unit: self.unit_column.clone(),
        }
    }

    /// Validate and convert into [`ReportOptions`].
    pub fn report_options(&self) -> Result<ReportOptions> {
        if self.top_n == 0 {
            return Err(StormError::Config("--top must be at least 1".to_string()));
        }
        Ok(ReportOptions {
            columns: self.columns(),
            units: self.unit_multipliers()?,
            top_n: self.top_n,
            measures: self.measures()?,
        })
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for ReportConfig {
    fn from(s: &Settings) -> Self {
        let units = s
            .units
            .iter()
            .filter_map(|spec| parse_unit_override(spec).ok())
            .collect();
        ReportConfig {
            input: s.input.clone(),
            top_n: Some(s.top_n),
            measure: Some(s.measure.clone()),
            unit_table: Some(s.unit_table.clone()),
            units,
            columns: Some(s.columns()),
            output: Some(s.output.clone()),
            theme: Some(s.theme.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
