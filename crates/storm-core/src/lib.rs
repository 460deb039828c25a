//! Core types for the storm report.
//!
//! Domain model, the damage unit-multiplier table, error types, CLI settings
//! and number formatting shared by the data, UI and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod units;
