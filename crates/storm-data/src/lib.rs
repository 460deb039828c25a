//! Data layer for the storm report.
//!
//! Loads the storm data CSV, normalizes damage units, aggregates both
//! measures per event type, ranks the top contributors, and exports the
//! rankings.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod normalizer;
pub mod reader;

pub use storm_core as core;
