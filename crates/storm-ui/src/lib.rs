//! Terminal UI layer for the storm report.
//!
//! Provides themes, horizontal bar chart views, a plain-text chart renderer
//! for non-interactive output, and the application event loop built on top
//! of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod text_chart;
pub mod themes;

pub use storm_core as core;
