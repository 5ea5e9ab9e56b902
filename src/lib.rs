//! # freqscan
//!
//! Turns circuit-simulator frequency-scan output (`.out` flat files) into
//! spreadsheet reports: one column per file, a block of detected resonance
//! peaks, and an overlay chart, optionally rasterized to PNG.
//!
//! ```text
//! .out files ─▶ data::loader ─▶ data::normalize ─▶ peaks ─▶ report ─▶ .xlsx
//!                                                              └──▶ render ─▶ .png
//! ```

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod peaks;
pub mod pipeline;
pub mod render;
pub mod report;

pub use config::Config;
pub use error::{PipelineError, RenderError, Stage};
