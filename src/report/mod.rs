//! Report assembly: worksheet layout, chart description and writers.

pub mod chart;
pub mod export;
pub mod layout;
pub mod xlsx;

pub use chart::{ChartSpec, ReportStyle};
pub use layout::{build_overlay_report, build_scan_report, build_single_report, Report};
