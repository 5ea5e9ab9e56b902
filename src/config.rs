//! TOML configuration file support.
//!
//! Every key is optional; anything left out falls back to the built-in
//! defaults:
//!
//! ```toml
//! # freqscan.toml
//! [columns]
//! frequency = "F(Hz)"
//! impedance = "|Z+|(ohms)"
//!
//! [peaks]
//! height = 1.0
//!
//! [report]
//! alignment = "join"        # or "positional"
//! sheet_name = "Sheet1"
//!
//! [style]
//! palette = ["#0072BD", "#D95319", "#EDB120"]
//! font = "Times New Roman"
//! font_size = 9
//!
//! [render]
//! enabled = true
//! max_attempts = 3
//! retry_delay_ms = 1000
//! font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::color::Palette;
use crate::data::merge::Alignment;
use crate::error::PipelineError;
use crate::peaks::{PeakDetector, DEFAULT_HEIGHT};
use crate::render::RetryPolicy;
use crate::report::chart::ReportStyle;

/// Independent column of frequency-scan files.
pub const DEFAULT_FREQUENCY_COLUMN: &str = "F(Hz)";
/// Dependent column of frequency-scan files.
pub const DEFAULT_IMPEDANCE_COLUMN: &str = "|Z+|(ohms)";
/// Worksheet all reports are written to.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Root configuration structure for freqscan.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub peaks: PeaksConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Column names of frequency-scan files.
#[derive(Debug, Default, Deserialize)]
pub struct ColumnsConfig {
    pub frequency: Option<String>,
    pub impedance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeaksConfig {
    /// Minimum peak height.
    pub height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportConfig {
    pub alignment: Option<Alignment>,
    pub sheet_name: Option<String>,
}

/// Chart styling.
#[derive(Debug, Default, Deserialize)]
pub struct StyleConfig {
    /// `#RRGGBB` line colours.
    pub palette: Option<Vec<String>>,
    /// Use this many evenly spaced hues instead of `palette`.
    pub generated_palette: Option<usize>,
    pub font: Option<String>,
    pub font_size: Option<u32>,
    pub line_width: Option<f64>,
    pub chart_style: Option<u8>,
    pub chart_scale: Option<f64>,
}

/// Chart image rendering.
#[derive(Debug, Default, Deserialize)]
pub struct RenderConfig {
    pub enabled: Option<bool>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub font_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, PipelineError> {
        toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn frequency_column(&self) -> &str {
        self.columns
            .frequency
            .as_deref()
            .unwrap_or(DEFAULT_FREQUENCY_COLUMN)
    }

    pub fn impedance_column(&self) -> &str {
        self.columns
            .impedance
            .as_deref()
            .unwrap_or(DEFAULT_IMPEDANCE_COLUMN)
    }

    pub fn detector(&self) -> PeakDetector {
        PeakDetector::new(self.peaks.height.unwrap_or(DEFAULT_HEIGHT))
    }

    pub fn alignment(&self) -> Alignment {
        self.report.alignment.unwrap_or_default()
    }

    pub fn sheet_name(&self) -> &str {
        self.report
            .sheet_name
            .as_deref()
            .unwrap_or(DEFAULT_SHEET_NAME)
    }

    /// Resolve styling, validating the palette.
    pub fn report_style(&self) -> Result<ReportStyle, PipelineError> {
        let mut style = ReportStyle::default();
        if let Some(n) = self.style.generated_palette {
            style.palette = Palette::generated(n);
        } else if let Some(hex) = &self.style.palette {
            style.palette = Palette::from_hex(hex).map_err(PipelineError::Config)?;
        }
        if let Some(font) = &self.style.font {
            style.font = font.clone();
        }
        if let Some(size) = self.style.font_size {
            style.font_size = size;
        }
        if let Some(width) = self.style.line_width {
            style.line_width = width;
        }
        if let Some(id) = self.style.chart_style {
            style.chart_style = id;
        }
        if let Some(scale) = self.style.chart_scale {
            style.chart_scale = scale;
        }
        Ok(style)
    }

    pub fn render_enabled(&self) -> bool {
        self.render.enabled.unwrap_or(true)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.render.max_attempts.unwrap_or(default.max_attempts).max(1),
            delay: self
                .render
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r##"
            [columns]
            frequency = "Freq"

            [peaks]
            height = 2.5

            [report]
            alignment = "positional"

            [style]
            palette = ["#112233", "#445566"]
            font_size = 11

            [render]
            max_attempts = 5
            retry_delay_ms = 10
        "##;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.frequency_column(), "Freq");
        assert_eq!(config.impedance_column(), DEFAULT_IMPEDANCE_COLUMN);
        assert_eq!(config.detector().height, 2.5);
        assert_eq!(config.alignment(), Alignment::Positional);

        let style = config.report_style().unwrap();
        assert_eq!(style.palette.len(), 2);
        assert_eq!(style.font_size, 11);
        assert_eq!(style.font, "Times New Roman");

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(10));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.frequency_column(), DEFAULT_FREQUENCY_COLUMN);
        assert_eq!(config.alignment(), Alignment::Join);
        assert_eq!(config.sheet_name(), DEFAULT_SHEET_NAME);
        assert_eq!(config.detector().height, DEFAULT_HEIGHT);
        assert!(config.render_enabled());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.report_style().unwrap().palette.len(), 7);
    }

    #[test]
    fn test_bad_palette_is_config_error() {
        let config = Config::from_str("[style]\npalette = [\"#zzzzzz\"]\n").unwrap();
        let err = config.report_style().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(Config::from_str("[bogus]\nx = 1\n").is_err());
    }
}
