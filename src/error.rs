use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The pipeline stage an error originated from, used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Ingestion,
    Normalization,
    Alignment,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "configuration",
            Stage::Ingestion => "ingestion",
            Stage::Normalization => "normalization",
            Stage::Alignment => "alignment",
            Stage::Report => "report assembly",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Fatal pipeline errors
// ---------------------------------------------------------------------------

/// Errors that abort a batch. Rasterization problems are *not* in here,
/// see [`RenderError`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A column required for normalization is not in the file header.
    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },

    /// Nothing to process.
    #[error("no input files")]
    NoInput,

    /// No dependent column survived the selection.
    #[error("no columns selected for the overlay report")]
    EmptySelection,

    /// Two outputs of one run would be written to the same file.
    #[error("{} would be written more than once", path.display())]
    DuplicateOutput { path: PathBuf },

    /// Configuration file could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Workbook could not be written.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// CSV export failed.
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// Chart description export failed.
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while writing an output artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Read { .. } | PipelineError::NoInput => Stage::Ingestion,
            PipelineError::MissingColumn { .. } => Stage::Normalization,
            PipelineError::EmptySelection => Stage::Alignment,
            PipelineError::Config(_) => Stage::Config,
            PipelineError::DuplicateOutput { .. }
            | PipelineError::Workbook(_)
            | PipelineError::Csv(_)
            | PipelineError::Json(_)
            | PipelineError::Io(_) => Stage::Report,
        }
    }
}

// ---------------------------------------------------------------------------
// Recoverable rasterization errors
// ---------------------------------------------------------------------------

/// Errors raised by a chart renderer. These never abort a run; the workbook
/// is still delivered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The rendering prerequisite (font, engine, platform) is missing.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// The report carries no chart series to draw.
    #[error("chart not found in report")]
    ChartNotFound,

    /// Opening the rendering resource failed but may succeed on retry.
    #[error("transient open failure: {0}")]
    Transient(String),

    /// Opening kept failing after all attempts.
    #[error("could not open rendering resource after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    /// Drawing itself failed.
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    /// Whether the retry policy should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_for_errors() {
        let err = PipelineError::MissingColumn {
            file: "scan1.out".into(),
            column: "F(Hz)".into(),
        };
        assert_eq!(err.stage(), Stage::Normalization);
        assert_eq!(err.to_string(), "scan1.out: missing column 'F(Hz)'");

        let err = PipelineError::Read {
            path: PathBuf::from("missing.out"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.stage(), Stage::Ingestion);
        assert!(err.to_string().contains("missing.out"));
    }

    #[test]
    fn test_only_transient_is_retried() {
        assert!(RenderError::Transient("locked".into()).is_transient());
        assert!(!RenderError::ChartNotFound.is_transient());
        assert!(!RenderError::Unavailable("no font".into()).is_transient());
    }
}
