//! Chart rasterization behind a pluggable renderer.
//!
//! Rendering is best-effort: [`rasterize`] never returns an error, it reports
//! a [`RenderOutcome`] and the workbook stays valid whatever happens here.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::RenderError;
use crate::report::Report;

pub mod plot;

pub use plot::PlottersRenderer;

/// Only one rasterization runs at a time.
static RENDER_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded retry around opening the rendering resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only [`RenderError::is_transient`] errors are retried; running out
    /// turns the last one into [`RenderError::Exhausted`].
    pub fn run<T>(&self, mut op: impl FnMut(u32) -> Result<T, RenderError>) -> Result<T, RenderError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    debug!("attempt {attempt}/{attempts} failed: {err}; retrying");
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(RenderError::Exhausted {
                        attempts,
                        last: err.to_string(),
                    })
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer interface
// ---------------------------------------------------------------------------

/// An open rendering resource. Dropping the session releases it, on every
/// exit path.
pub trait RenderSession {
    /// Draw the report's chart into a PNG at `output`.
    fn export_chart(&mut self, report: &Report, output: &Path) -> Result<(), RenderError>;
}

/// Something that can turn a report's chart into an image.
pub trait ChartRenderer {
    fn name(&self) -> &str;

    /// `false` for renderers that never produce an image.
    fn is_available(&self) -> bool {
        true
    }

    /// Acquire the rendering resource for the given workbook.
    fn open<'a>(&'a self, workbook: &Path) -> Result<Box<dyn RenderSession + 'a>, RenderError>;
}

/// Renderer for environments without one; every request is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl ChartRenderer for NoopRenderer {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn open<'a>(&'a self, _workbook: &Path) -> Result<Box<dyn RenderSession + 'a>, RenderError> {
        Err(RenderError::Unavailable("no chart renderer configured".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// Result of a rasterization attempt.
#[derive(Debug)]
pub enum RenderOutcome {
    /// Image written to this path.
    Rendered(PathBuf),
    /// No renderer available, or rendering disabled.
    Skipped,
    /// Rendering was attempted and failed; the workbook is still usable.
    Failed(RenderError),
}

impl RenderOutcome {
    pub fn image(&self) -> Option<&Path> {
        match self {
            RenderOutcome::Rendered(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RenderOutcome::Failed(_))
    }
}

/// Render the chart of `report` (already written to `workbook`) to `output`.
pub fn rasterize(
    renderer: &dyn ChartRenderer,
    report: &Report,
    workbook: &Path,
    output: &Path,
    policy: &RetryPolicy,
) -> RenderOutcome {
    if !renderer.is_available() {
        debug!("renderer '{}' unavailable, skipping image", renderer.name());
        return RenderOutcome::Skipped;
    }

    let _guard = RENDER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let result = policy
        .run(|attempt| {
            debug!("opening renderer '{}' (attempt {attempt})", renderer.name());
            renderer.open(workbook)
        })
        .and_then(|mut session| session.export_chart(report, output));

    match result {
        Ok(()) => {
            info!("chart image written to {}", output.display());
            RenderOutcome::Rendered(output.to_path_buf())
        }
        Err(err) => {
            warn!("chart image not produced: {err}");
            RenderOutcome::Failed(err)
        }
    }
}
