use std::path::Path;

use serde::Serialize;

// ---------------------------------------------------------------------------
// RawTable – one simulator output file, tokenised
// ---------------------------------------------------------------------------

/// Whitespace-split content of one `.out` file.
///
/// Rows are kept exactly as tokenised. Frequency-scan normalization drops
/// rows whose width differs from the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Display name (file base name, extension stripped).
    pub name: String,
    /// Column names from the first line, when the file carries a header.
    pub header: Option<Vec<String>>,
    /// Remaining lines, one token vector per line. Blank lines are skipped.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Number of columns: header width, or the first row's width.
    pub fn width(&self) -> usize {
        match &self.header {
            Some(h) => h.len(),
            None => self.rows.first().map(Vec::len).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a header column, if any.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.as_ref()?.iter().position(|h| h == column)
    }
}

/// File base name with the extension stripped, as used for report headings.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Series – independent/dependent pairs of one file
// ---------------------------------------------------------------------------

/// A normalized (independent, dependent) series in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// Independent axis (already divided by 60).
    pub x: Vec<f64>,
    /// Dependent values – same length as `x`.
    pub y: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Series {
            name: name.into(),
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Peaks
// ---------------------------------------------------------------------------

/// One detected peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Sample index in the dependent sequence.
    pub index: usize,
    /// Dependent value at the peak.
    pub value: f64,
    /// Independent value at the peak.
    pub x: f64,
}

/// Peaks of one series, rank 0 first, in left-to-right index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakSet {
    pub peaks: Vec<Peak>,
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// The peak of the given rank, if this series has that many.
    pub fn rank(&self, rank: usize) -> Option<&Peak> {
        self.peaks.get(rank)
    }
}

/// A series together with its detected peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub series: Series,
    pub peaks: PeakSet,
}

// ---------------------------------------------------------------------------
// WideTable – several dependent columns over one shared axis
// ---------------------------------------------------------------------------

/// A named dependent column. `None` marks an unset cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Dependent columns aligned on one independent axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WideTable {
    /// Name of the independent column (e.g. `Time`, `Frequency`).
    pub axis_name: String,
    pub axis: Vec<f64>,
    pub columns: Vec<Column>,
}

impl WideTable {
    pub fn new(axis_name: impl Into<String>) -> Self {
        WideTable {
            axis_name: axis_name.into(),
            axis: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Ordered dependent column names.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
