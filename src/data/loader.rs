use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::model::{display_name, RawTable};
use crate::error::PipelineError;

/// `Desc="..."` attribute of a description-file line.
static DESC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Desc="([^"]+)""#).expect("Invalid regex pattern"));

/// First run of digits in a file name.
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("Invalid regex pattern"));

/// Sort key for files whose name carries no number.
pub const UNNUMBERED_FILE: u64 = 9999;

// ---------------------------------------------------------------------------
// Flat-file ingestion
// ---------------------------------------------------------------------------

/// Whether the first line of an output file names its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// First line is a header (`F(Hz)  |Z+|(ohms) ...`).
    #[default]
    Header,
    /// No header; names come from a description file.
    Headerless,
}

/// Read one simulator output file.
///
/// An unreadable file is fatal and reported with its path. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_table(path: &Path, mode: HeaderMode) -> Result<RawTable, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let table = parse_table(&display_name(path), &text, mode);
    debug!(
        "{}: {} data rows, width {}",
        path.display(),
        table.rows.len(),
        table.width()
    );
    Ok(table)
}

/// Split text on runs of whitespace, one token vector per non-blank line.
pub fn parse_table(name: &str, text: &str, mode: HeaderMode) -> RawTable {
    let mut lines = text
        .lines()
        .map(|line| {
            line.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<String>>()
        })
        .filter(|tokens| !tokens.is_empty());

    let header = match mode {
        HeaderMode::Header => lines.next(),
        HeaderMode::Headerless => None,
    };

    RawTable {
        name: name.to_string(),
        header,
        rows: lines.collect(),
    }
}

// ---------------------------------------------------------------------------
// Description (.inf) files
// ---------------------------------------------------------------------------

/// Column index → human-readable name.
pub type DescriptionMap = BTreeMap<usize, String>;

/// Parse `PGB(n) ... Desc="name" ...` lines.
///
/// A `PGB` line without a `Desc` attribute maps to `PGBn`. Lines whose index
/// is not an integer are ignored.
pub fn parse_description(text: &str) -> DescriptionMap {
    let mut map = DescriptionMap::new();
    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("PGB(") else {
            continue;
        };
        let Some(index) = rest
            .split(')')
            .next()
            .and_then(|s| s.trim().parse::<usize>().ok())
        else {
            continue;
        };
        let name = DESC_REGEX
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| fallback_name(index));
        map.insert(index, name);
    }
    map
}

pub fn read_description(path: &Path) -> Result<DescriptionMap, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_description(&String::from_utf8_lossy(&bytes)))
}

/// Synthetic name for an index missing from the description map.
pub fn fallback_name(index: usize) -> String {
    format!("PGB{index}")
}

/// Names columns across a sequence of headerless files.
///
/// The running index continues from file to file: the first file covers
/// indices `1..=k`, the next starts at `k + 1`.
#[derive(Debug, Clone)]
pub struct ColumnNaming<'a> {
    descriptions: Option<&'a DescriptionMap>,
    next_index: usize,
}

impl<'a> ColumnNaming<'a> {
    pub fn new(descriptions: Option<&'a DescriptionMap>) -> Self {
        ColumnNaming {
            descriptions,
            next_index: 1,
        }
    }

    /// Names for `count` dependent columns of the next file.
    pub fn next_names(&mut self, count: usize) -> Vec<String> {
        let start = self.next_index;
        self.next_index += count;
        (start..start + count)
            .map(|i| {
                self.descriptions
                    .and_then(|d| d.get(&i))
                    .cloned()
                    .unwrap_or_else(|| fallback_name(i))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Input discovery and ordering
// ---------------------------------------------------------------------------

/// Expand directories into their files with the given extension (sorted by
/// name); plain file arguments are kept in the order given.
pub fn collect_inputs(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input).map_err(|source| PipelineError::Read {
                path: input.clone(),
                source,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// First integer in the file name, or [`UNNUMBERED_FILE`].
pub fn file_number(path: &Path) -> u64 {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    NUMBER_REGEX
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNNUMBERED_FILE)
}

/// Stable sort by the number embedded in each file name.
pub fn sort_by_file_number(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| file_number(p));
}
