//! End-to-end runs: ingest → normalize → detect peaks → assemble → write →
//! rasterize.
//!
//! Files are processed one at a time in input order. Any ingestion or
//! normalization error aborts the batch; rasterization only ever downgrades
//! to a [`RenderOutcome`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::Config;
use crate::data::filter::{project, select_columns};
use crate::data::loader::{read_table, sort_by_file_number, ColumnNaming, DescriptionMap, HeaderMode};
use crate::data::merge::merge_tables;
use crate::data::model::{PeakSet, ScanEntry, WideTable};
use crate::data::normalize::{normalize_columns, normalize_series};
use crate::error::PipelineError;
use crate::render::{rasterize, ChartRenderer, RenderOutcome};
use crate::report::export::{write_chart_json, write_csv};
use crate::report::xlsx::write_workbook;
use crate::report::{build_overlay_report, build_scan_report, build_single_report, Report};

/// Combined frequency-scan workbook.
pub const SCAN_WORKBOOK: &str = "AllData.xlsx";
/// Image of the combined frequency-scan chart.
pub const SCAN_IMAGE: &str = "AllData.png";
/// Overlay workbook.
pub const OVERLAY_WORKBOOK: &str = "AllData_with_Chart.xlsx";
/// Image of the overlay chart.
pub const OVERLAY_IMAGE: &str = "DataChart.png";

/// Optional artifacts written next to the workbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct Artifacts {
    /// Also write the sheet as CSV.
    pub csv: bool,
    /// Also write the chart description as JSON.
    pub json: bool,
    /// Rasterize the chart.
    pub image: bool,
}

/// Paths written alongside a workbook.
#[derive(Debug, Default)]
pub struct ExtraFiles {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Frequency scans
// ---------------------------------------------------------------------------

/// Ingest, normalize and peak-detect each file, keeping input order.
pub fn load_scan_entries(paths: &[PathBuf], config: &Config) -> Result<Vec<ScanEntry>, PipelineError> {
    if paths.is_empty() {
        return Err(PipelineError::NoInput);
    }
    let detector = config.detector();
    paths
        .iter()
        .map(|path| {
            let raw = read_table(path, HeaderMode::Header)?;
            let series = normalize_series(&raw, config.frequency_column(), config.impedance_column())?;
            let peaks = detector.detect(&series);
            info!("{}: {} peaks", series.name, peaks.len());
            Ok(ScanEntry { series, peaks })
        })
        .collect()
}

#[derive(Debug)]
pub struct ScanOutput {
    pub entries: Vec<ScanEntry>,
    pub report: Report,
    pub workbook: PathBuf,
    pub extras: ExtraFiles,
    /// Single-file workbooks, in input order.
    pub per_file: Vec<PathBuf>,
    pub image: RenderOutcome,
}

/// Build the combined frequency-scan report for `paths` into `out_dir`.
pub fn run_scan(
    paths: &[PathBuf],
    config: &Config,
    out_dir: &Path,
    per_file: bool,
    artifacts: Artifacts,
    renderer: &dyn ChartRenderer,
) -> Result<ScanOutput, PipelineError> {
    let entries = load_scan_entries(paths, config)?;
    let style = config.report_style()?;
    let per_file_paths = if per_file {
        per_file_workbooks(&entries, out_dir)?
    } else {
        Vec::new()
    };
    std::fs::create_dir_all(out_dir)?;

    for (entry, path) in entries.iter().zip(&per_file_paths) {
        let single = build_single_report(entry, config.sheet_name(), &style);
        write_workbook(&single, path)?;
    }

    let report = build_scan_report(&entries, config.alignment(), config.sheet_name(), &style);
    let workbook = out_dir.join(SCAN_WORKBOOK);
    write_workbook(&report, &workbook)?;
    info!("report written to {}", workbook.display());

    let extras = write_extras(&report, &workbook, artifacts)?;
    let image = render_image(&report, &workbook, &out_dir.join(SCAN_IMAGE), config, artifacts, renderer);

    Ok(ScanOutput {
        entries,
        report,
        workbook,
        extras,
        per_file: per_file_paths,
        image,
    })
}

/// `<name>.xlsx` for every entry. Names are compared case-insensitively, with
/// each other and with the combined workbook, so nothing is overwritten.
fn per_file_workbooks(entries: &[ScanEntry], out_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut taken: HashSet<String> = HashSet::from([SCAN_WORKBOOK.to_lowercase()]);
    entries
        .iter()
        .map(|entry| {
            let file = format!("{}.xlsx", entry.series.name);
            let path = out_dir.join(&file);
            if !taken.insert(file.to_lowercase()) {
                return Err(PipelineError::DuplicateOutput { path });
            }
            Ok(path)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

/// Read and merge overlay files.
///
/// Files are ordered by the number in their name. With a description map the
/// files are read headerless and named through it; otherwise each file's
/// header names its columns.
pub fn load_overlay_table(
    paths: &[PathBuf],
    descriptions: Option<&DescriptionMap>,
    config: &Config,
) -> Result<WideTable, PipelineError> {
    if paths.is_empty() {
        return Err(PipelineError::NoInput);
    }
    let mut ordered = paths.to_vec();
    sort_by_file_number(&mut ordered);

    let mode = if descriptions.is_some() {
        HeaderMode::Headerless
    } else {
        HeaderMode::Header
    };
    let mut naming = ColumnNaming::new(descriptions);

    let mut tables = Vec::with_capacity(ordered.len());
    for path in &ordered {
        let raw = read_table(path, mode)?;
        let names = match &raw.header {
            Some(header) => header.iter().skip(1).cloned().collect(),
            None => naming.next_names(raw.width().saturating_sub(1)),
        };
        tables.push(normalize_columns(&raw, &names));
    }
    Ok(merge_tables(tables, config.alignment()))
}

/// Peaks of one overlay column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPeaks {
    pub column: String,
    pub peaks: PeakSet,
}

#[derive(Debug)]
pub struct OverlayOutput {
    pub table: WideTable,
    pub report: Report,
    pub workbook: PathBuf,
    pub extras: ExtraFiles,
    pub peaks: Vec<ColumnPeaks>,
    pub image: RenderOutcome,
}

/// Build an overlay report of the selected columns of `table`.
pub fn run_overlay(
    table: &WideTable,
    requested: &[String],
    y_title: &str,
    config: &Config,
    out_dir: &Path,
    artifacts: Artifacts,
    renderer: &dyn ChartRenderer,
) -> Result<OverlayOutput, PipelineError> {
    let selected = select_columns(table, requested);
    if selected.is_empty() {
        return Err(PipelineError::EmptySelection);
    }
    let projected = project(table, &selected);
    let style = config.report_style()?;
    std::fs::create_dir_all(out_dir)?;

    let detector = config.detector();
    let peaks = projected
        .columns
        .iter()
        .map(|c| ColumnPeaks {
            column: c.name.clone(),
            peaks: detector.detect_column(&projected.axis, &c.values),
        })
        .collect();

    let report = build_overlay_report(&projected, config.sheet_name(), &style, y_title);
    let workbook = out_dir.join(OVERLAY_WORKBOOK);
    write_workbook(&report, &workbook)?;
    info!("overlay written to {}", workbook.display());

    let extras = write_extras(&report, &workbook, artifacts)?;
    let image = render_image(&report, &workbook, &out_dir.join(OVERLAY_IMAGE), config, artifacts, renderer);

    Ok(OverlayOutput {
        table: projected,
        report,
        workbook,
        extras,
        peaks,
        image,
    })
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

fn write_extras(report: &Report, workbook: &Path, artifacts: Artifacts) -> Result<ExtraFiles, PipelineError> {
    let mut extras = ExtraFiles::default();
    if artifacts.csv {
        let path = workbook.with_extension("csv");
        write_csv(report, &path)?;
        extras.csv = Some(path);
    }
    if artifacts.json {
        let path = workbook.with_extension("json");
        write_chart_json(report, &path)?;
        extras.json = Some(path);
    }
    Ok(extras)
}

fn render_image(
    report: &Report,
    workbook: &Path,
    output: &Path,
    config: &Config,
    artifacts: Artifacts,
    renderer: &dyn ChartRenderer,
) -> RenderOutcome {
    if !artifacts.image || !config.render_enabled() {
        return RenderOutcome::Skipped;
    }
    rasterize(renderer, report, workbook, output, &config.retry_policy())
}
