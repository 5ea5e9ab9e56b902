use std::collections::BTreeMap;

use super::chart::{AxisSpec, CellRange, CellRef, ChartSpec, ReportStyle};
use crate::data::merge::{series_table, Alignment};
use crate::data::model::{ScanEntry, WideTable};

/// Header of the raw-series block.
pub const FREQUENCY_HEADER: &str = "Frequency";
/// Dependent column header of single-file workbooks.
pub const IMPEDANCE_HEADER: &str = "Impedance";
/// Y-axis title of frequency-scan charts.
pub const IMPEDANCE_AXIS: &str = "Impedance (Ohms)";
/// Chart title of single-file workbooks.
pub const SINGLE_SCAN_TITLE: &str = "Frequency Scan";

// ---------------------------------------------------------------------------
// Grid – sparse worksheet contents
// ---------------------------------------------------------------------------

/// A written cell. Absent cells are blank.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

/// Sparse worksheet: (row, col) → cell, iterated row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: BTreeMap<(u32, u16), Cell>,
}

impl Grid {
    pub fn set_text(&mut self, row: u32, col: u16, text: impl Into<String>) {
        self.cells.insert((row, col), Cell::Text(text.into()));
    }

    pub fn set_number(&mut self, row: u32, col: u16, value: f64) {
        self.cells.insert((row, col), Cell::Number(value));
    }

    /// Write a number, or leave the cell blank for `None`.
    pub fn set_optional(&mut self, row: u32, col: u16, value: Option<f64>) {
        if let Some(v) = value {
            self.set_number(row, col, v);
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter().map(|(&(r, c), cell)| (r, c, cell))
    }

    /// Number of rows up to the last written one.
    pub fn row_count(&self) -> u32 {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    /// Number of columns up to the last written one.
    pub fn col_count(&self) -> u16 {
        self.cells.keys().map(|(_, c)| c + 1).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Report – grid plus chart description
// ---------------------------------------------------------------------------

/// A finished report: worksheet contents and the chart wired to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub sheet_name: String,
    pub grid: Grid,
    pub chart: ChartSpec,
    /// Row of the raw-series header (`Frequency` / axis name).
    pub data_header_row: u32,
    /// Number of rows below the header.
    pub data_rows: u32,
}

impl Report {
    /// Numeric points of one chart series, read back from the grid.
    /// Rows where either cell is blank are skipped.
    pub fn series_points(&self, index: usize) -> Vec<(f64, f64)> {
        let Some(series) = self.chart.series.get(index) else {
            return Vec::new();
        };
        let xs = &series.categories;
        let ys = &series.values;
        (0..xs.len().min(ys.len()) as u32)
            .filter_map(|offset| {
                let x = self.grid.get(xs.first.row + offset, xs.first.col)?.as_number()?;
                let y = self.grid.get(ys.first.row + offset, ys.first.col)?.as_number()?;
                Some((x, y))
            })
            .collect()
    }
}

/// Write the raw-series block: axis in column 0, one column per table
/// column, starting right below `header_row`. Returns the data row count.
fn write_table_block(grid: &mut Grid, table: &WideTable, header_row: u32) -> u32 {
    let first = header_row + 1;
    for (i, &x) in table.axis.iter().enumerate() {
        grid.set_number(first + i as u32, 0, x);
    }
    for (c, column) in table.columns.iter().enumerate() {
        let col = c as u16 + 1;
        for (i, value) in column.values.iter().enumerate() {
            grid.set_optional(first + i as u32, col, *value);
        }
    }
    table.len() as u32
}

/// Wire one chart series per table column to its data block.
fn add_chart_series(
    chart: &mut ChartSpec,
    style: &ReportStyle,
    sheet: &str,
    names: &[(String, Option<CellRef>)],
    header_row: u32,
    rows: u32,
) {
    if rows == 0 {
        return;
    }
    let first = header_row + 1;
    let last = header_row + rows;
    for (c, (name, cell)) in names.iter().enumerate() {
        let col = c as u16 + 1;
        chart.add_series(
            style,
            name,
            *cell,
            CellRange::column(sheet, 0, first, last),
            CellRange::column(sheet, col, first, last),
        );
    }
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// Multi-file frequency-scan report.
///
/// ```text
/// row 0        |        | name1 | name2 | ...
/// row 1+2j     | peakN  | value | value |          (N = j + 1)
/// row 2+2j     | freq   | x     | x     |
/// row 2M+1..2  (blank)
/// row 2M+3     | Frequency
/// row 2M+4..   | axis   | y1    | y2    |
/// ```
///
/// `M` is the largest peak count; missing peaks leave blank cells.
pub fn build_scan_report(
    entries: &[ScanEntry],
    alignment: Alignment,
    sheet_name: &str,
    style: &ReportStyle,
) -> Report {
    let mut grid = Grid::default();

    for (c, entry) in entries.iter().enumerate() {
        grid.set_text(0, c as u16 + 1, entry.series.name.clone());
    }

    let max_peaks = entries.iter().map(|e| e.peaks.len()).max().unwrap_or(0) as u32;
    for j in 0..max_peaks {
        grid.set_text(1 + 2 * j, 0, format!("peak{}", j + 1));
        grid.set_text(2 + 2 * j, 0, "freq");
    }
    for (c, entry) in entries.iter().enumerate() {
        let col = c as u16 + 1;
        for (j, peak) in entry.peaks.peaks.iter().enumerate() {
            let j = j as u32;
            grid.set_number(1 + 2 * j, col, peak.value);
            grid.set_number(2 + 2 * j, col, peak.x);
        }
    }

    let header_row = 2 * max_peaks + 3;
    grid.set_text(header_row, 0, FREQUENCY_HEADER);

    let series: Vec<_> = entries.iter().map(|e| e.series.clone()).collect();
    let table = series_table(&series, FREQUENCY_HEADER, alignment);
    let rows = write_table_block(&mut grid, &table, header_row);

    let mut chart = ChartSpec::new(
        style,
        AxisSpec::frequency_order(),
        AxisSpec::open(IMPEDANCE_AXIS),
    );
    let names: Vec<_> = entries
        .iter()
        .enumerate()
        .map(|(c, e)| (e.series.name.clone(), Some(CellRef::new(0, c as u16 + 1))))
        .collect();
    add_chart_series(&mut chart, style, sheet_name, &names, header_row, rows);

    Report {
        sheet_name: sheet_name.to_string(),
        grid,
        chart,
        data_header_row: header_row,
        data_rows: rows,
    }
}

/// Time-domain overlay: header row with the axis name and column names,
/// data from row 1, open-ended x-axis.
pub fn build_overlay_report(
    table: &WideTable,
    sheet_name: &str,
    style: &ReportStyle,
    y_title: &str,
) -> Report {
    let mut grid = Grid::default();
    grid.set_text(0, 0, table.axis_name.clone());
    for (c, column) in table.columns.iter().enumerate() {
        grid.set_text(0, c as u16 + 1, column.name.clone());
    }
    let rows = write_table_block(&mut grid, table, 0);

    let mut chart = ChartSpec::new(style, AxisSpec::open(&table.axis_name), AxisSpec::open(y_title));
    let names: Vec<_> = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, col)| (col.name.clone(), Some(CellRef::new(0, c as u16 + 1))))
        .collect();
    add_chart_series(&mut chart, style, sheet_name, &names, 0, rows);

    Report {
        sheet_name: sheet_name.to_string(),
        grid,
        chart,
        data_header_row: 0,
        data_rows: rows,
    }
}

/// Single-file workbook: `Frequency` / `Impedance` columns and one titled
/// series named after the file.
pub fn build_single_report(entry: &ScanEntry, sheet_name: &str, style: &ReportStyle) -> Report {
    let mut grid = Grid::default();
    grid.set_text(0, 0, FREQUENCY_HEADER);
    grid.set_text(0, 1, IMPEDANCE_HEADER);
    for (i, (x, y)) in entry.series.points().enumerate() {
        grid.set_number(i as u32 + 1, 0, x);
        grid.set_number(i as u32 + 1, 1, y);
    }
    let rows = entry.series.len() as u32;

    let mut chart = ChartSpec::new(
        style,
        AxisSpec::frequency_order(),
        AxisSpec::open(IMPEDANCE_AXIS),
    );
    chart.title = Some(SINGLE_SCAN_TITLE.to_string());
    add_chart_series(
        &mut chart,
        style,
        sheet_name,
        &[(entry.series.name.clone(), None)],
        0,
        rows,
    );

    Report {
        sheet_name: sheet_name.to_string(),
        grid,
        chart,
        data_header_row: 0,
        data_rows: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Peak, PeakSet, Series};

    fn entry(name: &str, x: &[f64], y: &[f64], peak_idx: &[usize]) -> ScanEntry {
        let series = Series {
            name: name.into(),
            x: x.to_vec(),
            y: y.to_vec(),
        };
        let peaks = PeakSet {
            peaks: peak_idx
                .iter()
                .map(|&i| Peak {
                    index: i,
                    value: y[i],
                    x: x[i],
                })
                .collect(),
        };
        ScanEntry { series, peaks }
    }

    fn text(report: &Report, row: u32, col: u16) -> Option<&str> {
        report.grid.get(row, col).and_then(Cell::as_text)
    }

    fn number(report: &Report, row: u32, col: u16) -> Option<f64> {
        report.grid.get(row, col).and_then(Cell::as_number)
    }

    #[test]
    fn test_scan_layout_peak_block() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let a = entry("a", &x, &[0.0, 5.0, 0.0, 6.0, 0.0, 7.0, 0.0], &[1, 3, 5]);
        let b = entry("b", &x, &[0.0, 1.0, 2.0, 9.0, 2.0, 1.0, 0.0], &[3]);
        let report = build_scan_report(&[a, b], Alignment::Join, "Sheet1", &ReportStyle::default());

        assert!(report.grid.get(0, 0).is_none());
        assert_eq!(text(&report, 0, 1), Some("a"));
        assert_eq!(text(&report, 0, 2), Some("b"));

        // 2 * max(3, 1) = 6 peak rows.
        for j in 0..3u32 {
            assert_eq!(text(&report, 1 + 2 * j, 0), Some(format!("peak{}", j + 1).as_str()));
            assert_eq!(text(&report, 2 + 2 * j, 0), Some("freq"));
        }
        assert_eq!(number(&report, 1, 1), Some(5.0));
        assert_eq!(number(&report, 2, 1), Some(2.0));
        assert_eq!(number(&report, 5, 1), Some(7.0));
        assert_eq!(number(&report, 1, 2), Some(9.0));
        assert_eq!(number(&report, 2, 2), Some(4.0));
        // Missing peaks are blank, not zero.
        assert!(report.grid.get(3, 2).is_none());
        assert!(report.grid.get(6, 2).is_none());
        // Gap rows.
        assert!(report.grid.get(7, 0).is_none());
        assert!(report.grid.get(8, 0).is_none());

        assert_eq!(report.data_header_row, 9);
        assert_eq!(text(&report, 9, 0), Some("Frequency"));
        assert_eq!(number(&report, 10, 0), Some(1.0));
        assert_eq!(number(&report, 13, 2), Some(9.0));
        assert_eq!(report.data_rows, 7);
    }

    #[test]
    fn test_scan_chart_wiring() {
        let x = [1.0, 2.0, 3.0];
        let a = entry("a", &x, &[0.0, 2.0, 0.0], &[1]);
        let b = entry("b", &x, &[0.0, 3.0, 0.0], &[1]);
        let report = build_scan_report(&[a, b], Alignment::Join, "Sheet1", &ReportStyle::default());
        let chart = &report.chart;

        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.x_axis, AxisSpec::frequency_order());
        assert_eq!(chart.series[1].name_cell, Some(CellRef::new(0, 2)));
        // Header at row 5 (2*1 + 3), data rows 6..=8 → A7:A9.
        assert_eq!(chart.series[0].categories.formula(), "=Sheet1!$A$7:$A$9");
        assert_eq!(chart.series[1].values.formula(), "=Sheet1!$C$7:$C$9");
        assert_eq!(report.series_points(1), vec![(1.0, 0.0), (2.0, 3.0), (3.0, 0.0)]);
    }

    #[test]
    fn test_scan_join_leaves_gaps() {
        let a = entry("a", &[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &[]);
        let b = entry("b", &[2.0, 3.0, 4.0], &[20.0, 30.0, 40.0], &[]);
        let report = build_scan_report(&[a, b], Alignment::Join, "Sheet1", &ReportStyle::default());
        // No peaks: header at row 3, data from row 4.
        assert_eq!(report.data_header_row, 3);
        assert_eq!(report.data_rows, 4);
        assert_eq!(number(&report, 7, 0), Some(4.0));
        assert!(report.grid.get(7, 1).is_none());
        assert!(report.grid.get(4, 2).is_none());
        assert_eq!(report.series_points(1).len(), 3);
    }

    #[test]
    fn test_empty_series_have_no_chart_lines() {
        let a = entry("a", &[], &[], &[]);
        let report = build_scan_report(&[a], Alignment::Join, "Sheet1", &ReportStyle::default());
        assert!(report.chart.series.is_empty());
        assert_eq!(text(&report, 0, 1), Some("a"));
    }

    #[test]
    fn test_overlay_layout() {
        let table = WideTable {
            axis_name: "Time".into(),
            axis: vec![0.0, 0.5],
            columns: vec![
                Column {
                    name: "Ia".into(),
                    values: vec![Some(1.0), None],
                },
                Column {
                    name: "Ib".into(),
                    values: vec![Some(3.0), Some(4.0)],
                },
            ],
        };
        let report = build_overlay_report(&table, "Sheet1", &ReportStyle::default(), "Value");
        assert_eq!(text(&report, 0, 0), Some("Time"));
        assert_eq!(text(&report, 0, 2), Some("Ib"));
        assert_eq!(number(&report, 2, 0), Some(0.5));
        assert!(report.grid.get(2, 1).is_none());
        assert_eq!(report.chart.x_axis.max, None);
        assert_eq!(report.chart.series[0].values.formula(), "=Sheet1!$B$2:$B$3");
        assert_eq!(report.series_points(0), vec![(0.0, 1.0)]);
    }

    #[test]
    fn test_single_report() {
        let e = entry("case1", &[1.0, 2.0], &[3.0, 4.0], &[]);
        let report = build_single_report(&e, "Sheet1", &ReportStyle::default());
        assert_eq!(text(&report, 0, 0), Some("Frequency"));
        assert_eq!(text(&report, 0, 1), Some("Impedance"));
        assert_eq!(report.chart.title.as_deref(), Some("Frequency Scan"));
        assert_eq!(report.chart.series[0].name, "case1");
        assert_eq!(report.chart.series[0].name_cell, None);
        assert_eq!(report.grid.row_count(), 3);
        assert_eq!(report.grid.col_count(), 2);
    }
}
