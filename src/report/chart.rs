use serde::Serialize;

use crate::color::{to_hex, Palette};

/// Default chart size multiplier relative to the spreadsheet's default.
pub const DEFAULT_CHART_SCALE: f64 = 2.0;

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

/// Fixed look of every chart: colours, typography, line width.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub palette: Palette,
    /// Serif font used for axis titles, tick labels and legend.
    pub font: String,
    /// Font size in points.
    pub font_size: u32,
    pub line_width: f64,
    /// Built-in spreadsheet chart style id.
    pub chart_style: u8,
    pub chart_scale: f64,
}

impl Default for ReportStyle {
    fn default() -> Self {
        ReportStyle {
            palette: Palette::default(),
            font: "Times New Roman".to_string(),
            font_size: 9,
            line_width: 1.5,
            chart_style: 15,
            chart_scale: DEFAULT_CHART_SCALE,
        }
    }
}

// ---------------------------------------------------------------------------
// Cell references
// ---------------------------------------------------------------------------

/// Zero-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        CellRef { row, col }
    }

    /// Absolute A1 reference, e.g. `$B$1`.
    pub fn to_a1(self) -> String {
        format!("${}${}", column_letters(self.col), self.row + 1)
    }
}

/// Spreadsheet column letters for a zero-based index: 0 → `A`, 26 → `AA`.
pub fn column_letters(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A rectangular range on one sheet (inclusive bounds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub sheet: String,
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    /// Rows `first_row..=last_row` of one column.
    pub fn column(sheet: &str, col: u16, first_row: u32, last_row: u32) -> Self {
        CellRange {
            sheet: sheet.to_string(),
            first: CellRef::new(first_row, col),
            last: CellRef::new(last_row, col),
        }
    }

    /// Formula form, e.g. `=Sheet1!$A$8:$A$57`.
    pub fn formula(&self) -> String {
        format!("={}!{}:{}", self.sheet, self.first.to_a1(), self.last.to_a1())
    }

    /// Number of rows covered.
    pub fn len(&self) -> usize {
        (self.last.row - self.first.row + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.last.row < self.first.row
    }
}

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Scatter plot with smoothed connecting lines.
    ScatterSmooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    Bottom,
    Right,
}

/// One line on the chart, wired to its cell ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeriesSpec {
    pub name: String,
    /// Cell holding the series name; `None` means `name` is used literally.
    pub name_cell: Option<CellRef>,
    pub categories: CellRange,
    pub values: CellRange,
    /// `#RRGGBB`.
    pub color: String,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    pub title: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AxisSpec {
    /// Fixed 0–50 cycle-order axis of frequency-scan reports.
    pub fn frequency_order() -> Self {
        AxisSpec {
            title: "Frequency Order".to_string(),
            min: Some(0.0),
            max: Some(50.0),
        }
    }

    /// Axis without fixed bounds.
    pub fn open(title: &str) -> Self {
        AxisSpec {
            title: title.to_string(),
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub name: String,
    pub size: u32,
    /// Axis titles are bold, tick labels and legend are not.
    pub bold_titles: bool,
}

/// Everything needed to draw the overlay chart of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub series: Vec<ChartSeriesSpec>,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub legend: LegendPosition,
    pub font: FontSpec,
    pub style_id: u8,
    /// Top-left cell the chart is anchored at.
    pub anchor: CellRef,
    pub scale: f64,
}

impl ChartSpec {
    pub fn new(style: &ReportStyle, x_axis: AxisSpec, y_axis: AxisSpec) -> Self {
        ChartSpec {
            kind: ChartKind::ScatterSmooth,
            title: None,
            series: Vec::new(),
            x_axis,
            y_axis,
            legend: LegendPosition::Top,
            font: FontSpec {
                name: style.font.clone(),
                size: style.font_size,
                bold_titles: true,
            },
            style_id: style.chart_style,
            anchor: CellRef::new(1, 4),
            scale: style.chart_scale,
        }
    }

    /// Append a series; its colour is the palette entry for its position.
    pub fn add_series(
        &mut self,
        style: &ReportStyle,
        name: &str,
        name_cell: Option<CellRef>,
        categories: CellRange,
        values: CellRange,
    ) {
        let color = to_hex(style.palette.color_for(self.series.len()));
        self.series.push(ChartSeriesSpec {
            name: name.to_string(),
            name_cell,
            categories,
            values,
            color,
            line_width: style.line_width,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(1), "B");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_range_formula() {
        let range = CellRange::column("Sheet1", 1, 9, 58);
        assert_eq!(range.formula(), "=Sheet1!$B$10:$B$59");
        assert_eq!(range.len(), 50);
        assert_eq!(CellRef::new(0, 2).to_a1(), "$C$1");
    }

    #[test]
    fn test_series_colours_cycle() {
        let style = ReportStyle::default();
        let mut chart = ChartSpec::new(&style, AxisSpec::frequency_order(), AxisSpec::open("y"));
        for i in 0..9u16 {
            let r = CellRange::column("Sheet1", i + 1, 1, 2);
            chart.add_series(&style, "s", None, r.clone(), r);
        }
        assert_eq!(chart.series[0].color, "#0072BD");
        assert_eq!(chart.series[7].color, "#0072BD");
        assert_eq!(chart.series[8].color, "#D95319");
    }
}
