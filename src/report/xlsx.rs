use std::path::Path;

use log::debug;
use rust_xlsxwriter::{
    Chart, ChartFont, ChartFormat, ChartLegendPosition, ChartLine, ChartType, Color, Workbook,
    XlsxError,
};

use super::chart::{ChartKind, ChartSpec, LegendPosition};
use super::layout::{Cell, Report};
use crate::color::{parse_hex, to_rgb_u32};
use crate::error::PipelineError;

/// Default chart size in pixels before scaling.
const BASE_CHART_SIZE: (f64, f64) = (480.0, 288.0);

/// Write a report as a one-sheet workbook with its chart embedded.
///
/// The chart is omitted when it has no series (no data rows).
pub fn write_workbook(report: &Report, path: &Path) -> Result<(), PipelineError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&report.sheet_name)?;

    for (row, col, cell) in report.grid.iter() {
        match cell {
            Cell::Text(s) => worksheet.write_string(row, col, s)?,
            Cell::Number(v) => worksheet.write_number(row, col, *v)?,
        };
    }

    if !report.chart.series.is_empty() {
        let chart = build_chart(&report.chart)?;
        worksheet.insert_chart(report.chart.anchor.row, report.chart.anchor.col, &chart)?;
    }

    workbook.save(path)?;
    debug!(
        "wrote {} ({} rows, {} chart series)",
        path.display(),
        report.grid.row_count(),
        report.chart.series.len()
    );
    Ok(())
}

fn chart_type(kind: ChartKind) -> ChartType {
    match kind {
        ChartKind::ScatterSmooth => ChartType::ScatterSmooth,
    }
}

fn legend_position(position: LegendPosition) -> ChartLegendPosition {
    match position {
        LegendPosition::Top => ChartLegendPosition::Top,
        LegendPosition::Bottom => ChartLegendPosition::Bottom,
        LegendPosition::Right => ChartLegendPosition::Right,
    }
}

fn parse_color(hex: &str) -> Result<Color, XlsxError> {
    parse_hex(hex)
        .map(|c| Color::RGB(to_rgb_u32(c)))
        .map_err(XlsxError::ParameterError)
}

fn build_chart(spec: &ChartSpec) -> Result<Chart, XlsxError> {
    let mut chart = Chart::new(chart_type(spec.kind));

    for series in &spec.series {
        let mut line = ChartLine::new();
        line.set_color(parse_color(&series.color)?)
            .set_width(series.line_width);
        let mut format = ChartFormat::new();
        format.set_line(&line);

        let name = match series.name_cell {
            Some(cell) => format!("={}!{}", series.values.sheet, cell.to_a1()),
            None => series.name.clone(),
        };
        let cats = &series.categories;
        let vals = &series.values;
        chart
            .add_series()
            .set_name(name.as_str())
            .set_categories((
                cats.sheet.as_str(),
                cats.first.row,
                cats.first.col,
                cats.last.row,
                cats.last.col,
            ))
            .set_values((
                vals.sheet.as_str(),
                vals.first.row,
                vals.first.col,
                vals.last.row,
                vals.last.col,
            ))
            .set_format(&mut format);
    }

    if let Some(title) = &spec.title {
        chart.title().set_name(title);
    }

    let mut title_font = ChartFont::new();
    title_font.set_name(&spec.font.name).set_size(spec.font.size);
    if spec.font.bold_titles {
        title_font.set_bold();
    }
    let mut num_font = ChartFont::new();
    num_font.set_name(&spec.font.name).set_size(spec.font.size);

    let x_axis = chart.x_axis();
    x_axis
        .set_name(&spec.x_axis.title)
        .set_name_font(&title_font)
        .set_font(&num_font);
    if let Some(min) = spec.x_axis.min {
        x_axis.set_min(min);
    }
    if let Some(max) = spec.x_axis.max {
        x_axis.set_max(max);
    }

    let y_axis = chart.y_axis();
    y_axis
        .set_name(&spec.y_axis.title)
        .set_name_font(&title_font)
        .set_font(&num_font);
    if let Some(min) = spec.y_axis.min {
        y_axis.set_min(min);
    }
    if let Some(max) = spec.y_axis.max {
        y_axis.set_max(max);
    }

    chart
        .legend()
        .set_position(legend_position(spec.legend))
        .set_font(&num_font);
    chart.set_style(spec.style_id);
    chart
        .set_width((BASE_CHART_SIZE.0 * spec.scale).round() as u32)
        .set_height((BASE_CHART_SIZE.1 * spec.scale).round() as u32);

    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::merge::Alignment;
    use crate::data::model::{PeakSet, ScanEntry, Series};
    use crate::report::chart::ReportStyle;
    use crate::report::layout::build_scan_report;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#0072BD").unwrap(), Color::RGB(0x0072BD));
        assert!(parse_color("#xyz").is_err());
        assert!(parse_color("bad").is_err());
    }

    #[test]
    fn test_write_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AllData.xlsx");
        let entry = ScanEntry {
            series: Series {
                name: "case".into(),
                x: vec![1.0, 2.0, 3.0],
                y: vec![0.0, 2.0, 0.0],
            },
            peaks: PeakSet::default(),
        };
        let report = build_scan_report(&[entry], Alignment::Join, "Sheet1", &ReportStyle::default());
        write_workbook(&report, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }
}
