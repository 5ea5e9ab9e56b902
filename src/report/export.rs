use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::layout::{Cell, Report};
use crate::error::PipelineError;

/// Write the report grid as CSV, one record per sheet row; blank cells are
/// empty fields.
pub fn write_csv(report: &Report, path: &Path) -> Result<(), PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_path(path)?;
    let cols = report.grid.col_count();
    for row in 0..report.grid.row_count() {
        let record: Vec<String> = (0..cols)
            .map(|col| match report.grid.get(row, col) {
                Some(Cell::Text(s)) => s.clone(),
                Some(Cell::Number(v)) => v.to_string(),
                None => String::new(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the chart description as pretty JSON.
pub fn write_chart_json(report: &Report, path: &Path) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report.chart)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::merge::Alignment;
    use crate::data::model::{Peak, PeakSet, ScanEntry, Series};
    use crate::report::chart::ReportStyle;
    use crate::report::layout::build_scan_report;

    fn report() -> Report {
        let entry = ScanEntry {
            series: Series {
                name: "case".into(),
                x: vec![1.0, 2.0, 3.0],
                y: vec![0.0, 2.5, 0.0],
            },
            peaks: PeakSet {
                peaks: vec![Peak {
                    index: 1,
                    value: 2.5,
                    x: 2.0,
                }],
            },
        };
        build_scan_report(&[entry], Alignment::Join, "Sheet1", &ReportStyle::default())
    }

    #[test]
    fn test_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AllData.csv");
        write_csv(&report(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![",case", "peak1,2.5", "freq,2", ",", ",", "Frequency,", "1,0", "2,2.5", "3,0"]
        );
    }

    #[test]
    fn test_chart_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        write_chart_json(&report(), &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "scatter_smooth");
        assert_eq!(value["legend"], "top");
        assert_eq!(value["series"][0]["color"], "#0072BD");
        assert_eq!(value["x_axis"]["max"], 50.0);
    }
}
