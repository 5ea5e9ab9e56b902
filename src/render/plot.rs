use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use plotters::prelude::*;
use plotters::style::{register_font, FontDesc, FontFamily, FontStyle};

use super::{ChartRenderer, RenderSession};
use crate::color::parse_hex;
use crate::error::RenderError;
use crate::report::chart::LegendPosition;
use crate::report::Report;

/// Serif fonts tried when no font file is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSerif-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "/Library/Fonts/Times New Roman.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
];

/// Loaded font files, keyed by the configured path (`None` = system search).
/// Each file is read once; its bytes live for the rest of the process.
static FONTS: Mutex<BTreeMap<Option<PathBuf>, Result<(PathBuf, &'static [u8]), String>>> =
    Mutex::new(BTreeMap::new());

fn draw_err(err: impl Display) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn load_font(configured: Option<&Path>) -> Result<(PathBuf, &'static [u8]), String> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };
    let path = candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| match configured {
            Some(path) => format!("font {} not found", path.display()),
            None => "no serif font found; set render.font_path".to_string(),
        })?;
    let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    // Registration needs 'static data.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    Ok((path, bytes))
}

/// Make the configured font the `serif` family (regular and bold).
///
/// Renders are serialised, so re-registering on every open keeps each
/// renderer drawing with its own font.
fn register_serif(configured: Option<&Path>) -> Result<PathBuf, String> {
    let loaded = {
        let mut fonts = FONTS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fonts
            .entry(configured.map(Path::to_path_buf))
            .or_insert_with(|| load_font(configured))
            .clone()
    };
    let (path, bytes) = loaded?;
    for style in [FontStyle::Normal, FontStyle::Bold] {
        register_font("serif", style, bytes)
            .map_err(|_| format!("{}: not a usable font", path.display()))?;
    }
    debug!("registered chart font {}", path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Plotters renderer
// ---------------------------------------------------------------------------

/// Draws the report chart with `plotters` and saves it as PNG.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
    /// Font file for all chart text; system serif fonts are tried otherwise.
    pub font_path: Option<PathBuf>,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        PlottersRenderer {
            width: 960,
            height: 576,
            font_path: None,
        }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn name(&self) -> &str {
        "plotters"
    }

    fn open<'a>(&'a self, workbook: &Path) -> Result<Box<dyn RenderSession + 'a>, RenderError> {
        if !workbook.is_file() {
            return Err(RenderError::Unavailable(format!(
                "workbook {} not found",
                workbook.display()
            )));
        }
        register_serif(self.font_path.as_deref()).map_err(RenderError::Unavailable)?;
        debug!("render session opened for {}", workbook.display());
        Ok(Box::new(PlotSession {
            renderer: self,
            workbook: workbook.to_path_buf(),
        }))
    }
}

struct PlotSession<'a> {
    renderer: &'a PlottersRenderer,
    workbook: PathBuf,
}

impl Drop for PlotSession<'_> {
    fn drop(&mut self) {
        debug!("render session closed for {}", self.workbook.display());
    }
}

impl RenderSession for PlotSession<'_> {
    fn export_chart(&mut self, report: &Report, output: &Path) -> Result<(), RenderError> {
        if report.chart.series.is_empty() {
            return Err(RenderError::ChartNotFound);
        }
        let (w, h) = (self.renderer.width, self.renderer.height);
        let mut buffer = vec![0u8; w as usize * h as usize * 3];
        draw_chart(report, &mut buffer, (w, h))?;
        let image = image::RgbImage::from_raw(w, h, buffer)
            .ok_or_else(|| RenderError::Draw("image buffer size mismatch".to_string()))?;
        image.save_with_format(output, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Series colour; anything but `#RRGGBB` draws grey.
fn parse_rgb(hex: &str) -> RGBColor {
    parse_hex(hex)
        .map(|c| RGBColor(c.red, c.green, c.blue))
        .unwrap_or(RGBColor(0x80, 0x80, 0x80))
}

/// `[min, max]` of the values, widened so the range is never empty.
fn bounds(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let margin = (hi - lo) * pad;
    (lo - margin, hi + margin)
}

fn draw_chart(report: &Report, buffer: &mut [u8], size: (u32, u32)) -> Result<(), RenderError> {
    let spec = &report.chart;
    let points: Vec<Vec<(f64, f64)>> = (0..spec.series.len())
        .map(|i| report.series_points(i))
        .collect();

    let (mut x0, mut x1) = bounds(points.iter().flatten().map(|p| p.0), 0.0);
    x0 = spec.x_axis.min.unwrap_or(x0);
    x1 = spec.x_axis.max.unwrap_or(x1);
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }
    let (y0, y1) = bounds(points.iter().flatten().map(|p| p.1), 0.05);

    // Points → pixels, scaled with the chart so text keeps its proportion.
    let text_px = f64::from(spec.font.size) * 4.0 / 3.0 * spec.scale;
    let title_style = if spec.font.bold_titles {
        FontStyle::Bold
    } else {
        FontStyle::Normal
    };
    let title_font = FontDesc::new(FontFamily::Serif, text_px, title_style);
    let label_font = FontDesc::new(FontFamily::Serif, text_px, FontStyle::Normal);

    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(16)
        .x_label_area_size((text_px * 3.0) as u32)
        .y_label_area_size((text_px * 5.0) as u32);
    if let Some(title) = &spec.title {
        builder.caption(title, title_font.clone());
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_axis.title.as_str())
        .y_desc(spec.y_axis.title.as_str())
        .axis_desc_style(title_font)
        .label_style(label_font.clone())
        .draw()
        .map_err(draw_err)?;

    let stroke = (spec.series.first().map(|s| s.line_width).unwrap_or(1.5) * spec.scale).round() as u32;
    for (series, pts) in spec.series.iter().zip(points) {
        let color = parse_rgb(&series.color);
        chart
            .draw_series(LineSeries::new(pts, color.stroke_width(stroke.max(1))))
            .map_err(draw_err)?
            .label(series.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    let position = match spec.legend {
        LegendPosition::Top => SeriesLabelPosition::UpperMiddle,
        LegendPosition::Bottom => SeriesLabelPosition::LowerMiddle,
        LegendPosition::Right => SeriesLabelPosition::UpperRight,
    };
    chart
        .configure_series_labels()
        .position(position)
        .label_font(label_font)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::merge::Alignment;
    use crate::data::model::{PeakSet, ScanEntry, Series};
    use crate::render::{rasterize, RetryPolicy};
    use crate::report::build_scan_report;
    use crate::report::chart::ReportStyle;
    use crate::report::xlsx::write_workbook;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("#0072BD"), RGBColor(0x00, 0x72, 0xBD));
        assert_eq!(parse_rgb("#0072BDFF"), RGBColor(0x80, 0x80, 0x80));
        assert_eq!(parse_rgb("not a colour"), RGBColor(0x80, 0x80, 0x80));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds([1.0, 3.0].into_iter(), 0.0), (1.0, 3.0));
        assert_eq!(bounds([2.0, 2.0].into_iter(), 0.1), (1.0, 3.0));
        assert_eq!(bounds(std::iter::empty(), 0.1), (0.0, 1.0));
        let (lo, hi) = bounds([0.0, 10.0].into_iter(), 0.1);
        assert!((lo + 1.0).abs() < 1e-9 && (hi - 11.0).abs() < 1e-9);
    }

    /// A TrueType font from the usual system locations, if any.
    fn system_font() -> Option<PathBuf> {
        FONT_CANDIDATES
            .iter()
            .chain(&[
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            ])
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }

    fn scan_report() -> Report {
        let entry = ScanEntry {
            series: Series {
                name: "case".into(),
                x: vec![1.0, 2.0, 3.0, 4.0],
                y: vec![0.5, 3.0, 1.0, 0.5],
            },
            peaks: PeakSet::default(),
        };
        build_scan_report(&[entry], Alignment::Join, "Sheet1", &ReportStyle::default())
    }

    #[test]
    fn test_renders_png_with_configured_font() {
        let Some(font) = system_font() else {
            eprintln!("no TrueType font installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("AllData.xlsx");
        let output = dir.path().join("AllData.png");
        let report = scan_report();
        write_workbook(&report, &workbook).unwrap();

        let renderer = PlottersRenderer {
            font_path: Some(font),
            ..PlottersRenderer::default()
        };
        let outcome = rasterize(&renderer, &report, &workbook, &output, &RetryPolicy::default());
        assert_eq!(outcome.image(), Some(output.as_path()));

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_each_renderer_uses_its_own_font_path() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("AllData.xlsx");
        write_workbook(&scan_report(), &workbook).unwrap();

        if let Some(font) = system_font() {
            let good = PlottersRenderer {
                font_path: Some(font),
                ..PlottersRenderer::default()
            };
            assert!(good.open(&workbook).is_ok());
        }
        // A missing font stays missing even after another renderer loaded one.
        let bad = PlottersRenderer {
            font_path: Some(dir.path().join("missing.ttf")),
            ..PlottersRenderer::default()
        };
        let err = bad.open(&workbook).err().unwrap();
        assert!(matches!(err, RenderError::Unavailable(ref msg) if msg.contains("missing.ttf")));
    }

    #[test]
    fn test_missing_workbook_is_unavailable() {
        let renderer = PlottersRenderer::default();
        let err = renderer
            .open(Path::new("/definitely/not/here.xlsx"))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Unavailable(_)));
    }
}
