use log::info;

use super::model::{Column, RawTable, Series, WideTable};
use crate::error::PipelineError;

/// Fixed divisor turning the simulator's frequency field into a per-60 Hz
/// cycle index.
pub const AXIS_DIVISOR: f64 = 60.0;

/// Name given to the independent column of merged overlay tables.
pub const TIME_COLUMN: &str = "Time";

/// Parse one token as a number. `NaN` counts as missing.
pub fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| !v.is_nan())
}

// ---------------------------------------------------------------------------
// Single-series normalization (frequency scans)
// ---------------------------------------------------------------------------

/// Extract `(independent / 60, dependent)` pairs from a headered table.
///
/// Rows whose width differs from the header, or where either field is not
/// numeric, are dropped. An empty file yields an empty series; a non-empty
/// file lacking either column is an error naming the file.
pub fn normalize_series(
    raw: &RawTable,
    independent: &str,
    dependent: &str,
) -> Result<Series, PipelineError> {
    let mut series = Series::new(raw.name.clone());
    if raw.header.is_none() && raw.rows.is_empty() {
        return Ok(series);
    }

    let missing = |column: &str| PipelineError::MissingColumn {
        file: raw.name.clone(),
        column: column.to_string(),
    };
    let x_idx = raw.column_index(independent).ok_or_else(|| missing(independent))?;
    let y_idx = raw.column_index(dependent).ok_or_else(|| missing(dependent))?;

    let width = raw.width();
    for row in raw.rows.iter().filter(|row| row.len() == width) {
        let x = row.get(x_idx).and_then(|t| parse_number(t));
        let y = row.get(y_idx).and_then(|t| parse_number(t));
        if let (Some(x), Some(y)) = (x, y) {
            series.push(x / AXIS_DIVISOR, y);
        }
    }

    info!(
        "{}: kept {} of {} rows",
        raw.name,
        series.len(),
        raw.rows.len()
    );
    Ok(series)
}

// ---------------------------------------------------------------------------
// Multi-column normalization (overlays)
// ---------------------------------------------------------------------------

/// Turn a table into a [`WideTable`] keyed on its first column.
///
/// `names` labels the dependent columns (columns `1..`); for headered tables
/// pass the header tail. Rows whose first token is not numeric are dropped;
/// missing or non-numeric dependent cells stay unset.
pub fn normalize_columns(raw: &RawTable, names: &[String]) -> WideTable {
    let mut table = WideTable::new(TIME_COLUMN);
    table.columns = names
        .iter()
        .map(|name| Column {
            name: name.clone(),
            values: Vec::new(),
        })
        .collect();

    for row in &raw.rows {
        let Some(axis) = row.first().and_then(|t| parse_number(t)) else {
            continue;
        };
        table.axis.push(axis / AXIS_DIVISOR);
        for (i, column) in table.columns.iter_mut().enumerate() {
            column
                .values
                .push(row.get(i + 1).and_then(|t| parse_number(t)));
        }
    }

    info!(
        "{}: kept {} of {} rows, {} columns",
        raw.name,
        table.len(),
        raw.rows.len(),
        table.columns.len()
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse_table, HeaderMode};
    use proptest::prelude::*;

    const SCAN: &str = "F(Hz) |Z+|(ohms) Phase\n\
                        60 1.0 0\n\
                        120 abc 0\n\
                        180 3.5 0\n\
                        nan 2.0 0\n\
                        240\n\
                        300 4.25 0\n";

    #[test]
    fn test_normalize_series_divides_and_drops() {
        let raw = parse_table("scan", SCAN, HeaderMode::Header);
        let series = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
        assert_eq!(series.name, "scan");
        assert_eq!(series.x, vec![1.0, 3.0, 5.0]);
        assert_eq!(series.y, vec![1.0, 3.5, 4.25]);
    }

    #[test]
    fn test_normalize_series_drops_ragged_rows() {
        let raw = parse_table(
            "scan",
            "F(Hz) |Z+|(ohms)\n60 1.0 junk\n120 2.0\n180\n",
            HeaderMode::Header,
        );
        let series = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
        assert_eq!(series.x, vec![2.0]);
        assert_eq!(series.y, vec![2.0]);
    }

    #[test]
    fn test_normalize_series_missing_column() {
        let raw = parse_table("scan", "Time Ia\n0 1\n", HeaderMode::Header);
        let err = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref column, .. } if column == "F(Hz)"));
    }

    #[test]
    fn test_normalize_empty_file() {
        let raw = parse_table("empty", "", HeaderMode::Header);
        let series = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = parse_table("scan", SCAN, HeaderMode::Header);
        let a = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
        let b = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
        let bits = |s: &Series| -> Vec<(u64, u64)> {
            s.points().map(|(x, y)| (x.to_bits(), y.to_bits())).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_normalize_columns_keeps_unset_cells() {
        let raw = parse_table("t", "60 1 x\n120 2\nbad 3 3\n", HeaderMode::Headerless);
        let names = vec!["Ia".to_string(), "Ib".to_string()];
        let table = normalize_columns(&raw, &names);
        assert_eq!(table.axis, vec![1.0, 2.0]);
        assert_eq!(table.columns[0].values, vec![Some(1.0), Some(2.0)]);
        assert_eq!(table.columns[1].values, vec![None, None]);
    }

    proptest! {
        #[test]
        fn prop_rows_never_increase(rows in proptest::collection::vec(
            (prop_oneof![(-1e6f64..1e6).prop_map(|v| v.to_string()), Just("x".to_string())],
             prop_oneof![(-1e6f64..1e6).prop_map(|v| v.to_string()), Just("--".to_string())]),
            0..50,
        )) {
            let mut text = String::from("F(Hz) |Z+|(ohms)\n");
            for (f, z) in &rows {
                text.push_str(&format!("{f} {z}\n"));
            }
            let raw = parse_table("p", &text, HeaderMode::Header);
            let series = normalize_series(&raw, "F(Hz)", "|Z+|(ohms)").unwrap();
            prop_assert!(series.len() <= rows.len());

            let valid: Vec<(f64, f64)> = rows
                .iter()
                .filter_map(|(f, z)| Some((f.parse::<f64>().ok()?, z.parse::<f64>().ok()?)))
                .collect();
            prop_assert_eq!(series.len(), valid.len());
            for ((x, y), (f, z)) in series.points().zip(valid) {
                prop_assert_eq!(x, f / AXIS_DIVISOR);
                prop_assert_eq!(y, z);
            }
        }
    }
}
