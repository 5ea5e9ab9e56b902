use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use super::model::{Column, Series, WideTable};

// ---------------------------------------------------------------------------
// Alignment strategy
// ---------------------------------------------------------------------------

/// How several tables are put on one independent axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Outer join on equal independent values; axis sorted ascending.
    #[default]
    Join,
    /// First table's axis, later columns matched by row position.
    Positional,
}

/// Axis value with a total order; repeated values are told apart by their
/// occurrence count inside one table.
#[derive(Debug, Clone, Copy)]
struct AxisKey {
    value: f64,
    occurrence: usize,
}

impl AxisKey {
    fn new(value: f64, occurrence: usize) -> Self {
        // -0.0 and 0.0 join.
        let value = if value == 0.0 { 0.0 } else { value };
        AxisKey { value, occurrence }
    }
}

impl PartialEq for AxisKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AxisKey {}

impl PartialOrd for AxisKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AxisKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(self.occurrence.cmp(&other.occurrence))
    }
}

/// Keys for every row of an axis, numbering repeats 0, 1, 2, ...
fn axis_keys(axis: &[f64]) -> Vec<AxisKey> {
    let mut seen: HashMap<u64, usize> = HashMap::new();
    axis.iter()
        .map(|&v| {
            let key = AxisKey::new(v, 0);
            let count = seen.entry(key.value.to_bits()).or_insert(0);
            let key = AxisKey::new(v, *count);
            *count += 1;
            key
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge tables with the chosen alignment. Columns keep input order.
pub fn merge_tables(tables: Vec<WideTable>, alignment: Alignment) -> WideTable {
    match alignment {
        Alignment::Join => outer_join(tables),
        Alignment::Positional => positional(tables),
    }
}

/// Outer join on the independent value.
///
/// Every axis value from any table appears once (per occurrence); cells of
/// tables that lack a value stay unset.
pub fn outer_join(tables: Vec<WideTable>) -> WideTable {
    let Some(axis_name) = tables.first().map(|t| t.axis_name.clone()) else {
        return WideTable::default();
    };

    let keyed: Vec<Vec<AxisKey>> = tables.iter().map(|t| axis_keys(&t.axis)).collect();

    let mut rows: BTreeMap<AxisKey, usize> = keyed
        .iter()
        .flatten()
        .map(|k| (*k, 0))
        .collect();
    for (i, slot) in rows.values_mut().enumerate() {
        *slot = i;
    }

    let mut merged = WideTable::new(axis_name);
    merged.axis = rows.keys().map(|k| k.value).collect();

    for (table, keys) in tables.into_iter().zip(keyed) {
        for column in table.columns {
            let mut values = vec![None; merged.axis.len()];
            for (key, value) in keys.iter().zip(column.values) {
                values[rows[key]] = value;
            }
            merged.columns.push(Column {
                name: column.name,
                values,
            });
        }
    }
    merged
}

/// Align by row position on the first table's axis; longer columns are
/// truncated and shorter ones padded with unset cells.
pub fn positional(tables: Vec<WideTable>) -> WideTable {
    let mut iter = tables.into_iter();
    let Some(mut merged) = iter.next() else {
        return WideTable::default();
    };
    let n = merged.axis.len();
    for column in &mut merged.columns {
        column.values.resize(n, None);
    }
    for table in iter {
        for mut column in table.columns {
            column.values.resize(n, None);
            merged.columns.push(column);
        }
    }
    merged
}

/// One column per series, named after the series.
pub fn series_table(series: &[Series], axis_name: &str, alignment: Alignment) -> WideTable {
    let tables = series
        .iter()
        .map(|s| WideTable {
            axis_name: axis_name.to_string(),
            axis: s.x.clone(),
            columns: vec![Column {
                name: s.name.clone(),
                values: s.y.iter().copied().map(Some).collect(),
            }],
        })
        .collect();
    merge_tables(tables, alignment)
}
