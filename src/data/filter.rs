use log::warn;

use super::model::WideTable;

/// Number of columns shown when the caller selects none.
pub const DEFAULT_SELECTION: usize = 3;

// ---------------------------------------------------------------------------
// Column selection for overlay reports
// ---------------------------------------------------------------------------

/// Resolve which dependent columns go into an overlay report.
///
/// * No selection → the first [`DEFAULT_SELECTION`] columns.
/// * Otherwise the requested names in the requested order; unknown names are
///   warned about and skipped, duplicates are kept once.
pub fn select_columns(table: &WideTable, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return table
            .columns
            .iter()
            .take(DEFAULT_SELECTION)
            .map(|c| c.name.clone())
            .collect();
    }

    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if table.column(name).is_none() {
            warn!("column '{name}' not found, skipping");
            continue;
        }
        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }
    selected
}

/// Keep only the selected columns, in selection order.
pub fn project(table: &WideTable, selected: &[String]) -> WideTable {
    WideTable {
        axis_name: table.axis_name.clone(),
        axis: table.axis.clone(),
        columns: selected
            .iter()
            .filter_map(|name| table.column(name).cloned())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table(names: &[&str]) -> WideTable {
        WideTable {
            axis_name: "Time".into(),
            axis: vec![0.0, 1.0],
            columns: names
                .iter()
                .map(|n| Column {
                    name: n.to_string(),
                    values: vec![Some(1.0), None],
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_selection_takes_first_three() {
        let t = table(&["a", "b", "c", "d"]);
        assert_eq!(select_columns(&t, &[]), vec!["a", "b", "c"]);
        let small = table(&["a"]);
        assert_eq!(select_columns(&small, &[]), vec!["a"]);
    }

    #[test]
    fn test_explicit_selection_skips_unknown() {
        let t = table(&["a", "b", "c"]);
        let req: Vec<String> = ["c", "zz", "a", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(select_columns(&t, &req), vec!["c", "a"]);
    }

    #[test]
    fn test_project_orders_columns() {
        let t = table(&["a", "b", "c"]);
        let p = project(&t, &["c".to_string(), "a".to_string()]);
        assert_eq!(p.column_names(), vec!["c", "a"]);
        assert_eq!(p.axis, t.axis);
    }
}
