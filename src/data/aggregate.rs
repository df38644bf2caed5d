use std::collections::BTreeMap;

use super::model::{Cell, Frame};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Grouped means
// ---------------------------------------------------------------------------

/// One row per distinct key tuple holding the mean of `value`.
///
/// Output columns are `keys` followed by `value`; rows are ordered by key
/// tuple. Rows with a missing key or a non-numeric value do not contribute.
pub fn group_mean(frame: &Frame, keys: &[&str], value: &str) -> Result<Frame> {
    let key_idx: Vec<usize> = keys
        .iter()
        .map(|k| frame.column_index(k))
        .collect::<Result<_>>()?;
    let value_idx = frame.column_index(value)?;

    let mut groups: BTreeMap<Vec<Cell>, (f64, usize)> = BTreeMap::new();
    for row in &frame.rows {
        let key: Vec<Cell> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Cell::is_missing) {
            continue;
        }
        let Some(v) = row[value_idx].as_f64() else {
            continue;
        };
        let acc = groups.entry(key).or_insert((0.0, 0));
        acc.0 += v;
        acc.1 += 1;
    }

    let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    columns.push(value.to_string());

    let rows = groups
        .into_iter()
        .map(|(mut key, (sum, count))| {
            key.push(Cell::Number(sum / count as f64));
            key
        })
        .collect();

    Ok(Frame::new(columns, rows))
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Stable sort on `column`, then keep the first `n` rows.
pub fn top_n(frame: &Frame, column: &str, n: usize, descending: bool) -> Result<Frame> {
    let idx = frame.column_index(column)?;
    let mut rows = frame.rows.clone();
    if descending {
        rows.sort_by(|a, b| b[idx].cmp(&a[idx]));
    } else {
        rows.sort_by(|a, b| a[idx].cmp(&b[idx]));
    }
    rows.truncate(n);
    Ok(Frame::new(frame.columns.clone(), rows))
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// A dense row × column grid of optional values.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `values[row][column]`, `None` where the source had no observation.
    pub values: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    /// Keep only rows with a value in every column.
    pub fn complete_rows(&self) -> PivotTable {
        let (row_labels, values) = self
            .row_labels
            .iter()
            .zip(&self.values)
            .filter(|(_, cells)| cells.iter().all(Option::is_some))
            .map(|(label, cells)| (label.clone(), cells.clone()))
            .unzip();
        PivotTable {
            row_labels,
            column_labels: self.column_labels.clone(),
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.column_labels.is_empty()
    }
}

/// Spread `value` into a grid keyed by `row_key` (sorted) and `column_key`
/// (in `column_order`). Column-key values outside `column_order` are ignored;
/// duplicate cells are averaged.
pub fn pivot(
    frame: &Frame,
    row_key: &str,
    column_key: &str,
    value: &str,
    column_order: &[&str],
) -> Result<PivotTable> {
    let means = group_mean(frame, &[row_key, column_key], value)?;

    let mut grid: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for row in &means.rows {
        let Some(col) = column_order.iter().position(|c| row[1].matches(c)) else {
            continue;
        };
        let cells = grid
            .entry(row[0].to_string())
            .or_insert_with(|| vec![None; column_order.len()]);
        cells[col] = row[2].as_f64();
    }

    let (row_labels, values) = grid.into_iter().unzip();
    Ok(PivotTable {
        row_labels,
        column_labels: column_order.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn salaries() -> Frame {
        let rows = [
            ("Norway", "Primary", 50000.0),
            ("Norway", "Primary", 54000.0),
            ("Norway", "Upper secondary", 60000.0),
            ("Chile", "Primary", 30000.0),
            ("Austria", "Primary", 45000.0),
            ("Austria", "Upper secondary", 49000.0),
        ];
        Frame::new(
            vec![
                "Reference area".to_string(),
                "Education Level".to_string(),
                "OBS_VALUE".to_string(),
            ],
            rows.iter()
                .map(|(c, e, v)| vec![Cell::from(*c), Cell::from(*e), Cell::Number(*v)])
                .collect(),
        )
    }

    #[test]
    fn test_group_mean_one_row_per_key_tuple() {
        let frame = salaries();
        let means = group_mean(&frame, &["Reference area", "Education Level"], "OBS_VALUE")
            .unwrap();

        let distinct: BTreeSet<(String, String)> = frame
            .rows
            .iter()
            .map(|r| (r[0].to_string(), r[1].to_string()))
            .collect();
        assert_eq!(means.len(), distinct.len());
        assert_eq!(
            means.columns,
            vec!["Reference area", "Education Level", "OBS_VALUE"]
        );

        // Ordered by key tuple.
        assert_eq!(means.rows[0][0], Cell::from("Austria"));
        let norway_primary = means
            .rows
            .iter()
            .find(|r| r[0].matches("Norway") && r[1].matches("Primary"))
            .unwrap();
        assert_eq!(norway_primary[2], Cell::Number(52000.0));
    }

    #[test]
    fn test_group_mean_skips_missing_keys() {
        let mut frame = salaries();
        frame.rows[0][0] = Cell::Missing;
        let means = group_mean(&frame, &["Reference area"], "OBS_VALUE").unwrap();
        assert_eq!(means.len(), 3);
        let norway = means.rows.iter().find(|r| r[0].matches("Norway")).unwrap();
        assert_eq!(norway[1], Cell::Number(57000.0));
    }

    #[test]
    fn test_top_n_descending() {
        let frame = salaries();
        for n in [0, 3, 10] {
            let top = top_n(&frame, "OBS_VALUE", n, true).unwrap();
            assert_eq!(top.len(), n.min(frame.len()));
            let values: Vec<f64> = top
                .column("OBS_VALUE")
                .unwrap()
                .iter()
                .filter_map(|c| c.as_f64())
                .collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_top_n_is_stable() {
        let frame = Frame::new(
            vec!["name".to_string(), "v".to_string()],
            vec![
                vec![Cell::from("first"), Cell::Number(1.0)],
                vec![Cell::from("second"), Cell::Number(1.0)],
                vec![Cell::from("third"), Cell::Number(2.0)],
            ],
        );
        let asc = top_n(&frame, "v", 3, false).unwrap();
        assert_eq!(asc.rows[0][0], Cell::from("first"));
        assert_eq!(asc.rows[1][0], Cell::from("second"));
        let desc = top_n(&frame, "v", 3, true).unwrap();
        assert_eq!(desc.rows[1][0], Cell::from("first"));
        assert_eq!(desc.rows[2][0], Cell::from("second"));
    }

    #[test]
    fn test_pivot_and_complete_rows() {
        let table = pivot(
            &salaries(),
            "Reference area",
            "Education Level",
            "OBS_VALUE",
            &["Primary", "Upper secondary"],
        )
        .unwrap();

        assert_eq!(table.row_labels, vec!["Austria", "Chile", "Norway"]);
        assert_eq!(table.values[1], vec![Some(30000.0), None]);
        assert_eq!(table.values[2], vec![Some(52000.0), Some(60000.0)]);

        let complete = table.complete_rows();
        assert_eq!(complete.row_labels, vec!["Austria", "Norway"]);
        assert!(!complete.is_empty());
    }
}
