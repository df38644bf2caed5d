use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};

use super::model::{Cell, Frame};
use crate::config::ColumnPolicy;
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Keep the desired columns that exist, in desired order.
///
/// Under [`ColumnPolicy::Lenient`] absent columns are logged and skipped;
/// under [`ColumnPolicy::Strict`] they are an error.
pub fn project(frame: &Frame, desired: &[&str], policy: ColumnPolicy) -> Result<Frame> {
    let (present, missing): (Vec<&str>, Vec<&str>) =
        desired.iter().copied().partition(|c| frame.has_column(c));

    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
        match policy {
            ColumnPolicy::Strict => return Err(ReportError::MissingColumns(missing)),
            ColumnPolicy::Lenient => warn!(
                "Some columns not found: {}; using the {} available",
                missing.join(", "),
                present.len()
            ),
        }
    }

    let indices: Vec<usize> = present
        .iter()
        .map(|c| frame.column_index(c))
        .collect::<Result<_>>()?;

    let rows = frame
        .rows
        .iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();

    Ok(Frame::new(
        present.iter().map(|c| c.to_string()).collect(),
        rows,
    ))
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Convert `column` to numbers and drop every row whose value does not
/// parse. Retained rows hold `Cell::Number` in that column.
pub fn coerce_numeric(frame: &Frame, column: &str) -> Result<Frame> {
    let idx = frame.column_index(column)?;

    let rows: Vec<Vec<Cell>> = frame
        .rows
        .iter()
        .filter_map(|row| {
            let value = row[idx].as_f64()?;
            let mut row = row.clone();
            row[idx] = Cell::Number(value);
            Some(row)
        })
        .collect();

    let dropped = frame.len() - rows.len();
    if dropped > 0 {
        info!("Dropped {dropped} rows with non-numeric {column}");
    }

    Ok(Frame::new(frame.columns.clone(), rows))
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// Rows whose `column` equals `value`.
pub fn filter_eq(frame: &Frame, column: &str, value: &str) -> Result<Frame> {
    let idx = frame.column_index(column)?;
    Ok(retain(frame, |row| row[idx].matches(value)))
}

/// Rows whose `column` is one of `values`.
pub fn filter_in<S: AsRef<str>>(frame: &Frame, column: &str, values: &[S]) -> Result<Frame> {
    let idx = frame.column_index(column)?;
    let wanted: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
    Ok(retain(frame, |row| {
        wanted.iter().any(|v| row[idx].matches(v))
    }))
}

fn retain(frame: &Frame, keep: impl Fn(&[Cell]) -> bool) -> Frame {
    let rows = frame
        .rows
        .iter()
        .filter(|row| keep(row.as_slice()))
        .cloned()
        .collect();
    Frame::new(frame.columns.clone(), rows)
}

// ---------------------------------------------------------------------------
// Derived columns
// ---------------------------------------------------------------------------

/// Append `target`, the label of each row's `source` code. Codes without a
/// label map to `Cell::Missing`. An existing `target` column is replaced.
pub fn map_column(
    frame: &Frame,
    source: &str,
    target: &str,
    mapping: &BTreeMap<&str, &str>,
) -> Result<Frame> {
    let src = frame.column_index(source)?;
    let existing = frame.column_index(target).ok();

    let label = |cell: &Cell| -> Cell {
        cell.as_text()
            .and_then(|code| mapping.get(code))
            .map_or(Cell::Missing, |l| Cell::from(*l))
    };

    let mut columns = frame.columns.clone();
    if existing.is_none() {
        columns.push(target.to_string());
    }

    let rows = frame
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            let value = label(&row[src]);
            match existing {
                Some(i) => row[i] = value,
                None => row.push(value),
            }
            row
        })
        .collect();

    Ok(Frame::new(columns, rows))
}
