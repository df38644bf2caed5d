use std::path::Path;

use log::{debug, info};

use super::model::{Cell, Frame};
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a delimited text file into a [`Frame`].
///
/// The first record is the header. Every field loads as opaque text, empty
/// fields load as [`Cell::Missing`]. Ragged rows are a read error.
pub fn load_delimited(path: &Path, delimiter: u8) -> Result<Frame> {
    let file_err = |source: csv::Error| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_path(path)
        .map_err(file_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(file_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(file_err)?;
        rows.push(record.iter().map(Cell::from_raw).collect::<Vec<_>>());
    }

    info!(
        "Loaded {} with shape ({}, {})",
        path.display(),
        rows.len(),
        columns.len()
    );
    debug!("Columns: {}", columns.join(", "));

    Ok(Frame::new(columns, rows))
}
