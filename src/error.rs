use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the frame operations, chart renderers and document
/// composers. Orchestration code wraps these in `anyhow` with stage context.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("missing expected columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column '{0}' not present in the table")]
    UnknownColumn(String),

    #[error("nothing to plot for chart '{0}'")]
    EmptyChart(String),

    #[error("{kind} charts cannot be written as {format}")]
    UnsupportedChart { kind: String, format: String },

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
