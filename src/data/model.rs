use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Column names of the OECD salary export
// ---------------------------------------------------------------------------

pub mod columns {
    pub const REF_AREA: &str = "REF_AREA";
    pub const REF_AREA_NAME: &str = "Reference area";
    pub const MEASURE: &str = "MEASURE";
    pub const UNIT_MEASURE: &str = "UNIT_MEASURE";
    pub const EDUCATION_LEV: &str = "EDUCATION_LEV";
    pub const PERS_TYPE: &str = "PERS_TYPE";
    pub const PERS_EXP_LEV: &str = "PERS_EXP_LEV";
    pub const OBS_VALUE: &str = "OBS_VALUE";
    pub const CURRENCY: &str = "CURRENCY";
    pub const REF_PERIOD: &str = "REF_PERIOD";

    /// Code columns and their human-readable twins, in export order.
    pub const RELEVANT: [&str; 18] = [
        REF_AREA,
        REF_AREA_NAME,
        MEASURE,
        "Measure",
        UNIT_MEASURE,
        "Unit of measure",
        EDUCATION_LEV,
        "Education level",
        PERS_TYPE,
        "Type of personnel",
        PERS_EXP_LEV,
        "Experience level",
        OBS_VALUE,
        "Observation value",
        CURRENCY,
        "Currency",
        REF_PERIOD,
        "Reference period",
    ];
}

// ---------------------------------------------------------------------------
// Cell – a single value in a frame column
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell. Loaded cells are `Text` or `Missing`;
/// `Number` only appears after numeric coercion or aggregation.
/// `Cell` keys `BTreeMap`s downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Cell::*;
        fn discriminant(v: &Cell) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Missing, Missing) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            Cell::Number(v) => write!(f, "{v:.2}"),
            Cell::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl Cell {
    /// Parse raw source text: empty fields are missing, everything else is
    /// kept as opaque text.
    pub fn from_raw(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// Interpret the cell as a finite `f64`, parsing text if needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Whether the cell's text equals `value`. Numbers compare through their
    /// display form so coerced columns still filter by their source literal.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Cell::Text(s) => s == value,
            Cell::Number(_) => self.to_string() == value,
            Cell::Missing => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame – the in-memory table
// ---------------------------------------------------------------------------

/// Column-named rows of cells. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Ordered column names.
    pub columns: Vec<String>,
    /// Row-major cells.
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Frame { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Index of a column, or `UnknownColumn`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReportError::UnknownColumn(name.to_string()))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Sorted set of the distinct non-missing values of a column.
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<Cell>> {
        Ok(self
            .column(name)?
            .into_iter()
            .filter(|c| !c.is_missing())
            .cloned()
            .collect())
    }

    /// Typed view of one row. Columns the frame lacks read as `None`.
    pub fn record(&self, row: usize) -> Option<ObservationRecord> {
        let cells = self.rows.get(row)?;
        let text = |name: &str| -> Option<String> {
            let idx = self.columns.iter().position(|c| c == name)?;
            match &cells[idx] {
                Cell::Missing => None,
                other => Some(other.to_string()),
            }
        };
        let obs_value = self
            .columns
            .iter()
            .position(|c| c == columns::OBS_VALUE)
            .and_then(|idx| cells[idx].as_f64());

        Some(ObservationRecord {
            ref_area: text(columns::REF_AREA),
            ref_area_name: text(columns::REF_AREA_NAME),
            measure: text(columns::MEASURE),
            unit_measure: text(columns::UNIT_MEASURE),
            education_lev: text(columns::EDUCATION_LEV),
            pers_type: text(columns::PERS_TYPE),
            pers_exp_lev: text(columns::PERS_EXP_LEV),
            obs_value,
            currency: text(columns::CURRENCY),
            ref_period: text(columns::REF_PERIOD),
        })
    }

    /// Build a frame from typed records, with one column per record field.
    #[cfg(test)]
    pub fn from_records(records: &[ObservationRecord]) -> Self {
        let columns = ObservationRecord::COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = records.iter().map(ObservationRecord::to_cells).collect();
        Frame { columns, rows }
    }
}

// ---------------------------------------------------------------------------
// ObservationRecord – one salary observation
// ---------------------------------------------------------------------------

/// One row of the salary dataset, viewed through its code columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRecord {
    pub ref_area: Option<String>,
    pub ref_area_name: Option<String>,
    pub measure: Option<String>,
    pub unit_measure: Option<String>,
    pub education_lev: Option<String>,
    pub pers_type: Option<String>,
    pub pers_exp_lev: Option<String>,
    pub obs_value: Option<f64>,
    pub currency: Option<String>,
    pub ref_period: Option<String>,
}

impl ObservationRecord {
    /// Column order used by [`Frame::from_records`].
    #[cfg(test)]
    pub const COLUMNS: [&'static str; 10] = [
        columns::REF_AREA,
        columns::REF_AREA_NAME,
        columns::MEASURE,
        columns::UNIT_MEASURE,
        columns::EDUCATION_LEV,
        columns::PERS_TYPE,
        columns::PERS_EXP_LEV,
        columns::OBS_VALUE,
        columns::CURRENCY,
        columns::REF_PERIOD,
    ];

    #[cfg(test)]
    fn to_cells(&self) -> Vec<Cell> {
        let text = |v: &Option<String>| v.as_deref().map_or(Cell::Missing, Cell::from_raw);
        vec![
            text(&self.ref_area),
            text(&self.ref_area_name),
            text(&self.measure),
            text(&self.unit_measure),
            text(&self.education_lev),
            text(&self.pers_type),
            text(&self.pers_exp_lev),
            self.obs_value.map_or(Cell::Missing, Cell::Number),
            text(&self.currency),
            text(&self.ref_period),
        ]
    }
}

impl fmt::Display for ObservationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} ({}) {} {} {} {} = {} {} [{}]",
            s(&self.ref_area_name),
            s(&self.ref_area),
            s(&self.unit_measure),
            s(&self.pers_type),
            s(&self.education_lev),
            s(&self.pers_exp_lev),
            self.obs_value
                .map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
            s(&self.currency),
            s(&self.ref_period),
        )
    }
}
