//! Chart descriptions and rendering.
//!
//! A [`ChartSpec`] is backend-neutral: the analysis layer fills it in, and
//! [`render_chart`] picks a backend from the output file extension:
//! `.png`/`.svg` are drawn with plotters, `.html` with plotly.

pub mod interactive;
pub mod static_plot;

use std::fmt;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::aggregate::PivotTable;
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Which colour sequence series and bars are drawn with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Viridis,
    Hue,
}

/// Appearance settings passed to every render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Canvas width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_title_size")]
    pub title_size: u32,

    /// Axis descriptions; tick labels are drawn at three quarters of this.
    #[serde(default = "default_label_size")]
    pub label_size: u32,

    #[serde(default)]
    pub palette: PaletteKind,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            font_family: default_font_family(),
            title_size: default_title_size(),
            label_size: default_label_size(),
            palette: PaletteKind::default(),
        }
    }
}

fn default_width() -> u32 {
    1400
}

fn default_height() -> u32 {
    1000
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

fn default_title_size() -> u32 {
    32
}

fn default_label_size() -> u32 {
    24
}

impl ChartStyle {
    pub fn tick_size(&self) -> u32 {
        (self.label_size * 3 / 4).max(8)
    }
}

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Box,
    Heatmap,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Box => "box",
            ChartKind::Heatmap => "heatmap",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    /// Categories on the y axis, first category at the top.
    Horizontal,
}

/// One named line; `values` align with the chart's categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bars {
        labels: Vec<String>,
        values: Vec<f64>,
        orientation: Orientation,
    },
    Lines {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    /// Raw observations per group.
    Boxes { groups: Vec<(String, Vec<f64>)> },
    Heatmap(PivotTable),
}

/// What to draw, independent of the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self.data {
            ChartData::Bars { .. } => ChartKind::Bar,
            ChartData::Lines { .. } => ChartKind::Line,
            ChartData::Boxes { .. } => ChartKind::Box,
            ChartData::Heatmap(_) => ChartKind::Heatmap,
        }
    }

    /// Whether there is at least one finite value to draw.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            ChartData::Bars { values, .. } => !values.iter().any(|v| v.is_finite()),
            ChartData::Lines { categories, series } => {
                categories.is_empty()
                    || !series
                        .iter()
                        .flat_map(|s| s.values.iter())
                        .any(|v| v.is_some_and(f64::is_finite))
            }
            ChartData::Boxes { groups } => groups.iter().all(|(_, v)| v.is_empty()),
            ChartData::Heatmap(table) => {
                table.is_empty() || !table.values.iter().flatten().any(Option::is_some)
            }
        }
    }

    /// Smallest and largest finite value in the chart.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = match &self.data {
            ChartData::Bars { values, .. } => values.clone(),
            ChartData::Lines { series, .. } => series
                .iter()
                .flat_map(|s| s.values.iter().flatten().copied())
                .collect(),
            ChartData::Boxes { groups } => {
                groups.iter().flat_map(|(_, v)| v.iter().copied()).collect()
            }
            ChartData::Heatmap(table) => table.values.iter().flatten().flatten().copied().collect(),
        };
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

// ---------------------------------------------------------------------------
// Rendering entry-point
// ---------------------------------------------------------------------------

/// Draw `spec` to `path`. The extension selects the backend.
pub fn render_chart(spec: &ChartSpec, style: &ChartStyle, path: &Path) -> Result<()> {
    if spec.is_empty() {
        return Err(ReportError::EmptyChart(spec.title.clone()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" | "svg" => static_plot::render(spec, style, path)?,
        "html" | "htm" => interactive::render(spec, style, path)?,
        other => {
            return Err(ReportError::UnsupportedChart {
                kind: spec.kind().to_string(),
                format: format!(".{other}"),
            })
        }
    }

    info!("Saved {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Label helpers shared by both backends
// ---------------------------------------------------------------------------

/// Whole currency amount with thousands separators, e.g. `52,000`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let rounded = value.round().abs() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value.round() < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Label for a category axis position, or empty between categories.
pub fn category_label(labels: &[String], position: f64) -> String {
    let idx = position.round();
    if (position - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}
