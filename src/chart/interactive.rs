use std::path::Path;

use plotly::common::{Marker, Mode, Orientation as PlotlyOrientation};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, BoxPlot, Plot, Scatter};

use super::{ChartData, ChartKind, ChartSpec, ChartStyle, Orientation};
use crate::color::{css, palette};
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Interactive chart (plotly): standalone HTML page
// ---------------------------------------------------------------------------

/// Build the plotly figure for `spec`. Heatmaps are static-only.
pub fn build_plot(spec: &ChartSpec, style: &ChartStyle) -> Result<Plot> {
    let mut plot = Plot::new();
    let mut show_legend = true;

    match &spec.data {
        ChartData::Bars {
            labels,
            values,
            orientation,
        } => {
            show_legend = false;
            let colors: Vec<String> = palette(style.palette, labels.len()).iter().map(css).collect();
            match orientation {
                Orientation::Vertical => plot.add_trace(
                    Bar::new(labels.clone(), values.clone())
                        .marker(Marker::new().color_array(colors)),
                ),
                // plotly stacks categories bottom-up; reverse so the first is on top.
                Orientation::Horizontal => plot.add_trace(
                    Bar::new(
                        values.iter().rev().copied().collect::<Vec<f64>>(),
                        labels.iter().rev().cloned().collect::<Vec<String>>(),
                    )
                    .orientation(PlotlyOrientation::Horizontal)
                    .marker(Marker::new().color_array(colors.into_iter().rev().collect::<Vec<String>>())),
                ),
            }
        }
        ChartData::Lines { categories, series } => {
            let colors = palette(style.palette, series.len());
            for (s, color) in series.iter().zip(&colors) {
                let (x, y): (Vec<String>, Vec<f64>) = categories
                    .iter()
                    .zip(&s.values)
                    .filter_map(|(c, v)| v.map(|v| (c.clone(), v)))
                    .unzip();
                plot.add_trace(
                    Scatter::new(x, y)
                        .name(s.name.as_str())
                        .mode(Mode::LinesMarkers)
                        .marker(Marker::new().color(css(color))),
                );
            }
        }
        ChartData::Boxes { groups } => {
            show_legend = false;
            let colors = palette(style.palette, groups.len());
            for ((name, values), color) in groups.iter().zip(&colors) {
                plot.add_trace(
                    BoxPlot::new(values.clone())
                        .name(name.as_str())
                        .marker(Marker::new().color(css(color))),
                );
            }
        }
        ChartData::Heatmap(_) => {
            return Err(ReportError::UnsupportedChart {
                kind: ChartKind::Heatmap.to_string(),
                format: "interactive HTML".to_string(),
            })
        }
    }

    plot.set_layout(
        Layout::new()
            .title(spec.title.as_str())
            .show_legend(show_legend)
            .height(600)
            .width(1000)
            .x_axis(Axis::new().title(spec.x_label.as_str()))
            .y_axis(Axis::new().title(spec.y_label.as_str())),
    );

    Ok(plot)
}

/// Write `spec` as a self-contained HTML page.
pub fn render(spec: &ChartSpec, style: &ChartStyle, path: &Path) -> Result<()> {
    let plot = build_plot(spec, style)?;
    std::fs::write(path, plot.to_html())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render_chart;
    use crate::data::aggregate::PivotTable;

    fn distribution() -> ChartSpec {
        ChartSpec {
            title: "Distribution of Teacher Salaries by Country".to_string(),
            x_label: "Country".to_string(),
            y_label: "Salary (USD PPP)".to_string(),
            data: ChartData::Boxes {
                groups: vec![
                    ("Luxembourg".to_string(), vec![80000.0, 95000.0, 120000.0]),
                    ("Germany".to_string(), vec![70000.0, 85000.0]),
                ],
            },
        }
    }

    #[test]
    fn test_box_chart_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salary_distribution.html");
        render_chart(&distribution(), &ChartStyle::default(), &path).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Distribution of Teacher Salaries by Country"));
        assert!(html.contains("Luxembourg"));
        assert!(html.contains("Germany"));
    }

    #[test]
    fn test_heatmap_is_static_only() {
        let spec = ChartSpec {
            data: ChartData::Heatmap(PivotTable {
                row_labels: vec!["Chile".to_string()],
                column_labels: vec!["Primary".to_string()],
                values: vec![vec![Some(30000.0)]],
            }),
            ..distribution()
        };
        assert!(matches!(
            build_plot(&spec, &ChartStyle::default()),
            Err(ReportError::UnsupportedChart { .. })
        ));
    }
}
