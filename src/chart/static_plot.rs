use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;

use super::{category_label, format_amount, ChartData, ChartSpec, ChartStyle, Orientation, Series};
use crate::color::{palette, ColorScale};
use crate::data::aggregate::PivotTable;
use crate::error::{ReportError, Result};

/// Pixels to the right of a heatmap reserved for its colour scale.
const COLORBAR_WIDTH: u32 = 200;
const COLORBAR_STEPS: usize = 64;

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

// ---------------------------------------------------------------------------
// Static chart (plotters): PNG or SVG
// ---------------------------------------------------------------------------

/// Render `spec` as a raster PNG, or SVG when the path ends in `.svg`.
pub fn render(spec: &ChartSpec, style: &ChartStyle, path: &Path) -> Result<()> {
    let size = (style.width, style.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let outcome = if is_svg {
        draw(SVGBackend::new(path, size).into_drawing_area(), spec, style).map_err(|e| e.to_string())
    } else {
        draw(BitMapBackend::new(path, size).into_drawing_area(), spec, style)
            .map_err(|e| e.to_string())
    };
    outcome.map_err(|e| ReportError::Chart(format!("{}: {e}", path.display())))
}

fn draw<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, spec: &ChartSpec, style: &ChartStyle) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    match &spec.data {
        ChartData::Bars {
            labels,
            values,
            orientation: Orientation::Horizontal,
        } => horizontal_bars(&root, spec, style, labels, values)?,
        ChartData::Bars { labels, values, .. } => vertical_bars(&root, spec, style, labels, values)?,
        ChartData::Lines { categories, series } => lines(&root, spec, style, categories, series)?,
        ChartData::Boxes { groups } => boxes(&root, spec, style, groups)?,
        ChartData::Heatmap(table) => heatmap(&root, spec, style, table)?,
    }
    root.present()?;
    Ok(())
}

/// Axis span for `n` categories centred on 0..n-1.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Value axis from zero to a little above the largest value.
fn amount_range(spec: &ChartSpec) -> Range<f64> {
    let max = spec.value_bounds().map_or(1.0, |(_, hi)| hi.max(0.0));
    0.0..if max > 0.0 { max * 1.1 } else { 1.0 }
}

/// Value axis hugging the data with 10% padding.
fn padded_range(spec: &ChartSpec) -> Range<f64> {
    let (lo, hi) = spec.value_bounds().unwrap_or((0.0, 1.0));
    let pad = ((hi - lo) * 0.1).max(hi.abs() * 0.05).max(1.0);
    (lo - pad)..(hi + pad)
}

/// Pixel width to reserve for the longest category label.
fn label_area(labels: &[String], style: &ChartStyle) -> u32 {
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(4) as u32;
    (longest * style.tick_size() * 6 / 10 + 30).clamp(60, 420)
}

fn horizontal_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: &ChartStyle,
    labels: &[String],
    values: &[f64],
) -> DrawResult<DB> {
    let family = style.font_family.as_str();
    let n = labels.len();
    // First label at the top: position n-1 holds labels[0].
    let reversed: Vec<String> = labels.iter().rev().cloned().collect();
    let colors = palette(style.palette, n);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, (family, style.title_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(label_area(labels, style))
        .build_cartesian_2d(amount_range(spec), category_range(n))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y| category_label(&reversed, *y))
        .x_label_formatter(&|x| format_amount(*x))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((family, style.label_size))
        .label_style((family, style.tick_size()))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        let y = (n - 1 - i) as f64;
        Rectangle::new([(0.0, y - 0.4), (*v, y + 0.4)], colors[i].filled())
    }))?;

    Ok(())
}

fn vertical_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: &ChartStyle,
    labels: &[String],
    values: &[f64],
) -> DrawResult<DB> {
    let family = style.font_family.as_str();
    let n = labels.len();
    let colors = palette(style.palette, n);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, (family, style.title_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(110)
        .build_cartesian_2d(category_range(n), amount_range(spec))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(labels, *x))
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((family, style.label_size))
        .label_style((family, style.tick_size()))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], colors[i].filled())
    }))?;

    Ok(())
}

fn lines<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: &ChartStyle,
    categories: &[String],
    series: &[Series],
) -> DrawResult<DB> {
    let family = style.font_family.as_str();
    let colors = palette(style.palette, series.len());

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, (family, style.title_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(110)
        .build_cartesian_2d(category_range(categories.len()), padded_range(spec))?;

    chart
        .configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((family, style.label_size))
        .label_style((family, style.tick_size()))
        .draw()?;

    for (s, &color) in series.iter().zip(&colors) {
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
            .collect();
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(3)).point_size(5))?
            .label(s.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .label_font((family, style.tick_size()))
        .draw()?;

    Ok(())
}

fn boxes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: &ChartStyle,
    groups: &[(String, Vec<f64>)],
) -> DrawResult<DB> {
    let family = style.font_family.as_str();
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let colors = palette(style.palette, groups.len());
    let range = padded_range(spec);
    let y_range = range.start as f32..range.end as f32;

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, (family, style.title_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(110)
        .build_cartesian_2d(category_range(groups.len()), y_range)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len())
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_label_formatter(&|y| format_amount(*y as f64))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((family, style.label_size))
        .label_style((family, style.tick_size()))
        .draw()?;

    chart.draw_series(
        groups
            .iter()
            .enumerate()
            .filter(|(_, (_, values))| !values.is_empty())
            .map(|(i, (_, values))| {
                Boxplot::new_vertical(i as f64, &Quartiles::new(values.as_slice()))
                    .width(40)
                    .style(colors[i].stroke_width(2))
            }),
    )?;

    Ok(())
}

fn heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: &ChartStyle,
    table: &PivotTable,
) -> DrawResult<DB> {
    let family = style.font_family.as_str();
    let rows = table.row_labels.len();
    let cols = table.column_labels.len();
    // First row at the top.
    let reversed_rows: Vec<String> = table.row_labels.iter().rev().cloned().collect();
    let scale = ColorScale::spanning(table.values.iter().flatten().flatten());

    let (width, _) = root.dim_in_pixel();
    let (plot_area, bar_area) = root.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&spec.title, (family, style.title_size))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(label_area(&table.row_labels, style))
        .build_cartesian_2d(category_range(cols), category_range(rows))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&|x| category_label(&table.column_labels, *x))
        .y_label_formatter(&|y| category_label(&reversed_rows, *y))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((family, style.label_size))
        .label_style((family, style.tick_size()))
        .draw()?;

    let cells: Vec<(f64, f64, f64)> = table
        .values
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            let y = (rows - 1 - r) as f64;
            row.iter()
                .enumerate()
                .filter_map(move |(c, v)| v.map(|v| (c as f64, y, v)))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        Rectangle::new(
            [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
            scale.color_for(v).filled(),
        )
    }))?;

    let annotation = (family, style.tick_size())
        .into_font()
        .style(FontStyle::Bold);
    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        let text_style = annotation
            .color(&scale.text_color_for(v))
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(format!("{v:.0}"), (x, y), text_style)
    }))?;

    colorbar(&bar_area, style, &scale)
}

/// Vertical viridis strip with the scale's minimum at the bottom and
/// maximum at the top.
fn colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    style: &ChartStyle,
    scale: &ColorScale,
) -> DrawResult<DB> {
    let (min, max) = scale.bounds();
    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let step = (hi - lo) / COLORBAR_STEPS as f64;

    // Align with the plot area under the caption and above the x labels.
    let mut bar = ChartBuilder::on(area)
        .margin_top(style.title_size + 40)
        .margin_bottom(90)
        .margin_left(10)
        .margin_right(10)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let from = lo + step * i as f64;
        let to = from + step;
        Rectangle::new(
            [(0.0, from), (0.3, to)],
            scale.color_for((from + to) / 2.0).filled(),
        )
    }))?;
    bar.draw_series(std::iter::once(Rectangle::new(
        [(0.0, lo), (0.3, hi)],
        BLACK.stroke_width(1),
    )))?;

    let label = (style.font_family.as_str(), style.tick_size())
        .into_font()
        .color(&BLACK);
    bar.draw_series([(hi, VPos::Top, max), (lo, VPos::Bottom, min)].into_iter().map(
        |(y, v_pos, value)| {
            Text::new(
                format_amount(value),
                (0.38, y),
                label.pos(Pos::new(HPos::Left, v_pos)),
            )
        },
    ))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use image::GenericImageView;

    use super::*;

    fn spec(data: ChartData) -> ChartSpec {
        ChartSpec {
            title: "Teacher Salaries".to_string(),
            x_label: "Category".to_string(),
            y_label: "Salary (USD PPP)".to_string(),
            data,
        }
    }

    /// Render `data` to `<name>.svg` and return the SVG text.
    fn render_svg(dir: &tempfile::TempDir, name: &str, data: ChartData) -> String {
        let path = dir.path().join(format!("{name}.svg"));
        render(&spec(data), &ChartStyle::default(), &path).unwrap();
        assert!(path.is_file());
        std::fs::read_to_string(&path).unwrap()
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{prefix} {i:02}")).collect()
    }

    #[test]
    fn test_horizontal_bars_label_every_country() {
        let dir = tempfile::tempdir().unwrap();
        let labels = names("Country", 20);
        let values = (0..20).map(|i| 80000.0 - 2500.0 * i as f64).collect();
        let svg = render_svg(
            &dir,
            "ranking",
            ChartData::Bars {
                labels: labels.clone(),
                values,
                orientation: Orientation::Horizontal,
            },
        );
        for label in &labels {
            assert!(svg.contains(label.as_str()), "missing {label}");
        }
        assert!(svg.contains("Teacher Salaries"));
    }

    #[test]
    fn test_vertical_bars() {
        let dir = tempfile::tempdir().unwrap();
        let labels = vec![
            "Pre-primary".to_string(),
            "Primary".to_string(),
            "Lower secondary".to_string(),
            "Upper secondary".to_string(),
        ];
        let svg = render_svg(
            &dir,
            "education",
            ChartData::Bars {
                labels: labels.clone(),
                values: vec![41000.0, 44000.0, 47000.0, 51000.0],
                orientation: Orientation::Vertical,
            },
        );
        for label in &labels {
            assert!(svg.contains(label.as_str()), "missing {label}");
        }
    }

    #[test]
    fn test_lines_with_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let categories = vec![
            "Starting".to_string(),
            "10 Years".to_string(),
            "15 Years".to_string(),
            "Maximum".to_string(),
        ];
        let series = vec![
            Series {
                name: "Luxembourg".to_string(),
                values: vec![Some(70000.0), Some(90000.0), Some(98000.0), Some(125000.0)],
            },
            Series {
                name: "Chile".to_string(),
                values: vec![Some(22000.0), None, Some(30000.0), Some(40000.0)],
            },
            Series {
                name: "Nowhere".to_string(),
                values: vec![None; 4],
            },
        ];
        let data = ChartData::Lines {
            categories: categories.clone(),
            series,
        };
        let svg = render_svg(&dir, "experience", data);
        for label in categories.iter().map(String::as_str).chain(["Luxembourg", "Chile"]) {
            assert!(svg.contains(label), "missing {label}");
        }
        // Series without any point get no legend entry.
        assert!(!svg.contains("Nowhere"));
    }

    #[test]
    fn test_boxes_tolerate_empty_group() {
        let dir = tempfile::tempdir().unwrap();
        let groups = vec![
            ("Germany".to_string(), vec![62000.0, 70000.0, 75000.0, 88000.0]),
            ("Korea".to_string(), Vec::new()),
            ("France".to_string(), vec![33000.0, 41000.0, 45000.0, 52000.0]),
        ];
        let svg = render_svg(&dir, "distribution", ChartData::Boxes { groups });
        for label in ["Germany", "Korea", "France"] {
            assert!(svg.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_heatmap_has_labels_and_colour_scale() {
        let dir = tempfile::tempdir().unwrap();
        let row_labels = names("Country", 12);
        let column_labels = vec![
            "Pre-primary".to_string(),
            "Primary".to_string(),
            "Lower secondary".to_string(),
            "Upper secondary".to_string(),
        ];
        let values = (0..12)
            .map(|r| {
                (0..4)
                    .map(|c| Some(30000.0 + 4000.0 * r as f64 + 1500.0 * c as f64))
                    .collect()
            })
            .collect();
        let svg = render_svg(
            &dir,
            "heatmap",
            ChartData::Heatmap(PivotTable {
                row_labels: row_labels.clone(),
                column_labels: column_labels.clone(),
                values,
            }),
        );
        for label in row_labels.iter().chain(&column_labels) {
            assert!(svg.contains(label.as_str()), "missing {label}");
        }
        // Cell annotations
        assert!(svg.contains(">30000"));
        assert!(svg.contains(">78500"));
        // Colour scale end labels
        assert!(svg.contains("30,000"));
        assert!(svg.contains("78,500"));
    }

    #[test]
    fn test_heatmap_single_value_scale() {
        let dir = tempfile::tempdir().unwrap();
        let svg = render_svg(
            &dir,
            "flat",
            ChartData::Heatmap(PivotTable {
                row_labels: vec!["Norway".to_string()],
                column_labels: vec!["Primary".to_string()],
                values: vec![vec![Some(47000.0)]],
            }),
        );
        assert!(svg.contains("Norway"));
        assert!(svg.contains("47,000"));
    }

    #[test]
    fn test_png_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.png");
        let data = ChartData::Bars {
            labels: names("Country", 3),
            values: vec![50000.0, 45000.0, 40000.0],
            orientation: Orientation::Horizontal,
        };
        render(&spec(data), &ChartStyle::default(), &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), ChartStyle::default().width);
        assert_eq!(decoded.height(), ChartStyle::default().height);
    }
}
