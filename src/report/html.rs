use std::path::Path;

use chrono::NaiveDate;
use log::info;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::{files, headings, placeholder, ComposeSummary, Figure, Section};
use crate::error::Result;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 0; color: #333; }
.container { width: 90%; max-width: 1200px; margin: 0 auto; padding: 20px; }
header { background-color: #2c3e50; color: white; padding: 20px 0; text-align: center; }
h1, h2, h3 { color: #2c3e50; }
header h1 { color: white; }
.section { margin: 40px 0; padding: 20px; background-color: #f9f9f9; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
.chart-container { margin: 20px 0; text-align: center; }
img { max-width: 100%; height: auto; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
.interactive { margin: 20px 0; height: 600px; border: none; width: 100%; }
.placeholder { color: #999; font-style: italic; }
footer { background-color: #2c3e50; color: white; text-align: center; padding: 20px 0; margin-top: 40px; }
"#;

/// A section ready to render: its heading and whether its figure exists.
struct Entry<'a> {
    section: &'a Section,
    heading: String,
    figure_present: bool,
}

/// Write the HTML report next to its charts. Figures are linked by file
/// name, so `output` belongs in `chart_dir`.
pub fn compose(
    sections: &[Section],
    chart_dir: &Path,
    output: &Path,
    generated: NaiveDate,
) -> Result<ComposeSummary> {
    let mut summary = ComposeSummary::default();
    let mut entries = Vec::with_capacity(sections.len());
    for (section, heading) in headings(sections) {
        let figure_present = match &section.figure {
            Some(figure) => summary.resolve(chart_dir, figure.file()).is_some(),
            None => false,
        };
        entries.push(Entry {
            section,
            heading,
            figure_present,
        });
    }

    let page = render(&entries, generated);
    std::fs::write(output, page.into_string())?;
    info!(
        "Saved {} ({} charts, {} missing)",
        output.display(),
        summary.embedded.len(),
        summary.placeholders.len()
    );
    Ok(summary)
}

fn render(entries: &[Entry], generated: NaiveDate) -> Markup {
    let last = entries.len().saturating_sub(1);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Teacher Salary Analysis" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header {
                    div.container {
                        h1 { "Teacher Salary Analysis" }
                        p { "An in-depth analysis of teacher salaries across different countries, education levels, and experience levels" }
                    }
                }
                div.container {
                    @for (i, entry) in entries.iter().enumerate() {
                        div.section {
                            h2 { (entry.heading) }
                            @for paragraph in &entry.section.paragraphs {
                                p { (paragraph) }
                            }
                            @if let Some(figure) = &entry.section.figure {
                                div.chart-container {
                                    @if !entry.figure_present {
                                        p.placeholder { (placeholder(figure.file())) }
                                    } @else {
                                        @match figure {
                                            Figure::Image { file, alt } => {
                                                img src=(file) alt=(alt);
                                            }
                                            Figure::Interactive { file } => {
                                                iframe.interactive src=(file) frameborder="0" {}
                                            }
                                        }
                                    }
                                }
                            }
                            @if i == last {
                                p { "For a more detailed analysis, please refer to the PDF report." }
                                p { a href=(files::PDF_REPORT) target="_blank" { "Download PDF Report" } }
                            }
                        }
                    }
                }
                footer {
                    div.container {
                        p { "Teacher Salary Analysis Report | Generated on " (generated.format("%Y-%m-%d").to_string()) }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::narrative;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_compose_with_all_charts_missing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join(files::HTML_REPORT);
        let summary = compose(&narrative::sections(20, 10), dir.path(), &output, date()).unwrap();

        assert_eq!(summary.placeholders.len(), 5);
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Image not found: teacher_salary_by_country.png"));
        assert!(html.contains("4. Salary Distribution by Country (Interactive)"));
        assert!(html.contains("5. Correlation Between Education Level and Salary"));
        assert!(html.contains("Generated on 2024-05-01"));
        assert!(html.contains(r#"href="teacher_salary_analysis_report.pdf""#));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn test_compose_links_present_charts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(files::DISTRIBUTION_CHART), "<html></html>").unwrap();
        std::fs::write(dir.path().join(files::HEATMAP_CHART), b"png").unwrap();

        let output = dir.path().join(files::HTML_REPORT);
        let summary = compose(&narrative::sections(20, 10), dir.path(), &output, date()).unwrap();
        assert_eq!(summary.embedded.len(), 2);
        assert_eq!(summary.placeholders.len(), 3);

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains(r#"src="salary_distribution.html""#));
        assert!(html.contains(r#"src="salary_heatmap_by_education.png""#));
        assert!(html.contains(r#"alt="Salary Heatmap by Education Level""#));
    }
}
