//! Report composition.
//!
//! ```text
//!  narrative::sections()          (titles, paragraphs, figure per section)
//!        │
//!        ├──► pdf::compose   ──► teacher_salary_analysis_report.pdf
//!        │                        one A4 page per section, static charts only
//!        │
//!        └──► html::compose  ──► index.html
//!                                 every section, interactive chart in an iframe
//! ```
//!
//! Numbering is assigned per document: a section that a document skips does
//! not consume a number.

pub mod html;
pub mod narrative;
pub mod pdf;

use std::path::{Path, PathBuf};

use log::warn;

/// Fixed artifact file names, relative to the output directory.
pub mod files {
    pub const COUNTRY_CHART: &str = "teacher_salary_by_country.png";
    pub const EXPERIENCE_CHART: &str = "salary_progression_by_experience.png";
    pub const EDUCATION_CHART: &str = "salary_by_education_level.png";
    pub const DISTRIBUTION_CHART: &str = "salary_distribution.html";
    pub const TREND_CHART: &str = "salary_trends_over_time.png";
    pub const HEATMAP_CHART: &str = "salary_heatmap_by_education.png";
    pub const PDF_REPORT: &str = "teacher_salary_analysis_report.pdf";
    pub const HTML_REPORT: &str = "index.html";
}

/// What a section shows below its text.
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    /// A raster chart, embedded in both documents.
    Image { file: String, alt: String },
    /// A standalone HTML chart; only the HTML report can show it.
    Interactive { file: String },
}

impl Figure {
    pub fn file(&self) -> &str {
        match self {
            Figure::Image { file, .. } | Figure::Interactive { file } => file,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    /// Sections between the introduction and conclusion are numbered.
    pub numbered: bool,
    pub paragraphs: Vec<String>,
    pub figure: Option<Figure>,
}

impl Section {
    pub fn heading(&self, number: Option<usize>) -> String {
        match number {
            Some(n) if self.numbered => format!("{n}. {}", self.title),
            _ => self.title.clone(),
        }
    }
}

/// Number the sections in order, skipping unnumbered ones.
pub fn headings<'a>(sections: impl IntoIterator<Item = &'a Section>) -> Vec<(&'a Section, String)> {
    let mut next = 1;
    sections
        .into_iter()
        .map(|section| {
            let heading = if section.numbered {
                next += 1;
                section.heading(Some(next - 1))
            } else {
                section.heading(None)
            };
            (section, heading)
        })
        .collect()
}

/// Which charts made it into a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeSummary {
    pub embedded: Vec<PathBuf>,
    /// Charts that were absent and replaced by a placeholder line.
    pub placeholders: Vec<PathBuf>,
}

impl ComposeSummary {
    /// Resolve `file` in `dir`, recording whether it exists.
    fn resolve(&mut self, dir: &Path, file: &str) -> Option<PathBuf> {
        let path = dir.join(file);
        if path.is_file() {
            self.embedded.push(path.clone());
            Some(path)
        } else {
            warn!("Image not found: {}", path.display());
            self.placeholders.push(path);
            None
        }
    }
}

/// Placeholder text shown where a chart is missing.
pub fn placeholder(file: &str) -> String {
    format!("Image not found: {file}")
}
