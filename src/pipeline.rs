//! End-to-end run: load, clean, analyse, chart, compose.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use log::{debug, info, warn};

use crate::analysis::{self, CleanData, CountryAverage};
use crate::chart::{render_chart, ChartSpec};
use crate::config::Config;
use crate::data::loader::load_delimited;
use crate::data::model::Frame;
use crate::error::ReportError;
use crate::report::{self, files, narrative, ComposeSummary};

/// Rows shown in the debug preview of each frame.
const PREVIEW_ROWS: usize = 5;

/// Cleaned data plus the country ranking every chart starts from.
#[derive(Debug, Clone)]
pub struct Analysed {
    pub data: CleanData,
    pub ranking: Vec<CountryAverage>,
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub charts: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub pdf: ComposeSummary,
    pub html: ComposeSummary,
}

pub struct ReportPipeline {
    config: Config,
}

impl ReportPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn output(&self, file: &str) -> PathBuf {
        self.config.output.directory.join(file)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let analysed = self.analyse()?;
        let mut summary = RunSummary::default();
        self.render_charts(&analysed, &mut summary)?;
        self.compose_reports(&mut summary)?;
        Ok(summary)
    }

    /// Load the source, clean it and rank countries by mean salary.
    pub fn analyse(&self) -> Result<Analysed> {
        let input = &self.config.input;
        let delimiter = self.config.delimiter_byte()?;
        let raw = load_delimited(&input.path, delimiter)
            .with_context(|| format!("Failed to load dataset {}", input.path.display()))?;
        preview("Raw dataset", &raw);
        log_missing(&raw);

        let cfg = &self.config.analysis;
        let data = analysis::clean(&raw, cfg).context("Failed to clean dataset")?;
        preview("Cleaned dataset", &data.cleaned);
        ensure!(
            !data.teachers.is_empty(),
            "no {} rows for personnel type {} after cleaning",
            cfg.unit,
            cfg.personnel_type
        );

        let ranking = analysis::country_ranking(&data.teachers)?;
        info!("Top {} countries by average teacher salary:", cfg.top_countries);
        for (rank, entry) in ranking.iter().take(cfg.top_countries).enumerate() {
            info!("  {:>2}. {:<30} {:>12.2}", rank + 1, entry.country, entry.salary);
        }

        Ok(Analysed { data, ranking })
    }

    fn render_charts(&self, analysed: &Analysed, summary: &mut RunSummary) -> Result<()> {
        let cfg = &self.config.analysis;
        let teachers = &analysed.data.teachers;
        let top = analysis::top_countries(&analysed.ranking, cfg.top_countries);

        std::fs::create_dir_all(&self.config.output.directory).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.output.directory.display()
            )
        })?;

        self.render(
            &analysis::country_chart(&analysed.ranking, cfg.ranking_size),
            files::COUNTRY_CHART,
            summary,
        )?;
        self.render(
            &analysis::experience_chart(teachers, &top)?,
            files::EXPERIENCE_CHART,
            summary,
        )?;

        let education = analysis::education_averages(teachers)?;
        debug!("Education level averages: {education:?}");
        self.render(
            &analysis::education_chart(&education),
            files::EDUCATION_CHART,
            summary,
        )?;
        self.render(
            &analysis::distribution_chart(teachers, &top)?,
            files::DISTRIBUTION_CHART,
            summary,
        )?;

        let periods = analysis::reference_periods(&analysed.data.cleaned);
        info!("Available years in the dataset: {}", periods.join(", "));
        let trend_top = analysis::top_countries(&analysed.ranking, cfg.trend_countries);
        match analysis::trend_chart(&analysed.data.cleaned, cfg, &trend_top)? {
            Some(spec) => self.render(&spec, files::TREND_CHART, summary)?,
            None => info!("Only one year available in the dataset. Cannot perform time series analysis."),
        }

        let heatmap = analysis::education_heatmap(teachers)?;
        self.render(&analysis::heatmap_chart(heatmap), files::HEATMAP_CHART, summary)
    }

    /// Render one chart. A chart with nothing to draw is skipped so the
    /// reports show a placeholder; any other failure stops the run.
    fn render(&self, spec: &ChartSpec, file: &str, summary: &mut RunSummary) -> Result<()> {
        let path = self.output(file);
        match render_chart(spec, &self.config.style, &path) {
            Ok(()) => {
                summary.charts.push(path);
                Ok(())
            }
            Err(ReportError::EmptyChart(title)) => {
                warn!("Skipping {file}: no data for '{title}'");
                summary.skipped.push(file.to_string());
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to render {}", path.display())),
        }
    }

    fn compose_reports(&self, summary: &mut RunSummary) -> Result<()> {
        let dir = &self.config.output.directory;
        let cfg = &self.config.analysis;
        let sections = narrative::sections(cfg.ranking_size, cfg.top_countries);

        let pdf_path = self.output(files::PDF_REPORT);
        summary.pdf = report::pdf::compose(&sections, dir, &pdf_path)
            .with_context(|| format!("Failed to write {}", pdf_path.display()))?;

        let html_path = self.output(files::HTML_REPORT);
        let today = chrono::Local::now().date_naive();
        summary.html = report::html::compose(&sections, dir, &html_path, today)
            .with_context(|| format!("Failed to write {}", html_path.display()))?;
        Ok(())
    }
}

/// Debug-log the shape and first rows of `frame`.
fn preview(label: &str, frame: &Frame) {
    info!("{label} shape: ({}, {})", frame.len(), frame.columns.len());
    for row in 0..frame.len().min(PREVIEW_ROWS) {
        if let Some(record) = frame.record(row) {
            debug!("  {record}");
        }
    }
}

fn log_missing(frame: &Frame) {
    for (i, column) in frame.columns.iter().enumerate() {
        let missing = frame.rows.iter().filter(|r| r[i].is_missing()).count();
        if missing > 0 {
            debug!("Missing values in {column}: {missing}");
        }
    }
}
