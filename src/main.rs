mod analysis;
mod chart;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod report;

use std::path::Path;
use std::process::ExitCode;

use config::{Config, CONFIG_FILE};
use log::{error, info};
use pipeline::ReportPipeline;

fn main() -> ExitCode {
    env_logger::Builder::default()
        .parse_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    info!("Starting teacher salary analysis...");

    let result = Config::load_or_default(Path::new(CONFIG_FILE))
        .and_then(|config| ReportPipeline::new(config).run());

    match result {
        Ok(summary) => {
            info!("Wrote {} charts", summary.charts.len());
            if !summary.skipped.is_empty() {
                info!("Skipped charts without data: {}", summary.skipped.join(", "));
            }
            info!(
                "PDF report embeds {} charts, HTML report links {}",
                summary.pdf.embedded.len(),
                summary.html.embedded.len()
            );
            info!("Analysis completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
