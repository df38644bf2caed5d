//! Configuration file handling.
//!
//! Every setting has a default, so the report runs unchanged without a
//! `salary-report.toml`. When the file exists in the working directory it
//! overrides the fields it names.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::ChartStyle;

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = "salary-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Chart appearance, handed to every render call.
    #[serde(default)]
    pub style: ChartStyle,
}

/// Source dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Single-byte field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("OECD.EDU.IMEP,DSD_EAG_SAL_STA@DF_EAG_SAL_STA_ALL,+all.csv")
}

fn default_delimiter() -> char {
    ','
}

/// Where charts and reports are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// How to treat expected columns the source lacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// Continue with the columns that exist.
    #[default]
    Lenient,
    /// Fail the run.
    Strict,
}

/// Filter constants and ranking sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub column_policy: ColumnPolicy,

    #[serde(default = "default_unit")]
    pub unit: String,

    #[serde(default = "default_personnel_type")]
    pub personnel_type: String,

    /// Bars in the country ranking chart.
    #[serde(default = "default_ranking_size")]
    pub ranking_size: usize,

    /// Countries followed by the experience and distribution charts.
    #[serde(default = "default_top_countries")]
    pub top_countries: usize,

    /// Countries followed by the trend chart.
    #[serde(default = "default_trend_countries")]
    pub trend_countries: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            column_policy: ColumnPolicy::default(),
            unit: default_unit(),
            personnel_type: default_personnel_type(),
            ranking_size: default_ranking_size(),
            top_countries: default_top_countries(),
            trend_countries: default_trend_countries(),
        }
    }
}

fn default_unit() -> String {
    "USD_PPP".to_string()
}

fn default_personnel_type() -> String {
    "TE".to_string()
}

fn default_ranking_size() -> usize {
    20
}

fn default_top_countries() -> usize {
    10
}

fn default_trend_countries() -> usize {
    5
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::info!("Using configuration from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.input.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .with_context(|| {
                format!(
                    "Delimiter {:?} is not a single ASCII character",
                    self.input.delimiter
                )
            })
    }

    fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        anyhow::ensure!(
            self.style.width >= 200 && self.style.height >= 150,
            "Chart size {}x{} is too small",
            self.style.width,
            self.style.height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PaletteKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.unit, "USD_PPP");
        assert_eq!(config.analysis.personnel_type, "TE");
        assert_eq!(config.analysis.column_policy, ColumnPolicy::Lenient);
        assert_eq!(config.analysis.ranking_size, 20);
        assert_eq!(config.output.directory, PathBuf::from("."));
        assert_eq!(config.delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
path = "data/salaries.csv"
delimiter = ";"

[analysis]
column_policy = "strict"
top_countries = 8

[style]
width = 1600
palette = "hue"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/salaries.csv"));
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert_eq!(config.analysis.column_policy, ColumnPolicy::Strict);
        assert_eq!(config.analysis.top_countries, 8);
        assert_eq!(config.analysis.trend_countries, 5);
        assert_eq!(config.style.width, 1600);
        assert_eq!(config.style.palette, PaletteKind::Hue);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.analysis.top_countries, 10);
    }

    #[test]
    fn test_load_rejects_bad_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[input]\ndelimiter = \"é\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
