//! Salary aggregates behind each chart.
//!
//! Everything here is pure: frames in, [`ChartSpec`]s and rankings out.
//! The pipeline decides where the charts go.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::chart::{ChartData, ChartSpec, Orientation, Series};
use crate::config::AnalysisConfig;
use crate::data::aggregate::{group_mean, pivot, top_n, PivotTable};
use crate::data::filter::{coerce_numeric, filter_eq, filter_in, map_column, project};
use crate::data::model::{columns, Cell, Frame};
use crate::error::Result;

/// Experience codes in salary-scale order, with display labels.
pub const EXPERIENCE_LEVELS: [(&str, &str); 4] = [
    ("EXP0", "Starting"),
    ("EXP10", "10 Years"),
    ("EXP15", "15 Years"),
    ("EXPMAX", "Maximum"),
];

/// Education codes from pre-primary to upper secondary, with display labels.
pub const EDUCATION_LEVELS: [(&str, &str); 4] = [
    ("ISCED11_02", "Pre-primary"),
    ("ISCED11_1", "Primary"),
    ("ISCED11_24", "Lower secondary"),
    ("ISCED11_34", "Upper secondary"),
];

/// Derived column holding education labels.
pub const EDUCATION_LABEL: &str = "Education Level";

const SALARY_AXIS: &str = "Average Salary (USD PPP)";

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// The source after column projection and numeric coercion, and the
/// teacher rows denominated in the configured unit.
#[derive(Debug, Clone)]
pub struct CleanData {
    pub cleaned: Frame,
    pub teachers: Frame,
}

/// Project onto the relevant columns, coerce `OBS_VALUE` and isolate
/// teacher rows in the configured unit.
pub fn clean(raw: &Frame, config: &AnalysisConfig) -> Result<CleanData> {
    let projected = project(raw, &columns::RELEVANT, config.column_policy)?;
    let cleaned = coerce_numeric(&projected, columns::OBS_VALUE)?;
    info!("Number of records after cleaning: {}", cleaned.len());

    let teachers = teacher_rows(&cleaned, config)?;
    info!(
        "{} rows in {} for personnel type {}",
        teachers.len(),
        config.unit,
        config.personnel_type
    );
    Ok(CleanData { cleaned, teachers })
}

/// Rows in the configured unit for the configured personnel type.
pub fn teacher_rows(frame: &Frame, config: &AnalysisConfig) -> Result<Frame> {
    let in_unit = filter_eq(frame, columns::UNIT_MEASURE, &config.unit)?;
    filter_eq(&in_unit, columns::PERS_TYPE, &config.personnel_type)
}

// ---------------------------------------------------------------------------
// Country ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CountryAverage {
    pub country: String,
    pub salary: f64,
}

/// Mean salary per country, highest first.
pub fn country_ranking(teachers: &Frame) -> Result<Vec<CountryAverage>> {
    let means = group_mean(teachers, &[columns::REF_AREA_NAME], columns::OBS_VALUE)?;
    let ranked = top_n(&means, columns::OBS_VALUE, means.len(), true)?;
    Ok(ranked
        .rows
        .iter()
        .filter_map(|row| {
            Some(CountryAverage {
                country: row[0].to_string(),
                salary: row[1].as_f64()?,
            })
        })
        .collect())
}

/// Names of the first `n` ranked countries.
pub fn top_countries(ranking: &[CountryAverage], n: usize) -> Vec<String> {
    ranking.iter().take(n).map(|c| c.country.clone()).collect()
}

pub fn country_chart(ranking: &[CountryAverage], n: usize) -> ChartSpec {
    let top = &ranking[..n.min(ranking.len())];
    ChartSpec {
        title: format!("Top {n} Countries by Average Teacher Salary (USD PPP)"),
        x_label: SALARY_AXIS.to_string(),
        y_label: "Country".to_string(),
        data: ChartData::Bars {
            labels: top.iter().map(|c| c.country.clone()).collect(),
            values: top.iter().map(|c| c.salary).collect(),
            orientation: Orientation::Horizontal,
        },
    }
}

// ---------------------------------------------------------------------------
// Experience progression
// ---------------------------------------------------------------------------

/// One line per top country across the experience levels.
pub fn experience_chart(teachers: &Frame, top: &[String]) -> Result<ChartSpec> {
    let codes: Vec<&str> = EXPERIENCE_LEVELS.iter().map(|(code, _)| *code).collect();
    let with_level = filter_in(teachers, columns::PERS_EXP_LEV, &codes)?;
    let in_top = filter_in(&with_level, columns::REF_AREA_NAME, top)?;
    let means = group_mean(
        &in_top,
        &[columns::REF_AREA_NAME, columns::PERS_EXP_LEV],
        columns::OBS_VALUE,
    )?;
    debug!("Experience aggregate has {} rows", means.len());

    let series = series_by_country(&means, top, &codes);
    Ok(ChartSpec {
        title: format!(
            "Teacher Salary Progression by Experience Level (Top {} Countries)",
            top.len()
        ),
        x_label: "Experience Level".to_string(),
        y_label: SALARY_AXIS.to_string(),
        data: ChartData::Lines {
            categories: EXPERIENCE_LEVELS
                .iter()
                .map(|(_, label)| label.to_string())
                .collect(),
            series,
        },
    })
}

/// Spread a `[country, category, value]` aggregate into one series per
/// country (in `countries` order) aligned with `categories`.
fn series_by_country(means: &Frame, countries: &[String], categories: &[&str]) -> Vec<Series> {
    let mut by_country: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for row in &means.rows {
        let Some(slot) = categories.iter().position(|c| row[1].matches(c)) else {
            continue;
        };
        let Some(country) = countries.iter().find(|c| row[0].matches(c)) else {
            continue;
        };
        by_country
            .entry(country.as_str())
            .or_insert_with(|| vec![None; categories.len()])[slot] = row[2].as_f64();
    }

    countries
        .iter()
        .filter_map(|country| {
            by_country.remove(country.as_str()).map(|values| Series {
                name: country.clone(),
                values,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Education levels
// ---------------------------------------------------------------------------

fn education_frame(teachers: &Frame) -> Result<Frame> {
    let codes: Vec<&str> = EDUCATION_LEVELS.iter().map(|(code, _)| *code).collect();
    let known = filter_in(teachers, columns::EDUCATION_LEV, &codes)?;
    let labels: BTreeMap<&str, &str> = EDUCATION_LEVELS.into_iter().collect();
    map_column(&known, columns::EDUCATION_LEV, EDUCATION_LABEL, &labels)
}

/// Mean salary per education level, lowest first.
pub fn education_averages(teachers: &Frame) -> Result<Vec<(String, f64)>> {
    let means = group_mean(&education_frame(teachers)?, &[EDUCATION_LABEL], columns::OBS_VALUE)?;
    let sorted = top_n(&means, columns::OBS_VALUE, means.len(), false)?;
    Ok(sorted
        .rows
        .iter()
        .filter_map(|row| Some((row[0].to_string(), row[1].as_f64()?)))
        .collect())
}

pub fn education_chart(averages: &[(String, f64)]) -> ChartSpec {
    ChartSpec {
        title: "Average Teacher Salary by Education Level".to_string(),
        x_label: "Education Level".to_string(),
        y_label: SALARY_AXIS.to_string(),
        data: ChartData::Bars {
            labels: averages.iter().map(|(l, _)| l.clone()).collect(),
            values: averages.iter().map(|(_, v)| *v).collect(),
            orientation: Orientation::Vertical,
        },
    }
}

/// Country × education level grid, restricted to countries reporting every
/// level.
pub fn education_heatmap(teachers: &Frame) -> Result<PivotTable> {
    let labels: Vec<&str> = EDUCATION_LEVELS.iter().map(|(_, label)| *label).collect();
    let table = pivot(
        &education_frame(teachers)?,
        columns::REF_AREA_NAME,
        EDUCATION_LABEL,
        columns::OBS_VALUE,
        &labels,
    )?;
    let complete = table.complete_rows();
    debug!(
        "{} of {} countries report all education levels",
        complete.row_labels.len(),
        table.row_labels.len()
    );
    Ok(complete)
}

pub fn heatmap_chart(table: PivotTable) -> ChartSpec {
    ChartSpec {
        title: "Teacher Salaries by Country and Education Level (USD PPP)".to_string(),
        x_label: "Education Level".to_string(),
        y_label: "Country".to_string(),
        data: ChartData::Heatmap(table),
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Raw salaries of the top countries, one box per country.
pub fn distribution_chart(teachers: &Frame, top: &[String]) -> Result<ChartSpec> {
    let area = teachers.column_index(columns::REF_AREA_NAME)?;
    let value = teachers.column_index(columns::OBS_VALUE)?;

    let groups = top
        .iter()
        .map(|country| {
            let values = teachers
                .rows
                .iter()
                .filter(|row| row[area].matches(country))
                .filter_map(|row| row[value].as_f64())
                .collect();
            (country.clone(), values)
        })
        .collect();

    Ok(ChartSpec {
        title: "Distribution of Teacher Salaries by Country".to_string(),
        x_label: "Country".to_string(),
        y_label: "Salary (USD PPP)".to_string(),
        data: ChartData::Boxes { groups },
    })
}

// ---------------------------------------------------------------------------
// Trends over time
// ---------------------------------------------------------------------------

/// Distinct reference periods of the cleaned data; empty if the column is
/// absent.
pub fn reference_periods(cleaned: &Frame) -> Vec<String> {
    cleaned
        .unique_values(columns::REF_PERIOD)
        .map(|set| set.iter().map(Cell::to_string).collect())
        .unwrap_or_default()
}

/// Yearly mean salary of the given countries, or `None` when the data
/// covers a single period.
pub fn trend_chart(
    cleaned: &Frame,
    config: &AnalysisConfig,
    countries: &[String],
) -> Result<Option<ChartSpec>> {
    if reference_periods(cleaned).len() < 2 {
        return Ok(None);
    }

    let dated = coerce_numeric(cleaned, columns::REF_PERIOD)?;
    let teachers = teacher_rows(&dated, config)?;
    let in_top = filter_in(&teachers, columns::REF_AREA_NAME, countries)?;
    let means = group_mean(
        &in_top,
        &[columns::REF_AREA_NAME, columns::REF_PERIOD],
        columns::OBS_VALUE,
    )?;

    // Numeric order, not lexical.
    let years: Vec<String> = means
        .unique_values(columns::REF_PERIOD)?
        .iter()
        .map(Cell::to_string)
        .collect();
    let year_refs: Vec<&str> = years.iter().map(String::as_str).collect();
    let series = series_by_country(&means, countries, &year_refs);

    Ok(Some(ChartSpec {
        title: format!(
            "Teacher Salary Trends Over Time (Top {} Countries)",
            countries.len()
        ),
        x_label: "Year".to_string(),
        y_label: SALARY_AXIS.to_string(),
        data: ChartData::Lines {
            categories: years,
            series,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnPolicy;
    use crate::data::model::ObservationRecord;

    fn obs(
        country: &str,
        unit: &str,
        exp: &str,
        edu: &str,
        year: &str,
        value: Option<f64>,
    ) -> ObservationRecord {
        ObservationRecord {
            ref_area: Some(country[..1].to_string()),
            ref_area_name: Some(country.to_string()),
            measure: Some("SAL_STAT".to_string()),
            unit_measure: Some(unit.to_string()),
            education_lev: Some(edu.to_string()),
            pers_type: Some("TE".to_string()),
            pers_exp_lev: Some(exp.to_string()),
            obs_value: value,
            currency: Some("USD".to_string()),
            ref_period: Some(year.to_string()),
        }
    }

    /// Loaded frames hold text, so mirror that before cleaning.
    fn as_loaded(records: &[ObservationRecord]) -> Frame {
        let mut frame = Frame::from_records(records);
        for row in &mut frame.rows {
            for cell in row.iter_mut() {
                if let Cell::Number(v) = cell {
                    *cell = Cell::Text(v.to_string());
                }
            }
        }
        frame
    }

    #[test]
    fn test_ranking_end_to_end() {
        let mut frame = as_loaded(&[
            obs("A", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(40000.0)),
            obs("B", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(60000.0)),
            obs("C", "USD", "EXP0", "ISCED11_1", "2022", Some(90000.0)),
            obs("D", "USD_PPP", "EXP0", "ISCED11_1", "2022", None),
        ]);
        let value = frame.column_index(columns::OBS_VALUE).unwrap();
        frame.rows[3][value] = Cell::from("not a number");

        let config = AnalysisConfig::default();
        let data = clean(&frame, &config).unwrap();
        assert_eq!(data.cleaned.len(), 3);

        let ranking = country_ranking(&data.teachers).unwrap();
        assert_eq!(
            ranking,
            vec![
                CountryAverage {
                    country: "B".to_string(),
                    salary: 60000.0
                },
                CountryAverage {
                    country: "A".to_string(),
                    salary: 40000.0
                },
            ]
        );
        assert_eq!(top_countries(&ranking, 1), vec!["B"]);
    }

    #[test]
    fn test_clean_strict_policy_rejects_partial_export() {
        let frame = as_loaded(&[obs("A", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(1.0))]);
        let config = AnalysisConfig {
            column_policy: ColumnPolicy::Strict,
            ..AnalysisConfig::default()
        };
        assert!(clean(&frame, &config).is_err());

        let lenient = clean(&frame, &AnalysisConfig::default()).unwrap();
        assert_eq!(lenient.teachers.len(), 1);
    }

    #[test]
    fn test_country_chart_takes_top_n() {
        let ranking: Vec<CountryAverage> = (0..5)
            .map(|i| CountryAverage {
                country: format!("C{i}"),
                salary: 1000.0 * (5 - i) as f64,
            })
            .collect();
        let spec = country_chart(&ranking, 3);
        match spec.data {
            ChartData::Bars {
                labels,
                values,
                orientation,
            } => {
                assert_eq!(labels, vec!["C0", "C1", "C2"]);
                assert_eq!(values, vec![5000.0, 4000.0, 3000.0]);
                assert_eq!(orientation, Orientation::Horizontal);
            }
            other => panic!("unexpected chart data {other:?}"),
        }
        assert!(!country_chart(&ranking, 20).is_empty());
    }

    fn teachers() -> Frame {
        let data = clean(
            &as_loaded(&[
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_1", "2021", Some(45000.0)),
                obs("Norway", "USD_PPP", "EXPMAX", "ISCED11_1", "2021", Some(55000.0)),
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_02", "2021", Some(40000.0)),
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_24", "2022", Some(47000.0)),
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_34", "2022", Some(50000.0)),
                obs("Chile", "USD_PPP", "EXP0", "ISCED11_1", "2021", Some(25000.0)),
                obs("Chile", "USD_PPP", "EXP15", "ISCED11_1", "2022", Some(30000.0)),
                obs("Chile", "USD_PPP", "EXP_OTHER", "ISCED11_5", "2022", Some(99000.0)),
            ]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        data.teachers
    }

    #[test]
    fn test_experience_series_follow_level_order() {
        let top = vec!["Norway".to_string(), "Chile".to_string()];
        let spec = experience_chart(&teachers(), &top).unwrap();
        let ChartData::Lines { categories, series } = spec.data else {
            panic!("expected lines");
        };
        assert_eq!(categories, vec!["Starting", "10 Years", "15 Years", "Maximum"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Norway");
        assert_eq!(series[0].values[0], Some(45500.0));
        assert_eq!(series[0].values[3], Some(55000.0));
        assert_eq!(series[1].values, vec![Some(25000.0), None, Some(30000.0), None]);
    }

    #[test]
    fn test_education_averages_sorted_ascending() {
        let averages = education_averages(&teachers()).unwrap();
        let labels: Vec<&str> = averages.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Primary", "Pre-primary", "Lower secondary", "Upper secondary"]
        );
        assert!(averages.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_heatmap_keeps_complete_countries() {
        let table = education_heatmap(&teachers()).unwrap();
        assert_eq!(table.row_labels, vec!["Norway"]);
        assert_eq!(
            table.column_labels,
            vec!["Pre-primary", "Primary", "Lower secondary", "Upper secondary"]
        );
        assert_eq!(
            table.values[0],
            vec![Some(40000.0), Some(50000.0), Some(47000.0), Some(50000.0)]
        );
    }

    #[test]
    fn test_distribution_groups_in_ranking_order() {
        let top = vec!["Chile".to_string(), "Norway".to_string()];
        let spec = distribution_chart(&teachers(), &top).unwrap();
        let ChartData::Boxes { groups } = spec.data else {
            panic!("expected boxes");
        };
        assert_eq!(groups[0].0, "Chile");
        assert_eq!(groups[0].1.len(), 3);
        assert_eq!(groups[1].1.len(), 5);
    }

    #[test]
    fn test_trend_chart_needs_several_periods() {
        let config = AnalysisConfig::default();
        let two_years = clean(
            &as_loaded(&[
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_1", "2021", Some(45000.0)),
                obs("Norway", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(47000.0)),
                obs("Chile", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(25000.0)),
            ]),
            &config,
        )
        .unwrap();
        let spec = trend_chart(&two_years.cleaned, &config, &["Norway".to_string()])
            .unwrap()
            .unwrap();
        let ChartData::Lines { categories, series } = spec.data else {
            panic!("expected lines");
        };
        assert_eq!(categories, vec!["2021", "2022"]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values, vec![Some(45000.0), Some(47000.0)]);

        let one_year = clean(
            &as_loaded(&[obs("Chile", "USD_PPP", "EXP0", "ISCED11_1", "2022", Some(1.0))]),
            &config,
        )
        .unwrap();
        assert!(trend_chart(&one_year.cleaned, &config, &[]).unwrap().is_none());
    }
}
