use super::{files, Figure, Section};

const INTRODUCTION: &str = "This report presents an analysis of teacher salaries across \
different countries, education levels, and experience levels based on OECD data. The analysis \
provides insights into salary variations, progression patterns, and comparative statistics.";

const CONCLUSION: &str = "The analysis reveals significant variations in teacher salaries \
across countries, education levels, and experience levels. Generally, salaries increase with \
experience and higher education levels. Countries with stronger economies tend to offer higher \
compensation for teachers, but there are notable exceptions that suggest policy and cultural \
factors also play important roles in determining teacher compensation.";

fn image(file: &str, alt: &str) -> Option<Figure> {
    Some(Figure::Image {
        file: file.to_string(),
        alt: alt.to_string(),
    })
}

/// The report's sections in reading order. `ranking_size` and
/// `top_countries` are quoted in the chart descriptions.
pub fn sections(ranking_size: usize, top_countries: usize) -> Vec<Section> {
    vec![
        Section {
            title: "Introduction".to_string(),
            numbered: false,
            paragraphs: vec![INTRODUCTION.to_string()],
            figure: None,
        },
        Section {
            title: "Teacher Salaries by Country".to_string(),
            numbered: true,
            paragraphs: vec![format!(
                "The chart below shows the top {ranking_size} countries by average teacher \
                 salary in USD PPP (Purchasing Power Parity). This allows for a fair comparison \
                 of teacher compensation across different economies."
            )],
            figure: image(files::COUNTRY_CHART, "Teacher Salaries by Country"),
        },
        Section {
            title: "Salary Progression by Experience Level".to_string(),
            numbered: true,
            paragraphs: vec![format!(
                "This analysis examines how teacher salaries progress with experience, from \
                 starting salary to maximum salary. The chart shows the salary trajectory for \
                 the top {top_countries} highest-paying countries."
            )],
            figure: image(files::EXPERIENCE_CHART, "Salary Progression by Experience"),
        },
        Section {
            title: "Salary Comparison by Education Level".to_string(),
            numbered: true,
            paragraphs: vec![
                "This chart compares average teacher salaries across different education \
                 levels, from pre-primary to upper secondary education. It highlights how \
                 compensation varies based on the level of education being taught."
                    .to_string(),
            ],
            figure: image(files::EDUCATION_CHART, "Salary by Education Level"),
        },
        Section {
            title: "Salary Distribution by Country (Interactive)".to_string(),
            numbered: true,
            paragraphs: vec![
                "The interactive chart below shows the distribution of teacher salaries across \
                 different countries. You can hover over the data points to see detailed \
                 information."
                    .to_string(),
            ],
            figure: Some(Figure::Interactive {
                file: files::DISTRIBUTION_CHART.to_string(),
            }),
        },
        Section {
            title: "Correlation Between Education Level and Salary".to_string(),
            numbered: true,
            paragraphs: vec![
                "The heatmap below shows the relationship between education levels and teacher \
                 salaries across different countries. Darker colors indicate higher salaries."
                    .to_string(),
            ],
            figure: image(files::HEATMAP_CHART, "Salary Heatmap by Education Level"),
        },
        Section {
            title: "Conclusion".to_string(),
            numbered: false,
            paragraphs: vec![CONCLUSION.to_string()],
            figure: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::headings;

    #[test]
    fn test_sections_quote_configured_sizes() {
        let sections = sections(15, 7);
        assert!(sections[1].paragraphs[0].contains("top 15 countries"));
        assert!(sections[2].paragraphs[0].contains("top 7 highest-paying"));
        assert!(!sections[1].paragraphs[0].contains("  "));
    }

    #[test]
    fn test_static_sections_number_heatmap_fourth() {
        let sections = sections(20, 10);
        let static_only = sections
            .iter()
            .filter(|s| !matches!(s.figure, Some(Figure::Interactive { .. })));
        let titles: Vec<String> = headings(static_only).into_iter().map(|(_, h)| h).collect();
        assert_eq!(
            titles[4],
            "4. Correlation Between Education Level and Salary"
        );
        assert_eq!(titles.last().map(String::as_str), Some("Conclusion"));
    }
}
