//! Presentation: turns an `AnalysisResult` into titled sections.
//!
//! Each section is rendered independently; an absent key produces no section
//! (or no line) and never stops the others.

use serde::Serialize;

use crate::analysis::result::{AnalysisResult, MatchCategory, PercentageScores};

pub const SCORES_TITLE: &str = "Percentage Scores";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    #[allow(dead_code)]
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        for section in &self.sections {
            md.push_str(&format!("## {}\n\n", section.title));
            for line in &section.lines {
                md.push_str(&format!("- {line}\n"));
            }
            md.push('\n');
        }
        md
    }
}

pub fn render(result: &AnalysisResult) -> Report {
    let mut sections = Vec::new();

    if let Some(keywords) = &result.keywords {
        sections.extend(
            keywords
                .sections
                .iter()
                .filter(|s| !s.items.is_empty())
                .map(|s| ReportSection {
                    title: s.name.clone(),
                    lines: s.items.clone(),
                }),
        );
    }

    if let Some(matches) = &result.skills_experience_match {
        sections.extend(matches.categories.iter().filter_map(render_match));
    }

    if let Some(scores) = &result.percentage_scores {
        if let Some(section) = render_scores(scores) {
            sections.push(section);
        }
    }

    Report { sections }
}

fn render_match(category: &MatchCategory) -> Option<ReportSection> {
    let mut lines = Vec::new();
    if !category.matched_items.is_empty() {
        lines.push(format!("Matched: {}", category.matched_items.join(", ")));
    }
    if let Some(explanation) = &category.explanation {
        lines.push(explanation.clone());
    }

    (!lines.is_empty()).then(|| ReportSection {
        title: format!("{} Match", category.name),
        lines,
    })
}

fn render_scores(scores: &PercentageScores) -> Option<ReportSection> {
    let lines: Vec<String> = [
        ("Technical Skills Match", scores.technical_skills_match),
        ("Soft Skills Match", scores.soft_skills_match),
        ("Relevant Experience Match", scores.relevant_experience_match),
        ("Overall Suitability Score", scores.overall_suitability_score),
    ]
    .into_iter()
    .filter_map(|(label, score)| score.map(|s| format!("{label}: {s:.1}%")))
    .collect();

    (!lines.is_empty()).then(|| ReportSection {
        title: SCORES_TITLE.to_string(),
        lines,
    })
}
