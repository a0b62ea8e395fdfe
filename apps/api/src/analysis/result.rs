//! Typed, lenient view over the model's JSON answer.
//!
//! Every section and every nested field is optional. Projection never fails on
//! syntactically valid JSON: values of an unexpected shape are coerced where a
//! reasonable reading exists and dropped otherwise.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub keywords: Option<Keywords>,
    pub skills_experience_match: Option<SkillsExperienceMatch>,
    pub percentage_scores: Option<PercentageScores>,
    /// The JSON value the sections were projected from.
    pub raw: Value,
}

/// Resume categories (Headline, Education, ...) in the order the model gave them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keywords {
    pub sections: Vec<KeywordSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSection {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillsExperienceMatch {
    pub categories: Vec<MatchCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCategory {
    pub name: String,
    pub matched_items: Vec<String>,
    pub explanation: Option<String>,
}

/// Model-reported percentages. Never computed locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentageScores {
    pub technical_skills_match: Option<f64>,
    pub soft_skills_match: Option<f64>,
    pub relevant_experience_match: Option<f64>,
    pub overall_suitability_score: Option<f64>,
}

const KEYWORDS_KEY: &str = "keywords";
const SKILLS_MATCH_KEY: &str = "skillsexperiencematch";
const SCORES_KEY: &str = "percentagescores";

const MATCHED_ITEMS_KEYS: &[&str] = &["matcheditems", "matched", "matches", "items"];
const EXPLANATION_KEYS: &[&str] = &["explanation", "details", "reason", "summary"];

const TECHNICAL_KEYS: &[&str] = &["technicalskillsmatch", "technicalskillsscore", "technicalskills"];
const SOFT_KEYS: &[&str] = &["softskillsmatch", "softskillsscore", "softskills"];
const EXPERIENCE_KEYS: &[&str] = &[
    "relevantexperiencematch",
    "relevantexperiencescore",
    "relevantexperience",
];
const OVERALL_KEYS: &[&str] = &[
    "overallsuitabilityscore",
    "overallmatchscore",
    "overallscore",
    "overallsuitability",
];

impl AnalysisResult {
    /// Projects any JSON value into the optional structure.
    pub fn from_value(raw: Value) -> Self {
        let (keywords, skills_experience_match, percentage_scores) = match raw.as_object() {
            Some(root) => (
                lookup(root, &[KEYWORDS_KEY])
                    .and_then(Value::as_object)
                    .map(Keywords::from_map),
                lookup(root, &[SKILLS_MATCH_KEY])
                    .and_then(Value::as_object)
                    .map(SkillsExperienceMatch::from_map),
                lookup(root, &[SCORES_KEY])
                    .and_then(Value::as_object)
                    .map(PercentageScores::from_map),
            ),
            None => (None, None, None),
        };

        Self {
            keywords,
            skills_experience_match,
            percentage_scores,
            raw,
        }
    }
}

impl Keywords {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            sections: map
                .iter()
                .map(|(name, value)| KeywordSection {
                    name: name.clone(),
                    items: value_to_items(value),
                })
                .collect(),
        }
    }

    /// Looks a section up by name, ignoring case, spacing and punctuation.
    #[allow(dead_code)]
    pub fn section(&self, name: &str) -> Option<&KeywordSection> {
        let wanted = normalize_key(name);
        self.sections.iter().find(|s| normalize_key(&s.name) == wanted)
    }
}

impl SkillsExperienceMatch {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            categories: map
                .iter()
                .map(|(name, value)| MatchCategory::from_value(name, value))
                .collect(),
        }
    }

    #[allow(dead_code)]
    pub fn category(&self, name: &str) -> Option<&MatchCategory> {
        let wanted = normalize_key(name);
        self.categories
            .iter()
            .find(|c| normalize_key(&c.name) == wanted)
    }
}

impl MatchCategory {
    fn from_value(name: &str, value: &Value) -> Self {
        let (matched_items, explanation) = match value {
            Value::Object(map) => (
                lookup(map, MATCHED_ITEMS_KEYS)
                    .map(value_to_items)
                    .unwrap_or_default(),
                lookup(map, EXPLANATION_KEYS)
                    .map(inline_value)
                    .filter(|s| !s.trim().is_empty()),
            ),
            Value::String(s) if !s.trim().is_empty() => (Vec::new(), Some(s.clone())),
            other => (value_to_items(other), None),
        };

        Self {
            name: name.to_string(),
            matched_items,
            explanation,
        }
    }
}

impl PercentageScores {
    fn from_map(map: &Map<String, Value>) -> Self {
        let score = |keys: &[&str]| lookup(map, keys).and_then(as_score);
        Self {
            technical_skills_match: score(TECHNICAL_KEYS),
            soft_skills_match: score(SOFT_KEYS),
            relevant_experience_match: score(EXPERIENCE_KEYS),
            overall_suitability_score: score(OVERALL_KEYS),
        }
    }
}

/// Lowercases and drops everything but letters and digits.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First entry whose normalized key matches one of `candidates`, in candidate order.
fn lookup<'a>(map: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| {
        map.iter()
            .find(|(key, _)| normalize_key(key) == *candidate)
            .map(|(_, value)| value)
    })
}

/// Accepts numbers and strings such as `"75.5%"`.
fn as_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    score.is_finite().then_some(score)
}

fn value_to_items(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(inline_value)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", inline_value(v)))
            .collect(),
        other => Some(inline_value(other))
            .filter(|s| !s.trim().is_empty())
            .into_iter()
            .collect(),
    }
}

/// Flattens a value into one display line.
fn inline_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(inline_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", inline_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
