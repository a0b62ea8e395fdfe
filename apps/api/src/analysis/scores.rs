//! Advisory check of the model's arithmetic.
//!
//! The reported numbers are always shown as-is. This only recomputes the
//! weighted overall score from the reported components and flags a mismatch.

use serde::Serialize;

use crate::analysis::result::PercentageScores;

pub const TECHNICAL_WEIGHT: f64 = 0.4;
pub const SOFT_WEIGHT: f64 = 0.3;
pub const EXPERIENCE_WEIGHT: f64 = 0.3;
/// Largest gap, in percentage points, still treated as rounding.
pub const TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCheck {
    pub reported_overall: Option<f64>,
    /// 0.4·T + 0.3·S + 0.3·E from the reported components.
    pub expected_overall: Option<f64>,
    pub consistent: Option<bool>,
}

/// Returns `consistent: None` when any input needed for the comparison is missing.
pub fn check_scores(scores: &PercentageScores) -> ScoreCheck {
    let expected_overall = match (
        scores.technical_skills_match,
        scores.soft_skills_match,
        scores.relevant_experience_match,
    ) {
        (Some(t), Some(s), Some(e)) => {
            let expected = TECHNICAL_WEIGHT * t + SOFT_WEIGHT * s + EXPERIENCE_WEIGHT * e;
            Some((expected * 100.0).round() / 100.0)
        }
        _ => None,
    };

    let consistent = expected_overall
        .zip(scores.overall_suitability_score)
        .map(|(expected, reported)| (expected - reported).abs() <= TOLERANCE);

    ScoreCheck {
        reported_overall: scores.overall_suitability_score,
        expected_overall,
        consistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(t: Option<f64>, s: Option<f64>, e: Option<f64>, m: Option<f64>) -> PercentageScores {
        PercentageScores {
            technical_skills_match: t,
            soft_skills_match: s,
            relevant_experience_match: e,
            overall_suitability_score: m,
        }
    }

    #[test]
    fn test_consistent_scores() {
        // 0.4*75.5 + 0.3*80 + 0.3*70 = 75.2
        let check = check_scores(&scores(Some(75.5), Some(80.0), Some(70.0), Some(75.2)));
        assert_eq!(check.expected_overall, Some(75.2));
        assert_eq!(check.consistent, Some(true));
    }

    #[test]
    fn test_small_rounding_difference_is_tolerated() {
        let check = check_scores(&scores(Some(66.7), Some(50.0), Some(100.0), Some(72.0)));
        assert_eq!(check.consistent, Some(true));
    }

    #[test]
    fn test_inconsistent_overall_is_flagged_but_kept() {
        let check = check_scores(&scores(Some(50.0), Some(50.0), Some(50.0), Some(90.0)));
        assert_eq!(check.expected_overall, Some(50.0));
        assert_eq!(check.reported_overall, Some(90.0));
        assert_eq!(check.consistent, Some(false));
    }

    #[test]
    fn test_missing_component_is_undetermined() {
        let check = check_scores(&scores(Some(50.0), None, Some(50.0), Some(50.0)));
        assert_eq!(check.expected_overall, None);
        assert_eq!(check.consistent, None);
    }

    #[test]
    fn test_missing_overall_still_reports_expected() {
        let check = check_scores(&scores(Some(100.0), Some(0.0), Some(0.0), None));
        assert_eq!(check.expected_overall, Some(40.0));
        assert_eq!(check.consistent, None);
    }
}
