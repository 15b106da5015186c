//! Score aggregation for transcripts

use crate::config::{RubricConfig, SkipPolicy};
use crate::{Criterion, CriterionReport, Grade, SignalResult, SignalStatus};

/// Criteria below this fraction of their maximum get a recommendation
const RECOMMENDATION_THRESHOLD: f64 = 0.6;

/// Calculator for rubric scores
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Group signal results by criterion and weight them.
    ///
    /// Under [`SkipPolicy::Redistribute`] a criterion whose signals were all skipped gets an
    /// effective weight of 0 and every applicable criterion is scaled by
    /// `total / applicable`, so the effective weights still sum to the rubric total.
    /// Under [`SkipPolicy::Zero`] weights are kept and skipped criteria contribute nothing.
    pub fn aggregate(rubric: &RubricConfig, results: Vec<SignalResult>) -> Vec<CriterionReport> {
        let mut grouped: Vec<(Criterion, Vec<SignalResult>)> =
            Criterion::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for result in results {
            let criterion = result.signal.criterion();
            if let Some((_, signals)) = grouped.iter_mut().find(|(c, _)| *c == criterion) {
                signals.push(result);
            }
        }

        let applicable_weight: f64 = grouped
            .iter()
            .filter(|(_, signals)| criterion_status(signals) != SignalStatus::Skipped)
            .map(|(c, _)| rubric.criteria.weight(*c))
            .sum();

        grouped
            .into_iter()
            .map(|(criterion, signals)| {
                let status = criterion_status(&signals);
                let weight = rubric.criteria.weight(criterion);
                let max_weight = rubric.criteria.max_weight(criterion);
                let effective_weight = match (rubric.skip_policy, status) {
                    (SkipPolicy::Redistribute, SignalStatus::Skipped) => 0.0,
                    (SkipPolicy::Redistribute, _) if applicable_weight > 0.0 => {
                        weight * rubric.total_weight / applicable_weight
                    }
                    (SkipPolicy::Redistribute, _) => 0.0,
                    (SkipPolicy::Zero, _) => weight,
                };

                let sub_score: f64 = signals
                    .iter()
                    .filter(|s| s.status != SignalStatus::Skipped)
                    .map(|s| s.sub_score)
                    .sum();
                let fraction = if max_weight > 0.0 {
                    (sub_score / max_weight).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let contribution = if status == SignalStatus::Skipped {
                    0.0
                } else {
                    fraction * effective_weight
                };

                CriterionReport {
                    criterion,
                    status,
                    weight,
                    effective_weight,
                    max_weight,
                    sub_score,
                    fraction,
                    contribution,
                    signals,
                }
            })
            .collect()
    }

    /// Sum of contributions normalized to 0-100
    pub fn final_score(criteria: &[CriterionReport], total_weight: f64) -> f64 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        let sum: f64 = criteria.iter().map(|c| c.contribution).sum();
        (sum * 100.0 / total_weight).clamp(0.0, 100.0)
    }

    /// Get a description of the grade
    pub fn grade_description(grade: Grade) -> &'static str {
        match grade {
            Grade::A => "Excellent - A confident, well-structured introduction",
            Grade::B => "Good - A solid introduction with room for polish",
            Grade::C => "Fair - Covers the basics but needs more work",
            Grade::D => "Poor - Several criteria need significant improvement",
            Grade::F => "Failing - The introduction needs major improvements",
        }
    }

    /// Get recommendations for criteria scoring below 60% of their maximum
    pub fn recommendations(criteria: &[CriterionReport]) -> Vec<String> {
        let mut recs: Vec<String> = criteria
            .iter()
            .filter(|c| c.status != SignalStatus::Skipped)
            .filter(|c| c.fraction < RECOMMENDATION_THRESHOLD)
            .map(|c| recommendation(c.criterion).to_string())
            .collect();

        if recs.is_empty() {
            recs.push("Strong delivery overall! Keep practising to stay consistent.".to_string());
        }

        recs
    }
}

fn recommendation(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::ContentAndStructure => {
            "Open with a greeting, cover your name, age, school, family and hobbies, and close with a thank-you"
        }
        Criterion::SpeechRate => "Pace yourself: aim for roughly 110-140 words per minute",
        Criterion::Grammar => "Review sentence structure; capitalize sentences and the pronoun \"I\"",
        Criterion::Vocabulary => "Use more varied words instead of repeating the same ones",
        Criterion::Clarity => "Cut filler words such as \"um\", \"like\" and \"you know\"",
        Criterion::Engagement => "Sound more enthusiastic: share what you enjoy and are proud of",
    }
}

/// Skipped if every signal was skipped, degraded if any was degraded
fn criterion_status(signals: &[SignalResult]) -> SignalStatus {
    if signals.is_empty() || signals.iter().all(|s| s.status == SignalStatus::Skipped) {
        SignalStatus::Skipped
    } else if signals.iter().any(|s| s.status == SignalStatus::Degraded) {
        SignalStatus::Degraded
    } else {
        SignalStatus::Scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawMetric, SignalKind};

    fn result(signal: SignalKind, status: SignalStatus, sub_score: f64, max_score: f64) -> SignalResult {
        SignalResult {
            signal,
            status,
            sub_score,
            max_score,
            raw: RawMetric::WordsPerMinute {
                wpm: None,
                band: None,
            },
            feedback: vec![],
        }
    }

    /// Every signal at full marks except speech rate, which is skipped
    fn full_marks_without_rate() -> Vec<SignalResult> {
        vec![
            result(SignalKind::Salutation, SignalStatus::Scored, 5.0, 5.0),
            result(SignalKind::Keywords, SignalStatus::Scored, 30.0, 30.0),
            result(SignalKind::Flow, SignalStatus::Scored, 5.0, 5.0),
            result(SignalKind::SpeechRate, SignalStatus::Skipped, 0.0, 10.0),
            result(SignalKind::Grammar, SignalStatus::Scored, 10.0, 10.0),
            result(SignalKind::Vocabulary, SignalStatus::Scored, 10.0, 10.0),
            result(SignalKind::Clarity, SignalStatus::Scored, 15.0, 15.0),
            result(SignalKind::Engagement, SignalStatus::Scored, 15.0, 15.0),
        ]
    }

    #[test]
    fn test_redistribution_arithmetic() {
        let rubric = RubricConfig::default();
        let criteria = ScoreCalculator::aggregate(&rubric, full_marks_without_rate());

        let content = &criteria[0];
        assert_eq!(content.criterion, Criterion::ContentAndStructure);
        // 40 * 100 / 90
        assert!((content.effective_weight - 44.444_444_444).abs() < 1e-6);

        let rate = criteria
            .iter()
            .find(|c| c.criterion == Criterion::SpeechRate)
            .unwrap();
        assert_eq!(rate.status, SignalStatus::Skipped);
        assert_eq!(rate.effective_weight, 0.0);

        let applied: f64 = criteria.iter().map(|c| c.effective_weight).sum();
        assert!((applied - 100.0).abs() < 1e-9);
        let score = ScoreCalculator::final_score(&criteria, rubric.total_weight);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_policy_keeps_weights() {
        let rubric = RubricConfig {
            skip_policy: SkipPolicy::Zero,
            ..RubricConfig::default()
        };
        let criteria = ScoreCalculator::aggregate(&rubric, full_marks_without_rate());
        assert_eq!(criteria[0].effective_weight, 40.0);
        let score = ScoreCalculator::final_score(&criteria, rubric.total_weight);
        assert!((score - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_scores() {
        let rubric = RubricConfig::default();
        let mut results = full_marks_without_rate();
        // keywords 3/4 and clarity halved
        results[1].sub_score = 22.5;
        results[6].sub_score = 7.5;
        let criteria = ScoreCalculator::aggregate(&rubric, results);

        let content = &criteria[0];
        assert!((content.sub_score - 32.5).abs() < 1e-9);
        assert!((content.fraction - 32.5 / 40.0).abs() < 1e-9);
        let expected_content = 32.5 / 40.0 * 40.0 * 100.0 / 90.0;
        assert!((content.contribution - expected_content).abs() < 1e-9);

        let clarity = criteria
            .iter()
            .find(|c| c.criterion == Criterion::Clarity)
            .unwrap();
        assert!((clarity.contribution - 0.5 * 15.0 * 100.0 / 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_degraded_status_propagates() {
        let rubric = RubricConfig::default();
        let mut results = full_marks_without_rate();
        results[4].status = SignalStatus::Degraded;
        let criteria = ScoreCalculator::aggregate(&rubric, results);
        let grammar = criteria
            .iter()
            .find(|c| c.criterion == Criterion::Grammar)
            .unwrap();
        assert_eq!(grammar.status, SignalStatus::Degraded);
        assert!(grammar.effective_weight > 0.0);
    }

    #[test]
    fn test_nothing_applicable_scores_zero() {
        let rubric = RubricConfig::default();
        let results = vec![result(SignalKind::SpeechRate, SignalStatus::Skipped, 0.0, 10.0)];
        let criteria = ScoreCalculator::aggregate(&rubric, results);
        assert!(criteria.iter().all(|c| c.status == SignalStatus::Skipped));
        assert_eq!(ScoreCalculator::final_score(&criteria, 100.0), 0.0);
    }

    #[test]
    fn test_recommendations() {
        let rubric = RubricConfig::default();
        let mut results = full_marks_without_rate();
        results[6].sub_score = 3.0;
        let criteria = ScoreCalculator::aggregate(&rubric, results);
        let recs = ScoreCalculator::recommendations(&criteria);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("filler"));
    }

    #[test]
    fn test_no_recommendations_when_strong() {
        let rubric = RubricConfig::default();
        let criteria = ScoreCalculator::aggregate(&rubric, full_marks_without_rate());
        let recs = ScoreCalculator::recommendations(&criteria);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("Strong delivery"));
    }

    #[test]
    fn test_grade_description() {
        assert!(ScoreCalculator::grade_description(Grade::A).starts_with("Excellent"));
        assert!(ScoreCalculator::grade_description(Grade::F).starts_with("Failing"));
    }
}
