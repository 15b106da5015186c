//! Rubric schema and deserialization

use crate::text::Phrase;
use crate::{ConfigError, Criterion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TOTAL_WEIGHT: f64 = 100.0;

/// What happens to a criterion's weight when none of its signals apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    /// Drop the criterion from the denominator and share its weight proportionally
    /// among the applicable criteria
    #[default]
    Redistribute,
    /// Keep the weight and score the criterion as zero
    Zero,
}

impl std::fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipPolicy::Redistribute => write!(f, "redistribute"),
            SkipPolicy::Zero => write!(f, "zero"),
        }
    }
}

/// How sentiment is computed over a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SentimentAggregate {
    /// One analyzer call over the full text
    #[default]
    Document,
    /// One call per sentence, averaged
    SentenceMean,
}

/// A threshold in a stepped curve: values `>= min` score `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveBand {
    pub min: f64,
    pub score: f64,
}

/// Maps a raw metric onto a sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScoreCurve {
    /// Highest band whose `min` the value reaches; `floor` below every band
    Stepped { bands: Vec<CurveBand>, floor: f64 },
    /// `min_score` at or below `low`, `max_score` at or above `high`, linear between
    Linear {
        low: f64,
        high: f64,
        min_score: f64,
        max_score: f64,
    },
}

impl ScoreCurve {
    pub fn score(&self, value: f64) -> f64 {
        match self {
            ScoreCurve::Stepped { bands, floor } => bands
                .iter()
                .filter(|b| value >= b.min)
                .max_by(|a, b| a.min.total_cmp(&b.min))
                .map(|b| b.score)
                .unwrap_or(*floor),
            ScoreCurve::Linear {
                low,
                high,
                min_score,
                max_score,
            } => {
                if value <= *low {
                    *min_score
                } else if value >= *high {
                    *max_score
                } else {
                    min_score + (max_score - min_score) * (value - low) / (high - low)
                }
            }
        }
    }

    /// Every score the curve can produce
    pub(crate) fn scores(&self) -> Vec<f64> {
        match self {
            ScoreCurve::Stepped { bands, floor } => {
                let mut out: Vec<f64> = bands.iter().map(|b| b.score).collect();
                out.push(*floor);
                out
            }
            ScoreCurve::Linear {
                min_score,
                max_score,
                ..
            } => vec![*min_score, *max_score],
        }
    }

    fn stepped(bands: &[(f64, f64)], floor: f64) -> Self {
        ScoreCurve::Stepped {
            bands: bands
                .iter()
                .map(|&(min, score)| CurveBand { min, score })
                .collect(),
            floor,
        }
    }
}

/// One salutation quality tier (e.g. "excellent")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalutationTier {
    pub label: String,
    pub score: f64,
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SalutationRules {
    #[serde(default = "default_salutation_max")]
    pub max_score: f64,
    /// Checked in order; the first tier with a matching phrase wins
    #[serde(default = "default_salutation_tiers")]
    pub tiers: Vec<SalutationTier>,
    #[serde(default)]
    pub none_score: f64,
}

impl Default for SalutationRules {
    fn default() -> Self {
        Self {
            max_score: default_salutation_max(),
            tiers: default_salutation_tiers(),
            none_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeywordRules {
    #[serde(default = "default_keyword_max")]
    pub max_score: f64,
    /// Below this many matched categories, feedback flags insufficient matches
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            max_score: default_keyword_max(),
            min_matches: default_min_matches(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlowRules {
    #[serde(default = "default_flow_max")]
    pub max_score: f64,
    /// Fraction of max awarded when order holds but salutation or closing is missing
    #[serde(default = "default_partial_credit")]
    pub partial_credit: f64,
    /// Fraction of max awarded when the observed order is wrong
    #[serde(default)]
    pub violation_credit: f64,
    #[serde(default = "default_closing_phrases")]
    pub closing_phrases: Vec<String>,
}

impl Default for FlowRules {
    fn default() -> Self {
        Self {
            max_score: default_flow_max(),
            partial_credit: default_partial_credit(),
            violation_credit: 0.0,
            closing_phrases: default_closing_phrases(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentRules {
    pub weight: f64,
    #[serde(default)]
    pub salutation: SalutationRules,
    #[serde(default)]
    pub keywords: KeywordRules,
    #[serde(default)]
    pub flow: FlowRules,
}

/// Inclusive WPM range; a missing bound is open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBand {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_wpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wpm: Option<f64>,
    pub score: f64,
}

impl RateBand {
    pub fn contains(&self, wpm: f64) -> bool {
        self.min_wpm.map_or(true, |min| wpm >= min) && self.max_wpm.map_or(true, |max| wpm <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpeechRateRules {
    pub weight: f64,
    #[serde(default = "default_rate_max")]
    pub max_score: f64,
    /// Checked in order; the first band containing the WPM wins
    #[serde(default = "default_rate_bands")]
    pub bands: Vec<RateBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrammarRules {
    pub weight: f64,
    #[serde(default = "default_grammar_max")]
    pub max_score: f64,
    /// Points lost per issue per 100 words
    #[serde(default = "default_penalty_per_issue")]
    pub penalty_per_issue: f64,
    /// Fraction of max used when the grammar checker is unavailable
    #[serde(default = "default_fallback_fraction")]
    pub fallback_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VocabularyRules {
    pub weight: f64,
    #[serde(default = "default_vocabulary_max")]
    pub max_score: f64,
    #[serde(default = "default_vocabulary_curve")]
    pub curve: ScoreCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClarityRules {
    pub weight: f64,
    #[serde(default = "default_clarity_max")]
    pub max_score: f64,
    /// Points lost per filler per 100 words
    #[serde(default = "default_penalty_per_filler")]
    pub penalty_per_filler: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngagementRules {
    pub weight: f64,
    #[serde(default = "default_engagement_max")]
    pub max_score: f64,
    #[serde(default)]
    pub aggregate: SentimentAggregate,
    /// Maps polarity in [-1, 1] onto a sub-score
    #[serde(default = "default_engagement_curve")]
    pub curve: ScoreCurve,
    /// Fraction of max used when the sentiment analyzer is unavailable
    #[serde(default = "default_fallback_fraction")]
    pub fallback_fraction: f64,
}

/// Every top-level criterion the engine scores. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Criteria {
    pub content_and_structure: ContentRules,
    pub speech_rate: SpeechRateRules,
    pub grammar: GrammarRules,
    pub vocabulary: VocabularyRules,
    pub clarity: ClarityRules,
    pub engagement: EngagementRules,
}

impl Criteria {
    pub fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::ContentAndStructure => self.content_and_structure.weight,
            Criterion::SpeechRate => self.speech_rate.weight,
            Criterion::Grammar => self.grammar.weight,
            Criterion::Vocabulary => self.vocabulary.weight,
            Criterion::Clarity => self.clarity.weight,
            Criterion::Engagement => self.engagement.weight,
        }
    }

    /// Denominator of the criterion's sub-score: the sum of its signals' maxima
    pub fn max_weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::ContentAndStructure => {
                let c = &self.content_and_structure;
                c.salutation.max_score + c.keywords.max_score + c.flow.max_score
            }
            Criterion::SpeechRate => self.speech_rate.max_score,
            Criterion::Grammar => self.grammar.max_score,
            Criterion::Vocabulary => self.vocabulary.max_score,
            Criterion::Clarity => self.clarity.max_score,
            Criterion::Engagement => self.engagement.max_score,
        }
    }

    pub fn total_weight(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.weight(*c)).sum()
    }
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            content_and_structure: ContentRules {
                weight: 40.0,
                salutation: SalutationRules::default(),
                keywords: KeywordRules::default(),
                flow: FlowRules::default(),
            },
            speech_rate: SpeechRateRules {
                weight: 10.0,
                max_score: default_rate_max(),
                bands: default_rate_bands(),
            },
            grammar: GrammarRules {
                weight: 10.0,
                max_score: default_grammar_max(),
                penalty_per_issue: default_penalty_per_issue(),
                fallback_fraction: default_fallback_fraction(),
            },
            vocabulary: VocabularyRules {
                weight: 10.0,
                max_score: default_vocabulary_max(),
                curve: default_vocabulary_curve(),
            },
            clarity: ClarityRules {
                weight: 15.0,
                max_score: default_clarity_max(),
                penalty_per_filler: default_penalty_per_filler(),
            },
            engagement: EngagementRules {
                weight: 15.0,
                max_score: default_engagement_max(),
                aggregate: SentimentAggregate::Document,
                curve: default_engagement_curve(),
                fallback_fraction: default_fallback_fraction(),
            },
        }
    }
}

/// Root rubric document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricConfig {
    /// Base rubric file this one extends (resolved at load time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Sum the criterion weights must reach
    #[serde(default = "default_total_weight")]
    pub total_weight: f64,

    /// Minimum passing score for the CLI (exit 1 if below)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,

    #[serde(default)]
    pub skip_policy: SkipPolicy,

    pub criteria: Criteria,

    /// Required topic categories, each with its accepted synonyms
    pub keywords: BTreeMap<String, Vec<String>>,

    /// Filler words and phrases penalized under clarity
    pub fillers: Vec<String>,
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            extends: None,
            total_weight: DEFAULT_TOTAL_WEIGHT,
            threshold: None,
            skip_policy: SkipPolicy::Redistribute,
            criteria: Criteria::default(),
            keywords: default_keywords(),
            fillers: default_fillers(),
        }
    }
}

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl RubricConfig {
    /// Check the invariants scoring relies on. Called once at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.total_weight.is_finite() && self.total_weight > 0.0) {
            return Err(ConfigError::invalid("totalWeight", "must be a positive number"));
        }
        if let Some(t) = self.threshold {
            if t > 100 {
                return Err(ConfigError::invalid("threshold", "must be between 0 and 100"));
            }
        }

        for criterion in Criterion::ALL {
            let weight = self.criteria.weight(criterion);
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ConfigError::invalid(
                    format!("criteria.{}.weight", criterion.key()),
                    "must be a non-negative number",
                ));
            }
        }
        let actual = self.criteria.total_weight();
        if (actual - self.total_weight).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum {
                expected: self.total_weight,
                actual,
            });
        }

        self.validate_content()?;
        self.validate_speech_rate()?;

        let g = &self.criteria.grammar;
        check_max("criteria.grammar.maxScore", g.max_score)?;
        check_non_negative("criteria.grammar.penaltyPerIssue", g.penalty_per_issue)?;
        check_fraction("criteria.grammar.fallbackFraction", g.fallback_fraction)?;

        let v = &self.criteria.vocabulary;
        check_max("criteria.vocabulary.maxScore", v.max_score)?;
        check_curve("criteria.vocabulary.curve", &v.curve, v.max_score)?;

        let c = &self.criteria.clarity;
        check_max("criteria.clarity.maxScore", c.max_score)?;
        check_non_negative("criteria.clarity.penaltyPerFiller", c.penalty_per_filler)?;

        let e = &self.criteria.engagement;
        check_max("criteria.engagement.maxScore", e.max_score)?;
        check_curve("criteria.engagement.curve", &e.curve, e.max_score)?;
        check_fraction("criteria.engagement.fallbackFraction", e.fallback_fraction)?;

        if self.fillers.iter().any(|f| is_blank(f)) {
            return Err(ConfigError::invalid("fillers", "entries must contain a word"));
        }
        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        let content = &self.criteria.content_and_structure;

        let s = &content.salutation;
        check_max("criteria.contentAndStructure.salutation.maxScore", s.max_score)?;
        check_score(
            "criteria.contentAndStructure.salutation.noneScore",
            s.none_score,
            s.max_score,
        )?;
        for tier in &s.tiers {
            let field = format!("criteria.contentAndStructure.salutation.tiers.{}", tier.label);
            check_score(&field, tier.score, s.max_score)?;
            if tier.phrases.is_empty() || tier.phrases.iter().any(|p| is_blank(p)) {
                return Err(ConfigError::invalid(field, "phrases must be non-empty words"));
            }
        }

        let k = &content.keywords;
        check_max("criteria.contentAndStructure.keywords.maxScore", k.max_score)?;
        if self.keywords.is_empty() {
            return Err(ConfigError::invalid("keywords", "at least one category is required"));
        }
        for (category, synonyms) in &self.keywords {
            if synonyms.is_empty() || synonyms.iter().any(|s| is_blank(s)) {
                return Err(ConfigError::invalid(
                    format!("keywords.{}", category),
                    "synonyms must be non-empty",
                ));
            }
        }
        if k.min_matches > self.keywords.len() {
            return Err(ConfigError::invalid(
                "criteria.contentAndStructure.keywords.minMatches",
                format!(
                    "{} exceeds the {} configured categories",
                    k.min_matches,
                    self.keywords.len()
                ),
            ));
        }

        let f = &content.flow;
        check_max("criteria.contentAndStructure.flow.maxScore", f.max_score)?;
        check_fraction("criteria.contentAndStructure.flow.partialCredit", f.partial_credit)?;
        check_fraction(
            "criteria.contentAndStructure.flow.violationCredit",
            f.violation_credit,
        )?;
        if f.closing_phrases.iter().any(|p| is_blank(p)) {
            return Err(ConfigError::invalid(
                "criteria.contentAndStructure.flow.closingPhrases",
                "entries must contain a word",
            ));
        }
        Ok(())
    }

    fn validate_speech_rate(&self) -> Result<(), ConfigError> {
        let rate = &self.criteria.speech_rate;
        check_max("criteria.speechRate.maxScore", rate.max_score)?;
        if rate.bands.is_empty() {
            return Err(ConfigError::invalid(
                "criteria.speechRate.bands",
                "at least one band is required",
            ));
        }
        for band in &rate.bands {
            let field = format!("criteria.speechRate.bands.{}", band.label);
            check_score(&field, band.score, rate.max_score)?;
            if let (Some(min), Some(max)) = (band.min_wpm, band.max_wpm) {
                if min > max {
                    return Err(ConfigError::invalid(field, "minWpm exceeds maxWpm"));
                }
            }
        }
        Ok(())
    }
}

/// A phrase with no word characters can never match a transcript
fn is_blank(phrase: &str) -> bool {
    Phrase::parse(phrase).is_none()
}

fn check_max(field: &str, max: f64) -> Result<(), ConfigError> {
    if max.is_finite() && max > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be greater than zero"))
    }
}

fn check_score(field: &str, score: f64, max: f64) -> Result<(), ConfigError> {
    if score.is_finite() && (0.0..=max).contains(&score) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("score {} is outside 0..={}", score, max),
        ))
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be between 0 and 1"))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a non-negative number"))
    }
}

fn check_curve(field: &str, curve: &ScoreCurve, max: f64) -> Result<(), ConfigError> {
    if let ScoreCurve::Stepped { bands, .. } = curve {
        if bands.is_empty() {
            return Err(ConfigError::invalid(field, "at least one band is required"));
        }
    }
    if let ScoreCurve::Linear { low, high, .. } = curve {
        if !(low < high) {
            return Err(ConfigError::invalid(field, "low must be less than high"));
        }
    }
    for score in curve.scores() {
        check_score(field, score, max)?;
    }
    Ok(())
}

fn default_total_weight() -> f64 {
    DEFAULT_TOTAL_WEIGHT
}

fn default_salutation_max() -> f64 {
    5.0
}

fn default_keyword_max() -> f64 {
    30.0
}

fn default_min_matches() -> usize {
    2
}

fn default_flow_max() -> f64 {
    5.0
}

fn default_partial_credit() -> f64 {
    0.5
}

fn default_rate_max() -> f64 {
    10.0
}

fn default_grammar_max() -> f64 {
    10.0
}

fn default_penalty_per_issue() -> f64 {
    1.0
}

fn default_fallback_fraction() -> f64 {
    0.5
}

fn default_vocabulary_max() -> f64 {
    10.0
}

fn default_clarity_max() -> f64 {
    15.0
}

fn default_penalty_per_filler() -> f64 {
    1.5
}

fn default_engagement_max() -> f64 {
    15.0
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_salutation_tiers() -> Vec<SalutationTier> {
    vec![
        SalutationTier {
            label: "excellent".to_string(),
            score: 5.0,
            phrases: strings(&[
                "excited to introduce",
                "pleasure to introduce",
                "feeling great",
                "thrilled to be here",
            ]),
        },
        SalutationTier {
            label: "good".to_string(),
            score: 4.0,
            phrases: strings(&[
                "good morning",
                "good afternoon",
                "good evening",
                "good day",
                "hello everyone",
                "hi everyone",
            ]),
        },
        SalutationTier {
            label: "normal".to_string(),
            score: 2.0,
            phrases: strings(&["hi", "hello", "hey"]),
        },
    ]
}

fn default_closing_phrases() -> Vec<String> {
    strings(&["thank you", "thanks", "that's all", "bye", "goodbye"])
}

fn default_rate_bands() -> Vec<RateBand> {
    let band = |label: &str, min: Option<f64>, max: Option<f64>, score: f64| RateBand {
        label: label.to_string(),
        min_wpm: min,
        max_wpm: max,
        score,
    };
    vec![
        band("ideal", Some(111.0), Some(140.0), 10.0),
        band("slow", Some(80.0), Some(111.0), 6.0),
        band("fast", Some(140.0), Some(160.0), 6.0),
        band("too slow", None, Some(80.0), 2.0),
        band("too fast", Some(160.0), None, 2.0),
    ]
}

fn default_vocabulary_curve() -> ScoreCurve {
    ScoreCurve::stepped(&[(0.9, 10.0), (0.7, 8.0), (0.5, 6.0), (0.3, 4.0)], 2.0)
}

fn default_engagement_curve() -> ScoreCurve {
    ScoreCurve::stepped(&[(0.6, 15.0), (0.2, 12.0), (-0.2, 7.5)], 3.0)
}

fn default_keywords() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert(
        "name".to_string(),
        strings(&["my name is", "myself", "i am called", "name"]),
    );
    map.insert(
        "age".to_string(),
        strings(&["years old", "year old", "age"]),
    );
    map.insert(
        "school".to_string(),
        strings(&["school", "class", "grade", "studying in", "student"]),
    );
    map.insert(
        "family".to_string(),
        strings(&["family", "parents", "father", "mother", "brother", "sister"]),
    );
    map.insert(
        "hobbies".to_string(),
        strings(&[
            "hobby",
            "hobbies",
            "interest",
            "interests",
            "enjoy",
            "like to",
            "love to",
            "passion",
        ]),
    );
    map
}

fn default_fillers() -> Vec<String> {
    strings(&[
        "um", "uh", "like", "you know", "so", "actually", "basically", "right", "i mean", "well",
        "kinda", "sort of", "okay", "hmm", "ah",
    ])
}
