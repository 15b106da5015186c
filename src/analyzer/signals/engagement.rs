//! Engagement via sentiment polarity

use super::{scored, Signal, SignalContext};
use crate::config::{EngagementRules, ScoreCurve, SentimentAggregate};
use crate::nlp::Sentiment;
use crate::{RawMetric, ServiceError, SignalKind, SignalResult, SignalStatus};

pub struct EngagementSignal {
    aggregate: SentimentAggregate,
    curve: ScoreCurve,
    fallback_fraction: f64,
    max_score: f64,
}

impl EngagementSignal {
    pub fn new(rules: &EngagementRules) -> Self {
        Self {
            aggregate: rules.aggregate,
            curve: rules.curve.clone(),
            fallback_fraction: rules.fallback_fraction,
            max_score: rules.max_score,
        }
    }

    fn sentiment(&self, ctx: &SignalContext<'_>) -> Result<Sentiment, ServiceError> {
        if ctx.transcript.is_empty() {
            return Ok(Sentiment::neutral());
        }
        match self.aggregate {
            SentimentAggregate::Document => ctx.services.analyze_sentiment(ctx.transcript.raw()),
            SentimentAggregate::SentenceMean => {
                let per_sentence = ctx.services.analyze_sentences(ctx.transcript.sentences())?;
                Ok(Sentiment::mean(&per_sentence))
            }
        }
    }
}

impl Signal for EngagementSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Engagement
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        match self.sentiment(ctx) {
            Ok(sentiment) => {
                let sub_score = self.curve.score(sentiment.polarity);
                let mut feedback = vec![format!(
                    "Tone is {} (polarity {:.2}).",
                    sentiment.label, sentiment.polarity
                )];
                if ctx.transcript.is_empty() {
                    feedback.push("No text to analyze; tone treated as neutral.".to_string());
                } else if sub_score < self.max_score * 0.6 {
                    feedback.push(
                        "Show more enthusiasm: mention what you enjoy or are proud of.".to_string(),
                    );
                }
                scored(
                    SignalKind::Engagement,
                    SignalStatus::Scored,
                    sub_score,
                    self.max_score,
                    RawMetric::Sentiment {
                        polarity: Some(sentiment.polarity),
                        positive: Some(sentiment.positive),
                        label: Some(sentiment.label),
                    },
                    feedback,
                )
            }
            Err(e) => {
                tracing::warn!(
                    analyzer = ctx.services.sentiment_name(),
                    error = %e,
                    "sentiment analysis failed, using fallback score"
                );
                let fallback = self.fallback_fraction * self.max_score;
                scored(
                    SignalKind::Engagement,
                    SignalStatus::Degraded,
                    fallback,
                    self.max_score,
                    RawMetric::Sentiment {
                        polarity: None,
                        positive: None,
                        label: None,
                    },
                    vec![format!(
                        "Sentiment analysis was skipped ({} {}); a neutral score of {:.1} was used.",
                        ctx.services.sentiment_name(),
                        e,
                        fallback
                    )],
                )
            }
        }
    }
}
