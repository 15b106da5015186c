//! Words per minute

use super::{scored, Signal, SignalContext};
use crate::config::{RateBand, SpeechRateRules};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

pub struct SpeechRateSignal {
    bands: Vec<RateBand>,
    max_score: f64,
}

/// WPM from a word count and a positive duration in seconds
pub fn words_per_minute(words: usize, duration_seconds: f64) -> f64 {
    words as f64 / (duration_seconds / 60.0)
}

impl SpeechRateSignal {
    pub fn new(rules: &SpeechRateRules) -> Self {
        Self {
            bands: rules.bands.clone(),
            max_score: rules.max_score,
        }
    }

    /// First band, in rubric order, containing `wpm`
    pub fn band_for(&self, wpm: f64) -> Option<&RateBand> {
        self.bands.iter().find(|b| b.contains(wpm))
    }

    fn best_band(&self) -> Option<&RateBand> {
        self.bands
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

fn describe_range(band: &RateBand) -> String {
    match (band.min_wpm, band.max_wpm) {
        (Some(min), Some(max)) => format!("{:.0}-{:.0} WPM", min, max),
        (Some(min), None) => format!("{:.0}+ WPM", min),
        (None, Some(max)) => format!("up to {:.0} WPM", max),
        (None, None) => "any rate".to_string(),
    }
}

impl Signal for SpeechRateSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::SpeechRate
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let Some(duration) = ctx.duration_seconds else {
            tracing::debug!("no duration supplied, speech rate not applicable");
            return scored(
                SignalKind::SpeechRate,
                SignalStatus::Skipped,
                0.0,
                self.max_score,
                RawMetric::WordsPerMinute {
                    wpm: None,
                    band: None,
                },
                vec!["Speech rate not applicable: no duration was provided.".to_string()],
            );
        };

        let wpm = words_per_minute(ctx.transcript.word_count(), duration);
        let band = self.band_for(wpm);
        let sub_score = band.map(|b| b.score).unwrap_or(0.0);

        let mut feedback = vec![match band {
            Some(b) => format!("Speaking rate {:.1} WPM: {}.", wpm, b.label),
            None => format!("Speaking rate {:.1} WPM is outside every configured band.", wpm),
        }];
        if let Some(best) = self.best_band() {
            if sub_score < best.score {
                feedback.push(format!(
                    "Aim for the {} range ({}).",
                    best.label,
                    describe_range(best)
                ));
            }
        }

        scored(
            SignalKind::SpeechRate,
            SignalStatus::Scored,
            sub_score,
            self.max_score,
            RawMetric::WordsPerMinute {
                wpm: Some(wpm),
                band: band.map(|b| b.label.clone()),
            },
            feedback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::signals::KeywordMatches;
    use crate::config::Criteria;
    use crate::nlp::LanguageServices;
    use crate::text::Transcript;

    fn signal() -> SpeechRateSignal {
        SpeechRateSignal::new(&Criteria::default().speech_rate)
    }

    fn label(wpm: f64) -> Option<String> {
        signal().band_for(wpm).map(|b| b.label.clone())
    }

    #[test]
    fn test_default_bands() {
        assert_eq!(label(111.0).as_deref(), Some("ideal"));
        assert_eq!(label(140.0).as_deref(), Some("ideal"));
        assert_eq!(label(110.5).as_deref(), Some("slow"));
        assert_eq!(label(80.0).as_deref(), Some("slow"));
        assert_eq!(label(150.0).as_deref(), Some("fast"));
        assert_eq!(label(160.0).as_deref(), Some("fast"));
        assert_eq!(label(79.9).as_deref(), Some("too slow"));
        assert_eq!(label(160.1).as_deref(), Some("too fast"));
    }

    #[test]
    fn test_185_words_in_a_minute_is_too_fast() {
        let text = vec!["word"; 185].join(" ");
        let transcript = Transcript::new(&text);
        let services = LanguageServices::builtin();
        let keywords = KeywordMatches::default();
        let ctx = SignalContext {
            transcript: &transcript,
            duration_seconds: Some(60.0),
            services: &services,
            salutation: None,
            keywords: &keywords,
        };
        let result = signal().evaluate(&ctx);
        assert_eq!(
            result.raw,
            RawMetric::WordsPerMinute {
                wpm: Some(185.0),
                band: Some("too fast".to_string())
            }
        );
        assert_eq!(result.sub_score, 2.0);
        assert_eq!(result.feedback[0], "Speaking rate 185.0 WPM: too fast.");
        assert_eq!(result.feedback[1], "Aim for the ideal range (111-140 WPM).");
    }

    #[test]
    fn test_missing_duration_is_skipped() {
        let transcript = Transcript::new("Hello there.");
        let services = LanguageServices::builtin();
        let keywords = KeywordMatches::default();
        let ctx = SignalContext {
            transcript: &transcript,
            duration_seconds: None,
            services: &services,
            salutation: None,
            keywords: &keywords,
        };
        let result = signal().evaluate(&ctx);
        assert_eq!(result.status, SignalStatus::Skipped);
        assert_eq!(result.sub_score, 0.0);
    }

    #[test]
    fn test_wpm() {
        assert_eq!(words_per_minute(150, 90.0), 100.0);
    }
}
