//! Discourse order: salutation, then body, then closing

use super::{compile_phrases, scored, Signal, SignalContext};
use crate::config::FlowRules;
use crate::text::{first_match, Phrase};
use crate::{RawMetric, SignalKind, SignalResult, SignalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Salutation,
    Body,
    Closing,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Salutation => "salutation",
            Section::Body => "body",
            Section::Closing => "closing",
        }
    }
}

/// Outcome of the order check
#[derive(Debug, Clone, Copy, PartialEq)]
enum FlowVerdict {
    /// Salutation and closing present, everything in order
    Complete,
    /// In order, but salutation or closing absent
    Partial,
    /// `later` section appears before `earlier`
    Violated { earlier: Section, later: Section },
    /// No section found at all
    Empty,
}

pub struct FlowSignal {
    closing: Vec<Phrase>,
    partial_credit: f64,
    violation_credit: f64,
    max_score: f64,
}

impl FlowSignal {
    pub fn new(rules: &FlowRules) -> Self {
        Self {
            closing: compile_phrases(&rules.closing_phrases),
            partial_credit: rules.partial_credit,
            violation_credit: rules.violation_credit,
            max_score: rules.max_score,
        }
    }

    pub fn closing_position(&self, words: &[String]) -> Option<usize> {
        first_match(&self.closing, words).map(|(pos, _)| pos)
    }
}

fn verdict(salutation: Option<usize>, body: Option<usize>, closing: Option<usize>) -> FlowVerdict {
    let present: Vec<(Section, usize)> = [
        (Section::Salutation, salutation),
        (Section::Body, body),
        (Section::Closing, closing),
    ]
    .into_iter()
    .filter_map(|(section, pos)| pos.map(|p| (section, p)))
    .collect();

    if present.is_empty() {
        return FlowVerdict::Empty;
    }
    for (i, &(earlier, earlier_at)) in present.iter().enumerate() {
        if let Some(&(later, _)) = present[i + 1..].iter().find(|(_, at)| *at < earlier_at) {
            return FlowVerdict::Violated { earlier, later };
        }
    }
    if salutation.is_some() && closing.is_some() {
        FlowVerdict::Complete
    } else {
        FlowVerdict::Partial
    }
}

impl Signal for FlowSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Flow
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalResult {
        let salutation_at = ctx.salutation.map(|m| m.position);
        let body_at = ctx.keywords.first_position();
        let closing_at = self.closing_position(ctx.transcript.words());

        let verdict = verdict(salutation_at, body_at, closing_at);
        let (credit, feedback) = match verdict {
            FlowVerdict::Complete => (
                1.0,
                "Speech follows the expected flow: salutation, body, closing.".to_string(),
            ),
            FlowVerdict::Partial => {
                let missing: Vec<&str> = [
                    salutation_at.is_none().then_some("salutation"),
                    closing_at.is_none().then_some("closing"),
                ]
                .into_iter()
                .flatten()
                .collect();
                (
                    self.partial_credit,
                    format!(
                        "Order is consistent but the {} is missing.",
                        missing.join(" and ")
                    ),
                )
            }
            FlowVerdict::Violated { earlier, later } => (
                self.violation_credit,
                format!(
                    "Speech does not follow the expected flow: the {} comes before the {}.",
                    later.name(),
                    earlier.name()
                ),
            ),
            FlowVerdict::Empty => (
                0.0,
                "No salutation, body topics or closing detected; flow cannot be assessed."
                    .to_string(),
            ),
        };

        scored(
            SignalKind::Flow,
            SignalStatus::Scored,
            credit * self.max_score,
            self.max_score,
            RawMetric::FlowOrder {
                follows_expected_flow: matches!(verdict, FlowVerdict::Complete),
                salutation_at,
                body_at,
                closing_at,
            },
            vec![feedback],
        )
    }
}
