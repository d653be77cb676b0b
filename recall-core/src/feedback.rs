//! Rule-based feedback text.
//!
//! Builds the feedback sentence for an attempted action from three
//! structured clauses (opening, positive effects, negative effects) and joins
//! them only at the end. No external calls, no randomness: identical inputs
//! always produce byte-identical text.

use crate::needs::{self, NeedEffects};
use crate::types::NeedsDiff;

/// What the agent tried to do and how it went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Action name (e.g. "eat").
    pub action: String,
    /// Interaction target (e.g. "apple").
    pub interactable: String,
    /// Location name (e.g. "kitchen").
    pub location: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Caller-supplied description of the failure (may be empty).
    pub failure_description: String,
}

/// Feedback text split into its clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedFeedback {
    /// `"I {action} {interactable}, "` on success, `"{description} "` on failure.
    pub opening: String,
    /// `" feeling ..."` for improvements, or empty.
    pub positive: String,
    /// Worsening clause, led by `" feeling "` or `", "`, or empty.
    pub negative: String,
}

impl ComposedFeedback {
    /// Full feedback sentence.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out =
            String::with_capacity(self.opening.len() + self.positive.len() + self.negative.len());
        out.push_str(&self.opening);
        out.push_str(&self.positive);
        out.push_str(&self.negative);
        out
    }

    /// The negative clause on its own (stored as `feedback_negative`).
    #[must_use]
    pub fn negative_text(&self) -> &str {
        &self.negative
    }
}

/// Join phrases as `a`, `a and b`, `a, b and c`.
#[must_use]
pub fn join_phrases(phrases: &[&str]) -> String {
    match phrases {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn opening_clause(outcome: &ActionOutcome) -> String {
    if outcome.success {
        format!("I {} {}, ", outcome.action, outcome.interactable)
    } else {
        // Failures are described by the caller; action/target are not repeated.
        format!("{} ", outcome.failure_description)
    }
}

fn positive_clause(effects: &NeedEffects) -> String {
    if effects.positive.is_empty() {
        String::new()
    } else {
        format!(" feeling {}", join_phrases(&effects.positive))
    }
}

fn negative_clause(effects: &NeedEffects, after_positive: bool) -> String {
    if effects.negative.is_empty() {
        return String::new();
    }
    let lead = if after_positive { ", " } else { " feeling " };
    format!("{lead}{}", join_phrases(&effects.negative))
}

/// Compose feedback from already-interpreted effects.
#[must_use]
pub fn compose_with_effects(outcome: &ActionOutcome, effects: &NeedEffects) -> ComposedFeedback {
    let opening = opening_clause(outcome);
    let positive = positive_clause(effects);
    let negative = negative_clause(effects, !positive.is_empty());
    ComposedFeedback { opening, positive, negative }
}

/// Compose feedback for an outcome and its needs diff.
#[must_use]
pub fn compose(outcome: &ActionOutcome, diff: &NeedsDiff) -> ComposedFeedback {
    compose_with_effects(outcome, &needs::interpret_terse(diff))
}
