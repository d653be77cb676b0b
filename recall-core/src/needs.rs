//! Needs-diff interpretation.
//!
//! Turns a [`NeedsDiff`] into qualitative phrases. Two independent
//! vocabularies exist:
//!
//! - **Verbose** — one first-person sentence per need, always all four,
//!   used to fill LLM prompt templates.
//! - **Terse** — short "feeling ..." fragments, split into an improvement
//!   group (`delta < 0`) and a worsening group (`delta >= 0`), used by the
//!   rule-based feedback text. Needs without a qualifying effect are
//!   simply absent.

use crate::types::{Need, NeedsDiff};

// ---------------------------------------------------------------------------
// Verbose mode
// ---------------------------------------------------------------------------

/// Five-tier classification of a single delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `delta <= -10`
    MuchLess,
    /// `-10 < delta < 0`
    BitLess,
    /// `delta == 0`
    Unchanged,
    /// `0 < delta < 10`
    BitMore,
    /// `delta >= 10`
    MuchMore,
}

impl Tier {
    /// Classify a delta.
    #[must_use]
    pub fn of(delta: i32) -> Self {
        match delta {
            d if d <= -10 => Self::MuchLess,
            d if d < 0 => Self::BitLess,
            0 => Self::Unchanged,
            d if d < 10 => Self::BitMore,
            _ => Self::MuchMore,
        }
    }
}

/// Verbose phrase for one need at one tier.
#[must_use]
pub fn verbose_phrase(need: Need, tier: Tier) -> &'static str {
    use Tier::{BitLess, BitMore, MuchLess, MuchMore, Unchanged};
    match (need, tier) {
        (Need::Hunger, MuchLess) => "I feel much less hungry now.",
        (Need::Hunger, BitLess) => "I feel a bit less hungry.",
        (Need::Hunger, Unchanged) => "My hunger didn't change.",
        (Need::Hunger, BitMore) => "I feel a bit more hungry.",
        (Need::Hunger, MuchMore) => "I feel much more hungry now.",

        (Need::Sleepiness, MuchLess) => "I feel much more awake now.",
        (Need::Sleepiness, BitLess) => "I feel a bit more awake.",
        (Need::Sleepiness, Unchanged) => "My sleepiness didn't change.",
        (Need::Sleepiness, BitMore) => "I feel a bit more sleepy.",
        (Need::Sleepiness, MuchMore) => "I feel much more sleepy now.",

        (Need::Loneliness, MuchLess) => "I feel much less lonely now.",
        (Need::Loneliness, BitLess) => "I feel a bit less lonely.",
        (Need::Loneliness, Unchanged) => "My loneliness didn't change.",
        (Need::Loneliness, BitMore) => "I feel a bit more lonely.",
        (Need::Loneliness, MuchMore) => "I feel much more lonely now.",

        (Need::Stress, MuchLess) => "I feel much less stressed now.",
        (Need::Stress, BitLess) => "I feel a bit less stressed.",
        (Need::Stress, Unchanged) => "My stress level didn't change.",
        (Need::Stress, BitMore) => "I feel a bit more stressed.",
        (Need::Stress, MuchMore) => "I feel much more stressed now.",
    }
}

/// Verbose interpretation of every need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedInterpretations {
    /// Hunger sentence.
    pub hunger: &'static str,
    /// Sleepiness sentence.
    pub sleepiness: &'static str,
    /// Loneliness sentence.
    pub loneliness: &'static str,
    /// Stress sentence.
    pub stress: &'static str,
}

impl NeedInterpretations {
    /// Sentence for a single need.
    #[must_use]
    pub fn get(&self, need: Need) -> &'static str {
        match need {
            Need::Hunger => self.hunger,
            Need::Sleepiness => self.sleepiness,
            Need::Loneliness => self.loneliness,
            Need::Stress => self.stress,
        }
    }
}

/// Interpret every need of `diff` in verbose mode.
#[must_use]
pub fn interpret_verbose(diff: &NeedsDiff) -> NeedInterpretations {
    let phrase = |need| verbose_phrase(need, Tier::of(diff.get(need)));
    NeedInterpretations {
        hunger: phrase(Need::Hunger),
        sleepiness: phrase(Need::Sleepiness),
        loneliness: phrase(Need::Loneliness),
        stress: phrase(Need::Stress),
    }
}

// ---------------------------------------------------------------------------
// Terse mode
// ---------------------------------------------------------------------------

/// Terse effect phrases, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedEffects {
    /// Needs that got better (`delta < 0`) and crossed a threshold.
    pub positive: Vec<&'static str>,
    /// Needs that got worse (`delta >= 0`) and crossed a threshold.
    pub negative: Vec<&'static str>,
}

impl NeedEffects {
    /// Whether neither group produced a phrase.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Improvement phrase for a need whose delta is negative.
fn improvement_phrase(need: Need, delta: i32) -> Option<&'static str> {
    match need {
        Need::Hunger => strong_or_mild(delta, -40, -20, "much less hungry", "a bit less hungry"),
        Need::Sleepiness => strong_or_mild(delta, -40, -20, "much less sleepy", "a bit less sleepy"),
        Need::Loneliness => strong_or_mild(delta, -10, 0, "much less lonely", "a bit less lonely"),
        Need::Stress => strong_or_mild(delta, -40, -20, "much less stressed", "a bit less stressed"),
    }
}

/// `delta <= strong` gives the strong phrase, `delta < mild` the mild one.
fn strong_or_mild(
    delta: i32,
    strong: i32,
    mild: i32,
    strong_phrase: &'static str,
    mild_phrase: &'static str,
) -> Option<&'static str> {
    if delta <= strong {
        Some(strong_phrase)
    } else if delta < mild {
        Some(mild_phrase)
    } else {
        None
    }
}

/// Worsening phrase for a need whose delta is zero or positive.
///
/// The stress labels are inverted relative to their thresholds; that is the
/// vocabulary downstream consumers were tuned against, so it is kept.
fn worsening_phrase(need: Need, delta: i32) -> Option<&'static str> {
    match need {
        Need::Hunger => (delta >= 10).then_some("this is Inedible"),
        Need::Sleepiness => above(delta, 10, 0, "a bit more tired", "that is so tired"),
        Need::Loneliness => above(delta, 10, 0, "much more lonely", "a bit more lonely"),
        Need::Stress => above(delta, 30, 10, "a bit more stressed", "much more stressed"),
    }
}

/// `delta > high` gives the first phrase, `delta > low` the second.
fn above(
    delta: i32,
    high: i32,
    low: i32,
    high_phrase: &'static str,
    low_phrase: &'static str,
) -> Option<&'static str> {
    if delta > high {
        Some(high_phrase)
    } else if delta > low {
        Some(low_phrase)
    } else {
        None
    }
}

/// Interpret `diff` in terse mode.
#[must_use]
pub fn interpret_terse(diff: &NeedsDiff) -> NeedEffects {
    let mut effects = NeedEffects::default();
    for (need, delta) in diff.iter() {
        if delta < 0 {
            effects.positive.extend(improvement_phrase(need, delta));
        } else {
            effects.negative.extend(worsening_phrase(need, delta));
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(hunger: i32, sleepiness: i32, loneliness: i32, stress: i32) -> NeedsDiff {
        NeedsDiff { hunger, sleepiness, loneliness, stress }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::of(-10), Tier::MuchLess);
        assert_eq!(Tier::of(-9), Tier::BitLess);
        assert_eq!(Tier::of(0), Tier::Unchanged);
        assert_eq!(Tier::of(9), Tier::BitMore);
        assert_eq!(Tier::of(10), Tier::MuchMore);
    }

    #[test]
    fn verbose_all_unchanged() {
        let v = interpret_verbose(&NeedsDiff::default());
        assert_eq!(v.hunger, "My hunger didn't change.");
        assert_eq!(v.sleepiness, "My sleepiness didn't change.");
        assert_eq!(v.loneliness, "My loneliness didn't change.");
        assert_eq!(v.stress, "My stress level didn't change.");
    }

    #[test]
    fn verbose_mixed() {
        let v = interpret_verbose(&diff(-45, 3, -2, 12));
        assert_eq!(v.get(Need::Hunger), "I feel much less hungry now.");
        assert_eq!(v.get(Need::Sleepiness), "I feel a bit more sleepy.");
        assert_eq!(v.get(Need::Loneliness), "I feel a bit less lonely.");
        assert_eq!(v.get(Need::Stress), "I feel much more stressed now.");
    }

    #[test]
    fn terse_unchanged_is_empty() {
        assert!(interpret_terse(&NeedsDiff::default()).is_empty());
    }

    #[test]
    fn terse_improvements_respect_thresholds() {
        let e = interpret_terse(&diff(-45, -25, -5, -20));
        assert_eq!(e.positive, vec!["much less hungry", "a bit less sleepy", "a bit less lonely"]);
        assert!(e.negative.is_empty());
    }

    #[test]
    fn terse_small_improvements_are_silent() {
        let e = interpret_terse(&diff(-19, -1, 0, -20));
        assert!(e.positive.is_empty());
    }

    #[test]
    fn terse_worsening() {
        let e = interpret_terse(&diff(10, 11, 4, 31));
        assert_eq!(
            e.negative,
            vec!["this is Inedible", "a bit more tired", "a bit more lonely", "a bit more stressed"]
        );

        let e = interpret_terse(&diff(9, 10, 11, 11));
        assert_eq!(e.negative, vec!["that is so tired", "much more lonely", "much more stressed"]);
    }
}
