//! Core type definitions for the RECALL record store.
//!
//! All types are serializable and map one-to-one onto the persisted JSON
//! layout of the agent store.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Identifier of a memory record within one agent's bucket.
///
/// Allocated ids are the decimal form of a non-negative integer. Ids supplied
/// by callers are stored verbatim, so non-numeric ids can exist in a bucket;
/// they are simply ignored by id allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Wrap an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the id for the given sequence number.
    #[must_use]
    pub fn from_number(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Parse the id as a sequence number, if it is one.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty string (i.e. "no id supplied").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// The fixed set of internal needs tracked for every agent.
///
/// For all four needs a negative delta is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Need {
    /// Hunger.
    Hunger,
    /// Sleepiness.
    Sleepiness,
    /// Loneliness.
    Loneliness,
    /// Stress.
    Stress,
}

impl Need {
    /// All needs, in the order phrases are emitted.
    pub const ALL: [Need; 4] = [Need::Hunger, Need::Sleepiness, Need::Loneliness, Need::Stress];

    /// Wire name of the need (as used in payloads and templates).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hunger => "hunger",
            Self::Sleepiness => "sleepiness",
            Self::Loneliness => "loneliness",
            Self::Stress => "stress",
        }
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed change in each need caused by an action's outcome.
///
/// Absent keys deserialize as 0; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsDiff {
    /// Change in hunger.
    pub hunger: i32,
    /// Change in sleepiness.
    pub sleepiness: i32,
    /// Change in loneliness.
    pub loneliness: i32,
    /// Change in stress.
    pub stress: i32,
}

impl NeedsDiff {
    /// Delta for a single need.
    #[must_use]
    pub fn get(&self, need: Need) -> i32 {
        match need {
            Need::Hunger => self.hunger,
            Need::Sleepiness => self.sleepiness,
            Need::Loneliness => self.loneliness,
            Need::Stress => self.stress,
        }
    }

    /// Iterate `(need, delta)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Need, i32)> + '_ {
        Need::ALL.into_iter().map(|need| (need, self.get(need)))
    }

    /// Whether every delta is zero.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.iter().all(|(_, d)| d == 0)
    }
}

// ---------------------------------------------------------------------------
// Importance
// ---------------------------------------------------------------------------

/// How significant a memory is, on an integer scale of 0–10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Importance(u8);

impl Importance {
    /// Upper bound of the scale.
    pub const MAX: u8 = 10;
    /// Value substituted when the caller supplies 0 or nothing.
    pub const DEFAULT: u8 = 8;

    /// Resolve a caller-requested importance with the standard bounds.
    ///
    /// `> 10` clamps to 10; `0`, absent, or negative becomes 8.
    #[must_use]
    pub fn from_request(requested: Option<i64>) -> Self {
        Self::resolve(requested, Self::DEFAULT, Self::MAX)
    }

    /// Resolve a caller-requested importance with explicit bounds.
    #[must_use]
    pub fn resolve(requested: Option<i64>, default: u8, max: u8) -> Self {
        let max = max.min(Self::MAX);
        match requested {
            Some(v) if v > i64::from(max) => Self(max),
            Some(v) if v > 0 => Self(u8::try_from(v).unwrap_or(max)),
            _ => Self(default.min(max)),
        }
    }

    /// Raw value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the value is zero ("no opinion").
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

// ---------------------------------------------------------------------------
// Embedding Vector
// ---------------------------------------------------------------------------

/// A dense vector embedding of one text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    /// Number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty (the "unset" state).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
