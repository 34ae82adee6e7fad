//! Bernoulli toss simulation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Outcome of a single toss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Toss {
    Tail = 0,
    Head = 1,
}

impl Toss {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn is_head(self) -> bool {
        matches!(self, Toss::Head)
    }

    pub fn from_u8(value: u8) -> Result<Self, TossError> {
        match value {
            0 => Ok(Toss::Tail),
            1 => Ok(Toss::Head),
            other => Err(TossError::InvalidOutcome(other)),
        }
    }
}

impl fmt::Display for Toss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Aggregated heads (X) and tails (T).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub heads: u64,
    pub tails: u64,
}

impl Counts {
    pub const fn new(heads: u64, tails: u64) -> Self {
        Self { heads, tails }
    }

    pub fn from_outcomes(outcomes: &[Toss]) -> Self {
        let heads = outcomes.iter().filter(|toss| toss.is_head()).count() as u64;
        Self {
            heads,
            tails: outcomes.len() as u64 - heads,
        }
    }

    /// Total tosses, or `None` when heads plus tails does not fit in a `u64`.
    pub const fn checked_total(&self) -> Option<u64> {
        self.heads.checked_add(self.tails)
    }

    /// Total tosses, saturating at `u64::MAX`.
    pub const fn total(&self) -> u64 {
        self.heads.saturating_add(self.tails)
    }

    /// Counts with heads and tails swapped.
    pub const fn mirrored(&self) -> Self {
        Self {
            heads: self.tails,
            tails: self.heads,
        }
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} heads, {} tails, total {} tosses",
            self.heads,
            self.tails,
            self.total()
        )
    }
}

/// Ordered record of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TossSequence {
    outcomes: Vec<Toss>,
    heads: u64,
}

impl TossSequence {
    pub fn from_outcomes(outcomes: Vec<Toss>) -> Self {
        let heads = outcomes.iter().filter(|toss| toss.is_head()).count() as u64;
        Self { outcomes, heads }
    }

    pub fn outcomes(&self) -> &[Toss] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn heads(&self) -> u64 {
        self.heads
    }

    pub fn tails(&self) -> u64 {
        self.outcomes.len() as u64 - self.heads
    }

    pub fn counts(&self) -> Counts {
        Counts::new(self.heads(), self.tails())
    }

    /// Counts over the first `len` outcomes (clamped to the sequence length).
    pub fn prefix_counts(&self, len: usize) -> Counts {
        let end = len.min(self.outcomes.len());
        Counts::from_outcomes(&self.outcomes[..end])
    }
}

/// Draws independent tosses for a coin with a fixed probability of heads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TossGenerator {
    pheads: f64,
}

impl TossGenerator {
    pub fn new(pheads: f64) -> Result<Self, TossError> {
        if !(0.0..=1.0).contains(&pheads) {
            return Err(TossError::InvalidBias(pheads));
        }
        Ok(Self { pheads })
    }

    pub fn fair() -> Self {
        Self { pheads: 0.5 }
    }

    pub fn pheads(&self) -> f64 {
        self.pheads
    }

    /// Draws one outcome. Fully biased coins never consult `rng`.
    pub fn toss<R: Rng + ?Sized>(&self, rng: &mut R) -> Toss {
        if self.pheads == 0.0 {
            return Toss::Tail;
        }
        if self.pheads == 1.0 {
            return Toss::Head;
        }
        let draw: f64 = rng.r#gen::<f64>();
        if draw < self.pheads {
            Toss::Head
        } else {
            Toss::Tail
        }
    }

    pub fn simulate<R: Rng + ?Sized>(&self, tosses: usize, rng: &mut R) -> TossSequence {
        let outcomes: Vec<Toss> = (0..tosses).map(|_| self.toss(rng)).collect();
        let sequence = TossSequence::from_outcomes(outcomes);
        debug!(
            pheads = self.pheads,
            tosses,
            heads = sequence.heads(),
            tails = sequence.tails(),
            "simulated tosses"
        );
        sequence
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TossError {
    #[error("probability of heads must lie in [0, 1], got {0}")]
    InvalidBias(f64),
    #[error("toss outcome must be 0 or 1, got {0}")]
    InvalidOutcome(u8),
}
