//! Posterior convergence over growing sample sizes.
//!
//! One long sequence is simulated and its prefixes of length 1, 2, 4, ...
//! are analysed, so every step shares the same underlying draws.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::grid::BiasGrid;
use crate::posterior::{Posterior, PosteriorError, PosteriorSummary};
use crate::prior::Prior;
use crate::toss::{Counts, TossError, TossGenerator, TossSequence};

pub const DEFAULT_MAX_TOSSES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSweep {
    generator: TossGenerator,
    max_tosses: usize,
}

impl ConvergenceSweep {
    pub fn new(pheads: f64, max_tosses: usize) -> Result<Self, SweepError> {
        if max_tosses == 0 {
            return Err(SweepError::NoTosses);
        }
        Ok(Self {
            generator: TossGenerator::new(pheads)?,
            max_tosses,
        })
    }

    pub fn pheads(&self) -> f64 {
        self.generator.pheads()
    }

    pub fn max_tosses(&self) -> usize {
        self.max_tosses
    }

    /// Powers of two up to and including `max_tosses`.
    pub fn prefix_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut len = 1usize;
        while len <= self.max_tosses {
            lengths.push(len);
            match len.checked_mul(2) {
                Some(next) => len = next,
                None => break,
            }
        }
        lengths
    }

    /// Simulates once, then computes one posterior per prior for each prefix.
    pub fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        grid: &BiasGrid,
        priors: &[Prior],
    ) -> Result<SweepResult, SweepError> {
        if priors.is_empty() {
            return Err(SweepError::NoPriors);
        }

        let sequence = self.generator.simulate(self.max_tosses, rng);
        let mut steps = Vec::new();
        for tosses in self.prefix_lengths() {
            let counts = sequence.prefix_counts(tosses);
            let posteriors = priors
                .iter()
                .map(|prior| Posterior::compute(counts, grid, prior))
                .collect::<Result<Vec<_>, _>>()?;
            steps.push(SweepStep {
                tosses,
                counts,
                posteriors,
            });
        }

        info!(
            pheads = self.pheads(),
            max_tosses = self.max_tosses,
            steps = steps.len(),
            priors = priors.len(),
            "convergence sweep complete"
        );

        Ok(SweepResult {
            pheads: self.pheads(),
            priors: priors.to_vec(),
            sequence,
            steps,
        })
    }
}

/// Posteriors computed for one prefix length.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepStep {
    pub tosses: usize,
    pub counts: Counts,
    /// One entry per prior, in the order the priors were supplied.
    pub posteriors: Vec<Posterior>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pheads: f64,
    priors: Vec<Prior>,
    sequence: TossSequence,
    steps: Vec<SweepStep>,
}

impl SweepResult {
    pub fn pheads(&self) -> f64 {
        self.pheads
    }

    pub fn priors(&self) -> &[Prior] {
        &self.priors
    }

    pub fn sequence(&self) -> &TossSequence {
        &self.sequence
    }

    pub fn steps(&self) -> &[SweepStep] {
        &self.steps
    }

    /// MAP markers are only drawn for coins that can land heads.
    pub fn shows_map(&self) -> bool {
        self.pheads > 0.0
    }

    pub fn summary(&self) -> SweepSummary {
        SweepSummary {
            pheads: self.pheads,
            max_tosses: self.sequence.len(),
            steps: self
                .steps
                .iter()
                .map(|step| SweepStepSummary {
                    tosses: step.tosses,
                    heads: step.counts.heads,
                    tails: step.counts.tails,
                    posteriors: step
                        .posteriors
                        .iter()
                        .zip(&self.priors)
                        .map(|(posterior, prior)| posterior.summary(prior.label()))
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub pheads: f64,
    pub max_tosses: usize,
    pub steps: Vec<SweepStepSummary>,
}

impl SweepSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepStepSummary {
    pub tosses: usize,
    pub heads: u64,
    pub tails: u64,
    pub posteriors: Vec<PosteriorSummary>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("sweep needs at least one toss")]
    NoTosses,
    #[error("sweep needs at least one prior")]
    NoPriors,
    #[error(transparent)]
    Toss(#[from] TossError),
    #[error(transparent)]
    Posterior(#[from] PosteriorError),
}
