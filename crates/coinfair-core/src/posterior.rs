//! Discretised posterior over the coin's fairness.
//!
//! Tosses are independent, so the likelihood of `X` heads and `T` tails is
//! binomial in `F`. The posterior on each grid point is
//! `X ln F + T ln(1 - F) + ln prior(F)`, shifted by its maximum before
//! exponentiating and then normalised to sum to one over the grid.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::grid::BiasGrid;
use crate::prior::LogPrior;
use crate::toss::{Counts, Toss};

/// Normalised posterior density aligned with a [`BiasGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    grid: BiasGrid,
    counts: Counts,
    density: Vec<f64>,
    map_index: usize,
}

impl Posterior {
    /// Posterior for aggregated counts under `prior`.
    pub fn compute<P: LogPrior + ?Sized>(
        counts: Counts,
        grid: &BiasGrid,
        prior: &P,
    ) -> Result<Self, PosteriorError> {
        if counts.checked_total().is_none() {
            return Err(PosteriorError::CountOverflow {
                heads: counts.heads,
                tails: counts.tails,
            });
        }
        let heads = counts.heads as f64;
        let tails = counts.tails as f64;

        let mut density: Vec<f64> = grid
            .points()
            .iter()
            .map(|&f| heads * f.ln() + tails * (1.0 - f).ln() + prior.ln_weight(f))
            .collect();

        let max_log = density.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max_log.is_finite() || density.iter().any(|value| value.is_nan()) {
            return Err(PosteriorError::DegeneratePrior);
        }

        let mut total = 0.0;
        for value in density.iter_mut() {
            *value = (*value - max_log).exp();
            total += *value;
        }
        // The maximum point contributes exp(0) = 1, so `total >= 1`.
        for value in density.iter_mut() {
            *value /= total;
        }

        let map_index = argmax_first(&density);
        debug!(
            heads = counts.heads,
            tails = counts.tails,
            points = grid.len(),
            map = grid.points()[map_index],
            "computed posterior"
        );

        Ok(Self {
            grid: grid.clone(),
            counts,
            density,
            map_index,
        })
    }

    /// Posterior for a raw outcome sequence.
    pub fn from_outcomes<P: LogPrior + ?Sized>(
        outcomes: &[Toss],
        grid: &BiasGrid,
        prior: &P,
    ) -> Result<Self, PosteriorError> {
        Self::compute(Counts::from_outcomes(outcomes), grid, prior)
    }

    pub fn grid(&self) -> &BiasGrid {
        &self.grid
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn map_index(&self) -> usize {
        self.map_index
    }

    /// Maximum a-posteriori value of F.
    pub fn map_estimate(&self) -> f64 {
        self.grid.points()[self.map_index]
    }

    pub fn max_density(&self) -> f64 {
        self.density[self.map_index]
    }

    /// `(F, density)` pairs in grid order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.grid
            .points()
            .iter()
            .copied()
            .zip(self.density.iter().copied())
    }

    pub fn summary(&self, prior: &str) -> PosteriorSummary {
        PosteriorSummary {
            prior: prior.to_string(),
            heads: self.counts.heads,
            tails: self.counts.tails,
            tosses: self.counts.total(),
            map_estimate: self.map_estimate(),
            max_density: self.max_density(),
        }
    }
}

/// Index of the first maximal element.
fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Compact, serializable view of a posterior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosteriorSummary {
    pub prior: String,
    pub heads: u64,
    pub tails: u64,
    pub tosses: u64,
    pub map_estimate: f64,
    pub max_density: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum PosteriorError {
    #[error("prior yields no finite log-weight on the grid")]
    DegeneratePrior,
    #[error("{heads} heads plus {tails} tails overflows the toss count")]
    CountOverflow { heads: u64, tails: u64 },
}
