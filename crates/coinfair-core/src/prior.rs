//! Prior weightings over the bias parameter.

use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_GAUSSIAN_MEAN: f64 = 0.5;
pub const DEFAULT_GAUSSIAN_STD_DEV: f64 = 0.05;

/// Log-weight a prior assigns to a bias value.
///
/// Weights need not be normalised; the posterior is normalised over the grid.
/// Any `Fn(f64) -> f64` returning a log-weight can act as a prior.
pub trait LogPrior {
    fn ln_weight(&self, fairness: f64) -> f64;
}

impl<F> LogPrior for F
where
    F: Fn(f64) -> f64,
{
    fn ln_weight(&self, fairness: f64) -> f64 {
        self(fairness)
    }
}

/// The priors offered by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Prior {
    /// No preference; contributes `ln(1) = 0`.
    #[default]
    Uniform,
    /// Belief concentrated around a mean.
    Gaussian(GaussianPrior),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPrior {
    mean: f64,
    std_dev: f64,
    normal: Normal,
}

impl GaussianPrior {
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Prior {
    pub fn gaussian(mean: f64, std_dev: f64) -> Result<Self, PriorError> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(PriorError::InvalidGaussian { mean, std_dev });
        }
        let normal =
            Normal::new(mean, std_dev).map_err(|_| PriorError::InvalidGaussian { mean, std_dev })?;
        Ok(Prior::Gaussian(GaussianPrior {
            mean,
            std_dev,
            normal,
        }))
    }

    /// Gaussian peaked at 0.5 with spread 0.05.
    pub fn default_gaussian() -> Self {
        // Finite mean and positive spread: construction cannot fail.
        Self::gaussian(DEFAULT_GAUSSIAN_MEAN, DEFAULT_GAUSSIAN_STD_DEV)
            .expect("default gaussian parameters are valid")
    }

    pub fn label(&self) -> &'static str {
        match self {
            Prior::Uniform => "uniform",
            Prior::Gaussian(_) => "gaussian",
        }
    }

    pub fn describe(&self) -> PriorDescription {
        match self {
            Prior::Uniform => PriorDescription {
                kind: self.label(),
                mean: None,
                std_dev: None,
            },
            Prior::Gaussian(gaussian) => PriorDescription {
                kind: self.label(),
                mean: Some(gaussian.mean),
                std_dev: Some(gaussian.std_dev),
            },
        }
    }
}

impl LogPrior for Prior {
    fn ln_weight(&self, fairness: f64) -> f64 {
        match self {
            Prior::Uniform => 0.0,
            Prior::Gaussian(gaussian) => gaussian.normal.ln_pdf(fairness),
        }
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prior::Uniform => write!(f, "uniform"),
            Prior::Gaussian(gaussian) => write!(
                f,
                "gaussian(mean={}, sd={})",
                gaussian.mean, gaussian.std_dev
            ),
        }
    }
}

/// Serializable summary of a prior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorDescription {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PriorError {
    #[error(
        "gaussian prior needs a finite mean and positive spread (mean={mean}, std_dev={std_dev})"
    )]
    InvalidGaussian { mean: f64, std_dev: f64 },
}
