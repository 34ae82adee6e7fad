//! Discretised support for the bias parameter.

use serde::Serialize;
use thiserror::Error;

/// Number of points on the standard support.
pub const STANDARD_POINTS: usize = 500;
/// Lowest standard grid value; keeps `ln(F)` finite.
pub const STANDARD_LOWER: f64 = 1e-6;
/// Highest standard grid value; keeps `ln(1 - F)` finite.
pub const STANDARD_UPPER: f64 = 1.0 - 1e-6;

/// Evenly spaced, strictly interior values of F.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasGrid {
    points: Vec<f64>,
}

impl BiasGrid {
    /// The 500-point grid spanning `[1e-6, 1 - 1e-6]`.
    pub fn standard() -> Self {
        Self {
            points: linspace(STANDARD_LOWER, STANDARD_UPPER, STANDARD_POINTS),
        }
    }

    /// `count` evenly spaced points from `lower` to `upper` inclusive.
    pub fn linspace(lower: f64, upper: f64, count: usize) -> Result<Self, GridError> {
        if count == 0 {
            return Err(GridError::Empty);
        }
        for bound in [lower, upper] {
            if !bound.is_finite() || bound <= 0.0 || bound >= 1.0 {
                return Err(GridError::OutOfDomain(bound));
            }
        }
        if lower > upper || (count > 1 && lower == upper) {
            return Err(GridError::Inverted { lower, upper });
        }
        Ok(Self {
            points: linspace(lower, upper, count),
        })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn lower(&self) -> f64 {
        self.points[0]
    }

    pub fn upper(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Spacing between neighbours; zero for a single-point grid.
    pub fn step(&self) -> f64 {
        if self.points.len() < 2 {
            0.0
        } else {
            (self.upper() - self.lower()) / (self.points.len() - 1) as f64
        }
    }
}

impl Default for BiasGrid {
    fn default() -> Self {
        Self::standard()
    }
}

fn linspace(lower: f64, upper: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![lower];
    }
    let step = (upper - lower) / (count - 1) as f64;
    let mut points: Vec<f64> = (0..count).map(|i| lower + i as f64 * step).collect();
    // Pin the endpoint so rounding never pushes it past `upper`.
    points[count - 1] = upper;
    points
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid must contain at least one point")]
    Empty,
    #[error("grid bound {0} must lie strictly between 0 and 1")]
    OutOfDomain(f64),
    #[error("grid lower bound {lower} must be below upper bound {upper}")]
    Inverted { lower: f64, upper: f64 },
}
