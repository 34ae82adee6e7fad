use std::fs;
use std::path::Path;

use coinfair_core::posterior::PosteriorSummary;
use coinfair_core::prior::PriorDescription;
use coinfair_core::sweep::SweepSummary;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a run computed, in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub grid_points: usize,
    pub priors: Vec<PriorDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationSummary>,
    pub posteriors: Vec<PosteriorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub pheads: f64,
    pub tosses: usize,
    pub heads: u64,
    pub tails: u64,
}

impl RunSummary {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| SummaryError::Io {
            context: "writing summary json",
            source: e,
        })
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        fs::write(path, self.to_markdown()).map_err(|e| SummaryError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str(&format!("# Coin fairness: {}\n\n", self.run_id));
        rows.push_str(&format!(
            "Command: `{}`, grid of {} points",
            self.command, self.grid_points
        ));
        if let Some(seed) = self.seed {
            rows.push_str(&format!(", seed {seed}"));
        }
        rows.push_str("\n\n");

        if let Some(sim) = &self.simulation {
            rows.push_str(&format!(
                "Simulated {} tosses with pheads={}: {} heads, {} tails\n\n",
                sim.tosses, sim.pheads, sim.heads, sim.tails
            ));
        }

        if !self.posteriors.is_empty() {
            push_table(&mut rows, self.posteriors.iter());
        }

        if let Some(sweep) = &self.sweep {
            rows.push_str(&format!(
                "## Convergence sweep (pheads={}, {} tosses)\n\n",
                sweep.pheads, sweep.max_tosses
            ));
            push_table(
                &mut rows,
                sweep.steps.iter().flat_map(|step| step.posteriors.iter()),
            );
        }
        rows
    }
}

fn push_table<'a>(rows: &mut String, posteriors: impl Iterator<Item = &'a PosteriorSummary>) {
    rows.push_str("| Prior | Heads | Tails | Tosses | MAP F | Peak density |\n");
    rows.push_str("|-------|-------|-------|--------|-------|--------------|\n");
    for post in posteriors {
        rows.push_str(&format!(
            "| {prior} | {heads} | {tails} | {tosses} | {map:.6} | {peak:.4e} |\n",
            prior = post.prior,
            heads = post.heads,
            tails = post.tails,
            tosses = post.tosses,
            map = post.map_estimate,
            peak = post.max_density,
        ));
    }
    rows.push('\n');
}

fn ensure_parent(path: &Path) -> Result<(), SummaryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SummaryError::Io {
                context: "creating summary directory",
                source: e,
            })?;
        }
    }
    Ok(())
}
