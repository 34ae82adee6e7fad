use std::path::PathBuf;

use coinfair_core::grid::BiasGrid;
use coinfair_core::posterior::{Posterior, PosteriorError};
use coinfair_core::present::Presenter;
use coinfair_core::prior::Prior;
use coinfair_core::sink::{NullRenderSink, RenderSink, ReportSink, SinkError};
use coinfair_core::sweep::{ConvergenceSweep, SweepError};
use coinfair_core::toss::{Counts, Toss, TossError, TossGenerator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{LabConfig, PriorKind, ResolvedOutputs, ValidationError};
use crate::plot::PlottersSink;
use crate::summary::{RunSummary, SimulationSummary, SummaryError};

/// What to compute in a single invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toss a coin `tosses` times and analyse the result.
    Simulate { pheads: f64, tosses: usize },
    /// Analyse known counts.
    Posterior { counts: Counts },
    /// Analyse a raw outcome sequence.
    Outcomes { outcomes: Vec<Toss> },
    /// Posterior at tosses 1, 2, 4, ... of one long simulation.
    Sweep {
        pheads: f64,
        max_tosses: usize,
        compare_gaussian: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Simulate { .. } => "simulate",
            Command::Posterior { .. } | Command::Outcomes { .. } => "posterior",
            Command::Sweep { .. } => "sweep",
        }
    }
}

pub struct LabRunner {
    config: LabConfig,
    outputs: ResolvedOutputs,
    grid: BiasGrid,
    prior: Prior,
    render_plots: bool,
}

/// Paths and data produced by a run.
pub struct RunOutcome {
    pub summary: RunSummary,
    pub summary_json: PathBuf,
    pub summary_md: PathBuf,
    pub plots: Vec<PathBuf>,
}

impl LabRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: LabConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let grid = config.grid.build()?;
        let prior = config.prior.build()?;
        Ok(Self {
            config,
            outputs,
            grid,
            prior,
            render_plots: true,
        })
    }

    pub fn with_plots(mut self, enabled: bool) -> Self {
        self.render_plots = enabled;
        self
    }

    pub fn grid(&self) -> &BiasGrid {
        &self.grid
    }

    /// Run `command`, reporting to `report` and writing summaries and plots.
    pub fn run<T: ReportSink>(
        &self,
        command: &Command,
        report: T,
    ) -> Result<RunOutcome, RunnerError> {
        let (summary, plots) = if self.render_plots {
            let mut sink = PlottersSink::new(&self.outputs.plots_dir);
            let summary = self.execute(command, &mut sink, report)?;
            (summary, sink.rendered().to_vec())
        } else {
            (self.execute(command, NullRenderSink, report)?, Vec::new())
        };

        summary.write_json(&self.outputs.summary_json)?;
        summary.write_markdown(&self.outputs.summary_md)?;
        info!(
            run_id = %self.config.run_id,
            command = command.name(),
            plots = plots.len(),
            "run complete"
        );

        Ok(RunOutcome {
            summary,
            summary_json: self.outputs.summary_json.clone(),
            summary_md: self.outputs.summary_md.clone(),
            plots,
        })
    }

    /// Compute `command` against arbitrary sinks without touching the file system.
    pub fn execute<R: RenderSink, T: ReportSink>(
        &self,
        command: &Command,
        render: R,
        report: T,
    ) -> Result<RunSummary, RunnerError> {
        let mut presenter = Presenter::new(render, report);
        let mut summary = RunSummary {
            run_id: self.config.run_id.clone(),
            command: command.name(),
            seed: None,
            grid_points: self.grid.len(),
            priors: vec![self.prior.describe()],
            simulation: None,
            posteriors: Vec::new(),
            sweep: None,
        };

        match command {
            Command::Simulate { pheads, tosses } => {
                let generator = TossGenerator::new(*pheads)?;
                let (seed, mut rng) = self.rng();
                summary.seed = Some(seed);
                let sequence = generator.simulate(*tosses, &mut rng);
                presenter.show_simulation(&sequence, *pheads)?;
                summary.simulation = Some(SimulationSummary {
                    pheads: *pheads,
                    tosses: *tosses,
                    heads: sequence.heads(),
                    tails: sequence.tails(),
                });
                let posterior =
                    Posterior::from_outcomes(sequence.outcomes(), &self.grid, &self.prior)?;
                tolerate(presenter.show_posterior("simulate", &posterior))?;
                summary.posteriors.push(posterior.summary(self.prior.label()));
            }
            Command::Posterior { counts } => {
                let posterior = Posterior::compute(*counts, &self.grid, &self.prior)?;
                tolerate(presenter.show_posterior("posterior", &posterior))?;
                summary.posteriors.push(posterior.summary(self.prior.label()));
            }
            Command::Outcomes { outcomes } => {
                let posterior = Posterior::from_outcomes(outcomes, &self.grid, &self.prior)?;
                tolerate(presenter.show_posterior("posterior", &posterior))?;
                summary.posteriors.push(posterior.summary(self.prior.label()));
            }
            Command::Sweep {
                pheads,
                max_tosses,
                compare_gaussian,
            } => {
                let sweep = ConvergenceSweep::new(*pheads, *max_tosses)?;
                let priors = self.sweep_priors(*compare_gaussian)?;
                let (seed, mut rng) = self.rng();
                summary.seed = Some(seed);
                summary.priors = priors.iter().map(Prior::describe).collect();
                let result = sweep.run(&mut rng, &self.grid, &priors)?;
                tolerate(presenter.show_sweep("sweep", &result))?;
                summary.sweep = Some(result.summary());
            }
        }

        Ok(summary)
    }

    fn sweep_priors(&self, compare_gaussian: bool) -> Result<Vec<Prior>, RunnerError> {
        if !compare_gaussian {
            return Ok(vec![self.prior]);
        }
        // Uniform first so it keeps the solid line; Gaussian overlays it.
        Ok(vec![
            Prior::Uniform,
            self.config.prior.build_kind(PriorKind::Gaussian)?,
        ])
    }

    fn rng(&self) -> (u64, StdRng) {
        let seed = self.config.simulation.seed.unwrap_or_else(rand::random);
        (seed, StdRng::seed_from_u64(seed))
    }
}

/// Plot failures are reported but do not abort the run.
fn tolerate(result: Result<(), SinkError>) -> Result<(), SinkError> {
    match result {
        Err(SinkError::Render { figure, message }) => {
            warn!(figure = %figure, "plot skipped: {message}");
            Ok(())
        }
        other => other,
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ValidationError),
    #[error(transparent)]
    Toss(#[from] TossError),
    #[error(transparent)]
    Posterior(#[from] PosteriorError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinfair_core::sink::MemorySink;

    fn runner(seed: Option<u64>, prior_yaml: &str) -> LabRunner {
        let seed = seed.map_or("null".to_string(), |s| s.to_string());
        let yaml = format!("run_id: unit\n{prior_yaml}simulation:\n  seed: {seed}\n");
        let mut config: LabConfig = serde_yaml::from_str(&yaml).expect("parse");
        config.validate().expect("valid");
        let outputs = config.resolved_outputs();
        LabRunner::new(config, outputs).expect("runner")
    }

    #[test]
    fn posterior_command_reports_map() {
        let runner = runner(Some(1), "");
        let mut render = MemorySink::default();
        let mut report = MemorySink::default();
        let summary = runner
            .execute(
                &Command::Posterior {
                    counts: Counts::new(0, 10),
                },
                &mut render,
                &mut report,
            )
            .expect("execute");
        assert_eq!(summary.posteriors.len(), 1);
        assert_eq!(summary.posteriors[0].map_estimate, 1e-6);
        assert_eq!(render.figures.len(), 1);
        assert_eq!(
            report.lines,
            vec!["The maximum posterior probability of the fairness of your coin is: F=0.000001"]
        );
    }

    #[test]
    fn simulate_records_seed_and_counts() {
        let runner = runner(Some(42), "");
        let mut report = MemorySink::default();
        let summary = runner
            .execute(
                &Command::Simulate {
                    pheads: 1.0,
                    tosses: 12,
                },
                NullRenderSink,
                &mut report,
            )
            .expect("execute");
        assert_eq!(summary.seed, Some(42));
        let sim = summary.simulation.expect("simulation summary");
        assert_eq!((sim.heads, sim.tails), (12, 0));
        assert!(report.lines[0].starts_with("12 heads, 0 tails out of 12 tosses"));
    }

    #[test]
    fn sweep_comparison_uses_both_priors() {
        let runner = runner(Some(7), "");
        let summary = runner
            .execute(
                &Command::Sweep {
                    pheads: 0.5,
                    max_tosses: 32,
                    compare_gaussian: true,
                },
                NullRenderSink,
                MemorySink::default(),
            )
            .expect("execute");
        assert_eq!(summary.priors.len(), 2);
        let sweep = summary.sweep.expect("sweep summary");
        assert_eq!(sweep.steps.len(), 6);
        assert!(sweep.steps.iter().all(|step| step.posteriors.len() == 2));
    }

    #[test]
    fn configured_gaussian_prior_is_used() {
        let runner = runner(None, "prior:\n  kind: gaussian\n");
        let summary = runner
            .execute(
                &Command::Posterior {
                    counts: Counts::new(80, 20),
                },
                NullRenderSink,
                MemorySink::default(),
            )
            .expect("execute");
        assert_eq!(summary.priors[0].kind, "gaussian");
        assert!(summary.posteriors[0].map_estimate < 0.7);
    }

    #[test]
    fn invalid_bias_is_rejected() {
        let runner = runner(Some(3), "");
        let err = runner
            .execute(
                &Command::Simulate {
                    pheads: 2.0,
                    tosses: 5,
                },
                NullRenderSink,
                MemorySink::default(),
            )
            .err()
            .expect("invalid bias");
        assert!(matches!(err, RunnerError::Toss(TossError::InvalidBias(_))));
    }

    #[test]
    fn render_failures_are_tolerated() {
        struct Failing;
        impl RenderSink for Failing {
            fn render(&mut self, figure: &coinfair_core::sink::Figure) -> Result<(), SinkError> {
                Err(SinkError::Render {
                    figure: figure.name.clone(),
                    message: "no backend".into(),
                })
            }
        }

        let runner = runner(Some(3), "");
        let mut report = MemorySink::default();
        runner
            .execute(
                &Command::Posterior {
                    counts: Counts::new(5, 5),
                },
                Failing,
                &mut report,
            )
            .expect("plot failure is not fatal");
        assert_eq!(report.lines.len(), 1);
    }
}
