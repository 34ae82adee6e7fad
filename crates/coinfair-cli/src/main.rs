use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use coinfair_cli::config::{LabConfig, PriorKind, ResolvedOutputs};
use coinfair_cli::logging::init_logging;
use coinfair_cli::runner::{Command, LabRunner};
use coinfair_core::sink::WriterSink;
use coinfair_core::toss::{Counts, Toss};

/// Simulate coin tosses and infer the coin's fairness.
#[derive(Debug, Parser)]
#[command(
    name = "coinfair",
    author,
    version,
    about = "Bayesian posterior over a coin's fairness"
)]
struct Cli {
    /// Path to an optional YAML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID", global = true)]
    run_id: Option<String>,

    /// Override the RNG seed for toss simulation.
    #[arg(long, value_name = "SEED", global = true)]
    seed: Option<u64>,

    /// Override the prior used for the posterior.
    #[arg(long, value_enum, global = true)]
    prior: Option<PriorKind>,

    /// Skip PNG rendering; summaries are still written.
    #[arg(long, global = true)]
    no_plot: bool,

    /// Exit after validating the configuration.
    #[arg(long, global = true)]
    validate_only: bool,

    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Toss a simulated coin and compute the posterior for the outcome.
    Simulate {
        /// Probability of heads in [0, 1].
        #[arg(long)]
        pheads: Option<f64>,
        /// Number of tosses.
        #[arg(long)]
        tosses: Option<usize>,
    },
    /// Compute the posterior for observed data.
    Posterior {
        /// Number of heads observed.
        #[arg(long, requires = "tails", conflicts_with = "outcomes")]
        heads: Option<u64>,
        /// Number of tails observed.
        #[arg(long, requires = "heads")]
        tails: Option<u64>,
        /// Raw outcomes, e.g. 1,0,0,1 (1 = head, 0 = tail).
        #[arg(long, value_delimiter = ',')]
        outcomes: Option<Vec<u8>>,
    },
    /// Watch the posterior sharpen over 1, 2, 4, ... tosses of one simulation.
    Sweep {
        /// Probability of heads in [0, 1].
        #[arg(long)]
        pheads: Option<f64>,
        /// Largest sample size in the sweep.
        #[arg(long)]
        max_tosses: Option<usize>,
        /// Overlay the Gaussian-prior posterior on the uniform one.
        #[arg(long)]
        compare_gaussian: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_ref() {
        Some(path) => LabConfig::from_path(path)?,
        None => LabConfig::default(),
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    if let Some(kind) = cli.prior {
        config.prior.kind = kind;
    }

    let command = match cli.command {
        Action::Simulate { pheads, tosses } => {
            if let Some(pheads) = pheads {
                config.simulation.pheads = pheads;
            }
            if let Some(tosses) = tosses {
                config.simulation.tosses = tosses;
            }
            Command::Simulate {
                pheads: config.simulation.pheads,
                tosses: config.simulation.tosses,
            }
        }
        Action::Posterior {
            heads,
            tails,
            outcomes,
        } => match (heads, tails, outcomes) {
            (Some(heads), Some(tails), None) => {
                let counts = Counts::new(heads, tails);
                if counts.checked_total().is_none() {
                    bail!("{heads} heads plus {tails} tails overflows the toss count");
                }
                Command::Posterior { counts }
            }
            (None, None, Some(raw)) => Command::Outcomes {
                outcomes: raw
                    .into_iter()
                    .map(Toss::from_u8)
                    .collect::<Result<Vec<_>, _>>()
                    .context("parsing --outcomes")?,
            },
            _ => bail!("posterior needs either --heads and --tails, or --outcomes"),
        },
        Action::Sweep {
            pheads,
            max_tosses,
            compare_gaussian,
        } => {
            if let Some(pheads) = pheads {
                config.simulation.pheads = pheads;
            }
            if let Some(max_tosses) = max_tosses {
                config.simulation.max_tosses = max_tosses;
            }
            Command::Sweep {
                pheads: config.simulation.pheads,
                max_tosses: config.simulation.max_tosses,
                compare_gaussian,
            }
        }
    };

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = LabRunner::new(config, outputs)?.with_plots(!cli.no_plot);

    if cli.validate_only {
        println!("Validation-only mode: configuration '{run_id}' is valid.");
        return Ok(());
    }

    let outcome = runner.run(&command, WriterSink::stdout())?;
    println!("Summary (JSON): {}", outcome.summary_json.display());
    println!("Summary (Markdown): {}", outcome.summary_md.display());
    for plot in &outcome.plots {
        println!("Plot: {}", plot.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
