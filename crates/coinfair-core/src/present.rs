//! Turns posteriors and sweeps into figures and report lines.

use crate::posterior::Posterior;
use crate::sink::{
    Color, Figure, Panel, RenderSink, ReportSink, Series, SinkError, Stroke, Tick, VLine,
};
use crate::sweep::SweepResult;
use crate::toss::{Counts, TossSequence};

const SWEEP_ROWS: usize = 5;
const SWEEP_COLS: usize = 3;
const FAIR_COIN: f64 = 0.5;

/// Report line announcing a MAP estimate.
pub fn map_line(posterior: &Posterior) -> String {
    format!(
        "The maximum posterior probability of the fairness of your coin is: F={:.6}",
        posterior.map_estimate()
    )
}

pub fn simulation_line(sequence: &TossSequence, pheads: f64) -> String {
    format!(
        "{} heads, {} tails out of {} tosses (pheads={pheads})",
        sequence.heads(),
        sequence.tails(),
        sequence.len()
    )
}

pub fn counts_title(counts: Counts) -> String {
    counts.to_string()
}

/// Single-panel figure of a posterior with reference lines at 0.5 and the MAP.
pub fn posterior_figure(name: &str, posterior: &Posterior) -> Figure {
    let panel = Panel {
        title: Some(counts_title(posterior.counts())),
        x_label: Some("Fairness F".to_string()),
        y_label: Some("Probability(F)".to_string()),
        series: vec![Series {
            label: None,
            points: posterior.points().collect(),
            stroke: Stroke::solid(Color::Blue),
        }],
        vlines: vec![
            VLine {
                x: FAIR_COIN,
                stroke: Stroke::dashed(Color::Black),
            },
            VLine {
                x: posterior.map_estimate(),
                stroke: Stroke::solid(Color::Blue),
            },
        ],
        ..Panel::default()
    };
    Figure::single(name, panel)
}

/// One panel per prefix length; the first prior is drawn solid blue, the
/// second dashed red.
pub fn sweep_figure(name: &str, result: &SweepResult) -> Figure {
    let strokes = [Stroke::solid(Color::Blue), Stroke::dashed(Color::Red)];
    let panels = result
        .steps()
        .iter()
        .map(|step| {
            let mut series = Vec::new();
            let mut vlines = vec![VLine {
                x: FAIR_COIN,
                stroke: Stroke::dashed(Color::Black),
            }];
            for (index, posterior) in step.posteriors.iter().enumerate() {
                let stroke = strokes[index.min(strokes.len() - 1)];
                series.push(Series {
                    label: (index == 0).then(|| format!("N={}", step.tosses)),
                    points: posterior.points().collect(),
                    stroke,
                });
                if result.shows_map() {
                    vlines.push(VLine {
                        x: posterior.map_estimate(),
                        stroke,
                    });
                }
            }
            Panel {
                series,
                vlines,
                x_ticks: unit_ticks(),
                show_legend: true,
                hide_y_axis: true,
                ..Panel::default()
            }
        })
        .collect();

    Figure {
        name: name.to_string(),
        rows: SWEEP_ROWS,
        cols: SWEEP_COLS,
        panels,
    }
}

fn unit_ticks() -> Vec<Tick> {
    [(0.0, "0"), (0.25, ""), (0.5, "0.5"), (0.75, ""), (1.0, "1")]
        .into_iter()
        .map(|(value, label)| Tick {
            value,
            label: label.to_string(),
        })
        .collect()
}

/// Routes results to a render sink and a report sink.
pub struct Presenter<R, T> {
    render: R,
    report: T,
}

impl<R: RenderSink, T: ReportSink> Presenter<R, T> {
    pub fn new(render: R, report: T) -> Self {
        Self { render, report }
    }

    pub fn into_parts(self) -> (R, T) {
        (self.render, self.report)
    }

    pub fn show_simulation(
        &mut self,
        sequence: &TossSequence,
        pheads: f64,
    ) -> Result<(), SinkError> {
        self.report.report(&simulation_line(sequence, pheads))
    }

    pub fn show_posterior(&mut self, name: &str, posterior: &Posterior) -> Result<(), SinkError> {
        self.report.report(&map_line(posterior))?;
        self.render.render(&posterior_figure(name, posterior))
    }

    pub fn show_sweep(&mut self, name: &str, result: &SweepResult) -> Result<(), SinkError> {
        for step in result.steps() {
            let estimates: Vec<String> = step
                .posteriors
                .iter()
                .zip(result.priors())
                .map(|(posterior, prior)| {
                    format!("{}={:.6}", prior.label(), posterior.map_estimate())
                })
                .collect();
            self.report.report(&format!(
                "N={:>5}: {} heads, {} tails, MAP {}",
                step.tosses,
                step.counts.heads,
                step.counts.tails,
                estimates.join(", ")
            ))?;
        }
        self.render.render(&sweep_figure(name, result))
    }
}
