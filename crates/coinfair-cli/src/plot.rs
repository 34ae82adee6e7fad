use std::fs;
use std::path::{Path, PathBuf};

use coinfair_core::sink::{
    Color as StrokeColor, Figure, LineStyle, Panel, RenderSink, SinkError, Stroke,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;
use tracing::debug;

const SINGLE_SIZE: (u32, u32) = (800, 480);
const PANEL_SIZE: (u32, u32) = (400, 300);
const DASH_ON: usize = 6;
const DASH_OFF: usize = 4;
const VLINE_SAMPLES: usize = 41;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Renders figures to PNG files with `plotters`.
pub struct PlottersSink {
    dir: PathBuf,
    rendered: Vec<PathBuf>,
}

impl PlottersSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rendered: Vec::new(),
        }
    }

    pub fn rendered(&self) -> &[PathBuf] {
        &self.rendered
    }

    pub fn render_png(&mut self, figure: &Figure) -> Result<PathBuf, PlotError> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir).map_err(|e| PlotError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = self.dir.join(format!("{}.png", figure.name));

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        // Captions, tick labels and legends need a font; without one, plotters
        // panics and the figure is redrawn with lines only.
        let result = match attempt(&output_path, figure, Labels::Text) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(
                    figure = %figure.name,
                    error = %err,
                    "labelled render failed, drawing without text"
                );
                attempt(&output_path, figure, Labels::Hidden)
            }
        };

        std::panic::set_hook(prev_hook);

        result?;
        debug!(path = %output_path.display(), "rendered figure");
        self.rendered.push(output_path.clone());
        Ok(output_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Labels {
    Text,
    Hidden,
}

fn attempt(path: &Path, figure: &Figure, labels: Labels) -> Result<(), PlotError> {
    match std::panic::catch_unwind(|| draw_figure(path, figure, labels)) {
        Ok(result) => result,
        Err(_) => Err(PlotError::Plot(
            "plotters panicked while rendering (missing font support?)".into(),
        )),
    }
}

impl RenderSink for PlottersSink {
    fn render(&mut self, figure: &Figure) -> Result<(), SinkError> {
        self.render_png(figure)
            .map(|_| ())
            .map_err(|err| SinkError::Render {
                figure: figure.name.clone(),
                message: err.to_string(),
            })
    }
}

fn figure_size(figure: &Figure) -> (u32, u32) {
    if figure.rows * figure.cols <= 1 {
        SINGLE_SIZE
    } else {
        (
            PANEL_SIZE.0 * figure.cols as u32,
            PANEL_SIZE.1 * figure.rows as u32,
        )
    }
}

fn draw_figure(path: &Path, figure: &Figure, labels: Labels) -> Result<(), PlotError> {
    let root = BitMapBackend::new(path, figure_size(figure)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| PlotError::Plot(e.to_string()))?;

    let areas = root.split_evenly((figure.rows.max(1), figure.cols.max(1)));
    for (area, panel) in areas.iter().zip(&figure.panels) {
        draw_panel(area, panel, labels)?;
    }

    root.present().map_err(|e| PlotError::Plot(e.to_string()))?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    panel: &Panel,
    labels: Labels,
) -> Result<(), PlotError> {
    let y_max = panel.y_max().max(f64::MIN_POSITIVE) * 1.05;
    let text = labels == Labels::Text;

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if text {
        builder
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .set_label_area_size(
                LabelAreaPosition::Left,
                if panel.hide_y_axis { 0 } else { 60 },
            );
        if let Some(title) = panel.title.as_deref() {
            builder.caption(title, ("sans-serif", 20));
        }
    }
    let mut chart = builder
        .build_cartesian_2d(0f64..1f64, 0f64..y_max)
        .map_err(|e| PlotError::Plot(e.to_string()))?;

    if text {
        let tick_label = |x: &f64| {
            panel
                .x_ticks
                .iter()
                .find(|tick| (tick.value - *x).abs() < 1e-9)
                .map(|tick| tick.label.clone())
                .unwrap_or_else(|| format!("{x:.2}"))
        };
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh();
        if !panel.x_ticks.is_empty() {
            mesh.x_labels(panel.x_ticks.len()).x_label_formatter(&tick_label);
        }
        if let Some(label) = panel.x_label.as_deref() {
            mesh.x_desc(label);
        }
        if let Some(label) = panel.y_label.as_deref() {
            mesh.y_desc(label);
        }
        if panel.hide_y_axis {
            mesh.disable_y_axis();
        }
        mesh.draw().map_err(|e| PlotError::Plot(e.to_string()))?;
    } else {
        chart
            .draw_series(bare_axes(panel, y_max))
            .map_err(|e| PlotError::Plot(e.to_string()))?;
    }

    let mut has_legend = false;
    for series in &panel.series {
        let style = shape(series.stroke);
        let annotation = chart
            .draw_series(stroke_paths(&series.points, series.stroke.style, style))
            .map_err(|e| PlotError::Plot(e.to_string()))?;
        if let Some(label) = series.label.as_deref() {
            has_legend = true;
            annotation
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    for vline in &panel.vlines {
        let points: Vec<(f64, f64)> = (0..VLINE_SAMPLES)
            .map(|i| (vline.x, y_max * i as f64 / (VLINE_SAMPLES - 1) as f64))
            .collect();
        chart
            .draw_series(stroke_paths(&points, vline.stroke.style, shape(vline.stroke)))
            .map_err(|e| PlotError::Plot(e.to_string()))?;
    }

    if text && panel.show_legend && has_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| PlotError::Plot(e.to_string()))?;
    }

    Ok(())
}

/// Axis lines and x tick marks drawn as plain paths, with no text.
fn bare_axes(panel: &Panel, y_max: f64) -> Vec<PathElement<(f64, f64)>> {
    let axis = BLACK.stroke_width(1);
    let mut paths = vec![PathElement::new(vec![(0.0, 0.0), (1.0, 0.0)], axis)];
    if !panel.hide_y_axis {
        paths.push(PathElement::new(vec![(0.0, 0.0), (0.0, y_max)], axis));
    }
    let tick = y_max * 0.02;
    paths.extend(
        panel
            .x_ticks
            .iter()
            .map(|t| PathElement::new(vec![(t.value, 0.0), (t.value, tick)], axis)),
    );
    paths
}

fn shape(stroke: Stroke) -> ShapeStyle {
    let color = match stroke.color {
        StrokeColor::Black => BLACK,
        StrokeColor::Blue => BLUE,
        StrokeColor::Red => RED,
    };
    color.stroke_width(2)
}

/// Path elements for a polyline; dashed strokes keep alternating runs of points.
fn stroke_paths(
    points: &[(f64, f64)],
    style: LineStyle,
    shape: ShapeStyle,
) -> Vec<PathElement<(f64, f64)>> {
    match style {
        LineStyle::Solid => vec![PathElement::new(points.to_vec(), shape)],
        LineStyle::Dashed => dash_runs(points, DASH_ON, DASH_OFF)
            .into_iter()
            .map(|run| PathElement::new(run, shape))
            .collect(),
    }
}

fn dash_runs(points: &[(f64, f64)], on: usize, off: usize) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start + 1 < points.len() {
        let end = (start + on).min(points.len() - 1);
        runs.push(points[start..=end].to_vec());
        start = end + off;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinfair_core::grid::BiasGrid;
    use coinfair_core::posterior::Posterior;
    use coinfair_core::present::{posterior_figure, sweep_figure};
    use coinfair_core::prior::Prior;
    use coinfair_core::sweep::ConvergenceSweep;
    use coinfair_core::toss::Counts;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn balanced_posterior() -> Posterior {
        Posterior::compute(Counts::new(5, 5), &BiasGrid::standard(), &Prior::Uniform)
            .expect("posterior")
    }

    #[test]
    fn dash_runs_alternate() {
        let points: Vec<(f64, f64)> = (0..20).map(|i| (i as f64, 0.0)).collect();
        let runs = dash_runs(&points, 3, 2);
        assert_eq!(runs[0].first(), Some(&(0.0, 0.0)));
        assert_eq!(runs[0].last(), Some(&(3.0, 0.0)));
        assert_eq!(runs[1].first(), Some(&(5.0, 0.0)));
        assert!(runs.iter().all(|run| run.len() >= 2));
    }

    #[test]
    fn dash_runs_skip_degenerate_input() {
        assert!(dash_runs(&[(0.0, 0.0)], 3, 2).is_empty());
        assert!(dash_runs(&[], 3, 2).is_empty());
    }

    #[test]
    fn grid_figures_scale_with_panels() {
        let figure = Figure {
            name: "sweep".into(),
            rows: 5,
            cols: 3,
            panels: Vec::new(),
        };
        assert_eq!(figure_size(&figure), (1200, 1500));
        assert_eq!(figure_size(&Figure::single("one", Panel::default())), SINGLE_SIZE);
    }

    #[test]
    fn posterior_figure_is_written_as_png() {
        let dir = tempdir().expect("temp dir");
        let mut sink = PlottersSink::new(dir.path());
        let path = sink
            .render_png(&posterior_figure("posterior", &balanced_posterior()))
            .expect("figure renders");
        assert_eq!(path, dir.path().join("posterior.png"));
        assert!(fs::metadata(&path).expect("png exists").len() > 0);
        assert_eq!(sink.rendered(), &[path]);
    }

    #[test]
    fn sweep_grid_is_written_through_the_render_sink() {
        let sweep = ConvergenceSweep::new(0.3, 64).expect("sweep");
        let result = sweep
            .run(
                &mut StdRng::seed_from_u64(9),
                &BiasGrid::standard(),
                &[Prior::Uniform, Prior::default_gaussian()],
            )
            .expect("sweep runs");
        let dir = tempdir().expect("temp dir");
        let mut sink = PlottersSink::new(dir.path().join("plots"));
        sink.render(&sweep_figure("sweep", &result)).expect("render succeeds");
        assert!(dir.path().join("plots/sweep.png").is_file());
    }

    #[test]
    fn text_free_rendering_needs_no_font() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bare.png");
        let figure = posterior_figure("bare", &balanced_posterior());
        draw_figure(&path, &figure, Labels::Hidden).expect("lines only");
        assert!(path.is_file());
    }
}
