//! Output seams: figures go to a [`RenderSink`], text goes to a [`ReportSink`].

use std::io::Write;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Blue,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Stroke used for a series or reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: Color,
    pub style: LineStyle,
}

impl Stroke {
    pub const fn solid(color: Color) -> Self {
        Self {
            color,
            style: LineStyle::Solid,
        }
    }

    pub const fn dashed(color: Color) -> Self {
        Self {
            color,
            style: LineStyle::Dashed,
        }
    }
}

/// A polyline of `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VLine {
    pub x: f64,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Panel {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub series: Vec<Series>,
    pub vlines: Vec<VLine>,
    pub x_ticks: Vec<Tick>,
    pub show_legend: bool,
    pub hide_y_axis: bool,
}

impl Panel {
    /// Largest y value across all series.
    pub fn y_max(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|series| series.points.iter().map(|(_, y)| *y))
            .fold(0.0, f64::max)
    }
}

/// Panels laid out row-major on a `rows x cols` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn single(name: impl Into<String>, panel: Panel) -> Self {
        Self {
            name: name.into(),
            rows: 1,
            cols: 1,
            panels: vec![panel],
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to render figure '{figure}': {message}")]
    Render { figure: String, message: String },
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

pub trait RenderSink {
    fn render(&mut self, figure: &Figure) -> Result<(), SinkError>;
}

pub trait ReportSink {
    fn report(&mut self, line: &str) -> Result<(), SinkError>;
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn render(&mut self, figure: &Figure) -> Result<(), SinkError> {
        (**self).render(figure)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn report(&mut self, line: &str) -> Result<(), SinkError> {
        (**self).report(line)
    }
}

/// Writes each report as a line to any [`Write`] target.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn report(&mut self, line: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }
}

/// Discards figures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderSink;

impl RenderSink for NullRenderSink {
    fn render(&mut self, _figure: &Figure) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps everything it receives in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub figures: Vec<Figure>,
    pub lines: Vec<String>,
}

impl RenderSink for MemorySink {
    fn render(&mut self, figure: &Figure) -> Result<(), SinkError> {
        self.figures.push(figure.clone());
        Ok(())
    }
}

impl ReportSink for MemorySink {
    fn report(&mut self, line: &str) -> Result<(), SinkError> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_appends_newlines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.report("first").unwrap();
        sink.report("second").unwrap();
        assert_eq!(sink.into_inner(), b"first\nsecond\n");
    }

    #[test]
    fn memory_sink_records_figures() {
        let mut sink = MemorySink::default();
        let figure = Figure::single("demo", Panel::default());
        sink.render(&figure).unwrap();
        assert_eq!(sink.figures, vec![figure]);
    }

    #[test]
    fn panel_y_max_spans_series() {
        let panel = Panel {
            series: vec![
                Series {
                    label: None,
                    points: vec![(0.0, 0.1), (1.0, 0.3)],
                    stroke: Stroke::solid(Color::Blue),
                },
                Series {
                    label: None,
                    points: vec![(0.0, 0.7)],
                    stroke: Stroke::dashed(Color::Red),
                },
            ],
            ..Panel::default()
        };
        assert_eq!(panel.y_max(), 0.7);
    }
}
