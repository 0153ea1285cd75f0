use anyhow::Result;
use plotters::{
    chart::{ChartBuilder, ChartContext},
    coord::{Shift, types::RangedCoordf64},
    prelude::{Cartesian2d, DrawingArea, IntoDrawingArea, Rectangle, SVGBackend},
    series::LineSeries,
    style::{BLUE, Color, IntoFont, WHITE},
};
use std::{
    collections::HashMap,
    fs,
    ops::Range,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};
use waveform_analysis::{
    AmplitudeTrace, AnalysisConfig, EventResult, Real, ResultSink, TriggerSpec, TriggerTally,
};
use waveform_common::EventId;

type PlotDrawingArea<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type PlotChartContext<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const PLOT_SIZE: (u32, u32) = (1024, 640);

/// Widens `lower..upper` by 5% on each side, or to a unit range if it is empty.
fn padded(lower: Real, upper: Real) -> Range<Real> {
    let margin = 0.05 * (upper - lower);
    if margin > 0.0 {
        (lower - margin)..(upper + margin)
    } else {
        (lower - 1.0)..(upper + 1.0)
    }
}

fn build_chart<'a, 'b>(
    root: &'a PlotDrawingArea<'b>,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    x: Range<Real>,
    y: Range<Real>,
) -> Result<PlotChartContext<'a, 'b>> {
    let mut chart = ChartBuilder::on(root)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .margin(10)
        .caption(caption, ("sans-serif", 20.0).into_font())
        .build_cartesian_2d(x, y)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    Ok(chart)
}

/// Path of the plot of `trace`, for an event triggered by `analysis`.
pub(crate) fn trace_plot_path(
    output_dir: &Path,
    analysis: &AnalysisConfig,
    trace: &AmplitudeTrace,
    event_id: EventId,
    file_label: &str,
) -> PathBuf {
    output_dir
        .join(format!(
            "{}_waveforms_{}_triggered",
            trace.channel,
            analysis.trigger.name()
        ))
        .join(format!("event_{event_id}_from_{file_label}.svg"))
}

/// Title of the plots of an event, naming the trigger that fired.
pub(crate) fn trace_plot_title(
    fired_by: &TriggerSpec,
    event_id: EventId,
    file_label: &str,
) -> String {
    format!(
        "Event {event_id} ({} triggered > {} mV) from file {file_label}",
        fired_by.channel.id, fired_by.threshold_mv
    )
}

#[instrument(skip_all, level = "debug", fields(path = %path.display()))]
fn save_trace(trace: &AmplitudeTrace, title: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (lower, upper) = trace.range().unwrap_or_default();
    let mut chart = build_chart(
        &root,
        title,
        ("Sample", "mV"),
        0.0..trace.points.len() as Real,
        padded(lower, upper),
    )?;
    chart.draw_series(LineSeries::new(
        trace.points.iter().map(|&(index, mv)| (index as Real, mv)),
        &BLUE,
    ))?;

    root.present()?;
    Ok(())
}

/// Saves the distribution of integrated sums of one analysis as `integrated_sum_<label>.svg`.
#[instrument(skip_all, level = "debug", fields(label = %tally.label))]
pub(crate) fn save_integrated_sums(
    tally: &TriggerTally,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(histogram) = &tally.integrated_sums else {
        return Ok(None);
    };
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("integrated_sum_{}.svg", tally.label));
    let title = format!(
        "Integrated sum ({}), {} entries",
        tally.trigger,
        histogram.entries()
    );
    let spec = histogram.spec();
    let max_count = histogram.counts().iter().copied().max().unwrap_or_default();

    {
        let root = SVGBackend::new(&path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = build_chart(
            &root,
            &title,
            ("Integrated sum (mV)", "Events"),
            spec.lower..spec.upper,
            0.0..(max_count.max(1) as Real * 1.1),
        )?;
        chart.draw_series(histogram.iter().map(|(lo, hi, count)| {
            Rectangle::new([(lo, 0.0), (hi, count as Real)], BLUE.filled())
        }))?;
        root.present()?;
    }
    Ok(Some(path))
}

/// Writes one SVG plot per signal trace of every triggered event.
pub(crate) struct SvgSink {
    output_dir: PathBuf,
    max_plots: Option<usize>,
    file_label: String,
    /// Number of events plotted, by analysis label.
    plotted: HashMap<String, usize>,
    failures: usize,
}

impl SvgSink {
    pub(crate) fn new(output_dir: PathBuf, max_plots: Option<usize>) -> Self {
        Self {
            output_dir,
            max_plots,
            file_label: "unknown".to_owned(),
            plotted: HashMap::new(),
            failures: 0,
        }
    }

    /// Sets the label used in the names of plots of subsequent events.
    pub(crate) fn set_file_label(&mut self, file_label: String) {
        self.file_label = file_label;
    }

    pub(crate) fn failures(&self) -> usize {
        self.failures
    }

    pub(crate) fn plotted(&self, label: &str) -> usize {
        self.plotted.get(label).copied().unwrap_or_default()
    }
}

impl ResultSink for SvgSink {
    fn accept(&mut self, analysis: &AnalysisConfig, result: &EventResult) {
        let Some(fired_by) = &result.fired_by else {
            return;
        };
        if result.traces.is_empty() {
            return;
        }
        let plotted = self.plotted.entry(analysis.label.clone()).or_default();
        if self.max_plots.is_some_and(|max| *plotted >= max) {
            return;
        }
        *plotted += 1;

        let title = trace_plot_title(fired_by, result.event_id, &self.file_label);
        for trace in &result.traces {
            let path = trace_plot_path(
                &self.output_dir,
                analysis,
                trace,
                result.event_id,
                &self.file_label,
            );
            match save_trace(trace, &title, &path) {
                Ok(()) => debug!(path = %path.display(), "Saved trace plot"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to save trace plot");
                    self.failures += 1;
                }
            }
        }
    }
}
