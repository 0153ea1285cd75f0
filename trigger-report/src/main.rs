//! Counts the events of digitiser files on which each configured trigger channel crosses its
//! threshold, plots the signal traces of triggered events, and histograms their integrated sums.
//!
//! ```text
//! trigger-report 'data/run_*.jsonl' --trigger b4ch9:short:1000 --trigger b4ch10:short:1000 \
//!     --signal b1ch2:long --signal b1ch3:long --emit both --output-dir plots
//! ```
mod parameters;
mod plot;
mod source;

use anyhow::Context;
use clap::Parser;
use parameters::{ChannelSetWrapper, TriggerSetWrapper};
use plot::{SvgSink, save_integrated_sums};
use source::{JsonLinesSource, file_label};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::{info, info_span, warn};
use waveform_analysis::{
    AggregateCounters, AnalysisConfig, FiredOutput, HistogramSpec, OnFired, Pipeline, Real,
    SignalSpec, TriggerGroup,
};
use waveform_common::{TracerEngine, TracerOptions};

/// Counts and plots the events on which trigger channels cross their thresholds.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Glob patterns matching event files, one JSON object per line.
    #[clap(required = true)]
    files: Vec<String>,

    /// Triggers as `<channels>:<class>[:<polarity>]:<threshold mV>`, e.g. `b4ch9:short:1000`
    /// or `b4ch9-12:short:1000`. One analysis is run per trigger channel.
    #[clap(long = "trigger", required = true)]
    triggers: Vec<TriggerSetWrapper>,

    /// Run a single analysis which counts an event once any of the triggers fires.
    #[clap(long)]
    any_trigger: bool,

    /// Signal channels as `<channels>:<class>[:<polarity>]`, e.g. `b1ch2:long` or
    /// `b1ch2-11:long`. Without any, triggered events are only counted.
    #[clap(long = "signal")]
    signals: Vec<ChannelSetWrapper>,

    /// Output for triggered events: `trace`, `integrated-sum` or `both`.
    #[clap(long, default_value = "both")]
    emit: OnFired,

    /// Number of bins of the integrated sum histograms.
    #[clap(long, default_value = "100")]
    bins: usize,

    /// Lower edge of the integrated sum histograms, in mV.
    #[clap(long, default_value = "0")]
    hist_min: Real,

    /// Upper edge of the integrated sum histograms, in mV.
    #[clap(long, default_value = "1200000")]
    hist_max: Real,

    /// Directory in which plots are saved.
    #[clap(long, default_value = "plots")]
    output_dir: PathBuf,

    /// Maximum number of triggered events plotted per analysis.
    #[clap(long)]
    max_plots: Option<usize>,
}

impl Cli {
    fn analyses(&self) -> anyhow::Result<Vec<AnalysisConfig>> {
        let signals = self
            .signals
            .iter()
            .flat_map(|ChannelSetWrapper(specs)| specs)
            .copied()
            .collect::<Vec<_>>();
        let output = if signals.is_empty() {
            None
        } else {
            let histogram = HistogramSpec {
                bins: self.bins,
                lower: self.hist_min,
                upper: self.hist_max,
            };
            Some(
                FiredOutput::new(SignalSpec::new(signals)?, self.emit).with_histogram(histogram),
            )
        };

        let triggers = self
            .triggers
            .iter()
            .flat_map(|TriggerSetWrapper(triggers)| triggers)
            .copied();
        let groups = if self.any_trigger {
            vec![TriggerGroup::new(triggers.collect())?]
        } else {
            triggers.map(TriggerGroup::from).collect()
        };
        Ok(groups
            .into_iter()
            .map(|group| {
                let analysis = AnalysisConfig::new(group);
                match &output {
                    Some(output) => analysis.with_output(output.clone()),
                    None => analysis,
                }
            })
            .collect())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let _tracer = TracerEngine::new(TracerOptions::default(), env!("CARGO_PKG_NAME"))?;

    let mut pipeline = Pipeline::new(args.analyses()?)?;
    let mut sink = SvgSink::new(args.output_dir.clone(), args.max_plots);

    let outcome = process_files(&mut pipeline, &mut sink, &args.files);

    let counters = pipeline.finish();
    print!("{}", report(&counters, &sink, &args.output_dir));
    outcome.context("Run aborted, the report covers the files completed before the error")
}

/// Runs every file matching `patterns` through `pipeline`.
///
/// Files which cannot be opened or read to the end are counted as skipped. A fatal pipeline
/// error stops the run, leaving the counters of completed files in `pipeline`.
fn process_files(
    pipeline: &mut Pipeline,
    sink: &mut SvgSink,
    patterns: &[String],
) -> anyhow::Result<()> {
    for pattern in patterns {
        let paths = glob::glob(pattern).with_context(|| format!("Invalid pattern '{pattern}'"))?;
        let mut matched = false;
        for path in paths {
            matched = true;
            let path = match path {
                Ok(path) => path,
                Err(e) => {
                    pipeline.skip_file(e);
                    continue;
                }
            };
            let _guard = info_span!("file", path = %path.display()).entered();
            match File::open(&path) {
                Ok(file) => {
                    sink.set_file_label(file_label(&path));
                    let mut source = JsonLinesSource::new(BufReader::new(file));
                    pipeline
                        .process_source(&mut source, sink)
                        .with_context(|| format!("Failed to process '{}'", path.display()))?;
                }
                Err(e) => pipeline.skip_file(e),
            }
        }
        if !matched {
            warn!("No files match '{pattern}'");
        }
    }
    Ok(())
}

/// Saves the integrated sum histograms and renders the counts of the run.
fn report(counters: &AggregateCounters, sink: &SvgSink, output_dir: &Path) -> String {
    for tally in counters.tallies() {
        match save_integrated_sums(tally, output_dir) {
            Ok(Some(path)) => info!(path = %path.display(), "Saved integrated sum histogram"),
            Ok(None) => {}
            Err(e) => {
                warn!(label = %tally.label, error = %e, "Failed to save integrated sum histogram")
            }
        }
    }
    if sink.failures() > 0 {
        warn!("{} plots could not be saved", sink.failures());
    }
    counters.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use waveform_common::EventId;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trigger-report").chain(args.iter().copied())).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trigger-report-run-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// One JSON line with a short 240 sample trace on `channel`, dipping to `minimum` once.
    fn event_line(event_id: EventId, channel: &str, minimum: u16) -> String {
        let mut samples = vec![3000u16; 240];
        samples[150] = minimum;
        serde_json::json!({"event_id": event_id, "channels": {channel: samples}}).to_string()
    }

    fn counting_pipeline() -> Pipeline {
        let cli = parse(&["run_*.jsonl", "--trigger", "b4ch9:short:1000"]);
        Pipeline::new(cli.analyses().unwrap()).unwrap()
    }

    #[test]
    fn one_analysis_per_trigger() {
        let cli = parse(&[
            "run_*.jsonl",
            "--trigger",
            "b4ch9:short:1000",
            "--trigger",
            "b4ch10:short:500",
            "--signal",
            "b1ch2:long",
            "--signal",
            "b1ch3:long",
            "--emit",
            "integrated-sum",
            "--bins",
            "50",
        ]);
        let analyses = cli.analyses().unwrap();
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].label, "b4ch9");
        assert_eq!(analyses[1].trigger.triggers()[0].threshold_mv, 500.0);
        assert_eq!(analyses[0].signals(), analyses[1].signals());
        let output = analyses[1].output.as_ref().unwrap();
        assert_eq!(output.emit, OnFired::IntegratedSum);
        assert_eq!(output.histogram.bins, 50);
        assert_eq!(output.histogram.upper, 1.2e6);
    }

    #[test]
    fn channel_ranges_expand() {
        let cli = parse(&[
            "run_*.jsonl",
            "--trigger",
            "b4ch9-10:short:1000",
            "--signal",
            "b1ch2-11:long",
        ]);
        let analyses = cli.analyses().unwrap();
        let labels = analyses.iter().map(|a| a.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["b4ch9", "b4ch10"]);
        let signals = analyses[0]
            .signals()
            .iter()
            .map(|spec| spec.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(signals.len(), 10);
        assert_eq!(signals.first().map(String::as_str), Some("b1ch2"));
        assert_eq!(signals.last().map(String::as_str), Some("b1ch11"));
    }

    #[test]
    fn any_trigger_combines_triggers() {
        let cli = parse(&[
            "run_*.jsonl",
            "--trigger",
            "b4ch9:short:1000",
            "--trigger",
            "b4ch10:short:500",
            "--any-trigger",
        ]);
        let analyses = cli.analyses().unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].label, "b4ch9+b4ch10");
        assert_eq!(analyses[0].trigger.triggers().len(), 2);
    }

    #[test]
    fn count_only_without_signals() {
        let cli = parse(&["run.jsonl", "--trigger", "b4ch9:short:1000"]);
        let analyses = cli.analyses().unwrap();
        assert!(analyses[0].output.is_none());
    }

    #[test]
    fn reject_bad_arguments() {
        let args = ["trigger-report", "run.jsonl", "--trigger", "b4ch9:medium:1000"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["trigger-report", "run.jsonl", "--trigger", "b4ch9:short:1", "--emit", "all"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["trigger-report", "run.jsonl", "--trigger", "b4ch9-b5ch2:short:1"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["trigger-report", "--trigger", "b4ch9:short:1"]).is_err());
    }

    #[test]
    fn unreadable_file_is_reported_as_skipped() {
        let dir = scratch_dir("skipped");
        let lines = [event_line(1, "b4ch9", 0), event_line(2, "b4ch9", 3000)];
        fs::write(dir.join("run_1.jsonl"), lines.join("\n")).unwrap();
        fs::write(dir.join("run_2.jsonl"), format!("{}\n{{\"event_id\": 4", lines[0])).unwrap();

        let mut pipeline = counting_pipeline();
        let mut sink = SvgSink::new(dir.clone(), None);
        let pattern = dir.join("run_*.jsonl").to_string_lossy().into_owned();
        process_files(&mut pipeline, &mut sink, &[pattern]).unwrap();

        let counters = pipeline.finish();
        let report = report(&counters, &sink, &dir);
        assert!(report.contains("Files processed:  1\n"));
        assert!(report.contains("Files skipped:    1\n"));
        assert!(report.contains("Events processed: 2\n"));
        assert!(report.contains("  b4ch9 (b4ch9 > 1000 mV): 1\n"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn fatal_error_keeps_completed_files() {
        let dir = scratch_dir("fatal");
        fs::write(dir.join("run_1.jsonl"), event_line(1, "b4ch9", 0)).unwrap();
        fs::write(dir.join("run_2.jsonl"), event_line(2, "b4ch10", 0)).unwrap();

        let mut pipeline = counting_pipeline();
        let mut sink = SvgSink::new(dir.clone(), None);
        let pattern = dir.join("run_*.jsonl").to_string_lossy().into_owned();
        let error = process_files(&mut pipeline, &mut sink, &[pattern]).unwrap_err();
        assert!(error.to_string().contains("run_2.jsonl"));

        let counters = pipeline.finish();
        assert_eq!(counters.files_processed, 1);
        assert_eq!(counters.triggered("b4ch9"), Some(1));
        let report = report(&counters, &sink, &dir);
        assert!(report.contains("Files processed:  1\n"));
        assert!(report.contains("Events processed: 1\n"));
        let _ = fs::remove_dir_all(&dir);
    }
}
