//! Baseline estimation, threshold triggering and charge integration for digitised
//! detector waveforms.
//!
//! The crate works purely on in-memory sample buffers. An [Event] maps channel identifiers
//! to raw digitiser codes; a [Pipeline] built from a list of [AnalysisConfig]s evaluates
//! each configured trigger on every event and, for triggered events, produces amplitude
//! traces and integrated sums in millivolts. Typical usage:
//! ```no_run
//! # use waveform_analysis::*;
//! # use waveform_common::ChannelId;
//! # fn events() -> Vec<Event> { Vec::new() }
//! let trigger = TriggerSpec::new(ChannelSpec::new(ChannelId::new(4, 9), ChannelClass::Short), 1000.0);
//! let signals = SignalSpec::new(vec![ChannelSpec::new(ChannelId::new(1, 2), ChannelClass::Long)])?;
//! let analysis = AnalysisConfig::new(trigger)
//!     .with_output(FiredOutput::new(signals, OnFired::IntegratedSum));
//!
//! let mut pipeline = Pipeline::new(vec![analysis])?;
//! pipeline.process_source(&mut IterSource::new(events()), &mut ())?;
//! println!("{}", pipeline.finish());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod baseline;
mod config;
mod counters;
mod error;
mod event;
mod histogram;
mod integration;
mod pipeline;
mod trace;
mod trigger;
mod units;
mod waveform;

pub use baseline::{BASELINE_WINDOW, baseline};
pub use config::{
    AnalysisConfig, ChannelSpec, FiredOutput, OnFired, SignalSpec, TriggerGroup, TriggerSpec,
};
pub use counters::{AggregateCounters, TriggerTally};
pub use error::{ConfigError, CountersError, HistogramError, PipelineError, WaveformError};
pub use event::{Event, EventResult, EventSource, IterSource, ResultSink};
pub use histogram::{Histogram, HistogramSpec, MAX_BINS};
pub use integration::{channel_integral, integrate};
pub use pipeline::{EventOutcome, Pipeline, SourceOutcome};
pub use trace::{AmplitudeTrace, TracePoint, transform};
pub use trigger::{fires, first_crossing};
pub use units::{ChannelClass, FULL_SCALE_MV, Polarity, to_millivolts};
pub use waveform::Waveform;

pub type Real = f64;
