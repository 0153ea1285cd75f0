use crate::{ChannelClass, Real};
use thiserror::Error;
use waveform_common::{ChannelId, EventId};

/// Structural problems with the analysis configuration. These abort a run before any
/// event is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown channel class '{0}', expected 'short' or 'long'")]
    UnknownChannelClass(String),
    #[error("Invalid channel specification: {0}")]
    InvalidChannel(String),
    #[error("A signal channel set must contain at least one channel")]
    EmptySignalSpec,
    #[error("A trigger group must contain at least one trigger")]
    EmptyTriggerGroup,
    #[error("Threshold {threshold} mV of analysis '{label}' is not a finite number")]
    NonFiniteThreshold { label: String, threshold: Real },
    #[error("Channel {channel} is configured as both {first} and {second}")]
    ConflictingClass {
        channel: ChannelId,
        first: ChannelClass,
        second: ChannelClass,
    },
    #[error("Analysis '{0}' is configured more than once")]
    DuplicateLabel(String),
    #[error("No analyses configured")]
    NoAnalyses,
    #[error("Invalid histogram for analysis '{label}': {source}")]
    Histogram {
        label: String,
        source: HistogramError,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistogramError {
    #[error("Histogram requires at least one bin")]
    NoBins,
    #[error("Histogram of {bins} bins exceeds the limit of {max} bins")]
    TooManyBins { bins: usize, max: usize },
    #[error("Histogram range [{lower}, {upper}) is empty or not finite")]
    InvalidRange { lower: Real, upper: Real },
    #[error("Cannot fill histogram with NaN")]
    NotANumber,
    #[error("Cannot merge histograms with different binning")]
    BinningMismatch,
}

/// A sample buffer that does not match the channel it is declared for.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaveformError {
    #[error("Channel {channel} holds {actual} samples, but class {class} expects {expected}")]
    LengthMismatch {
        channel: ChannelId,
        class: ChannelClass,
        expected: usize,
        actual: usize,
    },
    #[error("Channel {channel} holds no samples")]
    Empty { channel: ChannelId },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CountersError {
    #[error("Counters track {left} and {right} analyses respectively")]
    AnalysisCountMismatch { left: usize, right: usize },
    #[error("Counters disagree on analysis {index}: '{left}' vs '{right}'")]
    AnalysisMismatch {
        index: usize,
        left: String,
        right: String,
    },
    #[error("Integrated sum histograms of '{label}' cannot be merged: {source}")]
    Histogram {
        label: String,
        source: HistogramError,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Event {event_id} has no waveform for channel {channel}")]
    MissingChannel { event_id: EventId, channel: ChannelId },
    #[error("Event {event_id}: {source}")]
    Waveform {
        event_id: EventId,
        source: WaveformError,
    },
    #[error(transparent)]
    Counters(#[from] CountersError),
}

impl PipelineError {
    /// Whether the error invalidates the whole run, rather than the single event it was raised on.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::Waveform {
                source: WaveformError::LengthMismatch { .. },
                ..
            }
        )
    }
}
