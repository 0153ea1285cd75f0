use crate::{AmplitudeTrace, AnalysisConfig, Real, TriggerSpec};
use std::{collections::HashMap, convert::Infallible};
use waveform_common::{ChannelId, EventId, Intensity};

/// Raw digitiser codes of every channel read out for one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub channels: HashMap<ChannelId, Vec<Intensity>>,
}

impl Event {
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            channels: HashMap::new(),
        }
    }

    pub fn with_channel(mut self, channel: ChannelId, samples: Vec<Intensity>) -> Self {
        self.insert(channel, samples);
        self
    }

    /// Stores the samples of `channel`, returning any samples previously stored for it.
    pub fn insert(
        &mut self,
        channel: ChannelId,
        samples: Vec<Intensity>,
    ) -> Option<Vec<Intensity>> {
        self.channels.insert(channel, samples)
    }

    pub fn samples(&self, channel: &ChannelId) -> Option<&[Intensity]> {
        self.channels.get(channel).map(Vec::as_slice)
    }
}

/// Supplies events one at a time.
pub trait EventSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `Ok(None)` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<Event>, Self::Error>;
}

/// An [EventSource] over events already in memory.
pub struct IterSource<I> {
    events: I,
}

impl<I: Iterator<Item = Event>> IterSource<I> {
    pub fn new(events: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Event>> EventSource for IterSource<I> {
    type Error = Infallible;

    fn next_event(&mut self) -> Result<Option<Event>, Self::Error> {
        Ok(self.events.next())
    }
}

/// The outcome of one analysis on one event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventResult {
    pub event_id: EventId,
    /// The first trigger of the group that fired, if any.
    pub fired_by: Option<TriggerSpec>,
    /// One trace per signal channel, empty unless the trigger fired and traces are requested.
    pub traces: Vec<AmplitudeTrace>,
    pub integrated_sum: Option<Real>,
}

impl EventResult {
    pub fn fired(&self) -> bool {
        self.fired_by.is_some()
    }
}

/// Receives every [EventResult] as soon as it is committed.
pub trait ResultSink {
    fn accept(&mut self, analysis: &AnalysisConfig, result: &EventResult);
}

/// Discards all results.
impl ResultSink for () {
    fn accept(&mut self, _: &AnalysisConfig, _: &EventResult) {}
}

/// Collects results in memory, tagged with the label of their analysis.
impl ResultSink for Vec<(String, EventResult)> {
    fn accept(&mut self, analysis: &AnalysisConfig, result: &EventResult) {
        self.push((analysis.label.clone(), result.clone()));
    }
}
