use crate::{
    AggregateCounters, AnalysisConfig, ChannelSpec, ConfigError, CountersError, Event,
    EventResult, EventSource, PipelineError, ResultSink, Waveform, config::validate_all, fires,
    integrate, transform,
};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Whether an event contributed to the counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Processed,
    /// The event was malformed and left the counters untouched, apart from `events_skipped`.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceOutcome {
    Processed { events: u64, skipped: u64 },
    /// The source failed part way through, and everything read from it was discarded.
    Skipped { events_discarded: u64 },
}

/// Runs a fixed set of analyses over a stream of events and owns the run's counters.
#[derive(Debug)]
pub struct Pipeline {
    analyses: Vec<AnalysisConfig>,
    counters: AggregateCounters,
}

impl Pipeline {
    pub fn new(analyses: Vec<AnalysisConfig>) -> Result<Self, ConfigError> {
        validate_all(&analyses)?;
        let counters = AggregateCounters::for_analyses(&analyses)?;
        for analysis in &analyses {
            debug!(
                label = %analysis.label,
                trigger = %analysis.trigger,
                "Analysis configured"
            );
        }
        Ok(Self { analyses, counters })
    }

    pub fn analyses(&self) -> &[AnalysisConfig] {
        &self.analyses
    }

    pub fn counters(&self) -> &AggregateCounters {
        &self.counters
    }

    /// Computes the result of every analysis for `event` without touching the counters.
    ///
    /// Every channel an analysis reads is checked, whether or not its trigger fires.
    pub fn evaluate(&self, event: &Event) -> Result<Vec<EventResult>, PipelineError> {
        evaluate(&self.analyses, event)
    }

    /// Evaluates `event` and commits its results.
    ///
    /// Events with malformed waveforms are logged and counted as skipped, other errors abort
    /// the run. Counters accumulated so far remain available through [Self::finish].
    pub fn process_event<S: ResultSink>(
        &mut self,
        event: &Event,
        sink: &mut S,
    ) -> Result<EventOutcome, PipelineError> {
        process_event(&self.analyses, &mut self.counters, event, sink)
    }

    /// Processes every event of `source`.
    ///
    /// The source's contribution is merged into the run counters only once it is exhausted. If
    /// reading fails, the whole source is counted as a skipped file instead. Results already
    /// passed to `sink` are not recalled.
    pub fn process_source<E: EventSource, S: ResultSink>(
        &mut self,
        source: &mut E,
        sink: &mut S,
    ) -> Result<SourceOutcome, PipelineError> {
        let mut scratch = AggregateCounters::for_analyses(&self.analyses)?;
        loop {
            match source.next_event() {
                Ok(Some(event)) => {
                    process_event(&self.analyses, &mut scratch, &event, sink)?;
                }
                Ok(None) => break,
                Err(e) => {
                    let events_discarded = scratch.events_processed + scratch.events_skipped;
                    warn!(error = %e, events_discarded, "Discarding source after read error");
                    self.counters.files_skipped += 1;
                    return Ok(SourceOutcome::Skipped { events_discarded });
                }
            }
        }
        scratch.files_processed = 1;
        self.counters.merge(&scratch)?;
        info!(
            events = scratch.events_processed,
            skipped = scratch.events_skipped,
            "Source processed"
        );
        Ok(SourceOutcome::Processed {
            events: scratch.events_processed,
            skipped: scratch.events_skipped,
        })
    }

    /// Records a source that could not be read at all.
    pub fn skip_file(&mut self, reason: impl Display) {
        warn!(%reason, "Skipping file");
        self.counters.files_skipped += 1;
    }

    pub fn finish(self) -> AggregateCounters {
        self.counters
    }
}

fn waveform<'a>(event: &'a Event, spec: &ChannelSpec) -> Result<Waveform<'a>, PipelineError> {
    let samples = event
        .samples(&spec.id)
        .ok_or(PipelineError::MissingChannel {
            event_id: event.id,
            channel: spec.id,
        })?;
    Waveform::new(spec, samples).map_err(|source| PipelineError::Waveform {
        event_id: event.id,
        source,
    })
}

#[tracing::instrument(skip_all, fields(event_id = event.id))]
fn evaluate(analyses: &[AnalysisConfig], event: &Event) -> Result<Vec<EventResult>, PipelineError> {
    // Missing channels take precedence, as they invalidate the run rather than the event.
    if let Some(spec) = analyses
        .iter()
        .flat_map(AnalysisConfig::required_channels)
        .find(|spec| event.samples(&spec.id).is_none())
    {
        return Err(PipelineError::MissingChannel {
            event_id: event.id,
            channel: spec.id,
        });
    }

    analyses
        .iter()
        .map(|analysis| evaluate_analysis(analysis, event))
        .collect()
}

#[tracing::instrument(skip_all, level = "trace", fields(label = %analysis.label, fired))]
fn evaluate_analysis(
    analysis: &AnalysisConfig,
    event: &Event,
) -> Result<EventResult, PipelineError> {
    let triggers = analysis
        .trigger
        .triggers()
        .iter()
        .map(|trigger| waveform(event, &trigger.channel).map(|waveform| (trigger, waveform)))
        .collect::<Result<Vec<_>, _>>()?;
    let signals = analysis
        .signals()
        .iter()
        .map(|spec| waveform(event, spec))
        .collect::<Result<Vec<_>, _>>()?;

    // Members are tried in order, stopping at the first that fires.
    let fired_by = triggers
        .iter()
        .find(|(trigger, waveform)| fires(waveform, trigger.threshold_mv))
        .map(|&(trigger, _)| *trigger);
    tracing::Span::current().record("fired", fired_by.is_some());

    let mut result = EventResult {
        event_id: event.id,
        fired_by,
        traces: Vec::new(),
        integrated_sum: None,
    };
    if let Some(output) = analysis.output.as_ref().filter(|_| fired_by.is_some()) {
        if output.emit.emits_trace() {
            result.traces = signals.iter().map(transform).collect();
        }
        if output.emit.emits_integrated_sum() {
            result.integrated_sum = Some(integrate(&signals));
        }
    }
    Ok(result)
}

fn process_event<S: ResultSink>(
    analyses: &[AnalysisConfig],
    counters: &mut AggregateCounters,
    event: &Event,
    sink: &mut S,
) -> Result<EventOutcome, PipelineError> {
    let results = match evaluate(analyses, event) {
        Ok(results) => results,
        Err(e) if !e.is_fatal() => {
            warn!(event_id = event.id, error = %e, "Skipping event");
            counters.events_skipped += 1;
            return Ok(EventOutcome::Skipped);
        }
        Err(e) => return Err(e),
    };

    for ((analysis, tally), result) in analyses
        .iter()
        .zip(counters.tallies_mut())
        .zip(&results)
    {
        if result.fired() {
            tally
                .record(result.integrated_sum)
                .map_err(|source| CountersError::Histogram {
                    label: analysis.label.clone(),
                    source,
                })?;
        }
        sink.accept(analysis, result);
    }
    counters.events_processed += 1;
    Ok(EventOutcome::Processed)
}
