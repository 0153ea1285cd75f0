use serde::Deserialize;
use std::{collections::HashMap, io::BufRead, path::Path};
use thiserror::Error;
use waveform_analysis::{Event, EventSource};
use waveform_common::{ChannelId, ChannelIdError, EventId, Intensity};

#[derive(Debug, Error)]
pub(crate) enum SourceError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Malformed event on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Invalid channel name on line {line}: {source}")]
    Channel { line: usize, source: ChannelIdError },
    #[error("Channel {channel} appears more than once on line {line}")]
    DuplicateChannel { line: usize, channel: ChannelId },
}

/// One line of an event file.
#[derive(Deserialize)]
struct EventRecord {
    event_id: EventId,
    /// Keyed by either channel form, `b1ch2` or `adc_b1_ch2`.
    channels: HashMap<String, Vec<Intensity>>,
}

/// Reads events stored as one JSON object per line, skipping blank lines.
pub(crate) struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }

    fn parse(&self) -> Result<Event, SourceError> {
        let line = self.line;
        let record: EventRecord = serde_json::from_str(&self.buffer)
            .map_err(|source| SourceError::Json { line, source })?;
        record
            .channels
            .into_iter()
            .try_fold(
                Event::new(record.event_id),
                |mut event, (name, samples)| -> Result<Event, SourceError> {
                    let channel = name
                        .parse::<ChannelId>()
                        .map_err(|source| SourceError::Channel { line, source })?;
                    // `b4ch9` and `adc_b4_ch9` name the same channel.
                    if event.insert(channel, samples).is_some() {
                        return Err(SourceError::DuplicateChannel { line, channel });
                    }
                    Ok(event)
                },
            )
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    type Error = SourceError;

    fn next_event(&mut self) -> Result<Option<Event>, Self::Error> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if !self.buffer.trim().is_empty() {
                return self.parse().map(Some);
            }
        }
    }
}

/// Label identifying an input file in plot names: the digits after the last `_` of the
/// file stem, as in `run_42.jsonl`, or `unknown`.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('_'))
        .map(|(_, suffix)| suffix)
        .filter(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("unknown")
        .to_owned()
}
