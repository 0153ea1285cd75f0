use crate::{ChannelClass, ConfigError, HistogramSpec, Polarity, Real};
use itertools::Itertools;
use std::{collections::HashMap, fmt, str::FromStr};
use strum::{Display, EnumString};
use waveform_common::ChannelId;

/// A channel identifier together with the digitiser class it is read out with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelSpec {
    pub id: ChannelId,
    pub class: ChannelClass,
    pub polarity: Polarity,
}

impl ChannelSpec {
    pub fn new(id: ChannelId, class: ChannelClass) -> Self {
        Self {
            id,
            class,
            polarity: Polarity::default(),
        }
    }

    pub fn with_polarity(self, polarity: Polarity) -> Self {
        Self { polarity, ..self }
    }
}

impl fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.class)
    }
}

/// Parses `b1ch2:long`, optionally followed by `:positive` or `:negative`.
impl FromStr for ChannelSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let id = parts
            .next()
            .unwrap_or_default()
            .parse::<ChannelId>()
            .map_err(|e| ConfigError::InvalidChannel(e.to_string()))?;
        let class = parts.next().ok_or_else(|| {
            ConfigError::InvalidChannel(format!("missing channel class in '{s}'"))
        })?;
        let class = ChannelClass::from_str(class)
            .map_err(|_| ConfigError::UnknownChannelClass(class.to_owned()))?;
        let polarity = match parts.next() {
            Some(polarity) => Polarity::from_str(polarity)
                .map_err(|_| ConfigError::InvalidChannel(format!("unknown polarity in '{s}'")))?,
            None => Polarity::default(),
        };
        if parts.next().is_some() {
            return Err(ConfigError::InvalidChannel(format!(
                "too many fields in '{s}'"
            )));
        }
        Ok(Self::new(id, class).with_polarity(polarity))
    }
}

/// The channel whose threshold crossing marks an event as interesting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerSpec {
    pub channel: ChannelSpec,
    pub threshold_mv: Real,
}

impl TriggerSpec {
    pub fn new(channel: ChannelSpec, threshold_mv: Real) -> Self {
        Self {
            channel,
            threshold_mv,
        }
    }
}

impl fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {} mV", self.channel.id, self.threshold_mv)
    }
}

/// Non-empty set of triggers which fires as soon as any of its members fires.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerGroup {
    triggers: Vec<TriggerSpec>,
}

impl TriggerGroup {
    pub fn new(triggers: Vec<TriggerSpec>) -> Result<Self, ConfigError> {
        if triggers.is_empty() {
            Err(ConfigError::EmptyTriggerGroup)
        } else {
            Ok(Self { triggers })
        }
    }

    /// Members in evaluation order.
    pub fn triggers(&self) -> &[TriggerSpec] {
        &self.triggers
    }

    /// Trigger channels joined by `+`, e.g. `b4ch9+b4ch10`.
    pub fn name(&self) -> String {
        self.triggers
            .iter()
            .map(|trigger| trigger.channel.id)
            .join("+")
    }
}

impl From<TriggerSpec> for TriggerGroup {
    fn from(trigger: TriggerSpec) -> Self {
        Self {
            triggers: vec![trigger],
        }
    }
}

impl fmt::Display for TriggerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.triggers.iter().join(" or "))
    }
}

/// Non-empty, ordered set of channels whose amplitudes are reported for triggered events.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalSpec {
    channels: Vec<ChannelSpec>,
}

impl SignalSpec {
    pub fn new(channels: Vec<ChannelSpec>) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            Err(ConfigError::EmptySignalSpec)
        } else {
            Ok(Self { channels })
        }
    }

    pub fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }
}

/// What is produced for an event once its trigger has fired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OnFired {
    /// One amplitude trace per signal channel.
    Trace,
    /// A single sum over every sample of every signal channel.
    IntegratedSum,
    #[default]
    Both,
}

impl OnFired {
    pub fn emits_trace(self) -> bool {
        matches!(self, OnFired::Trace | OnFired::Both)
    }

    pub fn emits_integrated_sum(self) -> bool {
        matches!(self, OnFired::IntegratedSum | OnFired::Both)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FiredOutput {
    pub signals: SignalSpec,
    pub emit: OnFired,
    /// Binning of the integrated sum distribution, only used if sums are emitted.
    pub histogram: HistogramSpec,
}

impl FiredOutput {
    pub fn new(signals: SignalSpec, emit: OnFired) -> Self {
        Self {
            signals,
            emit,
            histogram: HistogramSpec::default(),
        }
    }

    pub fn with_histogram(self, histogram: HistogramSpec) -> Self {
        Self { histogram, ..self }
    }
}

/// A trigger group with the outputs requested when it fires.
///
/// An analysis without output only counts triggered events.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub label: String,
    pub trigger: TriggerGroup,
    pub output: Option<FiredOutput>,
}

impl AnalysisConfig {
    /// Creates a counting-only analysis, labelled after its trigger channels.
    pub fn new(trigger: impl Into<TriggerGroup>) -> Self {
        let trigger = trigger.into();
        Self {
            label: trigger.name(),
            trigger,
            output: None,
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    pub fn with_output(self, output: FiredOutput) -> Self {
        Self {
            output: Some(output),
            ..self
        }
    }

    pub fn signals(&self) -> &[ChannelSpec] {
        self.output
            .as_ref()
            .map(|output| output.signals.channels())
            .unwrap_or_default()
    }

    /// Every channel this analysis reads, triggers first.
    pub fn required_channels(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.trigger
            .triggers()
            .iter()
            .map(|trigger| &trigger.channel)
            .chain(self.signals())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trigger) = self
            .trigger
            .triggers()
            .iter()
            .find(|trigger| !trigger.threshold_mv.is_finite())
        {
            return Err(ConfigError::NonFiniteThreshold {
                label: self.label.clone(),
                threshold: trigger.threshold_mv,
            });
        }
        if let Some(output) = self
            .output
            .as_ref()
            .filter(|output| output.emit.emits_integrated_sum())
        {
            output
                .histogram
                .validate()
                .map_err(|source| ConfigError::Histogram {
                    label: self.label.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Checks a set of analyses for consistency with each other, as well as individually.
pub(crate) fn validate_all(analyses: &[AnalysisConfig]) -> Result<(), ConfigError> {
    if analyses.is_empty() {
        return Err(ConfigError::NoAnalyses);
    }
    let mut labels = Vec::with_capacity(analyses.len());
    let mut classes = HashMap::<ChannelId, ChannelClass>::new();
    for analysis in analyses {
        analysis.validate()?;
        if labels.contains(&analysis.label.as_str()) {
            return Err(ConfigError::DuplicateLabel(analysis.label.clone()));
        }
        labels.push(analysis.label.as_str());

        for spec in analysis.required_channels() {
            let first = *classes.entry(spec.id).or_insert(spec.class);
            if first != spec.class {
                return Err(ConfigError::ConflictingClass {
                    channel: spec.id,
                    first,
                    second: spec.class,
                });
            }
        }
    }
    Ok(())
}
