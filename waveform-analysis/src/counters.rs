use crate::{
    AnalysisConfig, ConfigError, CountersError, Histogram, HistogramError, Real, TriggerGroup,
};
use std::fmt;

/// Running results of one analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerTally {
    pub label: String,
    pub trigger: TriggerGroup,
    pub triggered: u64,
    /// Present if the analysis emits integrated sums.
    pub integrated_sums: Option<Histogram>,
}

impl TriggerTally {
    fn for_analysis(analysis: &AnalysisConfig) -> Result<Self, HistogramError> {
        let integrated_sums = analysis
            .output
            .as_ref()
            .filter(|output| output.emit.emits_integrated_sum())
            .map(|output| Histogram::new(output.histogram))
            .transpose()?;
        Ok(Self {
            label: analysis.label.clone(),
            trigger: analysis.trigger.clone(),
            triggered: 0,
            integrated_sums,
        })
    }

    pub(crate) fn record(&mut self, integrated_sum: Option<Real>) -> Result<(), HistogramError> {
        self.triggered += 1;
        if let (Some(histogram), Some(sum)) = (self.integrated_sums.as_mut(), integrated_sum) {
            histogram.fill(sum)?;
        }
        Ok(())
    }

    fn merge(&mut self, other: &TriggerTally) -> Result<(), HistogramError> {
        match (self.integrated_sums.as_mut(), other.integrated_sums.as_ref()) {
            (Some(histogram), Some(other)) => histogram.merge(other)?,
            (None, None) => {}
            _ => return Err(HistogramError::BinningMismatch),
        }
        self.triggered += other.triggered;
        Ok(())
    }
}

/// Run-wide counts, one [TriggerTally] per analysis in configuration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateCounters {
    pub events_processed: u64,
    pub events_skipped: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    tallies: Vec<TriggerTally>,
}

impl AggregateCounters {
    pub(crate) fn for_analyses(analyses: &[AnalysisConfig]) -> Result<Self, ConfigError> {
        let tallies = analyses
            .iter()
            .map(|analysis| {
                TriggerTally::for_analysis(analysis).map_err(|source| ConfigError::Histogram {
                    label: analysis.label.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            tallies,
            ..Default::default()
        })
    }

    pub fn tallies(&self) -> &[TriggerTally] {
        &self.tallies
    }

    pub(crate) fn tallies_mut(&mut self) -> &mut [TriggerTally] {
        &mut self.tallies
    }

    pub fn tally(&self, label: &str) -> Option<&TriggerTally> {
        self.tallies.iter().find(|tally| tally.label == label)
    }

    /// Number of events on which the analysis labelled `label` fired.
    pub fn triggered(&self, label: &str) -> Option<u64> {
        self.tally(label).map(|tally| tally.triggered)
    }

    /// Adds counters gathered over a disjoint set of events for the same analyses.
    ///
    /// `self` is left unchanged on error.
    pub fn merge(&mut self, other: &AggregateCounters) -> Result<(), CountersError> {
        if self.tallies.len() != other.tallies.len() {
            return Err(CountersError::AnalysisCountMismatch {
                left: self.tallies.len(),
                right: other.tallies.len(),
            });
        }
        for (index, (left, right)) in self.tallies.iter().zip(&other.tallies).enumerate() {
            if left.label != right.label {
                return Err(CountersError::AnalysisMismatch {
                    index,
                    left: left.label.clone(),
                    right: right.label.clone(),
                });
            }
        }

        let mut merged = self.tallies.clone();
        for (left, right) in merged.iter_mut().zip(&other.tallies) {
            left.merge(right).map_err(|source| CountersError::Histogram {
                label: left.label.clone(),
                source,
            })?;
        }
        self.tallies = merged;
        self.events_processed += other.events_processed;
        self.events_skipped += other.events_skipped;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        Ok(())
    }
}

impl fmt::Display for AggregateCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files processed:  {}", self.files_processed)?;
        writeln!(f, "Files skipped:    {}", self.files_skipped)?;
        writeln!(f, "Events processed: {}", self.events_processed)?;
        writeln!(f, "Events skipped:   {}", self.events_skipped)?;
        writeln!(f, "Triggered events:")?;
        for tally in &self.tallies {
            write!(f, "  {} ({}): {}", tally.label, tally.trigger, tally.triggered)?;
            if let Some(histogram) = &tally.integrated_sums {
                match histogram.mean() {
                    Some(mean) => write!(f, ", integrated sum mean {mean:.1} mV")?,
                    None => write!(f, ", no integrated sums")?,
                }
                if histogram.underflow() + histogram.overflow() > 0 {
                    write!(
                        f,
                        " ({} underflow, {} overflow)",
                        histogram.underflow(),
                        histogram.overflow()
                    )?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
