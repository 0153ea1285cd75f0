use crate::{HistogramError, Real};
use itertools::Itertools;

/// Largest number of bins a histogram may be created with.
pub const MAX_BINS: usize = 1 << 20;

/// Fixed-width binning over `[lower, upper)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramSpec {
    pub bins: usize,
    pub lower: Real,
    pub upper: Real,
}

impl Default for HistogramSpec {
    fn default() -> Self {
        Self {
            bins: 100,
            lower: 0.0,
            upper: 1.2e6,
        }
    }
}

impl HistogramSpec {
    pub fn validate(&self) -> Result<(), HistogramError> {
        if self.bins == 0 {
            return Err(HistogramError::NoBins);
        }
        if self.bins > MAX_BINS {
            return Err(HistogramError::TooManyBins {
                bins: self.bins,
                max: MAX_BINS,
            });
        }
        if !(self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper) {
            return Err(HistogramError::InvalidRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    pub fn bin_width(&self) -> Real {
        (self.upper - self.lower) / self.bins as Real
    }

    /// The `bins + 1` bin edges, from `lower` to `upper`.
    pub fn edges(&self) -> Vec<Real> {
        let width = self.bin_width();
        (0..self.bins)
            .map(|i| self.lower + i as Real * width)
            .chain(std::iter::once(self.upper))
            .collect()
    }
}

/// Frequency distribution of values with underflow and overflow counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    spec: HistogramSpec,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
    sum: Real,
}

impl Histogram {
    pub fn new(spec: HistogramSpec) -> Result<Self, HistogramError> {
        spec.validate()?;
        Ok(Self {
            spec,
            counts: vec![0; spec.bins],
            underflow: 0,
            overflow: 0,
            sum: 0.0,
        })
    }

    pub fn spec(&self) -> &HistogramSpec {
        &self.spec
    }

    pub fn fill(&mut self, value: Real) -> Result<(), HistogramError> {
        if value.is_nan() {
            return Err(HistogramError::NotANumber);
        }
        if value < self.spec.lower {
            self.underflow += 1;
        } else if value >= self.spec.upper {
            self.overflow += 1;
        } else {
            let bin = ((value - self.spec.lower) / self.spec.bin_width()) as usize;
            // Rounding can push values just below `upper` into the bin past the end.
            let bin = bin.min(self.spec.bins - 1);
            if let Some(count) = self.counts.get_mut(bin) {
                *count += 1;
            }
        }
        self.sum += value;
        Ok(())
    }

    /// Adds the contents of `other`, which must have identical binning.
    pub fn merge(&mut self, other: &Histogram) -> Result<(), HistogramError> {
        if self.spec != other.spec {
            return Err(HistogramError::BinningMismatch);
        }
        for (count, other) in self.counts.iter_mut().zip(&other.counts) {
            *count += other;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.sum += other.sum;
        Ok(())
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Number of values filled, including underflow and overflow.
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.underflow + self.overflow
    }

    /// Mean of every value filled, including those outside the range.
    pub fn mean(&self) -> Option<Real> {
        let entries = self.entries();
        (entries > 0).then(|| self.sum / entries as Real)
    }

    /// Iterates over `(lower edge, upper edge, count)` of each bin.
    pub fn iter(&self) -> impl Iterator<Item = (Real, Real, u64)> + '_ {
        self.spec
            .edges()
            .into_iter()
            .tuple_windows()
            .zip(self.counts.iter().copied())
            .map(|((lo, hi), count)| (lo, hi, count))
    }
}
