use crate::Real;
use strum::{Display, EnumIter, EnumString};
use waveform_common::Intensity;

/// Input range of every digitiser board, in millivolts.
pub const FULL_SCALE_MV: Real = 2000.0;

/// Resolution and trace length of a digitiser board.
///
/// The conversion factor divides the full scale range by the largest code, `2^bits - 1`,
/// rather than by the number of levels. Thresholds used with this crate are tuned
/// against that convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChannelClass {
    /// 12-bit board, 240 samples per trace.
    Short,
    /// 14-bit boards, 1920 samples per trace.
    Long,
}

impl ChannelClass {
    pub const fn bits(self) -> u32 {
        match self {
            ChannelClass::Short => 12,
            ChannelClass::Long => 14,
        }
    }

    pub const fn levels(self) -> u32 {
        1 << self.bits()
    }

    pub const fn sample_count(self) -> usize {
        match self {
            ChannelClass::Short => 240,
            ChannelClass::Long => 1920,
        }
    }

    pub fn mv_per_code(self) -> Real {
        FULL_SCALE_MV / Real::from(self.levels() - 1)
    }
}

/// Direction of a genuine pulse in raw digitiser codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Polarity {
    Positive,
    /// Pulses dip below the baseline; amplitudes are negated so that pulses come out positive.
    #[default]
    Negative,
}

/// Converts one raw code into a baseline subtracted amplitude in millivolts.
#[inline]
pub fn to_millivolts(
    sample: Intensity,
    baseline: Real,
    class: ChannelClass,
    polarity: Polarity,
) -> Real {
    let shifted = Real::from(sample) - baseline;
    match polarity {
        Polarity::Negative => -shifted * class.mv_per_code(),
        Polarity::Positive => shifted * class.mv_per_code(),
    }
}
