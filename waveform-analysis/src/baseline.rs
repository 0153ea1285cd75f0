use crate::Real;
use itertools::Itertools;
use waveform_common::Intensity;

/// Number of leading samples used to estimate the baseline.
pub const BASELINE_WINDOW: usize = 100;

/// Estimates the zero-signal level of a trace, in raw codes.
///
/// This is the median of the first [BASELINE_WINDOW] samples (or of all samples if the trace
/// is shorter). For an even number of samples the two central values are averaged. An empty
/// trace has a baseline of zero.
pub fn baseline(samples: &[Intensity]) -> Real {
    let window = samples.get(..BASELINE_WINDOW).unwrap_or(samples);
    let sorted = window.iter().copied().sorted_unstable().collect::<Vec<_>>();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        match (mid.checked_sub(1).and_then(|i| sorted.get(i)), sorted.get(mid)) {
            (Some(&lower), Some(&upper)) => (Real::from(lower) + Real::from(upper)) / 2.0,
            _ => 0.0,
        }
    } else {
        sorted.get(mid).copied().map(Real::from).unwrap_or_default()
    }
}
