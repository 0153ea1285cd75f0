use crate::{Real, Waveform};
use tracing::trace;

/// Index of the first sample whose amplitude strictly exceeds `threshold_mv`.
pub fn first_crossing(waveform: &Waveform, threshold_mv: Real) -> Option<usize> {
    waveform.amplitudes().position(|mv| mv > threshold_mv)
}

/// Whether any sample of the waveform strictly exceeds `threshold_mv`.
///
/// The scan stops at the first crossing.
pub fn fires(waveform: &Waveform, threshold_mv: Real) -> bool {
    let crossing = first_crossing(waveform, threshold_mv);
    if let Some(index) = crossing {
        trace!(channel = %waveform.channel(), index, threshold_mv, "Threshold crossed");
    }
    crossing.is_some()
}
