use crate::{Real, Waveform};
use waveform_common::ChannelId;

/// Sample index and amplitude in millivolts.
pub type TracePoint = (usize, Real);

/// A waveform converted to physical units, ready to be plotted.
#[derive(Clone, Debug, PartialEq)]
pub struct AmplitudeTrace {
    pub channel: ChannelId,
    /// Baseline that was subtracted, in raw codes.
    pub baseline: Real,
    pub points: Vec<TracePoint>,
}

impl AmplitudeTrace {
    /// The point with the largest amplitude, the earliest one on ties.
    pub fn peak(&self) -> Option<TracePoint> {
        self.points
            .iter()
            .copied()
            .reduce(|best, point| if point.1 > best.1 { point } else { best })
    }

    /// Smallest and largest amplitude of the trace.
    pub fn range(&self) -> Option<(Real, Real)> {
        self.points.iter().map(|&(_, mv)| (mv, mv)).reduce(|(lo, hi), (mv, _)| {
            (lo.min(mv), hi.max(mv))
        })
    }
}

/// Converts every sample of the waveform into millivolts.
pub fn transform(waveform: &Waveform) -> AmplitudeTrace {
    AmplitudeTrace {
        channel: waveform.channel(),
        baseline: waveform.baseline(),
        points: waveform.amplitudes().enumerate().collect(),
    }
}
