use crate::{ChannelClass, ChannelSpec, Polarity, Real, WaveformError, baseline, to_millivolts};
use waveform_common::{ChannelId, Intensity};

/// The samples of one channel for one event, checked against the channel's declared class.
#[derive(Clone, Copy, Debug)]
pub struct Waveform<'a> {
    channel: ChannelId,
    class: ChannelClass,
    polarity: Polarity,
    samples: &'a [Intensity],
}

impl<'a> Waveform<'a> {
    /// Fails if `samples` is empty or its length differs from the class's sample count.
    pub fn new(spec: &ChannelSpec, samples: &'a [Intensity]) -> Result<Self, WaveformError> {
        if samples.is_empty() {
            return Err(WaveformError::Empty { channel: spec.id });
        }
        let expected = spec.class.sample_count();
        if samples.len() != expected {
            return Err(WaveformError::LengthMismatch {
                channel: spec.id,
                class: spec.class,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            channel: spec.id,
            class: spec.class,
            polarity: spec.polarity,
            samples,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn class(&self) -> ChannelClass {
        self.class
    }

    pub fn samples(&self) -> &'a [Intensity] {
        self.samples
    }

    pub fn baseline(&self) -> Real {
        baseline(self.samples)
    }

    /// Lazily converts every sample to millivolts, in sample order.
    ///
    /// The baseline is computed once, when this method is called.
    pub fn amplitudes(&self) -> impl Iterator<Item = Real> + Clone + 'a {
        let baseline = self.baseline();
        let class = self.class;
        let polarity = self.polarity;
        self.samples
            .iter()
            .map(move |&sample| to_millivolts(sample, baseline, class, polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_declared_length() {
        let spec = ChannelSpec::new(ChannelId::new(4, 9), ChannelClass::Short);
        let samples = vec![100; 240];
        let waveform = Waveform::new(&spec, &samples).unwrap();
        assert_eq!(waveform.channel(), spec.id);
        assert_eq!(waveform.baseline(), 100.0);
        assert!(waveform.amplitudes().all(|mv| mv == 0.0));
    }

    #[test]
    fn rejects_wrong_length() {
        let spec = ChannelSpec::new(ChannelId::new(1, 2), ChannelClass::Long);
        let samples = vec![100; 240];
        assert_eq!(
            Waveform::new(&spec, &samples).unwrap_err(),
            WaveformError::LengthMismatch {
                channel: ChannelId::new(1, 2),
                class: ChannelClass::Long,
                expected: 1920,
                actual: 240,
            }
        );
    }

    #[test]
    fn rejects_empty() {
        let spec = ChannelSpec::new(ChannelId::new(1, 2), ChannelClass::Long);
        assert_eq!(
            Waveform::new(&spec, &[]).unwrap_err(),
            WaveformError::Empty {
                channel: ChannelId::new(1, 2)
            }
        );
    }
}
