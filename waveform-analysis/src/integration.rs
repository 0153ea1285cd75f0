use crate::{Real, Waveform};

/// Sum of the amplitudes, in millivolts, of every sample of one channel.
pub fn channel_integral(waveform: &Waveform) -> Real {
    integrate(std::iter::once(waveform))
}

/// Sum of the amplitudes, in millivolts, of every sample of every given channel.
///
/// Each channel has its own baseline. Samples are added one at a time to a single running
/// total, in channel order and then in sample order, so the result is reproducible for a
/// given channel order.
pub fn integrate<'a, 'w: 'a, I>(waveforms: I) -> Real
where
    I: IntoIterator<Item = &'a Waveform<'w>>,
{
    let mut total: Real = 0.0;
    for waveform in waveforms {
        for mv in waveform.amplitudes() {
            total += mv;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelClass, ChannelSpec};
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use waveform_common::{ChannelId, Intensity};

    fn long_spec(channel: u8) -> ChannelSpec {
        ChannelSpec::new(ChannelId::new(1, channel), ChannelClass::Long)
    }

    fn noisy(rng: &mut StdRng, pedestal: Intensity) -> Vec<Intensity> {
        (0..1920)
            .map(|_| pedestal + rng.random_range(0..20))
            .collect()
    }

    #[test]
    fn flat_channel_integrates_to_zero() {
        let samples = vec![8000; 1920];
        let waveform = Waveform::new(&long_spec(2), &samples).unwrap();
        assert_eq!(channel_integral(&waveform), 0.0);
    }

    #[test]
    fn single_pulse() {
        let mut samples = vec![8000; 1920];
        samples[500..510].fill(7900);
        let waveform = Waveform::new(&long_spec(2), &samples).unwrap();
        let expected = 10.0 * 100.0 * ChannelClass::Long.mv_per_code();
        assert_approx_eq!(channel_integral(&waveform), expected, 1e-9);
    }

    #[test]
    fn baselines_are_per_channel() {
        let a = vec![8000; 1920];
        let mut b = vec![3000; 1920];
        b[1000] = 2990;
        let waveforms = [
            Waveform::new(&long_spec(2), &a).unwrap(),
            Waveform::new(&long_spec(3), &b).unwrap(),
        ];
        let expected = 10.0 * ChannelClass::Long.mv_per_code();
        assert_approx_eq!(integrate(&waveforms), expected, 1e-9);
    }

    #[test]
    fn additive_across_channels() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..10 {
            let a = noisy(&mut rng, 8000);
            let b = noisy(&mut rng, 7000);
            let wa = Waveform::new(&long_spec(2), &a).unwrap();
            let wb = Waveform::new(&long_spec(3), &b).unwrap();

            let together = integrate([&wa, &wb]);
            let apart = channel_integral(&wa) + channel_integral(&wb);
            assert_approx_eq!(together, apart, 1e-6);
        }
    }

    #[test]
    fn fixed_summation_order() {
        let mut rng = StdRng::seed_from_u64(29);
        let channels = (2..12).map(|_| noisy(&mut rng, 8000)).collect::<Vec<_>>();
        let specs = (2..12).map(long_spec).collect::<Vec<_>>();
        let waveforms = specs
            .iter()
            .zip(&channels)
            .map(|(spec, samples)| Waveform::new(spec, samples).unwrap())
            .collect::<Vec<_>>();

        let mut expected: Real = 0.0;
        for (spec, samples) in specs.iter().zip(&channels) {
            let baseline = crate::baseline(samples);
            for &sample in samples {
                expected += -(Real::from(sample) - baseline) * spec.class.mv_per_code();
            }
        }
        assert_eq!(integrate(&waveforms), expected);
        assert_eq!(integrate(&waveforms), integrate(&waveforms));
    }
}
