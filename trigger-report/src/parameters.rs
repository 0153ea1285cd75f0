use anyhow::{Error, anyhow};
use std::str::FromStr;
use waveform_analysis::{ChannelSpec, Real, TriggerSpec};
use waveform_common::parse_channel_list;

/// Parses `<channels>:<class>[:<polarity>]`, where `<channels>` is a comma separated list of
/// channels and channel ranges sharing the class, e.g. `b1ch2-11:long`.
#[derive(Default, Debug, Clone)]
pub(crate) struct ChannelSetWrapper(pub(crate) Vec<ChannelSpec>);

impl FromStr for ChannelSetWrapper {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channels, class) = s.split_once(':').ok_or_else(|| {
            anyhow!("Incorrect channel set, expected pattern '<channels>:<class>', got '{s}'")
        })?;
        let specs = parse_channel_list(channels)?
            .into_iter()
            .map(|id| ChannelSpec::from_str(&format!("{id}:{class}")))
            .collect::<Result<_, _>>()?;
        Ok(ChannelSetWrapper(specs))
    }
}

/// Parses `<channels>:<class>[:<polarity>]:<threshold mV>`, e.g. `b4ch9:short:1000` or
/// `b4ch9-12:short:1000`, giving one trigger per channel.
#[derive(Default, Debug, Clone)]
pub(crate) struct TriggerSetWrapper(pub(crate) Vec<TriggerSpec>);

impl FromStr for TriggerSetWrapper {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channels, threshold) = s.rsplit_once(':').ok_or_else(|| {
            anyhow!("Incorrect trigger, expected pattern '<channels>:<class>:<threshold>', got '{s}'")
        })?;
        let threshold = Real::from_str(threshold)?;
        let ChannelSetWrapper(specs) = ChannelSetWrapper::from_str(channels)?;
        Ok(TriggerSetWrapper(
            specs
                .into_iter()
                .map(|spec| TriggerSpec::new(spec, threshold))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waveform_analysis::{ChannelClass, Polarity};
    use waveform_common::ChannelId;

    #[test]
    fn parse_channel_set() {
        let ChannelSetWrapper(specs) = "b1ch2-11:long".parse().unwrap();
        assert_eq!(specs.len(), 10);
        assert!(specs.iter().all(|spec| spec.class == ChannelClass::Long));
        assert_eq!(specs.first().map(|spec| spec.id), Some(ChannelId::new(1, 2)));
        assert_eq!(specs.last().map(|spec| spec.id), Some(ChannelId::new(1, 11)));

        let ChannelSetWrapper(specs) = "b1ch2-b1ch3,b2ch7:long:positive".parse().unwrap();
        assert_eq!(
            specs,
            [(1, 2), (1, 3), (2, 7)]
                .map(|(board, channel)| {
                    ChannelSpec::new(ChannelId::new(board, channel), ChannelClass::Long)
                        .with_polarity(Polarity::Positive)
                })
                .to_vec()
        );
    }

    #[test]
    fn reject_malformed_channel_set() {
        assert!("b1ch2-11".parse::<ChannelSetWrapper>().is_err());
        assert!("b1ch2-b2ch3:long".parse::<ChannelSetWrapper>().is_err());
        assert!("b1ch2-11:medium".parse::<ChannelSetWrapper>().is_err());
    }

    #[test]
    fn parse_trigger() {
        let TriggerSetWrapper(triggers) = "b4ch9:short:1000".parse().unwrap();
        assert_eq!(
            triggers,
            vec![TriggerSpec::new(
                ChannelSpec::new(ChannelId::new(4, 9), ChannelClass::Short),
                1000.0
            )]
        );

        let TriggerSetWrapper(triggers) = "adc_b1_ch2:long:positive:-2.5".parse().unwrap();
        assert_eq!(triggers.len(), 1);
        assert!(
            triggers
                .iter()
                .all(|t| t.channel.polarity == Polarity::Positive && t.threshold_mv == -2.5)
        );
    }

    #[test]
    fn parse_trigger_range() {
        let TriggerSetWrapper(triggers) = "b4ch9-12:short:100".parse().unwrap();
        let ids = triggers
            .iter()
            .map(|trigger| trigger.channel.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["b4ch9", "b4ch10", "b4ch11", "b4ch12"]);
        assert!(triggers.iter().all(|trigger| trigger.threshold_mv == 100.0));
    }

    #[test]
    fn reject_malformed_trigger() {
        assert!("b4ch9".parse::<TriggerSetWrapper>().is_err());
        assert!("b4ch9:short".parse::<TriggerSetWrapper>().is_err());
        assert!("b4ch9:short:lots".parse::<TriggerSetWrapper>().is_err());
        assert!("b4ch9:huge:10".parse::<TriggerSetWrapper>().is_err());
    }
}
