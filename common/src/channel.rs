use crate::{Board, Channel};
use std::{fmt, num::ParseIntError, str::FromStr};
use thiserror::Error;

const BRANCH_PREFIX: &str = "adc_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelIdError {
    #[error("Channel identifier '{0}' should have the form 'bXchY' or 'adc_bX_chY'")]
    Malformed(String),
    #[error("Invalid board or channel number in '{input}': {source}")]
    Number {
        input: String,
        source: ParseIntError,
    },
    #[error("Channel range '{0}' spans more than one board")]
    RangeAcrossBoards(String),
    #[error("Channel range '{0}' ends before it starts")]
    EmptyRange(String),
}

/// Key identifying one digitiser input: a board index and a channel on that board.
///
/// The identifier carries no information about the digitiser resolution or trace length,
/// these must always be configured alongside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId {
    pub board: Board,
    pub channel: Channel,
}

impl ChannelId {
    pub fn new(board: Board, channel: Channel) -> Self {
        Self { board, channel }
    }

    /// Name of the column holding this channel in the acquisition files, e.g. `adc_b4_ch9`.
    pub fn branch_name(&self) -> String {
        format!("{BRANCH_PREFIX}b{}_ch{}", self.board, self.channel)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}ch{}", self.board, self.channel)
    }
}

impl FromStr for ChannelId {
    type Err = ChannelIdError;

    /// Accepts the short form `b4ch9` as well as the branch forms `b4_ch9` and `adc_b4_ch9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ChannelIdError::Malformed(s.to_owned());
        let body = s.strip_prefix(BRANCH_PREFIX).unwrap_or(s);
        let body = body.strip_prefix('b').ok_or_else(malformed)?;
        let (board, channel) = body.split_once("ch").ok_or_else(malformed)?;
        let board = board.strip_suffix('_').unwrap_or(board);
        if board.is_empty() || channel.is_empty() {
            return Err(malformed());
        }
        let number = |source| ChannelIdError::Number {
            input: s.to_owned(),
            source,
        };
        Ok(Self {
            board: board.parse().map_err(number)?,
            channel: channel.parse().map_err(number)?,
        })
    }
}

/// Parses a comma separated list of channels, where each item is either a single channel or
/// an inclusive range on one board: `b1ch2-11` or `b1ch2-b1ch11`.
pub fn parse_channel_list(s: &str) -> Result<Vec<ChannelId>, ChannelIdError> {
    let mut channels = Vec::new();
    for item in s.split(',').map(str::trim) {
        let Some((first, last)) = item.split_once('-') else {
            channels.push(item.parse()?);
            continue;
        };
        let first = first.parse::<ChannelId>()?;
        let last = match last.parse::<Channel>() {
            Ok(channel) => ChannelId::new(first.board, channel),
            Err(_) => last.parse::<ChannelId>()?,
        };
        if first.board != last.board {
            return Err(ChannelIdError::RangeAcrossBoards(item.to_owned()));
        }
        if first.channel > last.channel {
            return Err(ChannelIdError::EmptyRange(item.to_owned()));
        }
        channels.extend(
            (first.channel..=last.channel).map(|channel| ChannelId::new(first.board, channel)),
        );
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_form() {
        assert_eq!("b4ch9".parse::<ChannelId>(), Ok(ChannelId::new(4, 9)));
        assert_eq!("b1ch11".parse::<ChannelId>(), Ok(ChannelId::new(1, 11)));
    }

    #[test]
    fn parse_branch_forms() {
        assert_eq!("adc_b4_ch9".parse::<ChannelId>(), Ok(ChannelId::new(4, 9)));
        assert_eq!("b3_ch4".parse::<ChannelId>(), Ok(ChannelId::new(3, 4)));
    }

    #[test]
    fn reject_malformed() {
        for input in ["", "ch9", "b4", "b4ch", "bch9", "adc_b4", "x4ch9"] {
            assert!(
                matches!(
                    input.parse::<ChannelId>(),
                    Err(ChannelIdError::Malformed(_))
                ),
                "{input}"
            );
        }
        assert!(matches!(
            "b4chx".parse::<ChannelId>(),
            Err(ChannelIdError::Number { .. })
        ));
        assert!(matches!(
            "b300ch1".parse::<ChannelId>(),
            Err(ChannelIdError::Number { .. })
        ));
    }

    #[test]
    fn parse_lists_and_ranges() {
        let expected = (2..=11).map(|ch| ChannelId::new(1, ch)).collect::<Vec<_>>();
        assert_eq!(parse_channel_list("b1ch2-11"), Ok(expected.clone()));
        assert_eq!(parse_channel_list("b1ch2-b1ch11"), Ok(expected.clone()));
        assert_eq!(parse_channel_list("adc_b1_ch2-adc_b1_ch11"), Ok(expected));
        assert_eq!(
            parse_channel_list("b4ch9, b4ch10,b2ch1-2"),
            Ok(vec![
                ChannelId::new(4, 9),
                ChannelId::new(4, 10),
                ChannelId::new(2, 1),
                ChannelId::new(2, 2),
            ])
        );
        assert_eq!(parse_channel_list("b4ch9-9"), Ok(vec![ChannelId::new(4, 9)]));
    }

    #[test]
    fn reject_bad_ranges() {
        assert_eq!(
            parse_channel_list("b1ch2-b2ch5"),
            Err(ChannelIdError::RangeAcrossBoards("b1ch2-b2ch5".to_owned()))
        );
        assert_eq!(
            parse_channel_list("b1ch11-2"),
            Err(ChannelIdError::EmptyRange("b1ch11-2".to_owned()))
        );
        assert!(matches!(
            parse_channel_list("b1ch2,,b1ch3"),
            Err(ChannelIdError::Malformed(_))
        ));
        assert!(matches!(
            parse_channel_list("b1ch2-x"),
            Err(ChannelIdError::Malformed(_))
        ));
    }

    #[test]
    fn display_and_branch_name() {
        let id = ChannelId::new(1, 2);
        assert_eq!(id.to_string(), "b1ch2");
        assert_eq!(id.branch_name(), "adc_b1_ch2");
        assert_eq!(id.branch_name().parse::<ChannelId>(), Ok(id));
    }
}
