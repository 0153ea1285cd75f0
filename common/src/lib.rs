mod channel;
mod tracer;

pub use channel::{ChannelId, ChannelIdError, parse_channel_list};
pub use tracer::{TracerEngine, TracerOptions};

pub type Board = u8;
pub type Channel = u8;
pub type EventId = u32;
pub type Intensity = u16;
