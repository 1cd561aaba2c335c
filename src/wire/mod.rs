//! Fight record wire format and decoding

pub mod decode;
pub mod protocol;

pub use decode::{decode_fight_record, DecodeError};
pub use protocol::{RawFightRecord, ReplayEvent};
