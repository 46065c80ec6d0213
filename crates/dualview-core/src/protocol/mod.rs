//! Telemetry datagram protocol shared by the push client and the query server.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{decode_datagram, encode_datagram, CodecError};
pub use messages::*;
pub use sequence::SequenceCounter;
