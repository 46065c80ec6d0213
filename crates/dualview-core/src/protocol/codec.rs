//! Datagram codec for telemetry messages.
//!
//! Wire format:
//! ```text
//! [magic:4 = "DVTM"][version:1][payload:N]
//! ```
//! The payload is the `bincode` encoding of a [`TelemetryMessage`]. Whole
//! datagrams are limited to [`MAX_DATAGRAM_SIZE`] bytes.

use thiserror::Error;

use crate::protocol::messages::{
    TelemetryMessage, HEADER_SIZE, MAGIC, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
};

/// Errors that can occur during datagram encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The datagram is shorter than the header.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first four bytes are not the telemetry magic.
    #[error("bad magic: {0:02X?}")]
    BadMagic([u8; 4]),

    /// The version byte is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The datagram exceeds the size limit.
    #[error("datagram of {size} bytes exceeds the {max}-byte limit")]
    Oversized { size: usize, max: usize },

    /// The payload could not be (de)serialized.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Encodes `msg` into one datagram.
///
/// # Errors
///
/// Returns [`CodecError`] if serialization fails or the result is too large.
///
/// # Examples
///
/// ```rust
/// use dualview_core::protocol::{decode_datagram, encode_datagram, TelemetryMessage};
///
/// let msg = TelemetryMessage::Query { seq: 7 };
/// let bytes = encode_datagram(&msg).unwrap();
/// assert_eq!(&bytes[..4], b"DVTM");
/// assert_eq!(decode_datagram(&bytes).unwrap(), msg);
/// ```
pub fn encode_datagram(msg: &TelemetryMessage) -> Result<Vec<u8>, CodecError> {
    let payload =
        bincode::serialize(msg).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
    let size = HEADER_SIZE + payload.len();
    if size > MAX_DATAGRAM_SIZE {
        return Err(CodecError::Oversized {
            size,
            max: MAX_DATAGRAM_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&MAGIC);
    buf.push(PROTOCOL_VERSION);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one datagram.
///
/// # Errors
///
/// Returns [`CodecError`] if the header is wrong, the datagram is oversized,
/// or the payload does not decode.
pub fn decode_datagram(bytes: &[u8]) -> Result<TelemetryMessage, CodecError> {
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(CodecError::Oversized {
            size: bytes.len(),
            max: MAX_DATAGRAM_SIZE,
        });
    }
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    if bytes[4] != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(bytes[4]));
    }

    bincode::deserialize(&bytes[HEADER_SIZE..])
        .map_err(|e| CodecError::MalformedPayload(e.to_string()))
}
