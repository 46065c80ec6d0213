//! Telemetry message types.
//!
//! A datagram carries exactly one [`TelemetryMessage`]. Samples describe the
//! local pad state at one loop tick: held pad inputs, raw stick axes, the
//! touch position and, when enabled, one motion-sensor reading.

use serde::{Deserialize, Serialize};

/// Four bytes that open every telemetry datagram.
pub const MAGIC: [u8; 4] = *b"DVTM";

/// Current datagram format version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Magic plus version byte.
pub const HEADER_SIZE: usize = 5;

/// Largest datagram either service sends or accepts.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// One accelerometer and gyroscope reading, in raw sensor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

/// Snapshot of the local input state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSample {
    /// Microseconds since the Unix epoch when the sample was taken.
    pub timestamp_us: u64,
    /// Held pad inputs, one bit per [`crate::keymap::PadButton::bit`].
    pub buttons: u32,
    /// Circle pad X/Y.
    pub circle_pad: [i16; 2],
    /// C-stick X/Y.
    pub c_stick: [i16; 2],
    /// Touch position on the bottom display while touched.
    pub touch: Option<[u16; 2]>,
    /// Motion reading, present only when motion telemetry is enabled.
    pub motion: Option<MotionSample>,
}

/// A telemetry datagram payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryMessage {
    /// Pushed sample.
    Sample { seq: u32, sample: InputSample },
    /// One-shot request for the latest sample.
    Query { seq: u32 },
    /// Registers the sender for pushed samples until it stops renewing.
    Subscribe { seq: u32 },
    /// Answer to a `Query`; `sample` is `None` before the first tick.
    Report { seq: u32, sample: Option<InputSample> },
}

impl TelemetryMessage {
    /// Sequence number carried by any message.
    pub fn seq(&self) -> u32 {
        match self {
            TelemetryMessage::Sample { seq, .. }
            | TelemetryMessage::Query { seq }
            | TelemetryMessage::Subscribe { seq }
            | TelemetryMessage::Report { seq, .. } => *seq,
        }
    }
}
