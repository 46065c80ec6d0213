//! Telemetry query server.
//!
//! Listens on a non-blocking UDP socket and services at most one datagram per
//! tick:
//!
//! - `Query { seq }` is answered with a `Report` carrying the latest sample.
//! - `Subscribe { seq }` is acknowledged with a `Report` and registers the
//!   sender for pushed samples until it stays silent for the subscriber TTL.
//!
//! Anything that does not decode is logged at debug level and dropped.

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use dualview_core::protocol::{
    decode_datagram, encode_datagram, SequenceCounter, TelemetryMessage, MAX_DATAGRAM_SIZE,
};
use dualview_core::InputSample;
use tracing::{debug, info};

use super::is_transient;
use crate::application::telemetry::{TelemetryError, TelemetryService};

pub struct QueryServer {
    socket: UdpSocket,
    local: SocketAddr,
    latest: Option<InputSample>,
    subscribers: HashMap<SocketAddr, Instant>,
    subscriber_ttl: Duration,
    seq: SequenceCounter,
    buf: [u8; MAX_DATAGRAM_SIZE],
}

impl QueryServer {
    /// Binds `0.0.0.0:port`; port `0` picks a free one.
    pub fn bind(port: u16, subscriber_ttl: Duration) -> Result<Self, TelemetryError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let bind_error = |source| TelemetryError::Bind {
            addr: addr.to_string(),
            source,
        };
        let socket = UdpSocket::bind(addr).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;
        let local = socket.local_addr().map_err(bind_error)?;

        info!(%local, "telemetry query server listening");
        Ok(Self {
            socket,
            local,
            latest: None,
            subscribers: HashMap::new(),
            subscriber_ttl,
            seq: SequenceCounter::new(),
            buf: [0; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Services one pending datagram. Returns `true` if one was read.
    pub fn run(&mut self) -> Result<bool, TelemetryError> {
        let (len, src) = match self.socket.recv_from(&mut self.buf) {
            Ok(pair) => pair,
            Err(e) if is_transient(&e) => return Ok(false),
            Err(source) => {
                return Err(TelemetryError::Receive {
                    addr: self.local.to_string(),
                    source,
                })
            }
        };

        match decode_datagram(&self.buf[..len]) {
            Ok(TelemetryMessage::Query { seq }) => self.reply(src, seq)?,
            Ok(TelemetryMessage::Subscribe { seq }) => {
                if self.subscribers.insert(src, Instant::now()).is_none() {
                    debug!(%src, "telemetry subscriber added");
                }
                self.reply(src, seq)?;
            }
            Ok(other) => debug!(%src, seq = other.seq(), "unexpected telemetry message ignored"),
            Err(e) => debug!(%src, "malformed telemetry datagram: {e}"),
        }
        Ok(true)
    }

    /// Stores `sample` and pushes it to every live subscriber.
    pub fn update(&mut self, sample: &InputSample) -> Result<(), TelemetryError> {
        self.latest = Some(*sample);

        let ttl = self.subscriber_ttl;
        self.subscribers.retain(|addr, renewed| {
            let live = renewed.elapsed() < ttl;
            if !live {
                debug!(%addr, "telemetry subscriber expired");
            }
            live
        });
        if self.subscribers.is_empty() {
            return Ok(());
        }

        let msg = TelemetryMessage::Sample {
            seq: self.seq.next(),
            sample: *sample,
        };
        let bytes = encode_datagram(&msg)?;
        let targets: Vec<SocketAddr> = self.subscribers.keys().copied().collect();
        for addr in targets {
            self.send(addr, &bytes)?;
        }
        Ok(())
    }

    fn reply(&mut self, dest: SocketAddr, seq: u32) -> Result<(), TelemetryError> {
        let msg = TelemetryMessage::Report {
            seq,
            sample: self.latest,
        };
        let bytes = encode_datagram(&msg)?;
        self.send(dest, &bytes)
    }

    fn send(&self, dest: SocketAddr, bytes: &[u8]) -> Result<(), TelemetryError> {
        match self.socket.send_to(bytes, dest) {
            Ok(_) => Ok(()),
            Err(e) if is_transient(&e) => {
                debug!(%dest, "telemetry datagram dropped: {e}");
                Ok(())
            }
            Err(source) => Err(TelemetryError::Send {
                addr: dest.to_string(),
                source,
            }),
        }
    }
}

impl TelemetryService for QueryServer {
    fn name(&self) -> &str {
        "query"
    }

    fn step(&mut self, sample: &InputSample) -> Result<(), TelemetryError> {
        self.run()?;
        self.update(sample)
    }

    fn shutdown(&mut self) {
        self.subscribers.clear();
        debug!(local = %self.local, "query server shut down");
    }
}
