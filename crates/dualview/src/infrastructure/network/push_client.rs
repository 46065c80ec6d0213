//! Telemetry push client.
//!
//! Sends one `Sample` datagram per tick to a fixed peer over a connected,
//! non-blocking UDP socket. A full send buffer drops the sample; any other
//! send error ends the service.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use dualview_core::protocol::{encode_datagram, SequenceCounter, TelemetryMessage};
use dualview_core::InputSample;
use tracing::{debug, info};

use super::is_transient;
use crate::application::telemetry::{TelemetryError, TelemetryService};

/// Connected UDP sender of input samples.
pub struct PushClient {
    socket: UdpSocket,
    peer: SocketAddr,
    seq: SequenceCounter,
}

impl PushClient {
    /// Resolves `host:port` and connects a non-blocking socket to it.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Connect`] if the peer cannot be resolved or
    /// connected, [`TelemetryError::Bind`] if no local socket is available.
    pub fn connect(host: &str, port: u16) -> Result<Self, TelemetryError> {
        let target = format!("{host}:{port}");
        let peer = (host, port)
            .to_socket_addrs()
            .and_then(|mut addrs| {
                addrs
                    .next()
                    .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address"))
            })
            .map_err(|source| TelemetryError::Connect {
                addr: target.clone(),
                source,
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).map_err(|source| TelemetryError::Bind {
            addr: local.to_string(),
            source,
        })?;
        socket
            .connect(peer)
            .and_then(|()| socket.set_nonblocking(true))
            .map_err(|source| TelemetryError::Connect {
                addr: target,
                source,
            })?;

        info!(%peer, "telemetry push client connected");
        Ok(Self {
            socket,
            peer,
            seq: SequenceCounter::new(),
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one sample.
    pub fn update(&mut self, sample: &InputSample) -> Result<(), TelemetryError> {
        let msg = TelemetryMessage::Sample {
            seq: self.seq.next(),
            sample: *sample,
        };
        let bytes = encode_datagram(&msg)?;
        match self.socket.send(&bytes) {
            Ok(_) => Ok(()),
            Err(e) if is_transient(&e) => {
                debug!(peer = %self.peer, "push sample dropped: {e}");
                Ok(())
            }
            Err(source) => Err(TelemetryError::Send {
                addr: self.peer.to_string(),
                source,
            }),
        }
    }
}

impl TelemetryService for PushClient {
    fn name(&self) -> &str {
        "push"
    }

    fn step(&mut self, sample: &InputSample) -> Result<(), TelemetryError> {
        self.update(sample)
    }

    fn shutdown(&mut self) {
        debug!(peer = %self.peer, "push client shut down");
    }
}
