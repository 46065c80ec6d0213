//! UDP telemetry services.
//!
//! # Sub-modules
//!
//! - **`push_client`** – Sends every tick's input sample to one configured peer.
//! - **`query_server`** – Answers one-shot queries and feeds subscribers.
//!
//! Both sockets are non-blocking, so a service step never stalls the loop.

use std::time::Duration;

use crate::application::telemetry::{TelemetryError, TelemetryFactory, TelemetryService};

pub mod mock;
pub mod push_client;
pub mod query_server;

pub use push_client::PushClient;
pub use query_server::QueryServer;

/// Creates the UDP-backed telemetry services.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTelemetryFactory;

impl TelemetryFactory for UdpTelemetryFactory {
    fn push(&mut self, host: &str, port: u16) -> Result<Box<dyn TelemetryService>, TelemetryError> {
        Ok(Box::new(PushClient::connect(host, port)?))
    }

    fn query(&mut self, port: u16, subscriber_ttl: Duration) -> Result<Box<dyn TelemetryService>, TelemetryError> {
        Ok(Box::new(QueryServer::bind(port, subscriber_ttl)?))
    }
}

/// Returns `true` for socket errors that only mean "nothing to do right now".
///
/// `ConnectionReset` is what Windows reports on a UDP socket after an ICMP
/// port-unreachable for an earlier datagram.
pub(crate) fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_recognises_would_block() {
        // Arrange
        let e = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");

        // Act / Assert
        assert!(is_transient(&e));
    }

    #[test]
    fn test_is_transient_rejects_refused() {
        let e = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");

        assert!(!is_transient(&e));
    }

    #[test]
    fn test_factory_binds_query_server_on_free_port() {
        let service = UdpTelemetryFactory.query(0, Duration::from_secs(1)).unwrap();

        assert_eq!(service.name(), "query");
    }
}
