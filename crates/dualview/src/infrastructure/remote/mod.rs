//! Remote-framebuffer connection adapters.
//!
//! The wire protocol is a platform collaborator implementing
//! [`Connector`](crate::application::manage_sessions::Connector). This module
//! holds the adapters that ship with the crate: a recording mock for tests and
//! a connector that refuses every attempt, used by binaries built without a
//! protocol backend.

use crate::application::manage_sessions::{
    ConnectError, ConnectRequest, Connector, FramebufferAllocator, RemoteConnection,
};

pub mod mock;

/// A [`Connector`] for builds without a remote-framebuffer backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableConnector;

impl Connector for UnavailableConnector {
    fn connect(
        &mut self,
        request: &ConnectRequest,
        _allocator: &mut dyn FramebufferAllocator,
    ) -> Result<Box<dyn RemoteConnection>, ConnectError> {
        Err(ConnectError::Handshake {
            addr: request.addr(),
            reason: "no remote-framebuffer backend in this build".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::manage_sessions::SurfaceError;
    use crate::infrastructure::display::SurfaceBinding;
    use dualview_core::{Screen, Size};
    use std::time::Duration;

    struct NoAlloc;

    impl FramebufferAllocator for NoAlloc {
        fn allocate(&mut self, _size: Size, _depth: u8) -> Result<SurfaceBinding, SurfaceError> {
            panic!("allocator must not be called");
        }
    }

    #[test]
    fn test_unavailable_connector_refuses_with_address() {
        let request = ConnectRequest {
            screen: Screen::Top,
            host: "10.0.0.2".to_string(),
            port: 5900,
            user: String::new(),
            password: None,
            depth: 32,
            handshake_timeout: Duration::from_secs(1),
        };

        let result = UnavailableConnector.connect(&request, &mut NoAlloc);

        match result {
            Err(ConnectError::Handshake { addr, .. }) => assert_eq!(addr, "10.0.0.2:5900"),
            _ => panic!("expected handshake error"),
        }
    }
}
