//! Recording connector and connection for tests.
//!
//! Every handle shares its state with the clones a test keeps, so behaviour
//! can be scripted and calls inspected while the controller owns the boxed
//! connection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dualview_core::{Point, Rect, Size};

use crate::application::manage_sessions::{
    Activity, ConnectError, ConnectRequest, Connector, FramebufferAllocator, ProtocolError,
    RemoteConnection,
};
use crate::infrastructure::display::SurfaceBinding;

const DEFAULT_FRAMEBUFFER: Size = Size {
    width: 800,
    height: 600,
};

/// Calls recorded by one [`MockConnection`], plus its scripted behaviour.
#[derive(Debug, Default)]
pub struct ConnectionLog {
    pub keys: Vec<(u32, bool)>,
    pub pointers: Vec<(Point, u8)>,
    pub updates: Vec<(Rect, bool)>,
    pub bindings: Vec<SurfaceBinding>,
    pub remote_cursor: Vec<bool>,
    pub waits: Vec<Duration>,
    pub pumps: usize,
    /// Results of the next waits; [`Activity::None`] once exhausted.
    pub activity: VecDeque<Activity>,
    /// Framebuffer size announced by the next pump.
    pub pending_resize: Option<Size>,
    pub fail_pump: bool,
    pub fail_sends: bool,
    pub depth: u8,
}

/// A scripted [`RemoteConnection`].
#[derive(Clone, Default)]
pub struct MockConnection {
    addr: String,
    log: Arc<Mutex<ConnectionLog>>,
}

impl MockConnection {
    pub fn log(&self) -> MutexGuard<'_, ConnectionLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the result of a future [`RemoteConnection::wait_for_activity`].
    pub fn push_activity(&self, activity: Activity) {
        self.log().activity.push_back(activity);
    }

    fn check_send(&self) -> Result<(), ProtocolError> {
        if self.log().fail_sends {
            return Err(ProtocolError::Closed(self.addr.clone()));
        }
        Ok(())
    }
}

impl RemoteConnection for MockConnection {
    fn wait_for_activity(&mut self, timeout: Duration) -> Activity {
        let mut log = self.log();
        log.waits.push(timeout);
        log.activity.pop_front().unwrap_or(Activity::None)
    }

    fn pump_messages(&mut self, allocator: &mut dyn FramebufferAllocator) -> Result<(), ProtocolError> {
        let (resize, depth, fail) = {
            let mut log = self.log();
            log.pumps += 1;
            (log.pending_resize.take(), log.depth, log.fail_pump)
        };
        if fail {
            return Err(ProtocolError::Malformed("injected pump failure".to_string()));
        }
        if let Some(size) = resize {
            let binding = allocator.allocate(size, depth)?;
            self.log().bindings.push(binding);
        }
        Ok(())
    }

    fn send_pointer(&mut self, position: Point, buttons: u8) -> Result<(), ProtocolError> {
        self.check_send()?;
        self.log().pointers.push((position, buttons));
        Ok(())
    }

    fn send_key(&mut self, keysym: u32, down: bool) -> Result<(), ProtocolError> {
        self.check_send()?;
        self.log().keys.push((keysym, down));
        Ok(())
    }

    fn request_framebuffer_update(&mut self, rect: Rect, incremental: bool) -> Result<(), ProtocolError> {
        self.check_send()?;
        self.log().updates.push((rect, incremental));
        Ok(())
    }

    fn bind_surface(&mut self, binding: SurfaceBinding) {
        self.log().bindings.push(binding);
    }

    fn set_remote_cursor(&mut self, enabled: bool) {
        self.log().remote_cursor.push(enabled);
    }
}

#[derive(Default)]
struct ConnectorState {
    fail_ports: HashSet<u16>,
    framebuffers: HashMap<u16, Size>,
    connections: HashMap<u16, MockConnection>,
    attempts: Vec<ConnectRequest>,
}

/// A scripted [`Connector`]; connections are keyed by port.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every handshake on `port` fail.
    pub fn fail_port(&self, port: u16) {
        self.state().fail_ports.insert(port);
    }

    /// Sets the initial framebuffer size announced on `port`.
    pub fn set_framebuffer(&self, port: u16, size: Size) {
        self.state().framebuffers.insert(port, size);
    }

    /// The most recent connection made on `port`.
    pub fn connection(&self, port: u16) -> Option<MockConnection> {
        self.state().connections.get(&port).cloned()
    }

    /// Every connect request seen, in order.
    pub fn attempts(&self) -> Vec<ConnectRequest> {
        self.state().attempts.clone()
    }
}

impl Connector for MockConnector {
    fn connect(
        &mut self,
        request: &ConnectRequest,
        allocator: &mut dyn FramebufferAllocator,
    ) -> Result<Box<dyn RemoteConnection>, ConnectError> {
        let addr = request.addr();
        let size = {
            let mut state = self.state();
            state.attempts.push(request.clone());
            if state.fail_ports.contains(&request.port) {
                return Err(ConnectError::Handshake {
                    addr,
                    reason: "injected handshake failure".to_string(),
                });
            }
            state
                .framebuffers
                .get(&request.port)
                .copied()
                .unwrap_or(DEFAULT_FRAMEBUFFER)
        };

        let binding = allocator
            .allocate(size, request.depth)
            .map_err(|source| ConnectError::Surface {
                addr: addr.clone(),
                source,
            })?;

        let connection = MockConnection {
            addr,
            log: Arc::new(Mutex::new(ConnectionLog {
                depth: request.depth,
                bindings: vec![binding],
                ..ConnectionLog::default()
            })),
        };
        self.state()
            .connections
            .insert(request.port, connection.clone());
        Ok(Box::new(connection))
    }
}
