//! ManageSessions use case: owns the top and bottom remote-display sessions.
//!
//! Each screen has one [`SessionSlot`]:
//!
//! ```text
//! Absent  ──►  Connecting  ──►  Live  ──►  Absent
//!                  │                        ▲
//!                  └────── connect error ───┘
//! ```
//!
//! - `Connecting`: the synchronous handshake is running. The protocol layer
//!   releases its own resources when the handshake fails; nothing is kept.
//! - `Live`: each tick the controller waits a bounded time for activity and
//!   pumps pending server messages. A wait or pump failure closes that
//!   session only.
//!
//! Framebuffer (re)allocation is delegated back to the controller through the
//! [`FramebufferAllocator`] handed to every connect and pump call. It updates
//! the session's [`Viewport`], asks the display backend for a surface and
//! returns the binding that the connection adopts as its frame sink.

use std::time::Duration;

use dualview_core::{Point, Rect, ResizeError, ScaleMode, Screen, Size, Viewport};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::infrastructure::display::{DisplayBackend, DisplayError, SurfaceBinding, SurfaceRequest};

// ── Errors ────────────────────────────────────────────────────────────────────

/// A framebuffer geometry that could not be given a surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("framebuffer rejected: {0}")]
    Resize(#[from] ResizeError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Connect-time failures. The session never became live.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cannot connect to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("handshake with {addr} failed: {reason}")]
    Handshake { addr: String, reason: String },

    #[error("handshake with {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("authentication with {addr} failed")]
    Authentication { addr: String },

    #[error("initial framebuffer of {addr} rejected: {source}")]
    Surface {
        addr: String,
        #[source]
        source: SurfaceError,
    },

    #[error("{screen} session is already {state}")]
    SlotBusy { screen: Screen, state: &'static str },
}

/// Runtime failures of a live connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error on connection to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {0} closed by peer")]
    Closed(String),

    #[error("malformed server message: {0}")]
    Malformed(String),

    #[error("framebuffer resize failed: {0}")]
    Resize(#[from] SurfaceError),
}

// ── Protocol-layer seams ──────────────────────────────────────────────────────

/// Result of a bounded wait on a connection socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Nothing arrived within the timeout.
    None,
    /// Server messages are pending.
    Ready,
    /// The wait itself failed.
    Error,
}

/// Resize callback handed to the protocol layer.
pub trait FramebufferAllocator {
    /// Provides a surface for a `size` framebuffer of `depth` bits per pixel.
    fn allocate(&mut self, size: Size, depth: u8) -> Result<SurfaceBinding, SurfaceError>;
}

/// A live remote-framebuffer connection.
///
/// Implementations own the wire protocol; everything here is non-blocking
/// except [`wait_for_activity`](Self::wait_for_activity), which is bounded.
pub trait RemoteConnection {
    fn wait_for_activity(&mut self, timeout: Duration) -> Activity;

    /// Handles every pending server message, calling `allocator` on resize.
    fn pump_messages(&mut self, allocator: &mut dyn FramebufferAllocator) -> Result<(), ProtocolError>;

    fn send_pointer(&mut self, position: Point, buttons: u8) -> Result<(), ProtocolError>;

    fn send_key(&mut self, keysym: u32, down: bool) -> Result<(), ProtocolError>;

    fn request_framebuffer_update(&mut self, rect: Rect, incremental: bool) -> Result<(), ProtocolError>;

    /// Adopts a new surface as the decode target.
    fn bind_surface(&mut self, binding: SurfaceBinding);

    /// Asks the server to draw the cursor into the framebuffer.
    fn set_remote_cursor(&mut self, enabled: bool);
}

/// Parameters of one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub screen: Screen,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Bits per pixel requested from the server.
    pub depth: u8,
    pub handshake_timeout: Duration,
}

impl ConnectRequest {
    /// `host:port`, used in logs and errors.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Opens remote-framebuffer connections.
pub trait Connector {
    /// Runs the handshake. The initial framebuffer is allocated through `allocator`.
    fn connect(
        &mut self,
        request: &ConnectRequest,
        allocator: &mut dyn FramebufferAllocator,
    ) -> Result<Box<dyn RemoteConnection>, ConnectError>;
}

// ── Surface allocation ────────────────────────────────────────────────────────

/// [`FramebufferAllocator`] bound to one session's viewport and screen.
pub struct SurfaceAllocator<'a> {
    screen: Screen,
    viewport: &'a mut Viewport,
    pointer: Point,
    display: &'a mut dyn DisplayBackend,
}

impl<'a> SurfaceAllocator<'a> {
    pub fn new(
        screen: Screen,
        viewport: &'a mut Viewport,
        pointer: Point,
        display: &'a mut dyn DisplayBackend,
    ) -> Self {
        Self {
            screen,
            viewport,
            pointer,
            display,
        }
    }
}

impl FramebufferAllocator for SurfaceAllocator<'_> {
    fn allocate(&mut self, size: Size, depth: u8) -> Result<SurfaceBinding, SurfaceError> {
        let spec = self.viewport.on_resize(size, self.pointer).map_err(|e| {
            warn!(screen = %self.screen, error = %e, "refusing framebuffer resize");
            e
        })?;
        let binding = self
            .display
            .create_surface(self.screen, &SurfaceRequest { spec, depth })?;
        self.display
            .set_view_origin(self.screen, spec.origin, spec.scrollbars);
        debug!(
            screen = %self.screen,
            width = size.width,
            height = size.height,
            depth,
            fit = ?spec.fit,
            "framebuffer allocated"
        );
        Ok(binding)
    }
}

// ── Session slots ─────────────────────────────────────────────────────────────

/// A connected session.
pub struct LiveSession {
    addr: String,
    connection: Box<dyn RemoteConnection>,
    viewport: Viewport,
}

impl LiveSession {
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

/// State of one screen's session.
pub enum SessionSlot {
    Absent,
    Connecting,
    Live(Box<LiveSession>),
}

impl SessionSlot {
    fn state_name(&self) -> &'static str {
        match self {
            SessionSlot::Absent => "absent",
            SessionSlot::Connecting => "connecting",
            SessionSlot::Live(_) => "live",
        }
    }
}

/// What a pump call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// No live session, or nothing arrived within the timeout.
    Idle,
    /// Pending messages were handled.
    Pumped,
    /// The session failed and was closed.
    Closed,
}

/// Geometry and timing shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub top: Size,
    pub bottom: Size,
    pub depth: u8,
    pub scrollbar_width: u32,
    pub max_framebuffer_dimension: u32,
    pub wait_timeout: Duration,
    pub handshake_timeout: Duration,
}

impl SessionSettings {
    fn display_size(&self, screen: Screen) -> Size {
        match screen {
            Screen::Top => self.top,
            Screen::Bottom => self.bottom,
        }
    }
}

/// The session controller.
pub struct SessionController {
    slots: [SessionSlot; 2],
    connector: Box<dyn Connector>,
    settings: SessionSettings,
    failures: usize,
}

impl SessionController {
    pub fn new(connector: Box<dyn Connector>, settings: SessionSettings) -> Self {
        Self {
            slots: [SessionSlot::Absent, SessionSlot::Absent],
            connector,
            settings,
            failures: 0,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Builds the connect request for `screen` from endpoint details.
    pub fn request(
        &self,
        screen: Screen,
        host: &str,
        port: u16,
        user: &str,
        password: Option<&str>,
    ) -> ConnectRequest {
        ConnectRequest {
            screen,
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: password.map(str::to_string),
            depth: self.settings.depth,
            handshake_timeout: self.settings.handshake_timeout,
        }
    }

    /// Connects the session of `request.screen`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if the slot is occupied or the handshake
    /// fails; the slot is `Absent` afterwards in the latter case.
    pub fn connect(
        &mut self,
        request: &ConnectRequest,
        mode: ScaleMode,
        display: &mut dyn DisplayBackend,
    ) -> Result<(), ConnectError> {
        let screen = request.screen;
        let index = screen.index();
        if !matches!(self.slots[index], SessionSlot::Absent) {
            return Err(ConnectError::SlotBusy {
                screen,
                state: self.slots[index].state_name(),
            });
        }

        let addr = request.addr();
        info!(%screen, %addr, "connecting");
        self.slots[index] = SessionSlot::Connecting;

        let mut viewport = Viewport::new(self.settings.display_size(screen), mode).with_limits(
            self.settings.scrollbar_width,
            self.settings.max_framebuffer_dimension,
        );
        let result = {
            let mut allocator = SurfaceAllocator::new(screen, &mut viewport, Point::ORIGIN, display);
            self.connector.connect(request, &mut allocator)
        };

        match result {
            Ok(connection) => {
                info!(%screen, %addr, content = ?viewport.content(), "session live");
                self.slots[index] = SessionSlot::Live(Box::new(LiveSession {
                    addr,
                    connection,
                    viewport,
                }));
                Ok(())
            }
            Err(e) => {
                error!(%screen, %addr, error = %e, "connect failed");
                self.slots[index] = SessionSlot::Absent;
                display.release_surface(screen);
                Err(e)
            }
        }
    }

    pub fn slot(&self, screen: Screen) -> &SessionSlot {
        &self.slots[screen.index()]
    }

    pub fn is_live(&self, screen: Screen) -> bool {
        matches!(self.slots[screen.index()], SessionSlot::Live(_))
    }

    pub fn live_count(&self) -> usize {
        Screen::ALL.iter().filter(|s| self.is_live(**s)).count()
    }

    /// Number of sessions closed by a runtime failure since the last
    /// [`clear_failures`](Self::clear_failures).
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Starts a fresh failure count for the next run.
    pub fn clear_failures(&mut self) {
        self.failures = 0;
    }

    pub fn session(&self, screen: Screen) -> Option<&LiveSession> {
        match &self.slots[screen.index()] {
            SessionSlot::Live(session) => Some(session),
            _ => None,
        }
    }

    fn session_mut(&mut self, screen: Screen) -> Option<&mut LiveSession> {
        match &mut self.slots[screen.index()] {
            SessionSlot::Live(session) => Some(session),
            _ => None,
        }
    }

    /// Mutable viewports of the live sessions, indexed by [`Screen::index`].
    pub fn viewports_mut(&mut self) -> [Option<&mut Viewport>; 2] {
        let [top, bottom] = &mut self.slots;
        [viewport_of(top), viewport_of(bottom)]
    }

    /// Forwards a key event. A send failure closes the session.
    pub fn send_key(&mut self, screen: Screen, keysym: u32, down: bool, display: &mut dyn DisplayBackend) {
        let Some(session) = self.session_mut(screen) else {
            debug!(%screen, keysym, "key for absent session dropped");
            return;
        };
        if let Err(e) = session.connection.send_key(keysym, down) {
            self.fail(screen, &e, display);
        }
    }

    /// Forwards a pointer event. A send failure closes the session.
    pub fn send_pointer(
        &mut self,
        screen: Screen,
        position: Point,
        buttons: u8,
        display: &mut dyn DisplayBackend,
    ) {
        let Some(session) = self.session_mut(screen) else {
            debug!(%screen, "pointer event for absent session dropped");
            return;
        };
        if let Err(e) = session.connection.send_pointer(position, buttons) {
            self.fail(screen, &e, display);
        }
    }

    /// Switches `screen` between fit and pan mode.
    ///
    /// The viewport is recomputed, a new surface is created and bound, and a
    /// full non-incremental update is requested so the new surface gets drawn.
    pub fn toggle_scaling(&mut self, screen: Screen, pointer: Point, display: &mut dyn DisplayBackend) {
        let depth = self.settings.depth;
        let Some(session) = self.session_mut(screen) else {
            return;
        };
        let Some(spec) = session.viewport.toggle_mode(pointer) else {
            debug!(%screen, "scale mode changed before first framebuffer");
            return;
        };
        info!(%screen, mode = ?session.viewport.mode(), "scale mode toggled");

        let binding = match display.create_surface(screen, &SurfaceRequest { spec, depth }) {
            Ok(binding) => binding,
            Err(e) => {
                let e = ProtocolError::Resize(SurfaceError::Display(e));
                self.fail(screen, &e, display);
                return;
            }
        };
        session.connection.bind_surface(binding);
        display.set_view_origin(screen, spec.origin, spec.scrollbars);
        let full = Rect::covering(spec.content);
        if let Err(e) = session.connection.request_framebuffer_update(full, false) {
            self.fail(screen, &e, display);
        }
    }

    /// Makes the session on `target` hide the remote cursor and the other show it.
    pub fn apply_cursor_policy(&mut self, target: Screen) {
        for screen in Screen::ALL {
            if let Some(session) = self.session_mut(screen) {
                session.connection.set_remote_cursor(screen != target);
            }
        }
    }

    /// Bounded wait plus message pump for one session.
    pub fn pump(&mut self, screen: Screen, pointer: Point, display: &mut dyn DisplayBackend) -> PumpOutcome {
        let timeout = self.settings.wait_timeout;
        let Some(session) = self.session_mut(screen) else {
            return PumpOutcome::Idle;
        };

        let result = match session.connection.wait_for_activity(timeout) {
            Activity::None => return PumpOutcome::Idle,
            Activity::Error => Err(ProtocolError::Closed(session.addr.clone())),
            Activity::Ready => {
                let mut allocator =
                    SurfaceAllocator::new(screen, &mut session.viewport, pointer, &mut *display);
                session.connection.pump_messages(&mut allocator)
            }
        };

        match result {
            Ok(()) => PumpOutcome::Pumped,
            Err(e) => {
                self.fail(screen, &e, display);
                PumpOutcome::Closed
            }
        }
    }

    /// Closes a session on user request.
    pub fn close(&mut self, screen: Screen, display: &mut dyn DisplayBackend) {
        if let SessionSlot::Live(session) = std::mem::replace(&mut self.slots[screen.index()], SessionSlot::Absent) {
            info!(%screen, addr = %session.addr, "session closed");
            display.release_surface(screen);
        }
    }

    pub fn close_all(&mut self, display: &mut dyn DisplayBackend) {
        for screen in Screen::ALL {
            self.close(screen, display);
        }
    }

    fn fail(&mut self, screen: Screen, cause: &ProtocolError, display: &mut dyn DisplayBackend) {
        if let SessionSlot::Live(session) = std::mem::replace(&mut self.slots[screen.index()], SessionSlot::Absent) {
            error!(%screen, addr = %session.addr, error = %cause, "session failed");
            self.failures += 1;
            display.release_surface(screen);
        }
    }
}

fn viewport_of(slot: &mut SessionSlot) -> Option<&mut Viewport> {
    match slot {
        SessionSlot::Live(session) => Some(&mut session.viewport),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display::mock::MockDisplay;
    use crate::infrastructure::remote::mock::MockConnector;

    fn settings() -> SessionSettings {
        SessionSettings {
            top: Size::new(400, 240),
            bottom: Size::new(320, 240),
            depth: 32,
            scrollbar_width: 2,
            max_framebuffer_dimension: 1024,
            wait_timeout: Duration::from_micros(500),
            handshake_timeout: Duration::from_secs(10),
        }
    }

    fn controller() -> (SessionController, MockConnector) {
        let connector = MockConnector::new();
        let controller = SessionController::new(Box::new(connector.clone()), settings());
        (controller, connector)
    }

    fn connect(controller: &mut SessionController, display: &mut MockDisplay, screen: Screen, port: u16) -> Result<(), ConnectError> {
        let request = controller.request(screen, "host", port, "", None);
        controller.connect(&request, ScaleMode::Pan, display)
    }

    // ── connect ───────────────────────────────────────────────────────────────

    #[test]
    fn test_connect_allocates_initial_surface_and_goes_live() {
        // Arrange
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connector.set_framebuffer(5900, Size::new(800, 600));

        // Act
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        // Assert
        assert!(controller.is_live(Screen::Top));
        assert_eq!(controller.live_count(), 1);
        let viewport = controller.session(Screen::Top).unwrap().viewport();
        assert_eq!(viewport.content(), Size::new(800, 600));
        assert_eq!(display.surface_count(Screen::Top), 1);
        let conn = connector.connection(5900).unwrap();
        assert_eq!(conn.log().bindings.len(), 1);
    }

    #[test]
    fn test_connect_failure_leaves_slot_absent() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connector.fail_port(5900);

        let result = connect(&mut controller, &mut display, Screen::Top, 5900);

        assert!(matches!(result, Err(ConnectError::Handshake { .. })));
        assert!(matches!(controller.slot(Screen::Top), SessionSlot::Absent));
        assert_eq!(controller.live_count(), 0);
    }

    #[test]
    fn test_oversized_initial_framebuffer_fails_connect() {
        // Arrange
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connector.set_framebuffer(5900, Size::new(2048, 1536));

        // Act
        let result = connect(&mut controller, &mut display, Screen::Top, 5900);

        // Assert
        assert!(matches!(
            result,
            Err(ConnectError::Surface {
                source: SurfaceError::Resize(ResizeError::TooLarge { .. }),
                ..
            })
        ));
        assert_eq!(display.surface_count(Screen::Top), 0, "no surface for refused geometry");
    }

    #[test]
    fn test_connect_into_live_slot_is_rejected() {
        let (mut controller, _connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        let result = connect(&mut controller, &mut display, Screen::Top, 5900);

        assert!(matches!(result, Err(ConnectError::SlotBusy { state: "live", .. })));
    }

    // ── pump ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_pump_idle_without_activity() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        let outcome = controller.pump(Screen::Top, Point::ORIGIN, &mut display);

        assert_eq!(outcome, PumpOutcome::Idle);
        let log = connector.connection(5900).unwrap();
        assert_eq!(log.log().waits, vec![Duration::from_micros(500)]);
        assert_eq!(log.log().pumps, 0);
    }

    #[test]
    fn test_pump_handles_resize_through_allocator() {
        // Arrange
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        let conn = connector.connection(5900).unwrap();
        conn.push_activity(Activity::Ready);
        conn.log().pending_resize = Some(Size::new(1024, 768));

        // Act
        let outcome = controller.pump(Screen::Top, Point::ORIGIN, &mut display);

        // Assert
        assert_eq!(outcome, PumpOutcome::Pumped);
        assert_eq!(
            controller.session(Screen::Top).unwrap().viewport().content(),
            Size::new(1024, 768)
        );
        assert_eq!(conn.log().bindings.len(), 2);
        assert_eq!(display.surface_count(Screen::Top), 2);
    }

    #[test]
    fn test_pump_failure_closes_only_that_session() {
        // Arrange
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        connect(&mut controller, &mut display, Screen::Bottom, 5901).unwrap();
        connector.connection(5901).unwrap().push_activity(Activity::Error);

        // Act
        let bottom = controller.pump(Screen::Bottom, Point::ORIGIN, &mut display);
        let top = controller.pump(Screen::Top, Point::ORIGIN, &mut display);

        // Assert
        assert_eq!(bottom, PumpOutcome::Closed);
        assert_eq!(top, PumpOutcome::Idle);
        assert!(controller.is_live(Screen::Top));
        assert!(!controller.is_live(Screen::Bottom));
        assert_eq!(controller.failures(), 1);
        assert_eq!(display.log().released, vec![Screen::Bottom]);
    }

    #[test]
    fn test_rejected_resize_during_pump_closes_session() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        let conn = connector.connection(5900).unwrap();
        conn.push_activity(Activity::Ready);
        conn.log().pending_resize = Some(Size::new(1920, 1080));

        let outcome = controller.pump(Screen::Top, Point::ORIGIN, &mut display);

        assert_eq!(outcome, PumpOutcome::Closed);
        assert_eq!(controller.failures(), 1);
    }

    // ── sends / toggles ───────────────────────────────────────────────────────

    #[test]
    fn test_send_failure_closes_session() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        connector.connection(5900).unwrap().log().fail_sends = true;

        controller.send_key(Screen::Top, 0x61, true, &mut display);

        assert!(!controller.is_live(Screen::Top));
        assert_eq!(controller.failures(), 1);
    }

    #[test]
    fn test_send_to_absent_session_is_dropped() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        controller.send_pointer(Screen::Bottom, Point::new(1, 1), 1, &mut display);

        assert!(connector.connection(5900).unwrap().log().pointers.is_empty());
        assert_eq!(controller.failures(), 0);
    }

    #[test]
    fn test_toggle_scaling_rebinds_and_requests_full_update() {
        // Arrange
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connector.set_framebuffer(5900, Size::new(800, 600));
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        // Act
        controller.toggle_scaling(Screen::Top, Point::ORIGIN, &mut display);

        // Assert
        let viewport = controller.session(Screen::Top).unwrap().viewport();
        assert_eq!(viewport.mode(), ScaleMode::Fit);
        let conn = connector.connection(5900).unwrap();
        let log = conn.log();
        assert_eq!(log.bindings.len(), 2);
        assert_eq!(
            log.updates,
            vec![(Rect::covering(Size::new(800, 600)), false)]
        );
        assert!(display.last_surface(Screen::Top).unwrap().spec.fit.is_some());
    }

    #[test]
    fn test_cursor_policy_shows_remote_cursor_on_non_target() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        connect(&mut controller, &mut display, Screen::Bottom, 5901).unwrap();

        controller.apply_cursor_policy(Screen::Bottom);

        assert_eq!(connector.connection(5900).unwrap().log().remote_cursor, vec![true]);
        assert_eq!(connector.connection(5901).unwrap().log().remote_cursor, vec![false]);
    }

    #[test]
    fn test_close_all_is_not_a_failure() {
        let (mut controller, _connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();

        controller.close_all(&mut display);

        assert_eq!(controller.live_count(), 0);
        assert_eq!(controller.failures(), 0);
    }

    #[test]
    fn test_clear_failures_starts_a_fresh_count() {
        let (mut controller, connector) = controller();
        let mut display = MockDisplay::new();
        connect(&mut controller, &mut display, Screen::Top, 5900).unwrap();
        connector.connection(5900).unwrap().push_activity(Activity::Error);
        controller.pump(Screen::Top, Point::ORIGIN, &mut display);
        assert_eq!(controller.failures(), 1);

        controller.clear_failures();

        assert_eq!(controller.failures(), 0);
    }
}
