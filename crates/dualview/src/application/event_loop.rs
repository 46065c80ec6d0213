//! The event loop: one cooperative thread driving every session and service.
//!
//! Each tick runs, in order:
//!
//! 1. drain every pending raw input event and dispatch its routed actions,
//! 2. inject the synthetic event the auto-scroller scheduled last tick, if any,
//! 3. step the telemetry services,
//! 4. bounded wait + message pump for each live session,
//! 5. present the live screens.
//!
//! Input is always handled before network work, so a disconnect requested
//! this tick is never undone by later processing. The loop ends when the user
//! disconnects, the backend quits, or no session and no service is left.
//!
//! While a synthetic event is pending the tick is stretched to the
//! auto-scroller's tick period, so edge scrolling runs at its configured
//! speed regardless of how often the sessions wake the loop.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dualview_core::{BindingTable, ScaleMode, Screen};
use tracing::{debug, info, warn};

use super::manage_sessions::{ConnectError, Connector, PumpOutcome, SessionController, SessionSettings};
use super::route_input::{InputRouter, RouteContext, RoutedAction};
use super::telemetry::{MotionSensor, TelemetryFactory, TelemetryMultiplexor};
use crate::infrastructure::display::DisplayBackend;
use crate::infrastructure::input_capture::{InputSource, RawInputEvent};
use crate::infrastructure::storage::config::{AppConfig, SessionEntry, TelemetryConfig};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A disconnect control code was pressed.
    UserDisconnect,
    /// The backend asked to quit.
    Quit,
    /// Every session and service ended on its own.
    WorkEnded {
        /// At least one session closed because of an error.
        failed: bool,
    },
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit(LoopExit),
}

/// Adapters the loop runs on.
pub struct LoopParts {
    pub input: Box<dyn InputSource>,
    pub display: Box<dyn DisplayBackend>,
    pub connector: Box<dyn Connector>,
    pub telemetry: Box<dyn TelemetryFactory>,
    pub sensor: Option<Box<dyn MotionSensor>>,
}

pub struct EventLoop {
    input: Box<dyn InputSource>,
    display: Box<dyn DisplayBackend>,
    sessions: SessionController,
    router: InputRouter,
    telemetry: TelemetryMultiplexor,
    telemetry_factory: Box<dyn TelemetryFactory>,
    telemetry_config: TelemetryConfig,
    sensor: Option<Box<dyn MotionSensor>>,
    idle_sleep: Duration,
    scroll_period: Duration,
}

impl EventLoop {
    pub fn new(parts: LoopParts, config: &AppConfig, bindings: BindingTable) -> Self {
        let settings = SessionSettings {
            top: config.display.top(),
            bottom: config.display.bottom(),
            depth: config.display.depth,
            scrollbar_width: config.display.scrollbar_width,
            max_framebuffer_dimension: config.display.max_framebuffer_dimension,
            wait_timeout: config.input.wait_timeout(),
            handshake_timeout: config.input.handshake_timeout(),
        };
        Self {
            input: parts.input,
            display: parts.display,
            sessions: SessionController::new(parts.connector, settings),
            router: InputRouter::new(bindings, config.input.axis_dead_zone, config.autoscroll),
            telemetry: TelemetryMultiplexor::new(),
            telemetry_factory: parts.telemetry,
            telemetry_config: config.telemetry.clone(),
            sensor: parts.sensor,
            idle_sleep: config.input.wait_timeout(),
            scroll_period: config.autoscroll.tick_period(),
        }
    }

    pub fn sessions(&self) -> &SessionController {
        &self.sessions
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn telemetry(&self) -> &TelemetryMultiplexor {
        &self.telemetry
    }

    /// Live sessions plus running telemetry services.
    pub fn active_work(&self) -> usize {
        self.sessions.live_count() + self.telemetry.active_count()
    }

    /// Connects the sessions of `entry` and starts telemetry.
    ///
    /// Input state and the failure count of a previous run are discarded.
    ///
    /// # Errors
    ///
    /// Returns the top session's [`ConnectError`]; nothing is started then.
    /// A bottom session failure is logged and the top session runs alone.
    pub fn open(&mut self, entry: &SessionEntry) -> Result<(), ConnectError> {
        info!(entry = %entry.name, host = %entry.host, "opening session");
        self.router.reset();
        self.sessions.clear_failures();
        let top = self.sessions.request(
            Screen::Top,
            &entry.host,
            entry.port,
            &entry.user,
            entry.password.as_deref(),
        );
        self.sessions
            .connect(&top, ScaleMode::from_scaling(entry.scaling), self.display.as_mut())?;

        if entry.enable_bottom {
            let bottom = self.sessions.request(
                Screen::Bottom,
                &entry.host,
                entry.bottom_port,
                &entry.user,
                entry.password.as_deref(),
            );
            let mode = ScaleMode::from_scaling(entry.bottom_scaling);
            if let Err(e) = self.sessions.connect(&bottom, mode, self.display.as_mut()) {
                warn!(error = %e, "continuing with the top session only");
            }
        }

        self.start_telemetry(&entry.host);

        let bottom_live = self.sessions.is_live(Screen::Bottom);
        if entry.backlight_off {
            self.display.set_backlight(false);
        }
        self.display
            .set_keyboard_visible(!entry.hide_keyboard && !bottom_live);

        let target = if bottom_live && entry.target_bottom {
            Screen::Bottom
        } else {
            Screen::Top
        };
        self.router.set_target(target);
        if bottom_live {
            self.sessions.apply_cursor_policy(target);
        }
        Ok(())
    }

    /// Starts telemetry without any display session.
    pub fn open_telemetry_only(&mut self, host: &str) {
        info!(%host, "running telemetry without display sessions");
        self.start_telemetry(host);
    }

    fn start_telemetry(&mut self, host: &str) {
        self.telemetry.shutdown();
        self.reclaim_sensor();
        self.telemetry = TelemetryMultiplexor::start(
            &self.telemetry_config,
            host,
            self.telemetry_factory.as_mut(),
            self.sensor.take(),
        );
    }

    fn reclaim_sensor(&mut self) {
        if let Some(sensor) = self.telemetry.take_sensor() {
            self.sensor = Some(sensor);
        }
    }

    /// Ticks until the loop ends.
    pub fn run(&mut self) -> LoopExit {
        loop {
            if let TickOutcome::Exit(exit) = self.tick() {
                info!(?exit, "event loop finished");
                return exit;
            }
        }
    }

    /// Runs one iteration of the loop.
    pub fn tick(&mut self) -> TickOutcome {
        if self.active_work() == 0 {
            return TickOutcome::Exit(self.work_ended());
        }
        let started = Instant::now();
        // Anything scheduled while draining below waits for the next tick.
        let scheduled = self.router.take_scheduled();

        while let Some(event) = self.input.poll_event() {
            if let Some(exit) = self.route_and_dispatch(event) {
                return TickOutcome::Exit(exit);
            }
        }

        if let Some(event) = scheduled {
            if let Some(exit) = self.route_and_dispatch(event) {
                return TickOutcome::Exit(exit);
            }
        }

        let sample = self.router.sample(current_timestamp_us());
        self.telemetry.step(sample);

        let mut closed = false;
        for screen in Screen::ALL {
            let pointer = self.router.pointer(screen);
            closed |= self.sessions.pump(screen, pointer, self.display.as_mut()) == PumpOutcome::Closed;
        }
        if closed {
            self.follow_remaining_session();
        }

        for screen in Screen::ALL {
            if !self.sessions.is_live(screen) {
                continue;
            }
            if let Err(e) = self.display.present(screen) {
                warn!(error = %e, "present failed");
            }
        }

        if self.active_work() == 0 {
            return TickOutcome::Exit(self.work_ended());
        }
        if self.sessions.live_count() == 0 {
            // Nothing to wait on; keep telemetry from spinning.
            std::thread::sleep(self.idle_sleep);
        } else if self.router.has_scheduled() {
            let remaining = self.scroll_period.saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                std::thread::sleep(remaining);
            }
        }
        TickOutcome::Continue
    }

    /// Retargets input and the cursor policy after a session closed.
    fn follow_remaining_session(&mut self) {
        let selected = self.router.target();
        let target = if self.sessions.is_live(selected) {
            selected
        } else {
            selected.other()
        };
        if !self.sessions.is_live(target) {
            return;
        }
        if target != selected {
            info!(%target, "input follows the remaining session");
            self.router.set_target(target);
        }
        self.sessions.apply_cursor_policy(target);
    }

    fn work_ended(&self) -> LoopExit {
        LoopExit::WorkEnded {
            failed: self.sessions.failures() > 0,
        }
    }

    fn route_and_dispatch(&mut self, event: RawInputEvent) -> Option<LoopExit> {
        let touch_held = self.input.touch_held();
        let actions = {
            let mut ctx = RouteContext::new(self.sessions.viewports_mut(), touch_held);
            self.router.route(event, &mut ctx)
        };
        actions.into_iter().find_map(|action| self.dispatch(action))
    }

    fn dispatch(&mut self, action: RoutedAction) -> Option<LoopExit> {
        let display = self.display.as_mut();
        match action {
            RoutedAction::Key {
                screen,
                keysym,
                pressed,
            } => self.sessions.send_key(screen, keysym, pressed, display),
            RoutedAction::Pointer {
                screen,
                position,
                buttons,
            } => self.sessions.send_pointer(screen, position, buttons, display),
            RoutedAction::MoveViewport {
                screen,
                origin,
                scrollbars,
            } => display.set_view_origin(screen, origin, scrollbars),
            RoutedAction::ToggleScaling { screen } => {
                let pointer = self.router.pointer(screen);
                self.sessions.toggle_scaling(screen, pointer, display);
            }
            RoutedAction::TargetChanged { target } => {
                debug!(%target, "event target changed");
                self.sessions.apply_cursor_policy(target);
            }
            RoutedAction::ToggleBacklight => {
                let on = !display.backlight();
                display.set_backlight(on);
            }
            RoutedAction::ToggleKeyboard => {
                let visible = !display.keyboard_visible();
                display.set_keyboard_visible(visible);
            }
            RoutedAction::Disconnect => {
                info!("disconnect requested");
                return Some(LoopExit::UserDisconnect);
            }
            RoutedAction::Quit => {
                info!("quit requested");
                return Some(LoopExit::Quit);
            }
        }
        None
    }

    /// Stops every service and session and restores the local display.
    pub fn close(&mut self) {
        self.telemetry.shutdown();
        self.reclaim_sensor();
        self.sessions.close_all(self.display.as_mut());
        self.router.reset();
        self.display.set_backlight(true);
        self.display.set_keyboard_visible(false);
    }
}

/// Returns the current time as microseconds since the Unix epoch.
fn current_timestamp_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::manage_sessions::Activity;
    use crate::application::telemetry::MockMotionSensor;
    use crate::infrastructure::display::mock::MockDisplay;
    use crate::infrastructure::input_capture::mock::MockInputSource;
    use crate::infrastructure::network::mock::MockTelemetryFactory;
    use crate::infrastructure::remote::mock::MockConnector;

    struct Harness {
        input: MockInputSource,
        display: MockDisplay,
        connector: MockConnector,
        telemetry: MockTelemetryFactory,
    }

    fn event_loop(config: &AppConfig) -> (EventLoop, Harness) {
        event_loop_with_sensor(config, None)
    }

    fn event_loop_with_sensor(
        config: &AppConfig,
        sensor: Option<Box<dyn MotionSensor>>,
    ) -> (EventLoop, Harness) {
        let harness = Harness {
            input: MockInputSource::new(),
            display: MockDisplay::new(),
            connector: MockConnector::new(),
            telemetry: MockTelemetryFactory::new(),
        };
        let parts = LoopParts {
            input: Box::new(harness.input.clone()),
            display: Box::new(harness.display.clone()),
            connector: Box::new(harness.connector.clone()),
            telemetry: Box::new(harness.telemetry.clone()),
            sensor,
        };
        (EventLoop::new(parts, config, BindingTable::default()), harness)
    }

    fn entry(enable_bottom: bool) -> SessionEntry {
        SessionEntry {
            enable_bottom,
            ..SessionEntry::new("desk", "10.0.0.2")
        }
    }

    #[test]
    fn test_open_connects_top_then_bottom() {
        // Arrange
        let (mut lp, h) = event_loop(&AppConfig::default());

        // Act
        lp.open(&entry(true)).unwrap();

        // Assert
        let ports: Vec<u16> = h.connector.attempts().iter().map(|r| r.port).collect();
        assert_eq!(ports, vec![5900, 5901]);
        assert_eq!(lp.active_work(), 2);
        assert_eq!(lp.router().target(), Screen::Bottom);
        assert!(!h.display.log().keyboard_visible);
    }

    #[test]
    fn test_top_connect_failure_starts_nothing() {
        let mut config = AppConfig::default();
        config.telemetry.push.enabled = true;
        let (mut lp, h) = event_loop(&config);
        h.connector.fail_port(5900);

        let result = lp.open(&entry(true));

        assert!(result.is_err());
        assert_eq!(h.connector.attempts().len(), 1);
        assert!(h.telemetry.started().is_empty());
        assert_eq!(lp.active_work(), 0);
    }

    #[test]
    fn test_bottom_failure_keeps_top_running() {
        let (mut lp, h) = event_loop(&AppConfig::default());
        h.connector.fail_port(5901);

        lp.open(&entry(true)).unwrap();

        assert!(lp.sessions().is_live(Screen::Top));
        assert_eq!(lp.router().target(), Screen::Top);
        assert_eq!(lp.tick(), TickOutcome::Continue);
    }

    #[test]
    fn test_disconnect_ends_tick_before_network_work() {
        // Arrange
        let (mut lp, h) = event_loop(&AppConfig::default());
        lp.open(&entry(false)).unwrap();
        h.input.inject_events([
            RawInputEvent::JoyButton { index: 0, pressed: true },
            RawInputEvent::JoyButton { index: 1, pressed: true },
        ]);

        // Act
        let outcome = lp.tick();

        // Assert
        assert_eq!(outcome, TickOutcome::Exit(LoopExit::UserDisconnect));
        assert_eq!(h.input.pending(), 1, "events after the disconnect stay queued");
        let conn = h.connector.connection(5900).unwrap();
        assert!(conn.log().waits.is_empty(), "no pump after disconnect");
    }

    #[test]
    fn test_tick_drains_all_input_then_pumps_and_presents() {
        let (mut lp, h) = event_loop(&AppConfig::default());
        lp.open(&entry(false)).unwrap();
        h.input.inject_events([
            RawInputEvent::JoyButton { index: 1, pressed: true },
            RawInputEvent::JoyButton { index: 1, pressed: false },
        ]);

        assert_eq!(lp.tick(), TickOutcome::Continue);

        let conn = h.connector.connection(5900).unwrap();
        assert_eq!(conn.log().keys, vec![(0x61, true), (0x61, false)]);
        assert_eq!(conn.log().waits.len(), 1);
        assert_eq!(h.display.log().presents, vec![Screen::Top]);
    }

    #[test]
    fn test_quit_event_exits() {
        let (mut lp, h) = event_loop(&AppConfig::default());
        lp.open(&entry(false)).unwrap();
        h.input.inject_event(RawInputEvent::Quit);

        assert_eq!(lp.tick(), TickOutcome::Exit(LoopExit::Quit));
    }

    #[test]
    fn test_loop_ends_when_last_session_fails() {
        // Arrange
        let (mut lp, h) = event_loop(&AppConfig::default());
        lp.open(&entry(false)).unwrap();
        h.connector
            .connection(5900)
            .unwrap()
            .push_activity(Activity::Error);

        // Act
        let exit = lp.run();

        // Assert
        assert_eq!(exit, LoopExit::WorkEnded { failed: true });
    }

    #[test]
    fn test_close_restores_display() {
        let (mut lp, h) = event_loop(&AppConfig::default());
        let mut e = entry(false);
        e.backlight_off = true;
        lp.open(&e).unwrap();
        assert!(!h.display.log().backlight);

        lp.close();

        assert!(h.display.log().backlight);
        assert!(!h.display.log().keyboard_visible);
        assert_eq!(lp.active_work(), 0);
    }

    #[test]
    fn test_reopen_starts_a_clean_run_with_motion() {
        // Arrange: motion-backed push telemetry, first run loses the bottom session
        let mut config = AppConfig::default();
        config.telemetry.push.enabled = true;
        config.telemetry.motion = true;
        let reading = dualview_core::MotionSample {
            accel: [1, 2, 3],
            gyro: [4, 5, 6],
        };
        let mut sensor = MockMotionSensor::new();
        sensor.expect_read().returning(move || Some(reading));
        let (mut lp, h) = event_loop_with_sensor(&config, Some(Box::new(sensor)));
        lp.open(&entry(true)).unwrap();
        h.connector.connection(5901).unwrap().push_activity(Activity::Error);
        lp.tick();
        assert_eq!(lp.sessions().failures(), 1);
        lp.close();

        // Act
        lp.open(&entry(true)).unwrap();
        lp.tick();

        // Assert
        let steps = h.telemetry.steps("push");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].motion, Some(reading));
        assert_eq!(lp.sessions().failures(), 0);
        assert_eq!(lp.router().target(), Screen::Bottom);
        assert_eq!(lp.active_work(), 3);
    }

    #[test]
    fn test_close_discards_input_state() {
        let (mut lp, h) = event_loop(&AppConfig::default());
        lp.open(&entry(false)).unwrap();
        h.input.inject_event(RawInputEvent::JoyButton { index: 7, pressed: true });
        lp.tick();
        assert!(lp.router().meta_active());

        lp.close();

        assert!(!lp.router().meta_active());
    }

    #[test]
    fn test_pending_scroll_paces_the_tick() {
        // Arrange: 10 ticks/s, bottom panned over 640x480, touch held on the right edge
        let mut config = AppConfig::default();
        config.autoscroll.tick_rate = 10.0;
        let (mut lp, h) = event_loop(&config);
        h.connector.set_framebuffer(5901, dualview_core::Size::new(640, 480));
        let mut e = entry(true);
        e.bottom_scaling = false;
        lp.open(&e).unwrap();
        h.input.set_touch_held(true);
        h.input.inject_event(RawInputEvent::PointerMotion {
            x: 319,
            y: 120,
            dx: 0,
            dy: 0,
            source: dualview_core::PointerSource::Real,
        });

        // Act
        let started = Instant::now();
        lp.tick();
        lp.tick();

        // Assert
        assert!(lp.router().is_scrolling());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
