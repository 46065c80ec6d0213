//! Telemetry multiplexor: interleaves the auxiliary services with the loop.
//!
//! Each enabled service gets exactly one non-blocking step per tick, fed the
//! same input sample. The first failing step disables the service for good
//! and shuts it down; the display sessions are never affected.

use std::time::Duration;

use dualview_core::{CodecError, InputSample, MotionSample};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::infrastructure::storage::config::TelemetryConfig;

/// Errors raised by a telemetry service.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("cannot bind telemetry socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot reach telemetry peer {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("send to {addr} failed: {source}")]
    Send {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("receive on {addr} failed: {source}")]
    Receive {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One auxiliary service.
pub trait TelemetryService {
    fn name(&self) -> &str;

    /// Performs one non-blocking unit of work with the latest sample.
    ///
    /// # Errors
    ///
    /// Any error is treated as unrecoverable and disables the service.
    fn step(&mut self, sample: &InputSample) -> Result<(), TelemetryError>;

    fn shutdown(&mut self);
}

/// Source of motion readings.
#[cfg_attr(test, mockall::automock)]
pub trait MotionSensor {
    fn read(&mut self) -> Option<MotionSample>;
}

/// Creates the concrete services at session start.
pub trait TelemetryFactory {
    fn push(&mut self, host: &str, port: u16) -> Result<Box<dyn TelemetryService>, TelemetryError>;

    fn query(&mut self, port: u16, subscriber_ttl: Duration) -> Result<Box<dyn TelemetryService>, TelemetryError>;
}

struct ServiceSlot {
    service: Box<dyn TelemetryService>,
    enabled: bool,
    last_error: Option<String>,
}

/// Runs every enabled service once per tick.
#[derive(Default)]
pub struct TelemetryMultiplexor {
    services: Vec<ServiceSlot>,
    sensor: Option<Box<dyn MotionSensor>>,
    motion: bool,
}

impl TelemetryMultiplexor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the services enabled in `config`.
    ///
    /// The push client targets `config.push.host`, or `session_host` when
    /// none is configured. A service that fails to start is logged and left
    /// out. The sensor is held even with motion disabled so that
    /// [`take_sensor`](Self::take_sensor) can hand it back.
    pub fn start(
        config: &TelemetryConfig,
        session_host: &str,
        factory: &mut dyn TelemetryFactory,
        sensor: Option<Box<dyn MotionSensor>>,
    ) -> Self {
        let mut mux = Self::new();
        if config.push.enabled {
            let host = config.push.host.as_deref().unwrap_or(session_host);
            match factory.push(host, config.push.port) {
                Ok(service) => mux.add(service),
                Err(e) => error!(error = %e, "push client disabled"),
            }
        }
        if config.query.enabled {
            match factory.query(config.query.port, config.query.subscriber_ttl()) {
                Ok(service) => mux.add(service),
                Err(e) => error!(error = %e, "query server disabled"),
            }
        }
        mux.sensor = sensor;
        mux.motion = config.motion;
        if mux.motion && mux.sensor.is_none() {
            warn!("motion telemetry enabled but no sensor is available");
        }
        mux
    }

    pub fn add(&mut self, service: Box<dyn TelemetryService>) {
        info!(service = service.name(), "telemetry service started");
        self.services.push(ServiceSlot {
            service,
            enabled: true,
            last_error: None,
        });
    }

    /// Installs `sensor` and enables motion readings.
    pub fn set_sensor(&mut self, sensor: Box<dyn MotionSensor>) {
        self.sensor = Some(sensor);
        self.motion = true;
    }

    /// Returns the sensor for the next run; motion readings stop.
    pub fn take_sensor(&mut self) -> Option<Box<dyn MotionSensor>> {
        self.motion = false;
        self.sensor.take()
    }

    /// Services still running.
    pub fn active_count(&self) -> usize {
        self.services.iter().filter(|s| s.enabled).count()
    }

    /// Last error of the service called `name`, if it failed.
    pub fn last_error(&self, name: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|s| s.service.name() == name)
            .and_then(|s| s.last_error.as_deref())
    }

    /// Steps every enabled service with `sample`.
    ///
    /// Motion is read at most once and shared by all services. Returns the
    /// number of services disabled by this step.
    pub fn step(&mut self, mut sample: InputSample) -> usize {
        if self.active_count() == 0 {
            return 0;
        }
        if let Some(sensor) = self.sensor.as_mut().filter(|_| self.motion) {
            sample.motion = sensor.read();
        }

        let mut disabled = 0;
        for slot in self.services.iter_mut().filter(|s| s.enabled) {
            if let Err(e) = slot.service.step(&sample) {
                error!(service = slot.service.name(), error = %e, "telemetry service failed");
                slot.service.shutdown();
                slot.enabled = false;
                slot.last_error = Some(e.to_string());
                disabled += 1;
            }
        }
        disabled
    }

    /// Shuts down every running service.
    pub fn shutdown(&mut self) {
        for slot in self.services.iter_mut().filter(|s| s.enabled) {
            slot.service.shutdown();
            slot.enabled = false;
            info!(service = slot.service.name(), "telemetry service stopped");
        }
    }
}
