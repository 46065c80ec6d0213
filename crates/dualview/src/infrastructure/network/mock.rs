//! Scripted telemetry factory for tests.
//!
//! Services are identified by name (`"push"`, `"query"`). A test can make a
//! service fail to start or fail on its n-th step, and read back every sample
//! a service was stepped with.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dualview_core::InputSample;

use crate::application::telemetry::{TelemetryError, TelemetryFactory, TelemetryService};

#[derive(Default)]
struct FactoryState {
    fail_init: Vec<&'static str>,
    fail_step: HashMap<&'static str, usize>,
    steps: HashMap<&'static str, Vec<InputSample>>,
    shutdowns: HashMap<&'static str, usize>,
    started: Vec<(&'static str, String)>,
}

/// A [`TelemetryFactory`] producing recording services.
#[derive(Clone, Default)]
pub struct MockTelemetryFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockTelemetryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FactoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the service called `name` fail to start.
    pub fn fail_init(&self, name: &'static str) {
        self.state().fail_init.push(name);
    }

    /// Makes the `step`-th step (1-based) of service `name` fail.
    pub fn fail_step(&self, name: &'static str, step: usize) {
        self.state().fail_step.insert(name, step);
    }

    /// Samples service `name` was stepped with.
    pub fn steps(&self, name: &str) -> Vec<InputSample> {
        self.state().steps.get(name).cloned().unwrap_or_default()
    }

    pub fn shutdowns(&self, name: &str) -> usize {
        self.state().shutdowns.get(name).copied().unwrap_or(0)
    }

    /// Services started, with the address each was started for.
    pub fn started(&self) -> Vec<(&'static str, String)> {
        self.state().started.clone()
    }

    fn start(&self, name: &'static str, addr: String) -> Result<Box<dyn TelemetryService>, TelemetryError> {
        let mut state = self.state();
        if state.fail_init.contains(&name) {
            return Err(TelemetryError::Bind {
                addr,
                source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
            });
        }
        state.started.push((name, addr.clone()));
        Ok(Box::new(MockService {
            name,
            addr,
            factory: self.clone(),
        }))
    }
}

impl TelemetryFactory for MockTelemetryFactory {
    fn push(&mut self, host: &str, port: u16) -> Result<Box<dyn TelemetryService>, TelemetryError> {
        self.start("push", format!("{host}:{port}"))
    }

    fn query(&mut self, port: u16, _subscriber_ttl: Duration) -> Result<Box<dyn TelemetryService>, TelemetryError> {
        self.start("query", format!("0.0.0.0:{port}"))
    }
}

struct MockService {
    name: &'static str,
    addr: String,
    factory: MockTelemetryFactory,
}

impl TelemetryService for MockService {
    fn name(&self) -> &str {
        self.name
    }

    fn step(&mut self, sample: &InputSample) -> Result<(), TelemetryError> {
        let mut state = self.factory.state();
        let steps = state.steps.entry(self.name).or_default();
        steps.push(*sample);
        let count = steps.len();
        if state.fail_step.get(self.name) == Some(&count) {
            return Err(TelemetryError::Send {
                addr: self.addr.clone(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        *self.factory.state().shutdowns.entry(self.name).or_default() += 1;
    }
}
