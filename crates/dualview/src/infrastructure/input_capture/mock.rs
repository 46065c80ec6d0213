//! Mock input source for testing.
//!
//! Tests keep a clone of the [`MockInputSource`] and push events into it
//! after handing another clone to the event loop; both share one queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{InputSource, RawInputEvent};

#[derive(Default)]
struct MockState {
    queue: VecDeque<RawInputEvent>,
    touch_held: bool,
    polls: usize,
}

/// A queue-backed implementation of [`InputSource`].
#[derive(Clone, Default)]
pub struct MockInputSource {
    state: Arc<Mutex<MockState>>,
}

impl MockInputSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an event, as if reported by the backend.
    pub fn inject_event(&self, event: RawInputEvent) {
        self.state().queue.push_back(event);
    }

    /// Queues several events in order.
    pub fn inject_events(&self, events: impl IntoIterator<Item = RawInputEvent>) {
        self.state().queue.extend(events);
    }

    /// Sets the reported touch-held state.
    pub fn set_touch_held(&self, held: bool) {
        self.state().touch_held = held;
    }

    /// Number of events still queued.
    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    /// Number of `poll_event` calls, including those that returned `None`.
    pub fn poll_count(&self) -> usize {
        self.state().polls
    }
}

impl InputSource for MockInputSource {
    fn poll_event(&mut self) -> Option<RawInputEvent> {
        let mut state = self.state();
        state.polls += 1;
        state.queue.pop_front()
    }

    fn touch_held(&self) -> bool {
        self.state().touch_held
    }
}
