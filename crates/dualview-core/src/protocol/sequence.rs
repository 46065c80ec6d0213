//! Wrapping sequence counter for telemetry datagrams.

/// Monotonically increasing `u32` that wraps to 0 after `u32::MAX`.
///
/// Owned by exactly one service, so no atomics are involved.
///
/// ```rust
/// use dualview_core::protocol::SequenceCounter;
///
/// let mut counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    next: u32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number and advances the counter.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }

    /// The value the next call to [`next`](Self::next) will return.
    pub fn current(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn test_sequence_counter_wraps_at_u32_max() {
        // Arrange
        let mut counter = SequenceCounter { next: u32::MAX };

        // Act
        let before_wrap = counter.next();
        let after_wrap = counter.next();

        // Assert
        assert_eq!(before_wrap, u32::MAX);
        assert_eq!(after_wrap, 0, "counter must wrap to 0 after u32::MAX");
    }

    #[test]
    fn test_current_does_not_increment() {
        let mut counter = SequenceCounter::new();
        counter.next();
        assert_eq!(counter.current(), 1);
        assert_eq!(counter.next(), 1);
    }
}
