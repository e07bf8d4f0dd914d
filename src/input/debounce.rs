//! # Debounce Gate
//!
//! Rejects presses that arrive too soon after the last accepted press of the
//! same button. Timestamps are `u32` milliseconds and compared with wrapping
//! subtraction, so a counter wrap does not lock a button out.

/// Fixed-threshold debounce check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceGate {
    threshold_ms: u32,
}

impl DebounceGate {
    #[must_use]
    pub const fn new(threshold_ms: u32) -> Self {
        Self { threshold_ms }
    }

    #[must_use]
    pub const fn threshold_ms(&self) -> u32 {
        self.threshold_ms
    }

    /// True iff more than the threshold has elapsed since `last`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::input::debounce::DebounceGate;
    ///
    /// let gate = DebounceGate::new(200);
    /// assert!(!gate.accept(1_050, 1_000));
    /// assert!(gate.accept(1_201, 1_000));
    /// ```
    #[must_use]
    pub const fn accept(&self, now: u32, last: u32) -> bool {
        now.wrapping_sub(last) > self.threshold_ms
    }
}

/// Last-accepted timestamp per digital source.
///
/// Owned by exactly one task. A source that has never been accepted passes
/// unconditionally.
#[derive(Debug, Clone)]
pub struct DebounceTable {
    gate: DebounceGate,
    last: Vec<Option<u32>>,
}

impl DebounceTable {
    #[must_use]
    pub fn new(gate: DebounceGate, sources: usize) -> Self {
        Self {
            gate,
            last: vec![None; sources],
        }
    }

    /// Run the gate for `source` at `now`, recording `now` on acceptance.
    ///
    /// Unknown sources are rejected.
    pub fn admit(&mut self, source: u8, now: u32) -> bool {
        let Some(slot) = self.last.get_mut(source as usize) else {
            return false;
        };

        let accepted = match *slot {
            None => true,
            Some(last) => self.gate.accept(now, last),
        };
        if accepted {
            *slot = Some(now);
        }
        accepted
    }

    #[must_use]
    pub fn gate(&self) -> DebounceGate {
        self.gate
    }

    /// Last accepted timestamp of `source`.
    #[must_use]
    pub fn last_accepted(&self, source: u8) -> Option<u32> {
        self.last.get(source as usize).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_threshold_is_exclusive() {
        let gate = DebounceGate::new(200);
        assert!(!gate.accept(200, 0));
        assert!(gate.accept(201, 0));
    }

    #[test]
    fn test_gate_handles_wraparound() {
        let gate = DebounceGate::new(200);
        let last = u32::MAX - 50;
        assert!(!gate.accept(100, last));
        assert!(gate.accept(300, last));
    }

    #[test]
    fn test_first_press_always_accepted() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 8);
        assert!(table.admit(3, 0));
        assert_eq!(table.last_accepted(3), Some(0));
    }

    #[test]
    fn test_bounce_within_threshold_is_suppressed() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 8);
        assert!(table.admit(0, 1_000));
        assert!(!table.admit(0, 1_050));
        assert!(!table.admit(0, 1_200));
        assert!(table.admit(0, 1_201));
    }

    #[test]
    fn test_rejection_does_not_move_timestamp() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 8);
        table.admit(1, 1_000);
        table.admit(1, 1_150);
        assert_eq!(table.last_accepted(1), Some(1_000));
    }

    #[test]
    fn test_sources_are_independent() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 8);
        assert!(table.admit(0, 1_000));
        assert!(table.admit(1, 1_010));
        assert!(!table.admit(0, 1_020));
        assert!(!table.admit(1, 1_030));
    }

    #[test]
    fn test_timestamps_never_decrease_across_accepted_presses() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 1);
        let mut previous = None;
        for now in (0..5_000).step_by(37) {
            table.admit(0, now);
            let current = table.last_accepted(0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_unknown_source_rejected() {
        let mut table = DebounceTable::new(DebounceGate::new(200), 4);
        assert!(!table.admit(4, 10_000));
        assert_eq!(table.last_accepted(4), None);
    }
}
