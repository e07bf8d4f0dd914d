//! # Input Module
//!
//! Button and joystick acquisition.
//!
//! This module handles:
//! - Capability traits for the board's GPIO, ADC and mux selector
//! - Falling-edge capture from interrupt context
//! - Per-button debouncing
//! - Periodic joystick sampling, including the multiplexed channel
//! - Dead-zone clamping
//!
//! Board bring-up (pin muxing, pull-ups, ADC init) is the caller's concern;
//! the pipeline only sees the traits below.

pub mod analog;
pub mod deadzone;
pub mod debounce;
pub mod digital;
pub mod sim;

use tokio::time::Instant;

use crate::error::Result;

/// Interrupt mask bit: pin held low
pub const EDGE_LEVEL_LOW: u32 = 0x1;
/// Interrupt mask bit: pin held high
pub const EDGE_LEVEL_HIGH: u32 = 0x2;
/// Interrupt mask bit: high-to-low transition
pub const EDGE_FALL: u32 = 0x4;
/// Interrupt mask bit: low-to-high transition
pub const EDGE_RISE: u32 = 0x8;

/// Handle to a configured input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinHandle(pub u8);

/// Callback run in interrupt context with `(pin, edge_mask)`.
pub type EdgeCallback = Box<dyn Fn(u8, u32) + Send + Sync + 'static>;

/// GPIO inputs with edge interrupts
pub trait DigitalInput: Send {
    /// Configure `pin` as a pulled-up input.
    fn configure(&mut self, pin: u8) -> Result<PinHandle>;

    /// Register the callback fired on transitions of `handle`.
    fn on_transition(&mut self, handle: PinHandle, callback: EdgeCallback) -> Result<()>;
}

/// One ADC, possibly shared by several channels
#[cfg_attr(test, mockall::automock)]
pub trait AnalogInput: Send {
    fn select_channel(&mut self, channel: u8);

    /// Raw sample from the selected channel.
    fn read(&mut self) -> u16;
}

/// Binary output driving the analog multiplexer select line
#[cfg_attr(test, mockall::automock)]
pub trait SelectorOutput: Send {
    fn set(&mut self, high: bool);
}

/// Millisecond counter used for debounce bookkeeping
pub trait Clock: Send {
    /// Milliseconds since an arbitrary start. Wraps at `u32::MAX`.
    fn now_ms(&self) -> u32;
}

/// [`Clock`] backed by tokio's monotonic clock, so paused-time tests see
/// virtual time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap-around.
        self.start.elapsed().as_millis() as u32
    }
}
