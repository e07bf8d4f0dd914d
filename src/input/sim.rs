//! # Simulated Board
//!
//! In-process stand-in for the controller hardware. Raw ADC levels are set
//! by hand, the multiplexed channel resolves through the selector level, and
//! [`SimBoard::press`] fires the registered edge callback the way a GPIO
//! interrupt would.
//!
//! ```
//! use gamepad_link::input::sim::SimBoard;
//! use gamepad_link::input::AnalogInput;
//!
//! let board = SimBoard::new(2);
//! board.set_level(0, 4000);
//!
//! let mut adc = board.analog();
//! adc.select_channel(0);
//! assert_eq!(adc.read(), 4000);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    AnalogInput, DigitalInput, EdgeCallback, PinHandle, SelectorOutput, EDGE_FALL, EDGE_RISE,
};
use crate::error::{GamepadLinkError, Result};

/// Raw level reported by unset channels (stick at rest).
pub const SIM_CENTER: u16 = 2047;

type SharedCallback = Arc<dyn Fn(u8, u32) + Send + Sync>;

#[derive(Default)]
struct SimState {
    levels: HashMap<u8, u16>,
    mux_low: Option<u16>,
    mux_high: Option<u16>,
    selector_high: bool,
    selector_history: Vec<bool>,
    configured: Vec<u8>,
    callbacks: HashMap<u8, SharedCallback>,
}

/// Shared simulated board; clones see the same state.
#[derive(Clone)]
pub struct SimBoard {
    mux_channel: u8,
    state: Arc<Mutex<SimState>>,
}

impl std::fmt::Debug for SimBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimBoard")
            .field("mux_channel", &self.mux_channel)
            .finish_non_exhaustive()
    }
}

impl SimBoard {
    /// Board whose ADC channel `mux_channel` sits behind the selector.
    pub fn new(mux_channel: u8) -> Self {
        Self {
            mux_channel,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the raw level of a directly wired channel.
    pub fn set_level(&self, channel: u8, raw: u16) {
        self.lock().levels.insert(channel, raw);
    }

    /// Set what the multiplexed channel reads for each selector level.
    pub fn set_mux_levels(&self, low: u16, high: u16) {
        let mut state = self.lock();
        state.mux_low = Some(low);
        state.mux_high = Some(high);
    }

    /// New ADC handle. Each task owns its own.
    pub fn analog(&self) -> SimAnalog {
        SimAnalog {
            board: self.clone(),
            channel: None,
        }
    }

    /// Handle driving the mux select line.
    pub fn selector(&self) -> SimSelector {
        SimSelector {
            board: self.clone(),
        }
    }

    /// Pins configured so far, in configuration order.
    pub fn configured_pins(&self) -> Vec<u8> {
        self.lock().configured.clone()
    }

    /// Every level written to the selector.
    pub fn selector_history(&self) -> Vec<bool> {
        self.lock().selector_history.clone()
    }

    /// Fire the edge callback of `pin` with `mask`. Returns false when no
    /// callback is registered.
    pub fn edge(&self, pin: u8, mask: u32) -> bool {
        // Clone out so the callback runs without the board lock held.
        let callback = self.lock().callbacks.get(&pin).cloned();
        match callback {
            Some(callback) => {
                callback(pin, mask);
                true
            }
            None => false,
        }
    }

    /// Simulate a button press (falling edge on a pulled-up input).
    pub fn press(&self, pin: u8) -> bool {
        self.edge(pin, EDGE_FALL)
    }

    /// Simulate a button release.
    pub fn release(&self, pin: u8) -> bool {
        self.edge(pin, EDGE_RISE)
    }

    fn sample(&self, channel: u8) -> u16 {
        let state = self.lock();
        if channel == self.mux_channel {
            let level = if state.selector_high {
                state.mux_high
            } else {
                state.mux_low
            };
            return level.unwrap_or(SIM_CENTER);
        }
        state.levels.get(&channel).copied().unwrap_or(SIM_CENTER)
    }
}

impl DigitalInput for SimBoard {
    fn configure(&mut self, pin: u8) -> Result<PinHandle> {
        let mut state = self.lock();
        if state.configured.contains(&pin) {
            return Err(GamepadLinkError::Hardware(format!(
                "pin {} configured twice",
                pin
            )));
        }
        state.configured.push(pin);
        Ok(PinHandle(pin))
    }

    fn on_transition(&mut self, handle: PinHandle, callback: EdgeCallback) -> Result<()> {
        let mut state = self.lock();
        if !state.configured.contains(&handle.0) {
            return Err(GamepadLinkError::Hardware(format!(
                "pin {} is not configured",
                handle.0
            )));
        }
        state.callbacks.insert(handle.0, Arc::from(callback));
        Ok(())
    }
}

/// ADC handle on a [`SimBoard`]
#[derive(Debug, Clone)]
pub struct SimAnalog {
    board: SimBoard,
    channel: Option<u8>,
}

impl AnalogInput for SimAnalog {
    fn select_channel(&mut self, channel: u8) {
        self.channel = Some(channel);
    }

    fn read(&mut self) -> u16 {
        match self.channel {
            Some(channel) => self.board.sample(channel),
            None => 0,
        }
    }
}

/// Mux select line on a [`SimBoard`]
#[derive(Debug, Clone)]
pub struct SimSelector {
    board: SimBoard,
}

impl SelectorOutput for SimSelector {
    fn set(&mut self, high: bool) {
        let mut state = self.board.lock();
        state.selector_high = high;
        state.selector_history.push(high);
    }
}
