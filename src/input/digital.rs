//! # Digital Inputs
//!
//! Buttons reach the transmitter in two steps:
//!
//! 1. [`EdgeSource`] runs in interrupt context. It turns a falling edge on a
//!    monitored pin into a source index and pushes it onto the raw queue
//!    without waiting. A full queue drops the press.
//! 2. [`DigitalEventTask`] drains the raw queue, debounces per source and
//!    emits `{axis, 1}` events to the transmit queue.
//!
//! The raw queue is the only thing the two sides share.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::debounce::{DebounceGate, DebounceTable};
use super::{Clock, DigitalInput, EDGE_FALL};
use crate::error::Result;
use crate::event::Event;
use crate::pipeline::PipelineStats;
use crate::profile::Profile;

/// Interrupt-context producer of raw button presses
#[derive(Debug)]
pub struct EdgeSource {
    /// `(pin, source index)` for every monitored pin.
    pins: Vec<(u8, u8)>,
    tx: mpsc::Sender<u8>,
    dropped: AtomicU64,
}

impl EdgeSource {
    pub fn new(profile: &Profile, tx: mpsc::Sender<u8>) -> Self {
        let pins = profile
            .digital
            .iter()
            .enumerate()
            .map(|(index, source)| (source.pin, index as u8))
            .collect();

        Self {
            pins,
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Handle one GPIO interrupt.
    ///
    /// Only a pure falling edge on a monitored pin is queued. Never blocks
    /// and never allocates. Returns whether a press was queued.
    pub fn on_edge(&self, pin: u8, events: u32) -> bool {
        if events != EDGE_FALL {
            return false;
        }

        let Some(&(_, source)) = self.pins.iter().find(|(p, _)| *p == pin) else {
            return false;
        };

        match self.tx.try_send(source) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Presses lost to a full (or closed) raw queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Configure every monitored pin on `input` and route its interrupts here.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error reported by `input`.
    pub fn attach<D: DigitalInput + ?Sized>(self: &Arc<Self>, input: &mut D) -> Result<()> {
        for &(pin, _) in &self.pins {
            let handle = input.configure(pin)?;
            let source = Arc::clone(self);
            input.on_transition(
                handle,
                Box::new(move |pin, events| {
                    source.on_edge(pin, events);
                }),
            )?;
        }
        Ok(())
    }
}

/// Debounces raw presses and emits button events
pub struct DigitalEventTask<C: Clock> {
    profile: Profile,
    debounce: DebounceTable,
    clock: C,
    wait: Duration,
    rx: mpsc::Receiver<u8>,
    tx: mpsc::Sender<Event>,
    stats: Arc<PipelineStats>,
}

impl<C: Clock> DigitalEventTask<C> {
    /// # Arguments
    ///
    /// * `wait` - Bounded wait used both for reading the raw queue and for
    ///   pushing to the transmit queue
    pub fn new(
        profile: Profile,
        gate: DebounceGate,
        clock: C,
        wait: Duration,
        rx: mpsc::Receiver<u8>,
        tx: mpsc::Sender<Event>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            debounce: DebounceTable::new(gate, profile.digital.len()),
            profile,
            clock,
            wait,
            rx,
            tx,
            stats,
        }
    }

    /// Run until `shutdown` fires or every edge source is gone.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "Digital event task started ({} sources, debounce {}ms)",
            self.profile.digital.len(),
            self.debounce.gate().threshold_ms()
        );

        while !shutdown.is_cancelled() {
            match timeout(self.wait, self.rx.recv()).await {
                // Nothing pressed; look at the shutdown flag again.
                Err(_) => continue,
                Ok(None) => break,
                Ok(Some(source)) => self.handle(source).await,
            }
        }

        info!("Digital event task stopped");
    }

    async fn handle(&mut self, source: u8) {
        let Some(axis) = self.profile.axis_for_source(source) else {
            debug!("Ignoring unknown digital source {}", source);
            return;
        };

        let now = self.clock.now_ms();
        if !self.debounce.admit(source, now) {
            debug!("Debounced press on axis {} at {}ms", axis, now);
            return;
        }

        let event = Event::press(axis);
        match self.tx.send_timeout(event, self.wait).await {
            Ok(()) => debug!("Button press {}", event),
            Err(SendTimeoutError::Timeout(event)) => {
                self.stats.digital_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Transmit queue full, dropped {}", event);
            }
            Err(SendTimeoutError::Closed(event)) => {
                self.stats.digital_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Transmit queue closed, dropped {}", event);
            }
        }
    }
}
