//! # Dead-Zone Filter
//!
//! Forces near-center joystick values to exactly zero. Every event is
//! forwarded, clamped or not, so a stick at rest keeps streaming zeros and
//! the receiver can tell "at rest" from "no data".

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::event::Event;

/// Zero `value` when `|value| < threshold`, otherwise pass it through.
///
/// # Examples
///
/// ```
/// use gamepad_link::input::deadzone::apply_deadzone;
///
/// assert_eq!(apply_deadzone(29, 30), 0);
/// assert_eq!(apply_deadzone(-29, 30), 0);
/// assert_eq!(apply_deadzone(30, 30), 30);
/// ```
#[must_use]
pub fn apply_deadzone(value: i16, threshold: i16) -> i16 {
    if value > -threshold && value < threshold {
        0
    } else {
        value
    }
}

/// Consumer of one joystick cluster's analog queue
pub struct DeadzoneFilterTask {
    name: &'static str,
    threshold: i16,
    rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
}

impl DeadzoneFilterTask {
    pub fn new(
        name: &'static str,
        threshold: i16,
        rx: mpsc::Receiver<Event>,
        tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            name,
            threshold,
            rx,
            tx,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "{} dead-zone filter started (threshold {})",
            self.name, self.threshold
        );

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let filtered = event.with_value(apply_deadzone(event.value, self.threshold));
            let sent = tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = self.tx.send(filtered) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        info!("{} dead-zone filter stopped", self.name);
    }
}
