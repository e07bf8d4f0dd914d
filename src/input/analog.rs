//! # Analog Axis Sampling
//!
//! Periodic producers for the joystick axes.
//!
//! - [`AnalogAxisTask`] owns one ADC channel and one axis.
//! - [`MuxAxisTask`] shares one ADC channel between two axes through an
//!   analog multiplexer. It drives the select line, waits for the signal to
//!   settle, samples, and alternates axes every cycle. Because two axes share
//!   the channel it runs at half the single-axis period.
//!
//! Both rescale with the active profile's [`Rescale`] and push onto their
//! cluster's analog queue, waiting as long as it takes for space.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{AnalogInput, SelectorOutput};
use crate::event::Event;
use crate::profile::{AnalogAxis, MuxAxes, Rescale};

/// Sleep for `period` unless shutdown fires first. Returns false on shutdown.
async fn pause(period: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = sleep(period) => true,
    }
}

/// Push `event`, waiting for space. Returns false on shutdown or a closed
/// queue.
async fn push(tx: &mpsc::Sender<Event>, event: Event, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// Sampler for a joystick axis with a dedicated ADC channel
pub struct AnalogAxisTask<A: AnalogInput> {
    input: A,
    axis: AnalogAxis,
    rescale: Rescale,
    period: Duration,
    tx: mpsc::Sender<Event>,
}

impl<A: AnalogInput> AnalogAxisTask<A> {
    pub fn new(
        input: A,
        axis: AnalogAxis,
        rescale: Rescale,
        period: Duration,
        tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            input,
            axis,
            rescale,
            period,
            tx,
        }
    }

    /// Select the channel, read it and rescale.
    pub fn sample(&mut self) -> Event {
        self.input.select_channel(self.axis.channel);
        let raw = self.input.read();
        Event::new(self.axis.axis, self.rescale.apply(raw))
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "Axis {} sampler started on ADC channel {} every {:?}",
            self.axis.axis, self.axis.channel, self.period
        );

        loop {
            let event = self.sample();
            if !push(&self.tx, event, &shutdown).await {
                break;
            }
            if !pause(self.period, &shutdown).await {
                break;
            }
        }

        info!("Axis {} sampler stopped", self.axis.axis);
    }
}

/// Sampler for two joystick axes multiplexed onto one ADC channel
pub struct MuxAxisTask<A: AnalogInput, S: SelectorOutput> {
    input: A,
    selector: S,
    axes: MuxAxes,
    rescale: Rescale,
    period: Duration,
    settle: Duration,
    /// False samples the low axis, true the high axis.
    phase: bool,
    tx: mpsc::Sender<Event>,
}

impl<A: AnalogInput, S: SelectorOutput> MuxAxisTask<A, S> {
    /// # Arguments
    ///
    /// * `period` - Delay between consecutive samples (half the single-axis
    ///   period)
    /// * `settle` - Delay between driving the select line and sampling
    pub fn new(
        input: A,
        selector: S,
        axes: MuxAxes,
        rescale: Rescale,
        period: Duration,
        settle: Duration,
        tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            input,
            selector,
            axes,
            rescale,
            period,
            settle,
            phase: false,
            tx,
        }
    }

    fn current_axis(&self) -> u8 {
        if self.phase {
            self.axes.high_axis
        } else {
            self.axes.low_axis
        }
    }

    /// Drive the selector for the current phase, let it settle, sample.
    ///
    /// Does not advance the phase.
    pub async fn sample(&mut self) -> Event {
        self.selector.set(self.phase);
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }

        self.input.select_channel(self.axes.channel);
        let raw = self.input.read();
        Event::new(self.current_axis(), self.rescale.apply(raw))
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "Multiplexed sampler started on ADC channel {} (axes {} / {}) every {:?}",
            self.axes.channel, self.axes.low_axis, self.axes.high_axis, self.period
        );

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.sample() => event,
            };
            if !push(&self.tx, event, &shutdown).await {
                break;
            }
            if !pause(self.period, &shutdown).await {
                break;
            }
            self.phase = !self.phase;
        }

        debug!("Multiplexed sampler ended in phase {}", self.phase);
        info!("Multiplexed sampler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::axis;
    use crate::input::sim::SimBoard;
    use crate::input::{MockAnalogInput, MockSelectorOutput};
    use crate::profile::Profile;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_sample_selects_channel_before_read() {
        let mut adc = MockAnalogInput::new();
        let mut seq = Sequence::new();
        adc.expect_select_channel()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        adc.expect_read().times(1).in_sequence(&mut seq).return_const(0u16);

        let profile = Profile::classic();
        let (tx, _rx) = mpsc::channel(1);
        let mut task = AnalogAxisTask::new(
            adc,
            profile.analog[1],
            profile.rescale,
            Duration::from_millis(100),
            tx,
        );

        assert_eq!(task.sample(), Event::new(axis::PRIMARY_Y, 255));
    }

    #[test]
    fn test_center_sample_is_zero() {
        let board = SimBoard::new(2);
        let profile = Profile::classic();
        let (tx, _rx) = mpsc::channel(1);
        let mut task = AnalogAxisTask::new(
            board.analog(),
            profile.analog[0],
            profile.rescale,
            Duration::from_millis(100),
            tx,
        );

        assert_eq!(task.sample(), Event::new(axis::PRIMARY_X, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_axis_task_samples_every_period() {
        let board = SimBoard::new(2);
        board.set_level(0, 0);
        let profile = Profile::classic();
        let (tx, mut rx) = mpsc::channel(32);
        let shutdown = CancellationToken::new();

        let task = AnalogAxisTask::new(
            board.analog(),
            profile.analog[0],
            profile.rescale,
            Duration::from_millis(100),
            tx,
        );
        let handle = tokio::spawn(task.run(shutdown.clone()));

        // Samples at 0, 100, 200 and 300ms.
        sleep(Duration::from_millis(350)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| *e == Event::new(axis::PRIMARY_X, 255)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_axis_task_blocks_on_full_queue() {
        let board = SimBoard::new(2);
        let profile = Profile::classic();
        let (tx, mut rx) = mpsc::channel(2);
        let shutdown = CancellationToken::new();

        let task = AnalogAxisTask::new(
            board.analog(),
            profile.analog[0],
            profile.rescale,
            Duration::from_millis(100),
            tx,
        );
        let handle = tokio::spawn(task.run(shutdown.clone()));

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(drain(&mut rx).len(), 2);

        // Space freed, the stalled producer resumes.
        sleep(Duration::from_millis(50)).await;
        assert_eq!(drain(&mut rx).len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_mux_sample_drives_selector_first() {
        let mut selector = MockSelectorOutput::new();
        let mut adc = MockAnalogInput::new();
        let mut seq = Sequence::new();
        selector
            .expect_set()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        adc.expect_select_channel()
            .with(eq(2))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        adc.expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(4094u16);

        let profile = Profile::classic();
        let (tx, _rx) = mpsc::channel(1);
        let mut task = MuxAxisTask::new(
            adc,
            selector,
            profile.mux,
            profile.rescale,
            Duration::from_millis(50),
            Duration::ZERO,
            tx,
        );

        assert_eq!(task.sample().await, Event::new(axis::SECONDARY_X, -255));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mux_alternates_axes_and_levels() {
        let board = SimBoard::new(2);
        board.set_mux_levels(0, 4094);
        let profile = Profile::classic();
        let (tx, mut rx) = mpsc::channel(32);
        let shutdown = CancellationToken::new();

        let task = MuxAxisTask::new(
            board.analog(),
            board.selector(),
            profile.mux,
            profile.rescale,
            Duration::from_millis(50),
            Duration::from_micros(100),
            tx,
        );
        let handle = tokio::spawn(task.run(shutdown.clone()));

        sleep(Duration::from_millis(480)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let events = drain(&mut rx);
        assert!(events.len() >= 8);
        for pair in events.windows(2) {
            assert_ne!(pair[0].axis, pair[1].axis);
        }
        for event in &events {
            let expected = if event.axis == axis::SECONDARY_X { 255 } else { -255 };
            assert_eq!(event.value, expected);
        }
        assert_eq!(events[0].axis, axis::SECONDARY_X);

        let history = board.selector_history();
        for pair in history.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
