//! # Pipeline Wiring
//!
//! Builds every queue and task of the device side and hands back a handle
//! that owns them.
//!
//! ```text
//! GPIO irq --> EdgeSource --raw--> DigitalEventTask --------------------+
//!                                                                       |
//! ADC ch0 --> AnalogAxisTask --+                                        v
//! ADC ch1 --> AnalogAxisTask --+--primary--> DeadzoneFilterTask --> transmit --> Transmitter --> UART
//!                                                                       ^
//! ADC ch2 --> MuxAxisTask -------secondary--> DeadzoneFilterTask -------+
//! ```
//!
//! Queues are bounded and each has exactly one consumer. Task-to-task pushes
//! wait for space; the interrupt-side push drops instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{GamepadLinkError, Result};
use crate::input::analog::{AnalogAxisTask, MuxAxisTask};
use crate::input::deadzone::DeadzoneFilterTask;
use crate::input::debounce::DebounceGate;
use crate::input::digital::{DigitalEventTask, EdgeSource};
use crate::input::{AnalogInput, DigitalInput, MonotonicClock, SelectorOutput};
use crate::link::serial::LinkPort;
use crate::link::transmitter::Transmitter;

/// Counters written by the pipeline tasks, each by a single task
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub frames_sent: AtomicU64,
    pub write_errors: AtomicU64,
    /// Button events lost because the transmit queue stayed full
    pub digital_dropped: AtomicU64,
}

/// ADC handles and mux selector, one handle per sampling task
pub struct AnalogHardware<A, S> {
    pub primary_x: A,
    pub primary_y: A,
    pub secondary: A,
    pub selector: S,
}

/// Running pipeline
pub struct PipelineHandle {
    shutdown: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    edge_source: Arc<EdgeSource>,
    stats: Arc<PipelineStats>,
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("tasks", &self.tasks.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Create the queues, attach the edge source and spawn every task.
///
/// Nothing is spawned unless all startup steps succeed.
///
/// # Errors
///
/// - [`GamepadLinkError::Startup`] if there is no tokio runtime or the queue
///   capacity is zero
/// - [`GamepadLinkError::Hardware`] if a pin cannot be configured
pub fn spawn<D, A, S, P>(
    config: &Config,
    digital: &mut D,
    analog: AnalogHardware<A, S>,
    port: P,
) -> Result<PipelineHandle>
where
    D: DigitalInput + ?Sized,
    A: AnalogInput + 'static,
    S: SelectorOutput + 'static,
    P: LinkPort + 'static,
{
    let runtime = Handle::try_current()
        .map_err(|e| GamepadLinkError::Startup(format!("no async runtime: {}", e)))?;

    let capacity = config.queues.capacity;
    if capacity == 0 {
        return Err(GamepadLinkError::Startup(
            "queue capacity must be greater than 0".to_string(),
        ));
    }

    let profile = config.profile();
    let timing = &config.timing;

    let (raw_tx, raw_rx) = mpsc::channel(capacity);
    let (primary_tx, primary_rx) = mpsc::channel(capacity);
    let (secondary_tx, secondary_rx) = mpsc::channel(capacity);
    let (transmit_tx, transmit_rx) = mpsc::channel(capacity);

    let edge_source = Arc::new(EdgeSource::new(&profile, raw_tx));
    edge_source.attach(digital)?;

    let stats = Arc::new(PipelineStats::default());
    let shutdown = CancellationToken::new();
    let limit = profile.rescale.span.clamp(0, i32::from(i16::MAX)) as i16;

    let transmitter = Transmitter::new(
        port,
        limit,
        config.serial.timeout(),
        transmit_rx,
        Arc::clone(&stats),
    );
    let digital_task = DigitalEventTask::new(
        profile,
        DebounceGate::new(timing.debounce_ms),
        MonotonicClock::new(),
        timing.digital_wait(),
        raw_rx,
        transmit_tx.clone(),
        Arc::clone(&stats),
    );
    let primary_filter = DeadzoneFilterTask::new(
        "Primary",
        profile.primary_deadzone,
        primary_rx,
        transmit_tx.clone(),
    );
    let secondary_filter = DeadzoneFilterTask::new(
        "Secondary",
        profile.secondary_deadzone,
        secondary_rx,
        transmit_tx,
    );
    let x_task = AnalogAxisTask::new(
        analog.primary_x,
        profile.analog[0],
        profile.rescale,
        timing.axis_period(),
        primary_tx.clone(),
    );
    let y_task = AnalogAxisTask::new(
        analog.primary_y,
        profile.analog[1],
        profile.rescale,
        timing.axis_period(),
        primary_tx,
    );
    let mux_task = MuxAxisTask::new(
        analog.secondary,
        analog.selector,
        profile.mux,
        profile.rescale,
        timing.mux_period(),
        timing.mux_settle(),
        secondary_tx,
    );

    // Consumers first so nothing waits on an unpolled queue at startup.
    let tasks = vec![
        ("transmitter", runtime.spawn(transmitter.run(shutdown.clone()))),
        ("digital", runtime.spawn(digital_task.run(shutdown.clone()))),
        ("primary-filter", runtime.spawn(primary_filter.run(shutdown.clone()))),
        ("secondary-filter", runtime.spawn(secondary_filter.run(shutdown.clone()))),
        ("axis-x", runtime.spawn(x_task.run(shutdown.clone()))),
        ("axis-y", runtime.spawn(y_task.run(shutdown.clone()))),
        ("mux", runtime.spawn(mux_task.run(shutdown.clone()))),
    ];

    info!(
        "Pipeline started: {:?} profile, {} buttons, queue capacity {}",
        profile.kind,
        profile.digital.len(),
        capacity
    );

    Ok(PipelineHandle {
        shutdown,
        tasks,
        edge_source,
        stats,
    })
}

impl PipelineHandle {
    /// The interrupt-side producer (for drivers registering extra pins).
    pub fn edge_source(&self) -> &Arc<EdgeSource> {
        &self.edge_source
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Presses dropped in interrupt context because the raw queue was full.
    pub fn interrupt_drops(&self) -> u64 {
        self.edge_source.dropped()
    }

    /// Token that stops every task when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every task and wait for them to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!("Task {} ended abnormally: {}", name, e);
            }
        }

        info!(
            "Pipeline stopped: {} frames sent, {} button drops, {} interrupt drops",
            self.stats.frames_sent.load(Ordering::Relaxed),
            self.stats.digital_dropped.load(Ordering::Relaxed),
            self.edge_source.dropped()
        );
    }
}
