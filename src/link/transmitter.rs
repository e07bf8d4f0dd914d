//! # Transmitter Task
//!
//! Sole consumer of the transmit queue. Each event is clamped to the
//! profile's output span, encoded as one frame and written to the link.
//! A failed or stalled write is logged and the event is lost, never retried.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frame::encode_event_clamped;
use super::serial::LinkPort;
use crate::event::Event;
use crate::pipeline::PipelineStats;

/// Number of frames between status log messages
pub const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Drains the transmit queue onto a [`LinkPort`]
pub struct Transmitter<P: LinkPort> {
    port: P,
    limit: i16,
    write_timeout: Duration,
    rx: mpsc::Receiver<Event>,
    stats: Arc<PipelineStats>,
}

impl<P: LinkPort> Transmitter<P> {
    /// # Arguments
    ///
    /// * `limit` - Largest magnitude put on the wire
    /// * `write_timeout` - How long one frame write may take
    pub fn new(
        port: P,
        limit: i16,
        write_timeout: Duration,
        rx: mpsc::Receiver<Event>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            port,
            limit,
            write_timeout,
            rx,
            stats,
        }
    }

    /// Run until shutdown or until every producer is gone.
    ///
    /// On shutdown, events already queued are still written.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Transmitter started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    while let Ok(event) = self.rx.try_recv() {
                        self.send(event).await;
                    }
                    break;
                }
                event = self.rx.recv() => match event {
                    Some(event) => self.send(event).await,
                    None => break,
                },
            }
        }

        info!(
            "Transmitter stopped after {} frames",
            self.stats.frames_sent.load(Ordering::Relaxed)
        );
    }

    async fn send(&mut self, event: Event) {
        let frame = encode_event_clamped(&event, self.limit);

        match timeout(self.write_timeout, self.port.write_all(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to write {}: {}", event, e);
                return;
            }
            Err(_) => {
                self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Write of {} timed out after {:?}", event, self.write_timeout);
                return;
            }
        }
        match timeout(self.write_timeout, self.port.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to flush serial link: {}", e),
            Err(_) => warn!("Flush timed out after {:?}", self.write_timeout),
        }

        let sent = self.stats.frames_sent.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Sent {}", event);
        if sent % LOG_INTERVAL_FRAMES == 0 {
            info!("Sent {} frames", sent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::serial::mocks::MockSerialPort;
    use std::io;

    const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

    fn transmitter(
        port: &MockSerialPort,
        limit: i16,
        rx: mpsc::Receiver<Event>,
        stats: &Arc<PipelineStats>,
    ) -> Transmitter<MockSerialPort> {
        Transmitter::new(port.clone(), limit, WRITE_TIMEOUT, rx, Arc::clone(stats))
    }

    #[tokio::test]
    async fn test_writes_one_frame_per_event() {
        let port = MockSerialPort::new();
        let stats = Arc::new(PipelineStats::default());
        let (tx, rx) = mpsc::channel(8);
        let handle =
            tokio::spawn(transmitter(&port, 255, rx, &stats).run(CancellationToken::new()));

        tx.send(Event::new(3, 300)).await.unwrap();
        tx.send(Event::press(0)).await.unwrap();
        tx.send(Event::new(6, -42)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            port.get_written_data(),
            vec![
                vec![3, 0, 0xFF, 0xFF],
                vec![0, 0, 1, 0xFF],
                vec![6, 0xFF, 0xD6, 0xFF],
            ]
        );
        assert_eq!(stats.frames_sent.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_wide_limit_keeps_reference_encoding() {
        let port = MockSerialPort::new();
        let stats = Arc::default();
        let (tx, rx) = mpsc::channel(8);
        let handle =
            tokio::spawn(transmitter(&port, i16::MAX, rx, &stats).run(CancellationToken::new()));

        tx.send(Event::new(3, 300)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(port.get_written_data(), vec![vec![3, 1, 44, 0xFF]]);
    }

    #[tokio::test]
    async fn test_write_error_is_not_fatal() {
        let port = MockSerialPort::new();
        port.set_write_error(Some(io::ErrorKind::BrokenPipe));
        let stats = Arc::new(PipelineStats::default());
        let (tx, rx) = mpsc::channel(8);
        let handle =
            tokio::spawn(transmitter(&port, 255, rx, &stats).run(CancellationToken::new()));

        tx.send(Event::press(1)).await.unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        port.set_write_error(None);
        tx.send(Event::press(2)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(port.get_written_data(), vec![vec![2, 0, 1, 0xFF]]);
        assert_eq!(stats.write_errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.frames_sent.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_queued_events() {
        let port = MockSerialPort::new();
        let (tx, rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();

        tx.send(Event::press(0)).await.unwrap();
        tx.send(Event::press(1)).await.unwrap();
        shutdown.cancel();

        transmitter(&port, 255, rx, &Arc::default()).run(shutdown).await;

        assert_eq!(port.get_written_data().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_write_times_out() {
        let port = MockSerialPort::new();
        port.set_write_delay(Some(Duration::from_millis(500)));
        let stats = Arc::new(PipelineStats::default());
        let (tx, rx) = mpsc::channel(8);
        let handle =
            tokio::spawn(transmitter(&port, 255, rx, &stats).run(CancellationToken::new()));

        tx.send(Event::press(0)).await.unwrap();
        tokio::time::sleep(WRITE_TIMEOUT * 2).await;
        assert_eq!(stats.write_errors.load(Ordering::Relaxed), 1);

        port.set_write_delay(None);
        tx.send(Event::press(1)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(port.get_written_data(), vec![vec![1, 0, 1, 0xFF]]);
        assert_eq!(stats.frames_sent.load(Ordering::Relaxed), 1);
    }
}
