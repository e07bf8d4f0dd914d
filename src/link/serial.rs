//! # Serial Link
//!
//! The radio module (an HC-06 style Bluetooth SPP bridge) is a plain UART.
//!
//! This module handles:
//! - Opening the port at the configured baud rate, 8N1, no flow control
//! - A small async write trait so the transmitter can be tested without
//!   hardware

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{GamepadLinkError, Result};

/// Fallback device paths tried after the configured one
const FALLBACK_DEVICE_PATHS: &[&str] = &[
    "/dev/rfcomm0", // Bluetooth SPP binding
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Trait for serial port write operations
#[async_trait]
pub trait LinkPort: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Wrapper around tokio_serial::SerialStream that implements LinkPort
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for TokioSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSerialPort")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Open the configured port, falling back to the common device paths.
    ///
    /// # Errors
    ///
    /// Returns [`GamepadLinkError::SerialPortNotFound`] if no path opens.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_link::config::SerialConfig;
    /// use gamepad_link::link::serial::TokioSerialPort;
    ///
    /// # #[tokio::main] async fn main() -> anyhow::Result<()> {
    /// let port = TokioSerialPort::open(&SerialConfig::default())?;
    /// println!("Connected to: {}", port.device_path());
    /// # Ok(()) }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths = vec![config.port.as_str()];
        paths.extend(
            FALLBACK_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|path| *path != config.port),
        );
        let (port, path) = open_with_paths(&paths, config.baud_rate, config.timeout())?;
        Ok(Self::new(port, path))
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Give back the underlying stream (for reading).
    pub fn into_inner(self) -> tokio_serial::SerialStream {
        self.port
    }
}

#[async_trait]
impl LinkPort for TokioSerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}

/// Try each path in order and return the first port that opens.
///
/// # Errors
///
/// Returns [`GamepadLinkError::SerialPortNotFound`] listing every path tried.
pub fn open_with_paths(
    paths: &[&str],
    baud_rate: u32,
    timeout: Duration,
) -> Result<(tokio_serial::SerialStream, String)> {
    for path in paths {
        debug!("Trying to open serial port: {}", path);

        match open_port(path, baud_rate, timeout) {
            Ok(port) => {
                info!("Opened serial link at {} ({} baud)", path, baud_rate);
                return Ok((port, path.to_string()));
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    Err(GamepadLinkError::SerialPortNotFound(paths.join(", ")))
}

/// Open a specific serial port, 8N1 without flow control
fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<tokio_serial::SerialStream> {
    tokio_serial::new(path, baud_rate)
        .timeout(timeout)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| GamepadLinkError::Serial(format!("Failed to open {}: {}", path, e)))
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock serial port for testing
    #[derive(Clone, Default)]
    pub struct MockSerialPort {
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub write_delay: Arc<Mutex<Option<Duration>>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn set_write_error(&self, error: Option<io::ErrorKind>) {
            *self.write_error.lock().unwrap() = error;
        }

        /// Make every write stall for `delay` before completing.
        pub fn set_write_delay(&self, delay: Option<Duration>) {
            *self.write_delay.lock().unwrap() = delay;
        }
    }

    #[async_trait]
    impl LinkPort for MockSerialPort {
        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            let delay = *self.write_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock write error"));
            }
            self.written_data.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
