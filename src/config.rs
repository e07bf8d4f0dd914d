//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; a missing file section falls back to
//! the defaults below, which match the classic hardware.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{GamepadLinkError, Result};
use crate::profile::{Profile, ProfileKind};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileKind,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub queues: QueueConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Sampling cadence and debounce timing
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,

    #[serde(default = "default_digital_wait_ms")]
    pub digital_wait_ms: u64,

    /// Single-axis sampling period. The multiplexed channel runs at twice
    /// this rate so each of its two axes keeps the same cadence.
    #[serde(default = "default_axis_period_ms")]
    pub axis_period_ms: u64,

    #[serde(default = "default_mux_settle_us")]
    pub mux_settle_us: u64,
}

/// Queue sizing
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files. Empty logs to the console only.
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/rfcomm0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_timeout_ms() -> u64 { 100 }

fn default_debounce_ms() -> u32 { 200 }
fn default_digital_wait_ms() -> u64 { 100 }
fn default_axis_period_ms() -> u64 { 100 }
fn default_mux_settle_us() -> u64 { 100 }

fn default_capacity() -> usize { 32 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            digital_wait_ms: default_digital_wait_ms(),
            axis_period_ms: default_axis_period_ms(),
            mux_settle_us: default_mux_settle_us(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TimingConfig {
    pub fn digital_wait(&self) -> Duration {
        Duration::from_millis(self.digital_wait_ms)
    }

    pub fn axis_period(&self) -> Duration {
        Duration::from_millis(self.axis_period_ms)
    }

    pub fn mux_period(&self) -> Duration {
        self.axis_period() / 2
    }

    pub fn mux_settle(&self) -> Duration {
        Duration::from_micros(self.mux_settle_us)
    }
}

fn invalid(message: impl std::fmt::Display) -> GamepadLinkError {
    GamepadLinkError::Config(toml::de::Error::custom(message))
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(format!("{} must be between {} and {}", name, min, max)));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration held in memory
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::config::Config;
    ///
    /// let config = Config::from_toml_str("profile = \"compact\"").unwrap();
    /// assert_eq!(config.queues.capacity, 32);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The hardware profile this configuration selects
    pub fn profile(&self) -> Profile {
        Profile::from_kind(self.profile)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200",
            ));
        }

        check_range("timeout_ms", self.serial.timeout_ms, 1, 10000)?;
        check_range("debounce_ms", u64::from(self.timing.debounce_ms), 1, 10000)?;
        check_range("digital_wait_ms", self.timing.digital_wait_ms, 1, 10000)?;
        check_range("axis_period_ms", self.timing.axis_period_ms, 2, 10000)?;
        check_range("mux_settle_us", self.timing.mux_settle_us, 0, 100_000)?;
        check_range("queue capacity", self.queues.capacity as u64, 1, 1024)?;

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}
