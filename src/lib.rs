//! # Gamepad Link Library
//!
//! Input acquisition and telemetry encoding for a handheld game controller.
//!
//! Buttons are captured from GPIO interrupts and debounced, joystick axes are
//! sampled and dead-zoned, and every resulting event is streamed as a fixed
//! 4-octet frame over a serial radio link. The host side of the link decodes
//! the stream back into virtual gamepad updates.

pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod link;
pub mod pipeline;
pub mod profile;
