//! # Link Module
//!
//! Everything on the serial radio link.
//!
//! This module handles:
//! - Fixed 4-octet frame encoding and decoding
//! - Stream reassembly with resynchronisation
//! - The transmitter task draining the outbound queue
//! - Opening the serial port
//! - Mapping received frames to virtual gamepad controls on the host

pub mod decoder;
pub mod frame;
pub mod receiver;
pub mod serial;
pub mod transmitter;
