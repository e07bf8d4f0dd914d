//! # Host-Side Receiver
//!
//! The other end of the link: decodes frames from the serial stream and maps
//! them onto virtual gamepad controls.
//!
//! | Axis id | Control |
//! |---------|---------|
//! | digital sources | Button, numbered in profile order |
//! | 6 / 7 | Right stick X / Y (`Rx` / `Ry`) |
//! | 8 / 9 | Left stick X / Y (`X` / `Y`) |
//!
//! Stick values are rescaled from the profile's signed span to the unsigned
//! 16-bit HID range, centered at `0x8000`.

use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::decoder::FrameDecoder;
use crate::error::{GamepadLinkError, Result};
use crate::event::{axis, Event};
use crate::profile::Profile;

/// HID axis center
pub const HID_AXIS_CENTER: i32 = 32768;

/// HID axis half range
pub const HID_AXIS_HALF_RANGE: i32 = 32767;

/// Virtual gamepad axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidAxis {
    X,
    Y,
    Rx,
    Ry,
}

/// What an axis id drives on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Button(u8),
    Axis(HidAxis),
}

/// One change to apply to the virtual gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlUpdate {
    Button { index: u8, pressed: bool },
    Axis { axis: HidAxis, value: u16 },
}

/// Axis-id to control table for one profile
#[derive(Debug, Clone)]
pub struct ControlMap {
    controls: HashMap<u8, Control>,
    span: i32,
}

impl ControlMap {
    pub fn for_profile(profile: &Profile) -> Self {
        let mut controls: HashMap<u8, Control> = profile
            .digital
            .iter()
            .enumerate()
            .map(|(index, source)| (source.axis, Control::Button(index as u8)))
            .collect();

        controls.insert(axis::PRIMARY_X, Control::Axis(HidAxis::Rx));
        controls.insert(axis::PRIMARY_Y, Control::Axis(HidAxis::Ry));
        controls.insert(axis::SECONDARY_X, Control::Axis(HidAxis::X));
        controls.insert(axis::SECONDARY_Y, Control::Axis(HidAxis::Y));

        Self {
            controls,
            span: profile.rescale.span.max(1),
        }
    }

    pub fn control(&self, axis: u8) -> Option<Control> {
        self.controls.get(&axis).copied()
    }

    /// Translate a received event.
    ///
    /// # Errors
    ///
    /// - [`GamepadLinkError::UnknownAxis`] for ids outside the table
    /// - [`GamepadLinkError::InvalidButtonValue`] for button values other
    ///   than 0 or 1
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::event::Event;
    /// use gamepad_link::link::receiver::{ControlMap, ControlUpdate, HidAxis};
    /// use gamepad_link::profile::Profile;
    ///
    /// let map = ControlMap::for_profile(&Profile::compact());
    /// let update = map.process(&Event::new(8, 0)).unwrap();
    /// assert_eq!(update, ControlUpdate::Axis { axis: HidAxis::X, value: 32768 });
    /// ```
    pub fn process(&self, event: &Event) -> Result<ControlUpdate> {
        match self.control(event.axis) {
            None => Err(GamepadLinkError::UnknownAxis(event.axis)),
            Some(Control::Button(index)) => match event.value {
                0 | 1 => Ok(ControlUpdate::Button {
                    index,
                    pressed: event.value != 0,
                }),
                value => Err(GamepadLinkError::InvalidButtonValue {
                    axis: event.axis,
                    value,
                }),
            },
            Some(Control::Axis(axis)) => Ok(ControlUpdate::Axis {
                axis,
                value: self.scale(event.value),
            }),
        }
    }

    fn scale(&self, value: i16) -> u16 {
        let scaled = i32::from(value) * HID_AXIS_HALF_RANGE / self.span + HID_AXIS_CENTER;
        scaled.clamp(0, i32::from(u16::MAX)) as u16
    }
}

/// Read frames from `reader` until EOF or shutdown, forwarding mapped
/// updates. Returns the number of updates forwarded.
///
/// Frames that fail to map are logged and skipped.
///
/// # Errors
///
/// Returns [`GamepadLinkError::Io`] if reading fails.
pub async fn run_receiver<R: AsyncRead + Unpin>(
    mut reader: R,
    mut decoder: FrameDecoder,
    map: ControlMap,
    updates: mpsc::Sender<ControlUpdate>,
    shutdown: CancellationToken,
) -> Result<u64> {
    let mut buf = [0u8; 64];
    let mut forwarded = 0u64;

    info!("Waiting for controller input...");

    loop {
        let read = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = reader.read(&mut buf) => read?,
        };
        if read == 0 {
            debug!("Link closed");
            break;
        }

        decoder.push(&buf[..read]);
        while let Some(event) = decoder.next_frame() {
            match map.process(&event) {
                Ok(update) => {
                    debug!("Received {} -> {:?}", event, update);
                    if updates.send(update).await.is_err() {
                        return Ok(forwarded);
                    }
                    forwarded += 1;
                }
                Err(e) => warn!("Ignoring {}: {}", event, e),
            }
        }
    }

    if decoder.discarded() > 0 {
        info!("Discarded {} bytes while resynchronising", decoder.discarded());
    }
    Ok(forwarded)
}
