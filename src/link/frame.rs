//! # Wire Frame
//!
//! Every event travels as exactly four octets:
//!
//! ```text
//! +---------+------------+-----------+------------+
//! | axis id | value high | value low | 0xFF       |
//! +---------+------------+-----------+------------+
//! ```
//!
//! `value` is a big-endian two's-complement `i16`. Axis ids stay below
//! `0xFF`, so the first octet of a frame never equals the terminator; the
//! high value octet can (every value in `-256..=-1` has high byte `0xFF`),
//! which is why the decoder synchronises on axis id and terminator together.

use crate::error::{GamepadLinkError, Result};
use crate::event::Event;

/// Length of one frame in octets
pub const FRAME_LEN: usize = 4;

/// Last octet of every frame
pub const FRAME_TERMINATOR: u8 = 0xFF;

/// One encoded frame
pub type Frame = [u8; FRAME_LEN];

/// Encode an event without range checks.
///
/// # Examples
///
/// ```
/// use gamepad_link::event::Event;
/// use gamepad_link::link::frame::encode_event;
///
/// assert_eq!(encode_event(&Event::new(3, 300)), [3, 1, 44, 0xFF]);
/// ```
#[must_use]
pub fn encode_event(event: &Event) -> Frame {
    let [high, low] = event.value.to_be_bytes();
    [event.axis, high, low, FRAME_TERMINATOR]
}

/// Encode an event after clamping its value to `[-limit, limit]`.
#[must_use]
pub fn encode_event_clamped(event: &Event, limit: i16) -> Frame {
    let limit = limit.max(0);
    encode_event(&event.with_value(event.value.clamp(-limit, limit)))
}

/// Decode one aligned frame.
///
/// # Errors
///
/// Returns [`GamepadLinkError::Frame`] if the slice is not four octets long,
/// does not end in the terminator, or starts with the terminator.
///
/// # Examples
///
/// ```
/// use gamepad_link::event::Event;
/// use gamepad_link::link::frame::decode_frame;
///
/// assert_eq!(decode_frame(&[3, 1, 44, 0xFF]).unwrap(), Event::new(3, 300));
/// ```
pub fn decode_frame(frame: &[u8]) -> Result<Event> {
    if frame.len() != FRAME_LEN {
        return Err(GamepadLinkError::Frame(format!(
            "expected {} bytes, got {}",
            FRAME_LEN,
            frame.len()
        )));
    }

    if frame[3] != FRAME_TERMINATOR {
        return Err(GamepadLinkError::Frame(format!(
            "invalid terminator: 0x{:02X}",
            frame[3]
        )));
    }

    if frame[0] == FRAME_TERMINATOR {
        return Err(GamepadLinkError::Frame("axis id 0xFF is reserved".to_string()));
    }

    Ok(Event::new(frame[0], i16::from_be_bytes([frame[1], frame[2]])))
}
