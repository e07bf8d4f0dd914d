//! # Event Model
//!
//! The unit that flows through every queue of the pipeline, plus the axis
//! identifier table shared by the device and the receiver.
//!
//! | Id | Source |
//! |----|--------|
//! | 0 | Button B |
//! | 1 | Button Y |
//! | 2 | Button X |
//! | 3 | Button A |
//! | 4 | Right trigger |
//! | 5 | Left trigger |
//! | 6 | Primary joystick X |
//! | 7 | Primary joystick Y |
//! | 8 | Secondary joystick X (multiplexed) |
//! | 9 | Secondary joystick Y (multiplexed) |
//! | 10 | Right stick click |
//! | 11 | Left stick click |

use std::fmt;

/// Axis identifiers as they appear on the wire.
pub mod axis {
    pub const BUTTON_B: u8 = 0;
    pub const BUTTON_Y: u8 = 1;
    pub const BUTTON_X: u8 = 2;
    pub const BUTTON_A: u8 = 3;
    pub const TRIGGER_RIGHT: u8 = 4;
    pub const TRIGGER_LEFT: u8 = 5;
    pub const PRIMARY_X: u8 = 6;
    pub const PRIMARY_Y: u8 = 7;
    pub const SECONDARY_X: u8 = 8;
    pub const SECONDARY_Y: u8 = 9;
    pub const STICK_CLICK_RIGHT: u8 = 10;
    pub const STICK_CLICK_LEFT: u8 = 11;
}

/// Value carried by a digital press.
pub const PRESSED: i16 = 1;

/// One input change: which axis, and its signed magnitude.
///
/// Events are plain values. A producer creates one, the next stage consumes
/// it, and nothing mutates it in place.
///
/// # Examples
///
/// ```
/// use gamepad_link::event::{axis, Event};
///
/// let press = Event::press(axis::BUTTON_A);
/// assert_eq!(press.value, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    /// Axis identifier (see [`axis`]).
    pub axis: u8,
    /// 1 for a press, signed scaled magnitude for analog axes.
    pub value: i16,
}

impl Event {
    #[must_use]
    pub const fn new(axis: u8, value: i16) -> Self {
        Self { axis, value }
    }

    /// A digital press on `axis`.
    #[must_use]
    pub const fn press(axis: u8) -> Self {
        Self {
            axis,
            value: PRESSED,
        }
    }

    /// Copy of this event with a different value.
    #[must_use]
    pub const fn with_value(self, value: i16) -> Self {
        Self {
            axis: self.axis,
            value,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis={} value={}", self.axis, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_has_unit_value() {
        let event = Event::press(axis::BUTTON_B);
        assert_eq!(event.axis, 0);
        assert_eq!(event.value, PRESSED);
    }

    #[test]
    fn test_with_value_keeps_axis() {
        let event = Event::new(axis::PRIMARY_X, -120).with_value(0);
        assert_eq!(event, Event::new(axis::PRIMARY_X, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Event::new(3, 300).to_string(), "axis=3 value=300");
    }

    #[test]
    fn test_axis_ids_are_distinct() {
        let ids = [
            axis::BUTTON_B,
            axis::BUTTON_Y,
            axis::BUTTON_X,
            axis::BUTTON_A,
            axis::TRIGGER_RIGHT,
            axis::TRIGGER_LEFT,
            axis::PRIMARY_X,
            axis::PRIMARY_Y,
            axis::SECONDARY_X,
            axis::SECONDARY_Y,
            axis::STICK_CLICK_RIGHT,
            axis::STICK_CLICK_LEFT,
        ];
        for (i, a) in ids.iter().enumerate() {
            assert_eq!(*a as usize, i);
        }
    }
}
