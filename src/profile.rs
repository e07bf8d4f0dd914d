//! # Controller Profiles
//!
//! Two hardware variants of the controller exist. They differ in how many
//! buttons are wired, how raw ADC samples are rescaled, and how wide the
//! joystick dead zones are. Rather than duplicating task logic, each variant is
//! a [`Profile`] selected once at startup.
//!
//! | | Classic | Compact |
//! |---|---|---|
//! | Digital sources | 8 | 4 |
//! | Rescale | `-(raw - 2047) * 255 / 2047` | `(raw - 2047) * 1000 / 2048` |
//! | Primary dead zone | 30 | 100 |
//! | Secondary dead zone | 42 | 140 |

use serde::Deserialize;

use crate::event::axis;

/// Which named profile is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    #[default]
    Classic,
    Compact,
}

/// A button wired to a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalSource {
    pub pin: u8,
    pub axis: u8,
}

/// A joystick axis with its own ADC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogAxis {
    pub channel: u8,
    pub axis: u8,
}

/// Two joystick axes sharing one ADC channel behind a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxAxes {
    pub channel: u8,
    /// Axis sampled while the selector is low.
    pub low_axis: u8,
    /// Axis sampled while the selector is high.
    pub high_axis: u8,
}

/// Linear mapping from a center-biased raw ADC sample to a signed value
/// centered at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescale {
    /// Raw sample that maps to zero.
    pub center: i32,
    /// Denominator of the linear map.
    pub divisor: i32,
    /// Full-scale output magnitude.
    pub span: i32,
    /// Negate the result (stick wired upside down).
    pub invert: bool,
}

impl Rescale {
    /// Rescale one raw sample.
    ///
    /// Samples outside `[0, 2 * center]` are not an error; the result is
    /// clamped to `[-span, span]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::profile::Profile;
    ///
    /// let rescale = Profile::classic().rescale;
    /// assert_eq!(rescale.apply(2047), 0);
    /// assert_eq!(rescale.apply(0), 255);
    /// assert_eq!(rescale.apply(4094), -255);
    /// ```
    #[must_use]
    pub fn apply(&self, raw: u16) -> i16 {
        let mapped = (i32::from(raw) - self.center) * self.span / self.divisor;
        let signed = if self.invert { -mapped } else { mapped };
        let limit = self.span.min(i32::from(i16::MAX));
        signed.clamp(-limit, limit) as i16
    }
}

/// Button wiring of the classic board: B, Y, X, A, triggers, stick clicks.
#[rustfmt::skip]
const CLASSIC_DIGITAL: [DigitalSource; 8] = [
    DigitalSource { pin: 10, axis: axis::BUTTON_B },
    DigitalSource { pin: 11, axis: axis::BUTTON_Y },
    DigitalSource { pin: 12, axis: axis::BUTTON_X },
    DigitalSource { pin: 13, axis: axis::BUTTON_A },
    DigitalSource { pin: 14, axis: axis::TRIGGER_RIGHT },
    DigitalSource { pin: 15, axis: axis::TRIGGER_LEFT },
    DigitalSource { pin: 21, axis: axis::STICK_CLICK_RIGHT },
    DigitalSource { pin: 20, axis: axis::STICK_CLICK_LEFT },
];

#[rustfmt::skip]
const COMPACT_DIGITAL: [DigitalSource; 4] = [
    DigitalSource { pin: 10, axis: axis::BUTTON_B },
    DigitalSource { pin: 11, axis: axis::BUTTON_Y },
    DigitalSource { pin: 12, axis: axis::BUTTON_X },
    DigitalSource { pin: 13, axis: axis::BUTTON_A },
];

#[rustfmt::skip]
const ANALOG_AXES: [AnalogAxis; 2] = [
    AnalogAxis { channel: 0, axis: axis::PRIMARY_X },
    AnalogAxis { channel: 1, axis: axis::PRIMARY_Y },
];

const MUX_AXES: MuxAxes = MuxAxes {
    channel: 2,
    low_axis: axis::SECONDARY_X,
    high_axis: axis::SECONDARY_Y,
};

/// Everything that differs between hardware variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub kind: ProfileKind,
    /// Source index in the raw digital queue is the position in this table.
    pub digital: &'static [DigitalSource],
    pub analog: [AnalogAxis; 2],
    pub mux: MuxAxes,
    pub rescale: Rescale,
    /// Dead zone of the primary (independent channels) joystick.
    pub primary_deadzone: i16,
    /// Dead zone of the secondary (multiplexed) joystick.
    pub secondary_deadzone: i16,
}

impl Profile {
    #[must_use]
    pub fn classic() -> Self {
        Self {
            kind: ProfileKind::Classic,
            digital: &CLASSIC_DIGITAL,
            analog: ANALOG_AXES,
            mux: MUX_AXES,
            rescale: Rescale {
                center: 2047,
                divisor: 2047,
                span: 255,
                invert: true,
            },
            primary_deadzone: 30,
            secondary_deadzone: 42,
        }
    }

    #[must_use]
    pub fn compact() -> Self {
        Self {
            kind: ProfileKind::Compact,
            digital: &COMPACT_DIGITAL,
            analog: ANALOG_AXES,
            mux: MUX_AXES,
            rescale: Rescale {
                center: 2047,
                divisor: 2048,
                span: 1000,
                invert: false,
            },
            primary_deadzone: 100,
            secondary_deadzone: 140,
        }
    }

    #[must_use]
    pub fn from_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Classic => Self::classic(),
            ProfileKind::Compact => Self::compact(),
        }
    }

    /// Source index of a monitored pin, if any.
    #[must_use]
    pub fn source_for_pin(&self, pin: u8) -> Option<u8> {
        self.digital
            .iter()
            .position(|source| source.pin == pin)
            .map(|index| index as u8)
    }

    /// Wire axis id of a digital source index.
    #[must_use]
    pub fn axis_for_source(&self, source: u8) -> Option<u8> {
        self.digital.get(source as usize).map(|source| source.axis)
    }

    /// Axis ids carried by analog events in this profile.
    #[must_use]
    pub fn analog_axes(&self) -> [u8; 4] {
        [
            self.analog[0].axis,
            self.analog[1].axis,
            self.mux.low_axis,
            self.mux.high_axis,
        ]
    }

    /// Whether `axis` can be emitted by this profile.
    #[must_use]
    pub fn is_known_axis(&self, axis: u8) -> bool {
        self.digital.iter().any(|source| source.axis == axis) || self.analog_axes().contains(&axis)
    }

    /// Whether `axis` is a digital (button) axis in this profile.
    #[must_use]
    pub fn is_button(&self, axis: u8) -> bool {
        self.digital.iter().any(|source| source.axis == axis)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_rescale_matches_formula() {
        let rescale = Profile::classic().rescale;
        for raw in (0..=4094u16).step_by(7) {
            let expected = -((i32::from(raw) - 2047) * 255 / 2047);
            assert_eq!(i32::from(rescale.apply(raw)), expected, "raw {}", raw);
        }
    }

    #[test]
    fn test_classic_rescale_is_monotonically_decreasing() {
        let rescale = Profile::classic().rescale;
        let mut previous = rescale.apply(0);
        for raw in 1..=4094u16 {
            let current = rescale.apply(raw);
            assert!(current <= previous, "raw {} went up", raw);
            previous = current;
        }
    }

    #[test]
    fn test_compact_rescale_is_not_inverted() {
        let rescale = Profile::compact().rescale;
        assert_eq!(rescale.apply(2047), 0);
        assert_eq!(rescale.apply(4095), 1000);
        assert_eq!(rescale.apply(0), -999);
    }

    #[test]
    fn test_rescale_clamps_out_of_range_samples() {
        let rescale = Profile::classic().rescale;
        assert_eq!(rescale.apply(u16::MAX), -255);
        assert_eq!(rescale.apply(4095), -255);
    }

    #[test]
    fn test_center_maps_to_zero_in_both_profiles() {
        assert_eq!(Profile::classic().rescale.apply(2047), 0);
        assert_eq!(Profile::compact().rescale.apply(2047), 0);
    }

    #[test]
    fn test_classic_pin_table() {
        let profile = Profile::classic();
        assert_eq!(profile.digital.len(), 8);
        assert_eq!(profile.source_for_pin(10), Some(0));
        assert_eq!(profile.source_for_pin(21), Some(6));
        assert_eq!(profile.source_for_pin(20), Some(7));
        assert_eq!(profile.source_for_pin(16), None);
        assert_eq!(profile.axis_for_source(6), Some(axis::STICK_CLICK_RIGHT));
        assert_eq!(profile.axis_for_source(7), Some(axis::STICK_CLICK_LEFT));
        assert_eq!(profile.axis_for_source(8), None);
    }

    #[test]
    fn test_compact_has_four_buttons() {
        let profile = Profile::compact();
        assert_eq!(profile.digital.len(), 4);
        assert_eq!(profile.source_for_pin(14), None);
        assert!(!profile.is_known_axis(axis::STICK_CLICK_LEFT));
        assert!(profile.is_known_axis(axis::SECONDARY_Y));
    }

    #[test]
    fn test_button_classification() {
        let profile = Profile::classic();
        assert!(profile.is_button(axis::BUTTON_A));
        assert!(profile.is_button(axis::STICK_CLICK_RIGHT));
        assert!(!profile.is_button(axis::PRIMARY_X));
        assert!(!profile.is_known_axis(12));
    }

    #[test]
    fn test_profile_kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            profile: ProfileKind,
        }
        let parsed: Wrapper = toml::from_str("profile = \"compact\"").unwrap();
        assert_eq!(parsed.profile, ProfileKind::Compact);
        assert_eq!(Profile::from_kind(parsed.profile), Profile::compact());
    }
}
