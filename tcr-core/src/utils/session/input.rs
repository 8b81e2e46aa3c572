//! Controller input types.
//!
//! The pipeline never reads hardware itself. A joystick widget or a gamepad
//! poll produces [`PadSample`]s, and the session turns those into wire
//! frames. [`StickValues`] carries the widget-side geometry that the page
//! callbacks receive.

use libm;

/// How often input sources are polled, in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 50;

/// One input reading: stick position, light trigger, gear buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PadSample {
    /// Stick x in `[-1, 1]`, positive right.
    pub x: f32,
    /// Stick y in `[-1, 1]`, positive forward.
    pub y: f32,
    /// Light trigger in `[0, 1]`; `None` when the source has no light input.
    pub light: Option<f32>,
    /// Shift-down shoulder button held.
    pub gear_down: bool,
    /// Shift-up shoulder button held.
    pub gear_up: bool,
}

/// Anything that can be polled for control input every
/// [`POLL_INTERVAL_MS`].
///
/// Returning `None` means no device produced a reading this tick.
pub trait InputSource {
    fn poll(&mut self) -> Option<PadSample>;
}

/// Normalized joystick geometry handed to the page callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickValues {
    /// Normalized x in `[-1, 1]`, rounded to two decimals.
    pub x: f32,
    /// Normalized y in `[-1, 1]`, positive up, rounded to two decimals.
    pub y: f32,
    /// Normalized knob distance from center, rounded to two decimals.
    pub distance: f32,
    /// Whole degrees counterclockwise from east.
    pub angle: f32,
    /// Raw knob offset in widget coordinates, y grows downward.
    pub raw: (f32, f32),
}

impl StickValues {
    /// Build the normalized reading from a knob offset.
    ///
    /// `dx`/`dy` are the offset from the stick center in widget coordinates
    /// (y down), `max_distance` the guide radius. The y axis flips here so
    /// that up means forward everywhere past the widget.
    pub fn from_offset(
        dx: f32,
        dy: f32,
        max_distance: f32,
    ) -> Self {
        let distance = libm::sqrtf(dx * dx + dy * dy);
        let degrees = libm::atan2f(-dy, dx) * 180.0 / core::f32::consts::PI;

        Self {
            x: round2(dx / max_distance),
            y: round2(-dy / max_distance),
            distance: round2(distance / max_distance),
            angle: libm::roundf((degrees + 360.0) % 360.0),
            raw: (dx, dy),
        }
    }
}

/// Round to two decimal places.
fn round2(value: f32) -> f32 {
    libm::roundf(value * 100.0) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_normalize_against_the_guide_radius() {
        let values = StickValues::from_offset(30.0, -40.0, 50.0);
        assert_eq!(values.x, 0.6);
        assert_eq!(values.y, 0.8);
        assert_eq!(values.distance, 1.0);
        assert_eq!(values.angle, 53.0);
        assert_eq!(values.raw, (30.0, -40.0));
    }

    #[test]
    fn test_downward_drag_reads_negative_y() {
        let values = StickValues::from_offset(0.0, 50.0, 50.0);
        assert_eq!(values.x, 0.0);
        assert_eq!(values.y, -1.0);
        assert_eq!(values.angle, 270.0);
    }

    #[test]
    fn test_values_round_to_two_decimals() {
        let values = StickValues::from_offset(33.3, 0.0, 100.0);
        assert_eq!(values.x, 0.33);
        assert_eq!(values.distance, 0.33);
        assert_eq!(values.angle, 0.0);
    }

    #[test]
    fn test_center_reads_as_zero() {
        let values = StickValues::from_offset(0.0, 0.0, 50.0);
        assert_eq!(values.x, 0.0);
        assert_eq!(values.y, 0.0);
        assert_eq!(values.distance, 0.0);
    }
}
