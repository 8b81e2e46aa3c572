//! Controller session: stick samples in, wire lines out.
//!
//! One [`ControllerSession`] per driving surface owns the gear selector, the
//! send gate, and the link state machine. `tick` is the gamepad path, gear
//! buttons plus stick every poll; `steer` is the joystick path, movement
//! callbacks only. Both paths share the send gate, so no surface can flood
//! the wire.

pub mod input;

use alloc::string::String;

use crate::utils::connection::link::ControlLink;
use crate::utils::math::steering::{tank_mix, GEAR_STEPS};
use crate::utils::wire::DriveFrame;
pub use input::{InputSource, PadSample, StickValues};

/// Minimum spacing between transmitted frames. Samples inside the window are
/// dropped, not queued.
pub const SEND_INTERVAL_MS: u64 = 100;

/// Gear shifts closer together than this are ignored.
pub const GEAR_DEBOUNCE_MS: u64 = 500;

/// Four-step gear selector with a shared shift debounce.
#[derive(Debug, Clone, Copy)]
pub struct GearSelector {
    gear: u8,
    last_shift_ms: Option<u64>,
}

impl GearSelector {
    /// Starts in top gear.
    pub fn new() -> Self {
        Self {
            gear: GEAR_STEPS,
            last_shift_ms: None,
        }
    }

    pub fn gear(&self) -> u8 {
        self.gear
    }

    /// Apply one poll's worth of shoulder-button state.
    ///
    /// Both buttons held cancel each other out. The debounce stamp moves
    /// only when the gear actually changes, so holding one button walks one
    /// step per debounce window instead of locking the selector.
    pub fn shift(
        &mut self,
        up: bool,
        down: bool,
        now_ms: u64,
    ) {
        if up == down {
            return;
        }
        if let Some(last) = self.last_shift_ms {
            if now_ms.saturating_sub(last) <= GEAR_DEBOUNCE_MS {
                return;
            }
        }

        if down && self.gear > 1 {
            self.gear -= 1;
            self.last_shift_ms = Some(now_ms);
            tracing::debug!("Gear down to {}", self.gear);
        } else if up && self.gear < GEAR_STEPS {
            self.gear += 1;
            self.last_shift_ms = Some(now_ms);
            tracing::debug!("Gear up to {}", self.gear);
        }
    }
}

/// Per-driver state that an input task owns.
#[derive(Debug)]
pub struct ControllerSession {
    pub gear: GearSelector,
    pub link: ControlLink,
    last_sent_ms: Option<u64>,
}

impl ControllerSession {
    pub fn new() -> Self {
        Self {
            gear: GearSelector::new(),
            link: ControlLink::new(),
            last_sent_ms: None,
        }
    }

    /// Joystick path: turn one stick reading into a wire line.
    ///
    /// Returns `None` inside the send window; the reading is dropped, not
    /// deferred. The emitted frame carries `now_ms` as its timestamp and the
    /// light trigger scaled to a `0..=255` byte.
    pub fn steer(
        &mut self,
        x: f32,
        y: f32,
        light: Option<f32>,
        now_ms: u64,
    ) -> Option<String> {
        if let Some(last) = self.last_sent_ms {
            if now_ms.saturating_sub(last) < SEND_INTERVAL_MS {
                return None;
            }
        }
        self.last_sent_ms = Some(now_ms);

        let mix = tank_mix(x, y, self.gear.gear());
        let light = (light.unwrap_or(0.0) * 255.0) as u8;

        Some(DriveFrame::from_mix(now_ms, &mix, light).encode())
    }

    /// Gamepad path: gear buttons first, then the stick, every poll.
    pub fn tick(
        &mut self,
        sample: &PadSample,
        now_ms: u64,
    ) -> Option<String> {
        self.gear.shift(sample.gear_up, sample.gear_down, now_ms);
        self.steer(sample.x, sample.y, sample.light, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_gate_drops_frames_inside_the_window() {
        let mut session = ControllerSession::new();
        assert!(session.steer(0.0, 1.0, None, 1_000).is_some());
        assert!(session.steer(0.0, 1.0, None, 1_050).is_none());
        assert!(session.steer(0.0, 1.0, None, 1_099).is_none());
        assert!(session.steer(0.0, 1.0, None, 1_100).is_some());
    }

    #[test]
    fn test_first_frame_always_passes_the_gate() {
        let mut session = ControllerSession::new();
        assert!(session.steer(0.0, 0.0, None, 0).is_some());
    }

    #[test]
    fn test_steer_emits_the_wire_line() {
        let mut session = ControllerSession::new();
        let line = session.steer(1.0, 0.0, None, 5_000).unwrap();
        assert_eq!(line, "5000,0,255,255,0,0");
    }

    #[test]
    fn test_light_trigger_scales_to_a_byte() {
        let mut session = ControllerSession::new();
        let line = session.steer(0.0, 0.0, Some(0.5), 1_000).unwrap();
        assert_eq!(line, "1000,0,0,0,0,127");

        let mut session = ControllerSession::new();
        let line = session.steer(0.0, 0.0, Some(1.0), 1_000).unwrap();
        assert_eq!(line, "1000,0,0,0,0,255");
    }

    #[test]
    fn test_missing_light_reads_as_dark() {
        let mut session = ControllerSession::new();
        let line = session.steer(0.0, 0.0, None, 1_000).unwrap();
        assert!(line.ends_with(",0"));
    }

    #[test]
    fn test_gear_walks_one_step_per_debounce_window() {
        let mut gear = GearSelector::new();
        assert_eq!(gear.gear(), 4);

        gear.shift(false, true, 600);
        assert_eq!(gear.gear(), 3);
        gear.shift(false, true, 900);
        assert_eq!(gear.gear(), 3);
        gear.shift(false, true, 1_101);
        assert_eq!(gear.gear(), 2);
    }

    #[test]
    fn test_first_shift_always_passes_the_debounce() {
        // A fresh selector has no shift to debounce against, so a press in
        // the first half second of uptime must land.
        let mut gear = GearSelector::new();
        gear.shift(false, true, 10);
        assert_eq!(gear.gear(), 3);

        gear.shift(false, true, 400);
        assert_eq!(gear.gear(), 3);
    }

    #[test]
    fn test_gear_clamps_without_burning_the_debounce() {
        let mut gear = GearSelector::new();
        gear.shift(true, false, 600);
        assert_eq!(gear.gear(), 4);

        // The failed upshift must not stamp the debounce clock.
        gear.shift(false, true, 601);
        assert_eq!(gear.gear(), 3);
    }

    #[test]
    fn test_both_buttons_cancel() {
        let mut gear = GearSelector::new();
        gear.shift(true, true, 600);
        assert_eq!(gear.gear(), 4);
        gear.shift(false, false, 1_200);
        assert_eq!(gear.gear(), 4);
    }

    #[test]
    fn test_gear_floor_and_ceiling() {
        let mut gear = GearSelector::new();
        let mut now = 600;
        for _ in 0..10 {
            gear.shift(false, true, now);
            now += 600;
        }
        assert_eq!(gear.gear(), 1);

        for _ in 0..10 {
            gear.shift(true, false, now);
            now += 600;
        }
        assert_eq!(gear.gear(), 4);
    }

    #[test]
    fn test_lower_gear_scales_the_emitted_frame() {
        let mut session = ControllerSession::new();
        for shift_at in [600, 1_200, 1_800] {
            session.gear.shift(false, true, shift_at);
        }
        assert_eq!(session.gear.gear(), 1);

        let line = session.steer(0.0, 1.0, None, 2_000).unwrap();
        assert_eq!(line, "2000,168,0,168,0,0");
    }

    #[test]
    fn test_tick_shifts_then_steers() {
        let mut session = ControllerSession::new();
        let sample = PadSample {
            x: 0.0,
            y: 1.0,
            light: None,
            gear_down: true,
            gear_up: false,
        };
        let line = session.tick(&sample, 600).unwrap();
        assert_eq!(session.gear.gear(), 3);
        assert_eq!(line, "600,226,0,226,0,0");
    }
}
