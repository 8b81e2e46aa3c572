//! Tank-steering mix for the two-track drive.
//!
//! Stick position comes in as `x`/`y` in `[-1, 1]`; the mix produces one PWM
//! magnitude per H-bridge input. Each track gets `y + x` or `y - x`, clamped
//! and quantized into the motors' usable band: duties at or below
//! [`PWM_THRESHOLD`] do not overcome drivetrain friction on this chassis, so
//! live outputs start just above it and everything weaker collapses to 0.
//!
//! # Example
//!
//! ```rust
//! use tcr_core::utils::math::steering::tank_mix;
//!
//! let mix = tank_mix(0.0, 1.0, 4);
//! assert_eq!(mix.left_forward, 255);
//! assert_eq!(mix.right_forward, 255);
//! assert_eq!(mix.left_backward, 0);
//! ```

use libm;

/// Highest duty that still stalls the motors. Quantized outputs sit above
/// this value or at 0, never inside `1..=PWM_THRESHOLD`.
pub const PWM_THRESHOLD: u8 = 140;

/// Number of gear steps; gear `g` scales stick input by `g / GEAR_STEPS`.
pub const GEAR_STEPS: u8 = 4;

/// Usable duty span above the threshold.
const PWM_SPAN: f32 = (255 - PWM_THRESHOLD) as f32;

/// One PWM magnitude per H-bridge input, ready for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorMix {
    pub left_forward: u8,
    pub left_backward: u8,
    pub right_forward: u8,
    pub right_backward: u8,
}

/// Mix a stick position into per-track PWM magnitudes.
///
/// `x` steers, `y` drives. `gear` in `[1, GEAR_STEPS]` scales both axes by
/// `gear / GEAR_STEPS` before mixing, and each track sum is clamped to
/// `[-1, 1]` before quantization.
///
/// The computed left-track pair lands on the right-motor fields and vice
/// versa: the H-bridge outputs on this chassis are cross-wired, and the swap
/// lives here rather than in the loom.
pub fn tank_mix(
    x: f32,
    y: f32,
    gear: u8,
) -> MotorMix {
    let ratio = gear as f32 / GEAR_STEPS as f32;
    let x = x * ratio;
    let y = y * ratio;

    let left = (y + x).clamp(-1.0, 1.0);
    let right = (y - x).clamp(-1.0, 1.0);

    let (left_fwd, left_back) = quantize(left);
    let (right_fwd, right_back) = quantize(right);

    MotorMix {
        left_forward: fold_idle(right_fwd),
        left_backward: fold_idle(right_back),
        right_forward: fold_idle(left_fwd),
        right_backward: fold_idle(left_back),
    }
}

/// Quantize one track's signed speed into a (forward, backward) duty pair.
///
/// The driven direction gets `PWM_THRESHOLD + floor(|speed| * span)`; the
/// other stays 0. Zero speed takes the backward branch and yields exactly
/// `PWM_THRESHOLD`, which [`fold_idle`] then collapses to a stop.
fn quantize(speed: f32) -> (u8, u8) {
    let duty = (PWM_THRESHOLD as f32 + libm::floorf(speed.abs() * PWM_SPAN)) as u8;
    if speed > 0.0 {
        (duty, 0)
    } else {
        (0, duty)
    }
}

/// Collapse duties inside the stall band to a full stop.
fn fold_idle(duty: u8) -> u8 {
    if duty <= PWM_THRESHOLD {
        0
    } else {
        duty
    }
}
