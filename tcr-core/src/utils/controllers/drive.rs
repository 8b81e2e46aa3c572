//! H-bridge motor outputs for the two tracks.
//!
//! Each track has a forward and a backward PWM input. Duty magnitudes arrive
//! pre-quantized from the steering mix, so they are written through
//! unchanged; the channels are expected to run 8-bit duty (max duty 255),
//! matching the wire range.

use embedded_hal::pwm::SetDutyCycle;

use crate::utils::wire::DriveFrame;

/// The four motor PWM channels, one per H-bridge input.
pub struct DriveOutputs<P> {
    left_forward: P,
    left_backward: P,
    right_forward: P,
    right_backward: P,
}

impl<P, E> DriveOutputs<P>
where
    P: SetDutyCycle<Error = E>,
{
    pub fn new(
        left_forward: P,
        left_backward: P,
        right_forward: P,
        right_backward: P,
    ) -> Self {
        Self {
            left_forward,
            left_backward,
            right_forward,
            right_backward,
        }
    }

    /// Write the four motor magnitudes of a frame through to the bridge.
    ///
    /// Values are not range-checked here; whatever the frame carries is what
    /// the PWM driver sees.
    pub fn apply(
        &mut self,
        frame: &DriveFrame,
    ) -> Result<(), E> {
        self.left_forward.set_duty_cycle(frame.left_forward)?;
        self.left_backward.set_duty_cycle(frame.left_backward)?;
        self.right_forward.set_duty_cycle(frame.right_forward)?;
        self.right_backward.set_duty_cycle(frame.right_backward)?;
        Ok(())
    }

    /// Zero all four channels, attempting every write even after a failure.
    /// The first error wins once all four are done.
    pub fn halt(&mut self) -> Result<(), E> {
        let lf = self.left_forward.set_duty_cycle_fully_off();
        let lb = self.left_backward.set_duty_cycle_fully_off();
        let rf = self.right_forward.set_duty_cycle_fully_off();
        let rb = self.right_backward.set_duty_cycle_fully_off();
        lf.and(lb).and(rf).and(rb)
    }
}
