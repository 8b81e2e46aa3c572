//! PWM headlight output.
//!
//! Driven with the wire's raw `0..=255` intensity on an 8-bit duty channel.

use embedded_hal::pwm::SetDutyCycle;

/// Single-channel headlight.
pub struct Headlight<P> {
    channel: P,
}

impl<P, E> Headlight<P>
where
    P: SetDutyCycle<Error = E>,
{
    pub fn new(channel: P) -> Self {
        Self { channel }
    }

    /// Set the raw duty magnitude.
    pub fn set_level(
        &mut self,
        level: u16,
    ) -> Result<(), E> {
        self.channel.set_duty_cycle(level)
    }

    /// Dark.
    pub fn off(&mut self) -> Result<(), E> {
        self.channel.set_duty_cycle_fully_off()
    }
}
