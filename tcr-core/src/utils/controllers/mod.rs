//! Module Exports
//!
//! This file exports the actuation modules of the drive system.
//!
//! - `drive`: The four H-bridge PWM inputs that move the two tracks.
//! - `headlight`: The single PWM headlight output.

/// Module for the H-bridge motor outputs.
pub mod drive;
pub mod headlight;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::utils::wire::DriveFrame;
pub use drive::DriveOutputs;
pub use headlight::Headlight;

/// Channel used to hand decoded frames and halts to the actuation task.
pub static DRIVE_CHANNEL: embassy_sync::channel::Channel<CriticalSectionRawMutex, DriveCommand, 16> =
    embassy_sync::channel::Channel::new();

/// Commands consumed by the actuation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// Write a decoded frame to the motors and the headlight.
    Apply(DriveFrame),
    /// Zero every actuation channel.
    Halt,
}

/// Single owner of every PWM output on the vehicle.
///
/// All writes to the motors and the headlight funnel through this
/// controller's receive loop, so a halt can never interleave with a half
/// applied frame.
pub struct DriveController<P> {
    outputs: DriveOutputs<P>,
    headlight: Headlight<P>,
}

impl<P, E> DriveController<P>
where
    P: embedded_hal::pwm::SetDutyCycle<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(
        outputs: DriveOutputs<P>,
        headlight: Headlight<P>,
    ) -> Self {
        Self { outputs, headlight }
    }

    /// Execute one command against the hardware.
    ///
    /// `Halt` writes every channel even when one of them fails; the first
    /// error is reported after all five writes were attempted.
    pub fn execute(
        &mut self,
        command: DriveCommand,
    ) -> Result<(), E> {
        match command {
            DriveCommand::Apply(frame) => {
                self.outputs.apply(&frame)?;
                self.headlight.set_level(frame.light)
            }
            DriveCommand::Halt => {
                let motors = self.outputs.halt();
                let light = self.headlight.off();
                motors.and(light)
            }
        }
    }

    /// Receive-and-execute loop for the actuation task.
    pub async fn run(&mut self) -> ! {
        loop {
            let command = DRIVE_CHANNEL.receiver().receive().await;
            tracing::debug!("Received drive command: {:?}", command);
            if let Err(e) = self.execute(command) {
                tracing::error!("Drive command failed: {:?}", e);
            }
        }
    }
}
