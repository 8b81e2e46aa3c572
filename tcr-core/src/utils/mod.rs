//! Utility re-exports and helper macros for the Tank-Cam Rover.
//!
//! This module re-exports the pieces of the control pipeline and provides
//! helper macros and embedded web assets:
//!
//! - `connection`: WebSocket control endpoint and reconnecting link state
//! - `controllers`: PWM actuation for the drive motors and headlight
//! - `math`: tank-steering mix and stick geometry
//! - `session`: controller-side state, input sampling, gear selection
//! - `wire`: comma-delimited drive frame codec
//! - `frontend`: HTML/JS assets for the control page
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod connection;
pub mod controllers;
pub(crate) mod frontend;
pub mod math;
pub mod session;
pub mod wire;

pub use connection::server::run as wss;
pub use controllers::DriveController;
pub use embassy_time::*;
pub use session::ControllerSession;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
