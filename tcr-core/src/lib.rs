//! Core control pipeline for the Tank-Cam Rover on no-std embedded platforms.
//!
//! Turns controller input into tank-steering PWM magnitudes, carries them
//! over a comma-delimited wire protocol, and applies them to the H-bridge
//! and headlight outputs on the vehicle.
#![no_std]

extern crate alloc;

pub mod utils;
