//! Math utilities for the Tank-Cam Rover.
//!
//! This module provides the tank-steering mix and the circular stick bound.

pub mod circle;
pub mod steering;
