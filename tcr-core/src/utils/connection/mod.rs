//! Module Exports
//!
//! This file exports the key modules used in the control link
//! implementation.
//!
//! # Modules
//! - `link`: Controller-side connect/reconnect state machine.
//! - `server`: Manages the WebSocket server, routes, and message handling.

/// Module for the controller-side link state machine.
pub mod link;

/// Module for managing the WebSocket server, including routes and connection
/// handling.
pub mod server;
