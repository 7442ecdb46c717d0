//! # Bot interface crate.
//!
//! Provides the data types shared between the coordination engine and its collaborators, along
//! with the traits those collaborators (drive base, actuators, gamepads, telemetry) implement.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Planar navigation types - poses and path segment geometry
pub mod nav;

/// Equipment interfaces - actuators and the drive base
pub mod eqpt;

/// Operator commands - gamepad input and scheduled mechanism actions
pub mod tc;

/// Telemetry sink
pub mod tm;
