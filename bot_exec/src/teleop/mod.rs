//! # Teleoperation module
//!
//! Runs one teleoperated control cycle: operator inputs are turned into lift, wrist and gripper
//! targets and a drive command. Wrist flips go through the interlock, the lift height limits the
//! drive speed.
//!
//! The driver gamepad moves the base, the tool gamepad runs the mechanisms.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during teleoperation initialisation.
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}
