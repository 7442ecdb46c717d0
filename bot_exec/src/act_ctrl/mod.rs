//! # Actuator control module
//!
//! Actuator control turns mechanism targets into demands on the actuator collaborators. Each
//! physical actuator (lift, wrist, gripper) is wrapped in a [`Mechanism`], which presents the same
//! "move to this absolute value" contract whether the hardware holds the position itself or the
//! position is closed in software by a [`PidController`].
//!
//! The lift is the only closed loop mechanism. Under teleoperation its position loop runs here,
//! the PID output being applied to the motor as raw power. In autonomous the hardware's own
//! run-to-position mode is used instead.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod mechanism;
pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use mechanism::*;
pub use params::Params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while updating a mechanism.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MechError {
    #[error("Actuator fault: {0}")]
    Fault(#[from] bot_if::eqpt::mech::ActuatorFault),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Mechanism {0:?} has no closed loop controller")]
    NoController(bot_if::eqpt::mech::ActId),
}
