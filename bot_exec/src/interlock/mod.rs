//! # Wrist interlock module
//!
//! The wrist can only be flipped between the front and back of the robot when the lift is high
//! enough for the gripper to clear the chassis. The interlock owns every change of wrist side under
//! manual control. When a flip is requested with the lift too low it raises the lift to the safe
//! threshold, flips, waits for the servo to settle and then returns the lift to where it was.
//!
//! The operator always wins: any manual change of the lift target part way through a sequence
//! abandons the sequence and returns the interlock to `Normal`, without completing a flip which
//! has not yet happened.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The states of the interlock. `Normal` is both the initial and the only stable state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum InterlockState {
    Normal,
    Raising,
    Flipping,
    Lowering,
}

/// Possible errors that can occur during interlock operation.
#[derive(Debug, thiserror::Error)]
pub enum InterlockError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl Default for InterlockState {
    fn default() -> Self {
        InterlockState::Normal
    }
}
