//! # Autonomous module
//!
//! Drives a routine loaded from `params/routines/` through the trajectory sequencer, routing the
//! routine's scheduled actions to the mechanisms. The lift is held by the motor's own position
//! control for the whole of the autonomous period.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod routine;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::{
    act_ctrl::MechError,
    traj_seq::{BuildError, TrajSeqError},
};
pub use routine::Routine;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when preparing or starting a routine.
#[derive(Debug, thiserror::Error)]
pub enum AutoError {
    #[error("Could not load the routine: {0}")]
    Load(util::params::LoadError),

    #[error("Could not build the routine's plan: {0}")]
    Build(#[from] BuildError),

    #[error("Park operation {0} is not a path segment")]
    ParkOpNotSegment(usize),

    #[error("Could not start the plan: {0}")]
    Sequencer(#[from] TrajSeqError),

    #[error("Could not prepare the mechanisms: {0}")]
    Mech(#[from] MechError),
}
