//! # Trajectory sequencer module
//!
//! The trajectory sequencer turns a routine, an ordered list of [`PlanOp`]s, into an immutable
//! [`TrajectoryPlan`] and then executes that plan on the drive collaborator, one call to
//! [`TrajSeq::proc`] per control cycle.
//!
//! A plan is made of steps (path segments and waits) and markers. A marker binds an [`Action`] to
//! a trigger:
//!
//! - `ElapsedTime` - an offset from the moment the step declared after the marker actually
//!   starts. Markers declared before the first step are timed from the start of the plan, those
//!   declared after the last step from the end of the final step.
//! - `Displacement` - an absolute arc length from the start of the plan. It is either given
//!   directly, or as an offset from the arc length at the point the marker is declared. Waits add
//!   time but no displacement.
//! - `EndOfSequence` - fired once the whole plan has completed at the final pose.
//!
//! During execution two monotonic cursors are kept, the elapsed time and the cumulative
//! displacement reported by the drive. Segments finish on the drive's progress, not on the
//! planned profile, so the planned times are only used for reporting. Every marker whose trigger has been crossed fires in the
//! cycle it was crossed, exactly once. Where several fall due in the same cycle temporal markers
//! fire before displacement markers, each class in declaration order.
//!
//! [`Action`]: bot_if::tc::Action

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod plan;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use plan::*;
pub use state::*;

use bot_if::{
    eqpt::{drive::DriveError, mech::ActuatorFault},
    nav::SegmentError,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when comparing cursors against marker triggers.
pub const TRIGGER_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which make a list of operations unbuildable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("The plan contains no path segments")]
    EmptyPlan,

    #[error("Operation {op_index} has degenerate geometry: {source}")]
    DegenerateSegment {
        op_index: usize,
        source: SegmentError,
    },

    #[error("Operation {op_index} has a negative time offset ({offset_s} s)")]
    NegativeTimeOffset { op_index: usize, offset_s: f64 },

    #[error("Operation {op_index} has a negative displacement ({distance_m})")]
    NegativeDisplacement { op_index: usize, distance_m: f64 },

    #[error("Operation {op_index} waits for a non-positive duration ({duration_s} s)")]
    InvalidWait { op_index: usize, duration_s: f64 },

    #[error(
        "Marker at operation {op_index} is bound to displacement {distance_m}, beyond the end of \
        the path at {length_m}"
    )]
    MarkerBeyondPath {
        op_index: usize,
        distance_m: f64,
        length_m: f64,
    },

    #[error("Invalid velocity profile: max velocity {max_vel_ms}, max acceleration {max_accel_mss}")]
    InvalidProfile { max_vel_ms: f64, max_accel_mss: f64 },
}

/// Possible errors that can occur during execution of a plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajSeqError {
    /// A plan is already executing. To replace it the current one must be cancelled and
    /// processed out first.
    #[error("Attempted to begin a plan while one is already executing")]
    SequenceAlreadyLoaded,

    #[error("Invalid cycle time: {0} s")]
    InvalidDt(f64),

    #[error("Drive error: {0}")]
    Drive(#[from] DriveError),
}

/// Errors returned by an action sink when dispatching an action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Actuator fault: {0}")]
    Fault(#[from] ActuatorFault),

    #[error("Action rejected: {0}")]
    Rejected(String),
}
