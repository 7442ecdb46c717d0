//! # Drive Equipment Interface
//!
//! The drive collaborator owns the holonomic base: its kinematics, its pose estimate and the path
//! follower used to track individual segments. The engine only tells it which segment to follow
//! and reads back how far along it the base is.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::nav::{Pose, SegmentGeom};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A teleoperated drive command.
///
/// All components are normalised to [-1, 1] before the speed cap is applied by the drive.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCmd {
    /// Sideways (positive left) demand.
    pub strafe: f64,

    /// Forward demand.
    pub forward: f64,

    /// Turn (positive anticlockwise) demand.
    pub turn: f64,

    /// Maximum magnitude of any wheel power.
    pub max_power: f64,

    /// If set the strafe and forward demands are relative to the field, and this is the heading
    /// of the robot in the field frame.
    pub field_heading_rad: Option<f64>,
}

/// Progress of the drive along the segment it is currently following.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SegmentProgress {
    /// Time since the segment was started.
    pub elapsed_s: f64,

    /// Arc length travelled since the segment was started.
    pub displacement: f64,

    /// True once the follower considers the segment complete.
    pub finished: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by the drive collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error("The drive is not following a segment")]
    NoActiveSegment,

    #[error("Drive hardware error: {0}")]
    Hardware(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The drive base collaborator.
pub trait Drive {
    /// Overwrite the drive's pose estimate.
    fn set_pose(&mut self, pose: Pose);

    /// The drive's current pose estimate.
    fn get_pose(&self) -> Pose;

    /// Begin following the given segment. Any previous segment is abandoned.
    fn follow_path(&mut self, segment: &SegmentGeom) -> Result<(), DriveError>;

    /// Advance the follower by `dt_s` and report progress along the current segment.
    fn progress(&mut self, dt_s: f64) -> Result<SegmentProgress, DriveError>;

    /// Issue a direct (teleoperated) drive command.
    fn drive(&mut self, cmd: &DriveCmd) -> Result<(), DriveError>;
}
