//! # Navigation types
//!
//! All navigation quantities are expressed in the field frame, a planar frame shared by the drive
//! base and the trajectory sequencer. Positions are in field units (the same units the drive
//! collaborator reports), headings in radians.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod segment;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::{PI, TAU};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

pub use segment::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose (position and heading) of the robot in the field frame.
///
/// The heading is always normalised to the range (-pi, pi]. A pose cannot be modified once it has
/// been constructed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PoseDef", into = "PoseDef")]
pub struct Pose {
    x: f64,
    y: f64,
    heading_rad: f64,
}

/// Human-editable representation of a pose, used in parameter and routine files.
///
/// Headings are given in degrees here since that is how routines are written down.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
struct PoseDef {
    x: f64,
    y: f64,
    #[serde(default)]
    heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Create a new pose, normalising the heading into (-pi, pi].
    pub fn new(x: f64, y: f64, heading_rad: f64) -> Self {
        Self {
            x,
            y,
            heading_rad: wrap_pi(heading_rad),
        }
    }

    /// Create a new pose from a position vector and a heading.
    pub fn from_position(position: Point2<f64>, heading_rad: f64) -> Self {
        Self::new(position.x, position.y, heading_rad)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Heading in radians, in the range (-pi, pi].
    pub fn heading_rad(&self) -> f64 {
        self.heading_rad
    }

    /// The position of the pose as a point.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Euclidian distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (other.position() - self.position()).norm()
    }

    /// Absolute shortest angular distance between the headings of two poses.
    pub fn heading_error_to(&self, other: &Pose) -> f64 {
        ang_dist(self.heading_rad, other.heading_rad).abs()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl From<PoseDef> for Pose {
    fn from(def: PoseDef) -> Self {
        Pose::new(def.x, def.y, def.heading_deg.to_radians())
    }
}

impl From<Pose> for PoseDef {
    fn from(pose: Pose) -> Self {
        PoseDef {
            x: pose.x,
            y: pose.y,
            heading_deg: pose.heading_rad.to_degrees(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi(angle_rad: f64) -> f64 {
    let wrapped = (angle_rad + PI).rem_euclid(TAU) - PI;

    // rem_euclid maps onto [-pi, pi), so the lower bound must be moved to the upper
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Signed shortest angular distance from `a` to `b`, in the range (-pi, pi].
pub fn ang_dist(a: f64, b: f64) -> f64 {
    wrap_pi(b - a)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
