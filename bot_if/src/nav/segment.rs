//! # Path segments
//!
//! A [`PathSegment`] is the description of a single path primitive as written in a routine. Once
//! the start of the segment is known (the end of the previous segment) it is resolved into a
//! [`SegmentGeom`], which provides the arc length of the segment and the pose of the robot at any
//! displacement along it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::PI;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::{ang_dist, Pose};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of samples used to integrate the arc length of a spline.
pub const SPLINE_SAMPLES: usize = 200;

/// Segments shorter than this are considered degenerate.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single path primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    /// Straight line to the target pose, heading interpolated linearly.
    Line { target: Pose },

    /// Spline to the target point, arriving with the given path tangent. The robot faces along
    /// the path.
    SplineToPoint {
        target: Point2<f64>,
        tangent_deg: f64,
    },

    /// Spline to the target pose, arriving with the given path tangent. The heading is
    /// interpolated linearly to the target heading.
    SplineToPose { target: Pose, tangent_deg: f64 },
}

/// Errors that occur while resolving a segment.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SegmentError {
    #[error("Line segment has zero length")]
    ZeroLengthLine,

    #[error("Spline segment start and end points coincide")]
    CoincidentSplineEndpoints,

    #[error("Segment geometry is not finite")]
    NonFinite,
}

/// Shape of a resolved segment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Line,

    /// Cubic Hermite spline between `p0` and `p1` with end derivatives `m0` and `m1`.
    Hermite {
        p0: Point2<f64>,
        p1: Point2<f64>,
        m0: Vector2<f64>,
        m1: Vector2<f64>,
    },
}

/// How the heading evolves along a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum HeadingMode {
    /// Linear interpolation from the start heading to the end heading.
    Linear,

    /// The robot faces the path tangent (reversed if following backwards).
    Tangent,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A segment whose start is known, and so whose geometry is fully determined.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGeom {
    segment: PathSegment,
    start: Pose,
    end: Pose,
    reversed: bool,
    shape: Shape,
    heading_mode: HeadingMode,
    length: f64,

    /// Cumulative arc length at each of the `SPLINE_SAMPLES + 1` parameter samples. Empty for
    /// lines.
    arc_table: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathSegment {
    /// The target position of the segment.
    pub fn target_position(&self) -> Point2<f64> {
        match self {
            PathSegment::Line { target } => target.position(),
            PathSegment::SplineToPoint { target, .. } => *target,
            PathSegment::SplineToPose { target, .. } => target.position(),
        }
    }

    /// Return a copy of this segment with the target translated by the given offset.
    pub fn translated(&self, offset: Vector2<f64>) -> Self {
        match *self {
            PathSegment::Line { target } => PathSegment::Line {
                target: Pose::from_position(target.position() + offset, target.heading_rad()),
            },
            PathSegment::SplineToPoint {
                target,
                tangent_deg,
            } => PathSegment::SplineToPoint {
                target: target + offset,
                tangent_deg,
            },
            PathSegment::SplineToPose {
                target,
                tangent_deg,
            } => PathSegment::SplineToPose {
                target: Pose::from_position(target.position() + offset, target.heading_rad()),
                tangent_deg,
            },
        }
    }
}

impl SegmentGeom {
    /// Resolve the segment starting from the given pose.
    ///
    /// When `reversed` is set the robot tracks the segment driving backwards, so the path leaves
    /// the start pose along the opposite of the start heading.
    pub fn resolve(segment: PathSegment, start: Pose, reversed: bool) -> Result<Self, SegmentError> {
        let start_tangent_rad = match reversed {
            true => start.heading_rad() + PI,
            false => start.heading_rad(),
        };

        let (shape, heading_mode, end) = match segment {
            PathSegment::Line { target } => {
                if start.distance_to(&target) < MIN_SEGMENT_LENGTH {
                    return Err(SegmentError::ZeroLengthLine);
                }
                (Shape::Line, HeadingMode::Linear, target)
            }
            PathSegment::SplineToPoint {
                target,
                tangent_deg,
            } => {
                let tangent_rad = tangent_deg.to_radians();
                let end_heading = match reversed {
                    true => tangent_rad + PI,
                    false => tangent_rad,
                };
                (
                    hermite(start.position(), start_tangent_rad, target, tangent_rad)?,
                    HeadingMode::Tangent,
                    Pose::from_position(target, end_heading),
                )
            }
            PathSegment::SplineToPose {
                target,
                tangent_deg,
            } => (
                hermite(
                    start.position(),
                    start_tangent_rad,
                    target.position(),
                    tangent_deg.to_radians(),
                )?,
                HeadingMode::Linear,
                target,
            ),
        };

        let mut geom = Self {
            segment,
            start,
            end,
            reversed,
            shape,
            heading_mode,
            length: 0.0,
            arc_table: Vec::new(),
        };

        match geom.shape {
            Shape::Line => geom.length = start.distance_to(&end),
            Shape::Hermite { .. } => {
                let mut table = Vec::with_capacity(SPLINE_SAMPLES + 1);
                table.push(0.0);
                let mut prev = geom.point_at_param(0.0);
                let mut acc = 0.0;
                for i in 1..=SPLINE_SAMPLES {
                    let point = geom.point_at_param(i as f64 / SPLINE_SAMPLES as f64);
                    acc += (point - prev).norm();
                    table.push(acc);
                    prev = point;
                }
                geom.length = acc;
                geom.arc_table = table;
            }
        }

        if !geom.length.is_finite() {
            return Err(SegmentError::NonFinite);
        }

        Ok(geom)
    }

    /// The segment this geometry was resolved from.
    pub fn segment(&self) -> &PathSegment {
        &self.segment
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    /// The pose of the robot at the end of the segment.
    pub fn end(&self) -> Pose {
        self.end
    }

    /// True if the segment is tracked driving backwards.
    pub fn reversed(&self) -> bool {
        self.reversed
    }

    /// Arc length of the segment.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The pose of the robot after travelling the given arc length along the segment.
    ///
    /// Displacements outside `[0, length]` are clamped.
    pub fn pose_at(&self, displacement: f64) -> Pose {
        let s = displacement.max(0.0).min(self.length);
        let t = self.param_at_length(s);
        let position = self.point_at_param(t);

        let heading_rad = match self.heading_mode {
            HeadingMode::Linear => {
                let frac = if self.length > 0.0 { s / self.length } else { 1.0 };
                self.start.heading_rad()
                    + frac * ang_dist(self.start.heading_rad(), self.end.heading_rad())
            }
            HeadingMode::Tangent => {
                let d = self.deriv_at_param(t);
                let tangent = d.y.atan2(d.x);
                match self.reversed {
                    true => tangent + PI,
                    false => tangent,
                }
            }
        };

        Pose::from_position(position, heading_rad)
    }

    /// Position on the segment at curve parameter `t` in [0, 1].
    fn point_at_param(&self, t: f64) -> Point2<f64> {
        match self.shape {
            Shape::Line => self.start.position() + (self.end.position() - self.start.position()) * t,
            Shape::Hermite { p0, p1, m0, m1 } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                Point2::from(p0.coords * h00 + m0 * h10 + p1.coords * h01 + m1 * h11)
            }
        }
    }

    /// Derivative of the position with respect to the curve parameter.
    fn deriv_at_param(&self, t: f64) -> Vector2<f64> {
        match self.shape {
            Shape::Line => self.end.position() - self.start.position(),
            Shape::Hermite { p0, p1, m0, m1 } => {
                let t2 = t * t;
                p0.coords * (6.0 * t2 - 6.0 * t)
                    + m0 * (3.0 * t2 - 4.0 * t + 1.0)
                    + p1.coords * (-6.0 * t2 + 6.0 * t)
                    + m1 * (3.0 * t2 - 2.0 * t)
            }
        }
    }

    /// Invert the arc length table to find the curve parameter for a displacement.
    fn param_at_length(&self, s: f64) -> f64 {
        if self.length <= 0.0 {
            return 1.0;
        }

        if self.arc_table.is_empty() {
            return s / self.length;
        }

        // First sample at or beyond s
        let idx = self.arc_table.partition_point(|l| *l < s);
        if idx == 0 {
            return 0.0;
        }
        if idx > SPLINE_SAMPLES {
            return 1.0;
        }

        let l0 = self.arc_table[idx - 1];
        let l1 = self.arc_table[idx];
        let frac = if l1 > l0 { (s - l0) / (l1 - l0) } else { 0.0 };

        ((idx - 1) as f64 + frac) / SPLINE_SAMPLES as f64
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the Hermite shape between two points with the given end tangent directions.
///
/// The magnitude of both end derivatives is the chord length between the points.
fn hermite(
    p0: Point2<f64>,
    tangent0_rad: f64,
    p1: Point2<f64>,
    tangent1_rad: f64,
) -> Result<Shape, SegmentError> {
    let chord = (p1 - p0).norm();

    if !chord.is_finite() {
        return Err(SegmentError::NonFinite);
    }
    if chord < MIN_SEGMENT_LENGTH {
        return Err(SegmentError::CoincidentSplineEndpoints);
    }

    Ok(Shape::Hermite {
        p0,
        p1,
        m0: Vector2::new(tangent0_rad.cos(), tangent0_rad.sin()) * chord,
        m1: Vector2::new(tangent1_rad.cos(), tangent1_rad.sin()) * chord,
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
