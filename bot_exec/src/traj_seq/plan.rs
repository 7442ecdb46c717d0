//! # Trajectory plans
//!
//! Building a plan walks the operations in order, keeping cursors for the pose at the end of the
//! plan so far, the number of steps, the planned time and the arc length. Segments advance all of
//! them, waits advance everything but the arc length.
//!
//! Temporal markers are bound to the step declared after them, so that they are timed from when
//! that step actually starts rather than from the planned profile. Displacement markers are bound
//! to an absolute arc length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use super::{BuildError, Params, TRIGGER_EPSILON};
use bot_if::{
    nav::{PathSegment, Pose, SegmentGeom},
    tc::Action,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A single operation in a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOp {
    /// Follow a path segment from the end of the previous one.
    Segment(PathSegment),

    /// Track the following segments driving backwards (or forwards again).
    SetReversed { reversed: bool },

    /// Fire an action `offset_s` after the next step starts, or after the final step ends if
    /// declared last.
    TemporalMarker {
        #[serde(default)]
        offset_s: f64,
        action: Action,
    },

    /// Fire an action once `distance_m` of arc length from the start of the plan has been
    /// travelled.
    DisplacementMarker { distance_m: f64, action: Action },

    /// Fire an action `offset_m` further along the path than the point it is declared at.
    DisplacementMarkerOffset { offset_m: f64, action: Action },

    /// Fire an action once the whole plan has completed.
    EndMarker { action: Action },

    /// Hold position for the given time.
    Wait { duration_s: f64 },
}

/// When a marker fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Trigger {
    /// Time after the actual start of step `step`. A `step` equal to the number of steps is the
    /// end of the final step.
    ElapsedTime { step: usize, offset_s: f64 },

    /// Absolute arc length from the start of the plan
    Displacement(f64),

    EndOfSequence,
}

/// An executable step of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Segment {
        geom: SegmentGeom,

        /// Planned time at which the segment starts
        start_time_s: f64,

        /// Planned duration from the velocity profile
        duration_s: f64,

        /// Arc length at which the segment starts
        start_displacement: f64,
    },
    Wait {
        start_time_s: f64,
        duration_s: f64,
    },
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scheduled action.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    index: usize,
    op_index: usize,
    trigger: Trigger,

    /// Time from the start of the plan the marker would fire at if the drive followed the
    /// planned profile, `None` for end of sequence markers
    planned_time_s: Option<f64>,

    action: Action,
}

/// A built, immutable plan.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPlan {
    start: Pose,
    end: Pose,
    steps: Vec<Step>,
    markers: Vec<Marker>,
    total_time_s: f64,
    total_displacement: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a plan starting at `start` from the given operations.
pub fn build(start: Pose, ops: &[PlanOp], params: &Params) -> Result<TrajectoryPlan, BuildError> {
    if !(params.max_vel_ms > 0.0) || !(params.max_accel_mss > 0.0) {
        return Err(BuildError::InvalidProfile {
            max_vel_ms: params.max_vel_ms,
            max_accel_mss: params.max_accel_mss,
        });
    }

    let mut pose = start;
    let mut reversed = false;
    let mut time_s = 0f64;
    let mut displacement = 0f64;

    let mut steps = Vec::new();
    let mut markers: Vec<Marker> = Vec::new();

    for (op_index, op) in ops.iter().enumerate() {
        let trigger = match op {
            PlanOp::Segment(segment) => {
                let geom = SegmentGeom::resolve(*segment, pose, reversed)
                    .map_err(|source| BuildError::DegenerateSegment { op_index, source })?;
                let duration_s = profile_duration(geom.length(), params);

                pose = geom.end();
                let length = geom.length();

                steps.push(Step::Segment {
                    geom,
                    start_time_s: time_s,
                    duration_s,
                    start_displacement: displacement,
                });

                time_s += duration_s;
                displacement += length;
                None
            }
            PlanOp::SetReversed { reversed: r } => {
                reversed = *r;
                None
            }
            PlanOp::Wait { duration_s } => {
                if !(*duration_s > 0.0) || !duration_s.is_finite() {
                    return Err(BuildError::InvalidWait {
                        op_index,
                        duration_s: *duration_s,
                    });
                }

                steps.push(Step::Wait {
                    start_time_s: time_s,
                    duration_s: *duration_s,
                });
                time_s += duration_s;
                None
            }
            PlanOp::TemporalMarker { offset_s, action } => {
                if !(*offset_s >= 0.0) || !offset_s.is_finite() {
                    return Err(BuildError::NegativeTimeOffset {
                        op_index,
                        offset_s: *offset_s,
                    });
                }
                let trigger = Trigger::ElapsedTime {
                    step: steps.len(),
                    offset_s: *offset_s,
                };
                Some((trigger, Some(time_s + offset_s), action))
            }
            PlanOp::DisplacementMarker { distance_m, action } => {
                if !(*distance_m >= 0.0) || !distance_m.is_finite() {
                    return Err(BuildError::NegativeDisplacement {
                        op_index,
                        distance_m: *distance_m,
                    });
                }
                Some((Trigger::Displacement(*distance_m), None, action))
            }
            PlanOp::DisplacementMarkerOffset { offset_m, action } => {
                if !(*offset_m >= 0.0) || !offset_m.is_finite() {
                    return Err(BuildError::NegativeDisplacement {
                        op_index,
                        distance_m: *offset_m,
                    });
                }
                Some((Trigger::Displacement(displacement + offset_m), None, action))
            }
            PlanOp::EndMarker { action } => Some((Trigger::EndOfSequence, None, action)),
        };

        if let Some((trigger, planned_time_s, action)) = trigger {
            markers.push(Marker {
                index: markers.len(),
                op_index,
                trigger,
                planned_time_s,
                action: action.clone(),
            });
        }
    }

    if !steps.iter().any(|s| matches!(s, Step::Segment { .. })) {
        return Err(BuildError::EmptyPlan);
    }

    // Displacement markers can only be checked once the full length is known
    for marker in markers.iter() {
        if let Trigger::Displacement(d) = marker.trigger {
            if d > displacement + TRIGGER_EPSILON {
                return Err(BuildError::MarkerBeyondPath {
                    op_index: marker.op_index,
                    distance_m: d,
                    length_m: displacement,
                });
            }
        }
    }

    debug!(
        "Built plan with {} steps and {} markers, {:.3} long, {:.3} s",
        steps.len(),
        markers.len(),
        displacement,
        time_s
    );

    Ok(TrajectoryPlan {
        start,
        end: pose,
        steps,
        markers,
        total_time_s: time_s,
        total_displacement: displacement,
    })
}

/// Duration of a symmetric trapezoidal velocity profile over the given length, starting and
/// ending at rest.
///
/// Short segments which never reach the maximum velocity use a triangular profile.
pub fn profile_duration(length: f64, params: &Params) -> f64 {
    let v = params.max_vel_ms;
    let a = params.max_accel_mss;

    if length >= v * v / a {
        length / v + v / a
    } else {
        2.0 * (length / a).sqrt()
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Marker {
    /// Position of this marker in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the operation which declared this marker.
    pub fn op_index(&self) -> usize {
        self.op_index
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Time from the start of the plan a temporal marker fires at if the drive keeps to the
    /// planned profile.
    pub fn planned_time_s(&self) -> Option<f64> {
        self.planned_time_s
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl TrajectoryPlan {
    pub fn start(&self) -> Pose {
        self.start
    }

    /// The pose at the end of the final segment.
    pub fn end(&self) -> Pose {
        self.end
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// All markers, in declaration order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Planned duration of all steps.
    pub fn total_time_s(&self) -> f64 {
        self.total_time_s
    }

    /// Arc length of all segments.
    pub fn total_displacement(&self) -> f64 {
        self.total_displacement
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use bot_if::{eqpt::mech::WristSide, nav::SegmentError, tc::MechCmd};

    pub(crate) fn params() -> Params {
        Params {
            max_vel_ms: 40.0,
            max_accel_mss: 40.0,
            end_pos_tolerance_m: 0.5,
            end_head_tolerance_rad: 0.05,
            end_settle_timeout_s: 0.5,
        }
    }

    fn line(x: f64, y: f64) -> PlanOp {
        PlanOp::Segment(PathSegment::Line {
            target: Pose::new(x, y, 0.0),
        })
    }

    fn lift(id: &str) -> Action {
        Action::new(
            id,
            MechCmd::Lift {
                target_ticks: 400.0,
            },
        )
    }

    #[test]
    fn test_profile_duration() {
        // Triangular: 10 < 40^2/40
        assert!((profile_duration(10.0, &params()) - 1.0).abs() < 1e-12);

        // Trapezoidal
        assert!((profile_duration(100.0, &params()) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_wait_offsets_time_not_displacement() {
        let ops = vec![
            line(10.0, 0.0),
            PlanOp::Wait { duration_s: 2.0 },
            PlanOp::TemporalMarker {
                offset_s: 0.5,
                action: lift("t"),
            },
            PlanOp::DisplacementMarkerOffset {
                offset_m: 0.0,
                action: lift("d"),
            },
            line(20.0, 0.0),
            PlanOp::EndMarker { action: lift("e") },
        ];

        let plan = build(Pose::new(0.0, 0.0, 0.0), &ops, &params()).unwrap();

        assert_eq!(plan.steps().len(), 3);
        assert_eq!(plan.markers().len(), 3);
        assert!((plan.total_displacement() - 20.0).abs() < 1e-12);
        assert!((plan.total_time_s() - 4.0).abs() < 1e-12);

        // Timed from the start of the second segment
        assert_eq!(
            plan.markers()[0].trigger(),
            Trigger::ElapsedTime {
                step: 2,
                offset_s: 0.5
            }
        );
        assert!((plan.markers()[0].planned_time_s().unwrap() - 3.5).abs() < 1e-12);
        match plan.markers()[1].trigger() {
            Trigger::Displacement(d) => assert!((d - 10.0).abs() < 1e-12),
            t => panic!("Unexpected trigger {:?}", t),
        }
        assert_eq!(plan.markers()[2].trigger(), Trigger::EndOfSequence);
        assert_eq!(plan.markers()[2].index(), 2);
        assert_eq!(plan.markers()[2].op_index(), 5);

        match &plan.steps()[2] {
            Step::Segment {
                start_time_s,
                start_displacement,
                ..
            } => {
                assert!((start_time_s - 3.0).abs() < 1e-12);
                assert!((start_displacement - 10.0).abs() < 1e-12);
            }
            s => panic!("Unexpected step {:?}", s),
        }
    }

    #[test]
    fn test_marker_beyond_path() {
        let start = Pose::new(0.0, 0.0, 0.0);

        let ops = vec![
            line(10.0, 0.0),
            PlanOp::DisplacementMarker {
                distance_m: 10.5,
                action: lift("late"),
            },
        ];
        assert_eq!(
            build(start, &ops, &params()),
            Err(BuildError::MarkerBeyondPath {
                op_index: 1,
                distance_m: 10.5,
                length_m: 10.0
            })
        );

        // 10 beyond the end of a 10 long path
        let ops = vec![
            line(10.0, 0.0),
            PlanOp::DisplacementMarkerOffset {
                offset_m: 10.0,
                action: lift("late"),
            },
        ];
        assert_eq!(
            build(start, &ops, &params()),
            Err(BuildError::MarkerBeyondPath {
                op_index: 1,
                distance_m: 20.0,
                length_m: 10.0
            })
        );

        // Exactly at the end is fine, wherever it is declared
        for ops in [
            vec![
                PlanOp::DisplacementMarker {
                    distance_m: 10.0,
                    action: lift("end"),
                },
                line(10.0, 0.0),
            ],
            vec![
                line(10.0, 0.0),
                PlanOp::DisplacementMarker {
                    distance_m: 10.0,
                    action: lift("end"),
                },
            ],
        ]
        .iter()
        {
            let plan = build(start, ops, &params()).unwrap();
            assert_eq!(plan.markers()[0].trigger(), Trigger::Displacement(10.0));
        }
    }

    #[test]
    fn test_displacement_absolute_and_offset() {
        let ops = vec![
            line(10.0, 0.0),
            PlanOp::DisplacementMarker {
                distance_m: 5.0,
                action: lift("abs"),
            },
            PlanOp::DisplacementMarkerOffset {
                offset_m: 5.0,
                action: lift("rel"),
            },
            line(30.0, 0.0),
        ];
        let plan = build(Pose::new(0.0, 0.0, 0.0), &ops, &params()).unwrap();

        assert_eq!(plan.markers()[0].trigger(), Trigger::Displacement(5.0));
        assert_eq!(plan.markers()[1].trigger(), Trigger::Displacement(15.0));
        assert_eq!(plan.markers()[0].planned_time_s(), None);
    }

    #[test]
    fn test_build_errors() {
        let start = Pose::new(0.0, 0.0, 0.0);

        assert_eq!(build(start, &[], &params()), Err(BuildError::EmptyPlan));
        assert_eq!(
            build(start, &[PlanOp::Wait { duration_s: 1.0 }], &params()),
            Err(BuildError::EmptyPlan)
        );

        assert_eq!(
            build(start, &[line(0.0, 0.0)], &params()),
            Err(BuildError::DegenerateSegment {
                op_index: 0,
                source: SegmentError::ZeroLengthLine
            })
        );

        let spline = PlanOp::Segment(PathSegment::SplineToPoint {
            target: nalgebra::Point2::new(10.0, 0.0),
            tangent_deg: 90.0,
        });
        assert_eq!(
            build(start, &[line(10.0, 0.0), spline], &params()),
            Err(BuildError::DegenerateSegment {
                op_index: 1,
                source: SegmentError::CoincidentSplineEndpoints
            })
        );

        assert!(matches!(
            build(
                start,
                &[
                    PlanOp::TemporalMarker {
                        offset_s: -0.1,
                        action: lift("a")
                    },
                    line(10.0, 0.0)
                ],
                &params()
            ),
            Err(BuildError::NegativeTimeOffset { op_index: 0, .. })
        ));

        assert!(matches!(
            build(
                start,
                &[
                    line(10.0, 0.0),
                    PlanOp::DisplacementMarker {
                        distance_m: -1.0,
                        action: lift("a")
                    },
                ],
                &params()
            ),
            Err(BuildError::NegativeDisplacement { op_index: 1, .. })
        ));

        assert!(matches!(
            build(
                start,
                &[line(10.0, 0.0), PlanOp::Wait { duration_s: 0.0 }],
                &params()
            ),
            Err(BuildError::InvalidWait { op_index: 1, .. })
        ));
    }

    #[test]
    fn test_reversed_segments() {
        let ops = vec![
            line(10.0, 0.0),
            PlanOp::SetReversed { reversed: true },
            PlanOp::Segment(PathSegment::SplineToPoint {
                target: nalgebra::Point2::new(0.0, 10.0),
                tangent_deg: 180.0,
            }),
        ];

        let plan = build(Pose::new(0.0, 0.0, 0.0), &ops, &params()).unwrap();
        match &plan.steps()[1] {
            Step::Segment { geom, .. } => assert!(geom.reversed()),
            s => panic!("Unexpected step {:?}", s),
        }
    }

    #[test]
    fn test_ops_from_toml() {
        #[derive(Deserialize)]
        struct Ops {
            ops: Vec<PlanOp>,
        }

        let ops: Ops = toml::from_str(
            r#"
            [[ops]]
            op = "temporal_marker"
            action = { id = "wrist_back", mech = "wrist", side = "back" }

            [[ops]]
            op = "segment"
            kind = "line"
            target = { x = 10.0, y = 0.0, heading_deg = 90.0 }

            [[ops]]
            op = "set_reversed"
            reversed = true

            [[ops]]
            op = "displacement_marker"
            distance_m = 2.5
            action = { id = "lift_stack", mech = "lift", target_ticks = 400.0 }

            [[ops]]
            op = "segment"
            kind = "spline_to_point"
            target = [0.0, 10.0]
            tangent_deg = 180.0

            [[ops]]
            op = "wait"
            duration_s = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(ops.ops.len(), 6);
        assert_eq!(
            ops.ops[0],
            PlanOp::TemporalMarker {
                offset_s: 0.0,
                action: Action::new(
                    "wrist_back",
                    MechCmd::Wrist {
                        side: WristSide::Back
                    }
                )
            }
        );
        assert_eq!(ops.ops[2], PlanOp::SetReversed { reversed: true });
        assert_eq!(ops.ops[5], PlanOp::Wait { duration_s: 0.5 });

        let plan = build(Pose::new(0.0, 0.0, 0.0), &ops.ops, &params()).unwrap();
        assert_eq!(plan.markers().len(), 2);
        assert_eq!(
            plan.markers()[0].trigger(),
            Trigger::ElapsedTime {
                step: 0,
                offset_s: 0.0
            }
        );
        assert_eq!(plan.markers()[1].trigger(), Trigger::Displacement(2.5));
    }
}
