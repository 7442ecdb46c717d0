//! Autonomous routine definitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Deserialize;

// Internal
use super::AutoError;
use crate::traj_seq::PlanOp;
use bot_if::nav::Pose;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A routine, as written in a routine file.
#[derive(Debug, Clone, Deserialize)]
pub struct Routine {
    pub name: String,

    /// Pose the robot is placed at before the match
    pub start: Pose,

    /// Offset of the park target per unit of park zone
    #[serde(default)]
    pub park_shift: [f64; 2],

    /// Indices of the segment operations whose targets move with the park zone
    #[serde(default)]
    pub park_ops: Vec<usize>,

    pub ops: Vec<PlanOp>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Routine {
    /// Load a routine file from the `routines` parameter directory.
    pub fn load(file_name: &str) -> Result<Self, AutoError> {
        params::load(&format!("routines/{}", file_name)).map_err(AutoError::Load)
    }

    /// The routine's operations with the park segments moved to the given park zone.
    pub fn plan_ops(&self, park_zone: f64) -> Result<Vec<PlanOp>, AutoError> {
        let offset = Vector2::new(self.park_shift[0], self.park_shift[1]) * park_zone;
        let mut ops = self.ops.clone();

        for &i in self.park_ops.iter() {
            match ops.get_mut(i) {
                Some(PlanOp::Segment(segment)) => *segment = segment.translated(offset),
                _ => return Err(AutoError::ParkOpNotSegment(i)),
            }
        }

        Ok(ops)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::traj_seq::{self, Step, Trigger};

    pub(crate) fn shipped_routine() -> Routine {
        params::load_str(include_str!("../../../params/routines/c2_d3_left.toml")).unwrap()
    }

    fn traj_params() -> traj_seq::Params {
        params::load_str(include_str!("../../../params/traj_seq.toml")).unwrap()
    }

    #[test]
    fn test_shipped_routine_builds() {
        let routine = shipped_routine();
        assert_eq!(routine.park_ops, vec![44]);
        assert!(matches!(routine.ops[44], PlanOp::Segment(_)));

        let plan = traj_seq::build(routine.start, &routine.plan_ops(0.0).unwrap(), &traj_params())
            .unwrap();

        assert!(plan.start().distance_to(&Pose::new(-41.25, -64.0, 90f64.to_radians())) < 1e-9);
        assert!(plan.end().distance_to(&Pose::new(-36.0, -12.0, 90f64.to_radians())) < 1e-9);
        assert_eq!(
            plan.markers()
                .iter()
                .filter(|m| m.trigger() == Trigger::EndOfSequence)
                .count(),
            1
        );
        assert!(plan
            .markers()
            .iter()
            .all(|m| match m.trigger() {
                Trigger::Displacement(d) => d <= plan.total_displacement(),
                _ => true,
            }));
    }

    #[test]
    fn test_park_zone_shift() {
        let routine = shipped_routine();
        let ops = routine.plan_ops(24.0).unwrap();

        match &ops[44] {
            PlanOp::Segment(s) => {
                assert!((s.target_position().x - -60.0).abs() < 1e-9);
                assert!((s.target_position().y - -12.0).abs() < 1e-9);
            }
            op => panic!("Expected a segment, got {:?}", op),
        }

        // Nothing else moves
        assert_eq!(ops[..44], routine.ops[..44]);

        let plan = traj_seq::build(routine.start, &ops, &traj_params()).unwrap();
        let last = plan
            .steps()
            .iter()
            .rev()
            .find_map(|s| match s {
                Step::Segment { geom, .. } => Some(geom.end()),
                _ => None,
            })
            .unwrap();
        assert!((last.x() - -60.0).abs() < 1e-9);
    }

    #[test]
    fn test_park_op_not_segment() {
        let mut routine = shipped_routine();
        routine.park_ops = vec![0];
        assert!(matches!(
            routine.plan_ops(1.0),
            Err(AutoError::ParkOpNotSegment(0))
        ));

        routine.park_ops = vec![500];
        assert!(matches!(
            routine.plan_ops(1.0),
            Err(AutoError::ParkOpNotSegment(500))
        ));
    }
}
