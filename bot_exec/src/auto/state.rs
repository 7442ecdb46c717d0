//! Implementations for the autonomous control cycle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use super::{AutoError, Routine};
use crate::{
    act_ctrl::{ControlMode, MechError},
    robot_state::{Collaborators, CycleFault, MechIo, RobotState},
    traj_seq::{self, ActionError, ActionSink, ExecStatus, TrajSeq, TrajectoryPlan},
};
use bot_if::tc::{Action, MechCmd};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Autonomous control.
pub struct AutoCtrl {
    /// Name of the routine being run
    name: String,

    /// The plan built from the routine
    plan: TrajectoryPlan,

    traj_seq: TrajSeq,
}

/// Report on a single autonomous cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub status: ExecStatus,

    /// The sequencer's report for this cycle
    pub seq: traj_seq::StatusReport,

    /// Faults which occured during the cycle
    pub faults: Vec<CycleFault>,
}

/// Routes marker actions to the mechanisms.
struct MechActionSink<'s, 'a> {
    state: &'s mut RobotState,
    mechs: &'s mut MechIo<'a>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AutoCtrl {
    /// Build the plan for a routine.
    ///
    /// `park_zone` moves the routine's park segments, see [`Routine::plan_ops`].
    pub fn init(
        routine: &Routine,
        park_zone: f64,
        traj_params: traj_seq::Params,
    ) -> Result<Self, AutoError> {
        let ops = routine.plan_ops(park_zone)?;
        let plan = traj_seq::build(routine.start, &ops, &traj_params)?;

        info!(
            "Routine \"{}\" built for park zone {}: {} steps, {} markers, {:.2} s, {:.1} long",
            routine.name,
            park_zone,
            plan.steps().len(),
            plan.markers().len(),
            plan.total_time_s(),
            plan.total_displacement()
        );

        Ok(Self {
            name: routine.name.clone(),
            plan,
            traj_seq: TrajSeq::new(traj_params),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan(&self) -> &TrajectoryPlan {
        &self.plan
    }

    /// The current execution status.
    pub fn status(&self) -> ExecStatus {
        self.traj_seq.mode()
    }

    /// Start the routine.
    ///
    /// Switches the lift to position control and resets the drive's pose to the start of the
    /// routine. Execution begins on the next cycle.
    pub fn start(&mut self, state: &mut RobotState, io: &mut Collaborators) -> Result<(), AutoError> {
        state.lift.set_mode(ControlMode::Position)?;
        self.traj_seq.begin(self.plan.clone(), &mut *io.drive)?;

        info!("Routine \"{}\" started", self.name);
        Ok(())
    }

    /// Request cancellation. Takes effect at the start of the next cycle.
    pub fn cancel(&mut self) {
        self.traj_seq.cancel();
    }

    /// Run one autonomous cycle.
    ///
    /// `cancel` stops the routine before any further marker fires. Mechanisms keep their current
    /// targets once the routine has stopped.
    pub fn cycle(
        &mut self,
        state: &mut RobotState,
        io: &mut Collaborators,
        dt_s: f64,
        cancel: bool,
    ) -> CycleReport {
        let mut faults = Vec::new();

        state.begin_cycle(dt_s);

        faults.extend(state.sense(&mut io.mechs));

        let status = {
            let mut sink = MechActionSink {
                state: &mut *state,
                mechs: &mut io.mechs,
            };
            self.traj_seq.proc(dt_s, &mut *io.drive, &mut sink, cancel)
        };

        let status = match status {
            Ok(s) => s,
            Err(e) => {
                warn!("Sequencer error: {}", e);
                faults.push(CycleFault::Sequencer(e));
                self.traj_seq.mode()
            }
        };

        let seq = self.traj_seq.report().clone();

        let tm = &mut *io.telemetry;
        tm.put("Routine", self.name.clone());
        tm.put("Status", format!("{:?}", status));
        tm.put("Elapsed", format!("{:.2} s", seq.elapsed_s));
        tm.put("Displacement", format!("{:.1}", seq.displacement));
        tm.put("Markers Fired", format!("{}", seq.markers_fired));
        tm.put("Lift Height", format!("{:.0}", state.lift_target_ticks));
        tm.flush();

        CycleReport {
            status,
            seq,
            faults,
        }
    }
}

impl<'s, 'a> ActionSink for MechActionSink<'s, 'a> {
    fn dispatch(&mut self, action: &Action) -> Result<(), ActionError> {
        debug!("Dispatching {}: {:?}", action.id, action.cmd);

        match action.cmd {
            MechCmd::Lift { target_ticks } => {
                let target = self.state.lift.command(&mut *self.mechs.lift, target_ticks)?;
                self.state.lift_target_ticks = target;
            }
            MechCmd::Wrist { side } => {
                let pos = self.state.wrist_pos(side);
                self.state.wrist.command(&mut *self.mechs.wrist, pos)?;
                self.state.set_wrist_side(side);
            }
            MechCmd::Gripper { state: gripper } => {
                let pos = self.state.gripper_pos(gripper);
                self.state.gripper.command(&mut *self.mechs.gripper, pos)?;
                self.state.gripper_state = gripper;
            }
        }

        Ok(())
    }
}

impl From<MechError> for ActionError {
    fn from(e: MechError) -> Self {
        match e {
            MechError::Fault(f) => ActionError::Fault(f),
            e => ActionError::Rejected(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
