//! # Robot State
//!
//! All per-match mutable state lives here and is passed by reference into the control cycle
//! drivers, so that a cycle can be run against simulated collaborators without any hardware.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;

// Internal
use crate::{
    act_ctrl::{self, MechError, Mechanism, PidController},
    interlock::WristInterlock,
    traj_seq::TrajSeqError,
};
use bot_if::{
    eqpt::{
        drive::{Drive, DriveError},
        mech::{ActId, Actuator, GripperState, WristSide},
    },
    tm::Telemetry,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The collaborators a control cycle acts through.
pub struct Collaborators<'a> {
    pub drive: &'a mut dyn Drive,
    pub mechs: MechIo<'a>,
    pub telemetry: &'a mut dyn Telemetry,
}

/// The mechanism actuator collaborators.
pub struct MechIo<'a> {
    pub lift: &'a mut dyn Actuator,
    pub wrist: &'a mut dyn Actuator,
    pub gripper: &'a mut dyn Actuator,
}

/// Per-match robot state.
pub struct RobotState {
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Time since the first cycle
    pub elapsed_s: f64,

    // Mechanisms
    pub lift: Mechanism,
    pub wrist: Mechanism,
    pub gripper: Mechanism,

    /// Demanded lift position
    pub lift_target_ticks: f64,

    /// Demanded wrist side. Only changed by the interlock under manual control, or by a
    /// scheduled action in autonomous.
    wrist_side: WristSide,

    /// Demanded gripper state
    pub gripper_state: GripperState,

    pub interlock: WristInterlock,

    /// Maximum drive power, derived from the lift target
    pub speed_cap: f64,

    /// Drive demand scaling set by the driver
    pub turbo: f64,

    act_params: act_ctrl::Params,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A fault which occured during a cycle. The cycle carries on regardless.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CycleFault {
    #[error("{0:?} mechanism fault: {1}")]
    Mech(ActId, MechError),

    #[error("Drive fault: {0}")]
    Drive(DriveError),

    #[error("Sequencer fault: {0}")]
    Sequencer(TrajSeqError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotState {
    /// Create the state for a new match.
    pub fn new(act_params: &act_ctrl::Params, interlock: WristInterlock) -> Self {
        let lift = Mechanism::closed_loop(
            ActId::Lift,
            PidController::from_params(&act_params.lift),
            act_params.lift.min_ticks,
            act_params.lift.max_ticks,
            act_params.lift.max_power,
        );
        let wrist = Mechanism::position_controlled(
            ActId::Wrist,
            act_params.wrist.front_pos.min(act_params.wrist.back_pos),
            act_params.wrist.front_pos.max(act_params.wrist.back_pos),
        );
        let gripper = Mechanism::position_controlled(
            ActId::Gripper,
            act_params.gripper.open_pos.min(act_params.gripper.closed_pos),
            act_params.gripper.open_pos.max(act_params.gripper.closed_pos),
        );

        Self {
            num_cycles: 0,
            elapsed_s: 0.0,
            lift,
            wrist,
            gripper,
            lift_target_ticks: act_params.lift.min_ticks,
            wrist_side: WristSide::Front,
            gripper_state: GripperState::Open,
            interlock,
            speed_cap: 1.0,
            turbo: 0.0,
            act_params: act_params.clone(),
        }
    }

    pub fn wrist_side(&self) -> WristSide {
        self.wrist_side
    }

    pub(crate) fn set_wrist_side(&mut self, side: WristSide) {
        self.wrist_side = side;
    }

    /// Servo position for a wrist side.
    pub fn wrist_pos(&self, side: WristSide) -> f64 {
        match side {
            WristSide::Front => self.act_params.wrist.front_pos,
            WristSide::Back => self.act_params.wrist.back_pos,
        }
    }

    /// Servo position for a gripper state.
    pub fn gripper_pos(&self, state: GripperState) -> f64 {
        match state {
            GripperState::Open => self.act_params.gripper.open_pos,
            GripperState::Closed => self.act_params.gripper.closed_pos,
        }
    }

    /// Count a new cycle.
    pub(crate) fn begin_cycle(&mut self, dt_s: f64) {
        self.num_cycles += 1;
        if dt_s > 0.0 {
            self.elapsed_s += dt_s;
        }
    }

    /// Read the position of every mechanism, returning any faults.
    pub fn sense(&mut self, mechs: &mut MechIo) -> Vec<CycleFault> {
        let mut faults = Vec::new();

        for (mech, act) in [
            (&mut self.lift, &mut *mechs.lift),
            (&mut self.wrist, &mut *mechs.wrist),
            (&mut self.gripper, &mut *mechs.gripper),
        ]
        .iter_mut()
        {
            if let Err(e) = mech.sense(&mut **act) {
                faults.push(CycleFault::Mech(mech.id(), e.into()));
            }
        }

        faults
    }

    /// Push the wrist and gripper targets to the actuators, returning any faults.
    pub fn apply_servo_targets(&mut self, mechs: &mut MechIo, dt_s: f64) -> Vec<CycleFault> {
        let mut faults = Vec::new();

        let wrist_pos = self.wrist_pos(self.wrist_side);
        self.wrist.move_to(wrist_pos);
        if let Err(e) = self.wrist.actuate(&mut *mechs.wrist, dt_s) {
            warn!("Could not command the wrist: {}", e);
            faults.push(CycleFault::Mech(ActId::Wrist, e));
        }

        let gripper_pos = self.gripper_pos(self.gripper_state);
        self.gripper.move_to(gripper_pos);
        if let Err(e) = self.gripper.actuate(&mut *mechs.gripper, dt_s) {
            warn!("Could not command the gripper: {}", e);
            faults.push(CycleFault::Mech(ActId::Gripper, e));
        }

        faults
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::{
        act_ctrl::{params::*, FeedForward},
        interlock,
        sim::{SimActuator, SimDrive},
    };

    pub(crate) fn act_params() -> act_ctrl::Params {
        act_ctrl::Params {
            lift: LiftParams {
                k_p: 0.005,
                k_i: 0.0,
                k_d: 0.0,
                k_ff: 0.0,
                feed_forward: FeedForward::Constant,
                min_ticks: 0.0,
                max_ticks: 2900.0,
                integral_reset_deadband_ticks: 50.0,
                max_power: 1.0,
            },
            wrist: WristParams {
                front_pos: 0.03,
                back_pos: 1.03,
            },
            gripper: GripperParams {
                open_pos: 0.0,
                closed_pos: 0.75,
            },
        }
    }

    pub(crate) fn robot_state() -> RobotState {
        let interlock = WristInterlock::with_params(interlock::Params {
            safe_threshold_ticks: 350.0,
            tolerance_ticks: 10.0,
            settle_s: 1.0,
        })
        .unwrap();
        RobotState::new(&act_params(), interlock)
    }

    /// Simulated collaborators for a test.
    pub(crate) struct SimIo {
        pub drive: SimDrive,
        pub lift: SimActuator,
        pub wrist: SimActuator,
        pub gripper: SimActuator,
        pub telemetry: bot_if::tm::NullTelemetry,
    }

    impl SimIo {
        pub fn new() -> Self {
            Self {
                drive: SimDrive::new(40.0),
                lift: SimActuator::motor(ActId::Lift, 0.0),
                wrist: SimActuator::servo(ActId::Wrist, 0.03),
                gripper: SimActuator::servo(ActId::Gripper, 0.0),
                telemetry: bot_if::tm::NullTelemetry,
            }
        }

        pub fn collaborators(&mut self) -> Collaborators {
            Collaborators {
                drive: &mut self.drive,
                mechs: MechIo {
                    lift: &mut self.lift,
                    wrist: &mut self.wrist,
                    gripper: &mut self.gripper,
                },
                telemetry: &mut self.telemetry,
            }
        }

        pub fn step(&mut self, dt_s: f64) {
            self.drive.step(dt_s);
            self.lift.step(dt_s);
            self.wrist.step(dt_s);
            self.gripper.step(dt_s);
        }
    }

    #[test]
    fn test_sense_faults() {
        let mut state = robot_state();
        let mut io = SimIo::new();
        io.wrist.inject_fault(true);

        let faults = state.sense(&mut io.collaborators().mechs);
        assert_eq!(faults.len(), 1);
        assert!(matches!(faults[0], CycleFault::Mech(ActId::Wrist, _)));
        assert_eq!(state.lift.position(), Some(0.0));
        assert_eq!(state.wrist.position(), None);
    }

    #[test]
    fn test_apply_servo_targets() {
        let mut state = robot_state();
        let mut io = SimIo::new();

        state.set_wrist_side(WristSide::Back);
        state.gripper_state = GripperState::Closed;

        let faults = state.apply_servo_targets(&mut io.collaborators().mechs, 0.02);
        assert!(faults.is_empty());
        assert_eq!(io.wrist.target(), Some(1.03));
        assert_eq!(io.gripper.target(), Some(0.75));
    }
}
