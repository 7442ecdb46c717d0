//! Implementations for the teleoperation control cycle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};

// Internal
use super::{Params, TeleopError};
use crate::{
    act_ctrl::MechReport,
    interlock,
    robot_state::{Collaborators, CycleFault, RobotState},
};
use bot_if::{
    eqpt::{
        drive::DriveCmd,
        mech::{ActId, GripperState},
    },
    tc::{Axis, Button, Gamepad, Trigger},
};
use util::{maths::deadband, module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The operator gamepads.
pub struct Gamepads<'a> {
    /// Moves the base
    pub driver: &'a mut dyn Gamepad,

    /// Runs the mechanisms
    pub tool: &'a mut dyn Gamepad,
}

/// Teleoperated control.
#[derive(Debug, Clone)]
pub struct TeleopCtrl {
    params: Params,
}

/// Report on a single teleoperated cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Lift target at the end of the cycle
    pub lift_target_ticks: f64,

    /// Power sent to the lift
    pub lift: MechReport,

    pub speed_cap: f64,
    pub turbo: f64,

    pub interlock: interlock::StatusReport,

    /// Faults which occured during the cycle
    pub faults: Vec<CycleFault>,

    /// True if the cycle time was unusable and closed loop control was skipped
    pub control_skipped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TeleopCtrl {
    /// Load the parameters and create the controller.
    pub fn init(params_file: &str) -> Result<Self, TeleopError> {
        let params: Params = match params::load(params_file) {
            Ok(p) => p,
            Err(e) => return Err(TeleopError::ParamLoadError(e)),
        };

        Self::with_params(params)
    }

    /// Create the controller from already loaded parameters.
    pub fn with_params(params: Params) -> Result<Self, TeleopError> {
        params.validate().map_err(TeleopError::InvalidParams)?;

        Ok(Self { params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Run one teleoperated cycle.
    ///
    /// Faults never stop the cycle, they are logged and returned in the report while the
    /// rest of the robot keeps running on its last known state.
    pub fn cycle(
        &mut self,
        state: &mut RobotState,
        io: &mut Collaborators,
        pads: &mut Gamepads,
        dt_s: f64,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        state.begin_cycle(dt_s);

        let dt_valid = dt_s.is_finite() && dt_s > 0.0;
        if !dt_valid {
            warn!("Unusable cycle time {} s, skipping lift control", dt_s);
            report.control_skipped = true;
        }

        // ---- INPUTS ----

        pads.driver.read();
        pads.tool.read();

        report.faults.extend(state.sense(&mut io.mechs));

        // ---- MECHANISMS ----

        let lift_override = self.lift_override(state.lift_target_ticks, &*pads.tool);
        self.update_gripper(state, &*pads.tool);

        let il_input = interlock::InputData {
            toggle_requested: pads.tool.was_just_pressed(Button::RightBumper),
            lift_override,
            lift_pos_ticks: state.lift.position().unwrap_or(self.params.lift_drive_ticks),
            lift_target_ticks: state.lift_target_ticks,
            wrist_side: state.wrist_side(),
            dt_s,
        };

        match state.interlock.proc(&il_input) {
            Ok((output, il_report)) => {
                state.lift_target_ticks = output.lift_target_ticks;
                state.set_wrist_side(output.wrist_side);
                report.interlock = il_report;
            }
            Err(e) => {
                warn!("Interlock processing failed: {}", e);
                if let Some(t) = lift_override {
                    state.lift_target_ticks = t;
                }
            }
        }

        state.lift.move_to(state.lift_target_ticks);
        if dt_valid {
            match state.lift.actuate(&mut *io.mechs.lift, dt_s) {
                Ok(r) => report.lift = r,
                Err(e) => {
                    warn!("Could not command the lift: {}", e);
                    report.faults.push(CycleFault::Mech(ActId::Lift, e));
                }
            }
        }

        report.faults.extend(state.apply_servo_targets(&mut io.mechs, dt_s));

        // ---- DRIVE ----

        state.speed_cap = self.speed_cap(state.lift_target_ticks);
        state.turbo = self.params.turbo_base
            + pads.driver.trigger(Trigger::Right) * self.params.turbo_gain
            - pads.driver.trigger(Trigger::Left) * self.params.slow_gain;

        let field_heading_rad = if self.params.field_centric {
            Some(io.drive.get_pose().heading_rad())
        } else {
            None
        };

        // Sticks read positive right, commands are positive left
        let cmd = DriveCmd {
            strafe: -pads.driver.axis(Axis::LeftX) * state.turbo,
            forward: pads.driver.axis(Axis::LeftY) * state.turbo,
            turn: -pads.driver.axis(Axis::RightX) * state.turbo,
            max_power: state.speed_cap,
            field_heading_rad,
        };
        trace!("Drive command: {:?}", cmd);

        if let Err(e) = io.drive.drive(&cmd) {
            warn!("Could not command the drive: {}", e);
            report.faults.push(CycleFault::Drive(e));
        }

        // ---- TELEMETRY ----

        report.lift_target_ticks = state.lift_target_ticks;
        report.speed_cap = state.speed_cap;
        report.turbo = state.turbo;

        let tm = &mut *io.telemetry;
        tm.put("Run Time", format!("{:.2} s", state.elapsed_s));
        tm.put("Turbo Factor", format!("{:.3}", state.turbo));
        tm.put("Speed Limit", format!("{:.3}", state.speed_cap));
        tm.put("Lift Height", format!("{:.0}", state.lift_target_ticks));
        tm.put("Interlock", format!("{:?}", report.interlock.state));
        tm.flush();

        report
    }

    /// Lift target demanded by the operator this cycle, if any.
    ///
    /// Presets are applied before the manual adjustment so both can act in one cycle.
    fn lift_override(&self, lift_target_ticks: f64, tool: &dyn Gamepad) -> Option<f64> {
        let mut target = None;

        for (button, ticks) in [
            (Button::Y, self.params.lift_high_ticks),
            (Button::X, self.params.lift_medium_ticks),
            (Button::B, self.params.lift_low_ticks),
            (Button::A, self.params.lift_drive_ticks),
        ]
        .iter()
        {
            if tool.was_just_pressed(*button) {
                debug!("Lift preset {:?} selected ({} ticks)", button, ticks);
                target = Some(*ticks);
            }
        }

        let stick = deadband(tool.axis(Axis::LeftY), self.params.stick_deadzone);
        if stick != 0.0 {
            target = Some(target.unwrap_or(lift_target_ticks) + stick * self.params.lift_increment_ticks);
        }

        target.map(|t| {
            t.max(self.params.lift_drive_ticks)
                .min(self.params.lift_high_ticks)
        })
    }

    /// Open on the left trigger, close on the right. Opening wins if both are pressed.
    fn update_gripper(&self, state: &mut RobotState, tool: &dyn Gamepad) {
        if tool.trigger(Trigger::Right) >= self.params.trigger_full_press {
            state.gripper_state = GripperState::Closed;
        }
        if tool.trigger(Trigger::Left) >= self.params.trigger_full_press {
            state.gripper_state = GripperState::Open;
        }
    }

    /// The maximum drive power for a given lift target.
    pub fn speed_cap(&self, lift_target_ticks: f64) -> f64 {
        1.0 - (lift_target_ticks / self.params.lift_high_ticks) * self.params.limit_ramp
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        interlock::InterlockState,
        robot_state::test::{robot_state, SimIo},
        sim::{ScriptEntry, ScriptedGamepad},
    };
    use bot_if::{eqpt::mech::WristSide, tc::GamepadSnapshot};

    const DT: f64 = 0.02;

    fn teleop() -> TeleopCtrl {
        TeleopCtrl::with_params(
            util::params::load_str(include_str!("../../../params/teleop.toml")).unwrap(),
        )
        .unwrap()
    }

    fn pad(entries: Vec<(f64, GamepadSnapshot)>) -> ScriptedGamepad {
        ScriptedGamepad::new(
            entries
                .into_iter()
                .map(|(at_s, snapshot)| ScriptEntry { at_s, snapshot })
                .collect(),
        )
    }

    fn press(buttons: &[Button]) -> GamepadSnapshot {
        GamepadSnapshot {
            held: buttons.to_vec(),
            ..Default::default()
        }
    }

    /// Run `n` cycles, stepping the simulation and the gamepads in between.
    fn run(
        teleop: &mut TeleopCtrl,
        state: &mut RobotState,
        io: &mut SimIo,
        driver: &mut ScriptedGamepad,
        tool: &mut ScriptedGamepad,
        n: usize,
    ) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for _ in 0..n {
            let report = {
                let mut collab = io.collaborators();
                let mut pads = Gamepads {
                    driver: &mut *driver,
                    tool: &mut *tool,
                };
                teleop.cycle(state, &mut collab, &mut pads, DT)
            };
            reports.push(report);
            io.step(DT);
            driver.advance(DT);
            tool.advance(DT);
        }
        reports
    }

    #[test]
    fn test_high_preset_speed_cap() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![]);
        let mut tool = pad(vec![(0.0, press(&[Button::Y]))]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 1);

        assert_eq!(reports[0].lift_target_ticks, 2900.0);
        assert!((reports[0].speed_cap - 0.25).abs() < 1e-12);
        assert!(reports[0].faults.is_empty());
        assert_eq!(io.drive.last_cmd().map(|c| c.max_power), Some(reports[0].speed_cap));

        // The lift is driven up at full power
        assert_eq!(reports[0].lift.power, Some(1.0));
    }

    #[test]
    fn test_medium_preset_speed_cap() {
        let teleop = teleop();
        let expected = 1.0 - (2100.0 / 2900.0) * 0.75;
        assert!((teleop.speed_cap(2100.0) - expected).abs() < 1e-12);
        assert!((teleop.speed_cap(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_manual_adjust_clamped() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![]);
        let mut tool = pad(vec![(
            0.0,
            GamepadSnapshot {
                left_y: -1.0,
                ..Default::default()
            },
        )]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 3);
        assert!(reports.iter().all(|r| r.lift_target_ticks == 0.0));

        let mut tool = pad(vec![(
            0.0,
            GamepadSnapshot {
                left_y: 1.0,
                ..Default::default()
            },
        )]);
        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 3);
        assert_eq!(reports[2].lift_target_ticks, 30.0);
    }

    #[test]
    fn test_gripper_triggers() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![]);
        let mut tool = pad(vec![
            (
                0.0,
                GamepadSnapshot {
                    right_trigger: 1.0,
                    ..Default::default()
                },
            ),
            (
                0.1,
                GamepadSnapshot {
                    left_trigger: 0.5,
                    ..Default::default()
                },
            ),
        ]);

        run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 1);
        assert_eq!(state.gripper_state, GripperState::Closed);
        assert_eq!(io.gripper.target(), Some(0.75));

        // A half pressed trigger does nothing
        run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 10);
        assert_eq!(state.gripper_state, GripperState::Closed);
    }

    #[test]
    fn test_wrist_flip_through_interlock() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![]);
        let mut tool = pad(vec![
            (0.0, press(&[Button::RightBumper])),
            (0.1, GamepadSnapshot::default()),
        ]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 1);
        assert_eq!(reports[0].interlock.state, InterlockState::Raising);
        assert_eq!(reports[0].lift_target_ticks, 350.0);
        assert_eq!(state.wrist_side(), WristSide::Front);

        // Run until the sequence has completed
        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 500);
        assert_eq!(reports.iter().filter(|r| r.interlock.flipped).count(), 1);
        assert_eq!(state.interlock.state(), InterlockState::Normal);
        assert_eq!(state.wrist_side(), WristSide::Back);
        assert_eq!(io.wrist.target(), Some(1.03));
        assert_eq!(state.lift_target_ticks, 0.0);
    }

    #[test]
    fn test_preset_aborts_interlock() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![]);
        let mut tool = pad(vec![
            (0.0, press(&[Button::RightBumper])),
            (0.04, GamepadSnapshot::default()),
            (0.08, press(&[Button::B])),
            (0.12, GamepadSnapshot::default()),
        ]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 10);
        let abort = reports.iter().position(|r| r.interlock.aborted).unwrap();
        assert_eq!(reports[abort].lift_target_ticks, 1250.0);
        assert_eq!(reports[abort].interlock.state, InterlockState::Normal);
        assert!(reports.iter().all(|r| !r.interlock.flipped));
        assert_eq!(state.wrist_side(), WristSide::Front);
    }

    #[test]
    fn test_fault_continues() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        io.lift.inject_fault(true);
        let mut driver = pad(vec![(
            0.0,
            GamepadSnapshot {
                left_y: 1.0,
                ..Default::default()
            },
        )]);
        let mut tool = pad(vec![(0.0, press(&[Button::Y]))]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 1);

        assert!(reports[0]
            .faults
            .iter()
            .all(|f| matches!(f, CycleFault::Mech(ActId::Lift, _))));
        assert!(!reports[0].faults.is_empty());

        // Everything else still ran
        assert_eq!(reports[0].lift_target_ticks, 2900.0);
        assert_eq!(io.wrist.target(), Some(0.03));
        assert_eq!(io.drive.num_commands(), 1);
    }

    #[test]
    fn test_turbo() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = pad(vec![(
            0.0,
            GamepadSnapshot {
                right_trigger: 1.0,
                left_trigger: 1.0,
                left_y: 1.0,
                ..Default::default()
            },
        )]);
        let mut tool = pad(vec![]);

        let reports = run(&mut teleop, &mut state, &mut io, &mut driver, &mut tool, 1);

        let expected = 0.5 + 0.25 - 0.333333;
        assert!((reports[0].turbo - expected).abs() < 1e-9);

        let cmd = io.drive.last_cmd().unwrap();
        assert!((cmd.forward - expected).abs() < 1e-9);
        assert_eq!(cmd.field_heading_rad, Some(0.0));
    }

    #[test]
    fn test_zero_dt_skips_control() {
        let mut teleop = teleop();
        let mut state = robot_state();
        let mut io = SimIo::new();
        let mut driver = ScriptedGamepad::default();
        let mut tool = pad(vec![(0.0, press(&[Button::Y]))]);

        let report = {
            let mut collab = io.collaborators();
            let mut pads = Gamepads {
                driver: &mut driver,
                tool: &mut tool,
            };
            teleop.cycle(&mut state, &mut collab, &mut pads, 0.0)
        };

        assert!(report.control_skipped);
        assert!(report.faults.is_empty());
        assert_eq!(report.lift.power, None);
        assert_eq!(io.lift.power(), 0.0);
        assert_eq!(report.lift_target_ticks, 2900.0);
        assert_eq!(state.num_cycles, 1);
    }
}
