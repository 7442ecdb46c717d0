//! # Mechanism actuator model
//!
//! A [`Mechanism`] holds the target of one actuator and applies it to the actuator collaborator
//! once per cycle. Moves are fire-and-forget: `move_to` only records the target, the next
//! `actuate` call turns it into a hardware demand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;

// Internal
use super::{MechError, PidController};
use bot_if::eqpt::mech::{ActId, Actuator, ActuatorFault};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A setpoint and the way it is to be achieved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActuatorTarget {
    pub value: f64,
    pub mode: ControlMode,
}

/// A single physical mechanism.
#[derive(Debug, Clone)]
pub struct Mechanism {
    id: ActId,

    /// Allowed range of position targets
    min: f64,
    max: f64,

    /// Mode used by `move_to`
    mode: ControlMode,

    /// Latest target, `None` until the first move
    target: Option<ActuatorTarget>,

    /// Position loop, only present on closed loop mechanisms
    controller: Option<PidController>,

    /// Limit on the power applied by the position loop
    max_power: f64,

    /// Most recent successful position reading
    position: Option<f64>,

    /// Most recent power demand, zero if not driven by power
    power: f64,
}

/// Status of a single `actuate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MechReport {
    /// The raw power demanded this cycle, if any
    pub power: Option<f64>,

    /// True if the power was limited to the mechanism's maximum
    pub power_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How an actuator target is achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlMode {
    /// The hardware holds the position itself.
    Position,

    /// The position loop computes a power every cycle.
    Power,

    /// The value is applied directly as power.
    RawPower,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Mechanism {
    /// A mechanism whose hardware holds position (servos, or a motor in run-to-position).
    pub fn position_controlled(id: ActId, min: f64, max: f64) -> Self {
        Self {
            id,
            min,
            max,
            mode: ControlMode::Position,
            target: None,
            controller: None,
            max_power: 1f64,
            position: None,
            power: 0f64,
        }
    }

    /// A mechanism whose position loop is closed by the given controller.
    ///
    /// `min` and `max` bound targets set while in `Position` mode, in `Power` mode the
    /// controller's own limits apply.
    pub fn closed_loop(
        id: ActId,
        controller: PidController,
        min: f64,
        max: f64,
        max_power: f64,
    ) -> Self {
        Self {
            id,
            min,
            max,
            mode: ControlMode::Power,
            target: None,
            controller: Some(controller),
            max_power: max_power.abs(),
            position: None,
            power: 0f64,
        }
    }

    pub fn id(&self) -> ActId {
        self.id
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Switch the mode used by subsequent moves.
    ///
    /// The current target is kept but will be achieved in the new mode. Switching a mechanism
    /// without a controller into `Power` mode fails.
    pub fn set_mode(&mut self, mode: ControlMode) -> Result<(), MechError> {
        if mode == ControlMode::Power && self.controller.is_none() {
            return Err(MechError::NoController(self.id));
        }

        if mode != self.mode {
            debug!("{:?} switching from {:?} to {:?} control", self.id, self.mode, mode);
        }

        self.mode = mode;
        if let Some(ref mut c) = self.controller {
            c.reset();
        }
        if let Some(target) = self.target {
            if target.mode != ControlMode::RawPower {
                self.move_to(target.value);
            }
        }

        Ok(())
    }

    /// Move to an absolute position, returning the target after clamping.
    pub fn move_to(&mut self, value: f64) -> f64 {
        let value = match self.controller {
            Some(ref mut c) if self.mode == ControlMode::Power => c.set_target(value),
            _ => value.max(self.min).min(self.max),
        };

        self.target = Some(ActuatorTarget {
            value,
            mode: self.mode,
        });

        value
    }

    /// Drive the actuator at a raw power, bypassing any position control.
    pub fn set_power(&mut self, power: f64) {
        self.target = Some(ActuatorTarget {
            value: power.max(-1f64).min(1f64),
            mode: ControlMode::RawPower,
        });
    }

    /// The latest target.
    pub fn target(&self) -> Option<ActuatorTarget> {
        self.target
    }

    /// The most recent successful position reading.
    pub fn position(&self) -> Option<f64> {
        self.position
    }

    /// The most recent power demand.
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Read the actuator's position.
    ///
    /// On a fault the previous reading is kept.
    pub fn sense(&mut self, actuator: &mut dyn Actuator) -> Result<f64, ActuatorFault> {
        match actuator.get_position() {
            Ok(p) => {
                self.position = Some(p);
                Ok(p)
            }
            Err(e) => {
                warn!("Could not read {:?} position: {}", self.id, e);
                Err(e)
            }
        }
    }

    /// Apply the current target to the actuator.
    ///
    /// In `Power` mode the position loop is stepped using the last sensed position. If there is no
    /// target, or no position to close the loop on, nothing is sent.
    pub fn actuate(
        &mut self,
        actuator: &mut dyn Actuator,
        dt_s: f64,
    ) -> Result<MechReport, MechError> {
        let mut report = MechReport::default();

        let target = match self.target {
            Some(t) => t,
            None => return Ok(report),
        };

        match target.mode {
            ControlMode::Position => {
                self.power = 0f64;
                actuator.set_target(target.value)?;
            }
            ControlMode::Power => {
                let (controller, position) = match (self.controller.as_mut(), self.position) {
                    (Some(c), Some(p)) => (c, p),
                    (None, _) => return Err(MechError::NoController(self.id)),
                    (Some(_), None) => return Ok(report),
                };

                let raw = controller.compute(position, dt_s)?;
                let power = raw.max(-self.max_power).min(self.max_power);
                report.power_limited = power != raw;

                self.power = power;
                report.power = Some(power);
                actuator.set_raw_power(power)?;
            }
            ControlMode::RawPower => {
                self.power = target.value;
                report.power = Some(target.value);
                actuator.set_raw_power(target.value)?;
            }
        }

        Ok(report)
    }

    /// Move to a position and immediately apply it.
    ///
    /// Used where a target must reach the hardware in the same cycle it is decided, so that a
    /// fault can be attributed to the command that caused it.
    pub fn command(&mut self, actuator: &mut dyn Actuator, value: f64) -> Result<f64, MechError> {
        let value = self.move_to(value);
        match self.mode {
            ControlMode::Position => actuator.set_target(value)?,
            // The position loop needs a dt, so it is applied by the next `actuate`.
            ControlMode::Power | ControlMode::RawPower => (),
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::act_ctrl::FeedForward;
    use crate::sim::SimActuator;

    fn lift() -> Mechanism {
        let pid = PidController::new(0.01, 0.0, 0.0, 0.0, FeedForward::Constant, 0.0, 2900.0, 50.0);
        Mechanism::closed_loop(ActId::Lift, pid, 0.0, 2900.0, 0.8)
    }

    #[test]
    fn test_position_mode() {
        let mut act = SimActuator::servo(ActId::Wrist, 0.0);
        let mut wrist = Mechanism::position_controlled(ActId::Wrist, 0.0, 1.03);

        // Nothing sent before the first move
        wrist.actuate(&mut act, 0.02).unwrap();
        assert_eq!(act.target(), None);

        assert_eq!(wrist.move_to(2.0), 1.03);
        wrist.actuate(&mut act, 0.02).unwrap();
        assert_eq!(act.target(), Some(1.03));
    }

    #[test]
    fn test_power_mode_clamped() {
        let mut act = SimActuator::motor(ActId::Lift, 0.0);
        let mut lift = lift();

        lift.move_to(2900.0);

        // No position yet, so nothing is sent
        let report = lift.actuate(&mut act, 0.02).unwrap();
        assert_eq!(report.power, None);

        lift.sense(&mut act).unwrap();
        let report = lift.actuate(&mut act, 0.02).unwrap();
        assert_eq!(report.power, Some(0.8));
        assert!(report.power_limited);
        assert_eq!(act.power(), 0.8);
    }

    #[test]
    fn test_power_mode_bad_dt() {
        let mut act = SimActuator::motor(ActId::Lift, 0.0);
        let mut lift = lift();
        lift.move_to(100.0);
        lift.sense(&mut act).unwrap();

        match lift.actuate(&mut act, 0.0) {
            Err(MechError::Control(_)) => (),
            r => panic!("Expected control error, got {:?}", r),
        }
        assert_eq!(act.power(), 0.0);
    }

    #[test]
    fn test_fault_keeps_stale_position() {
        let mut act = SimActuator::motor(ActId::Lift, 120.0);
        let mut lift = lift();

        lift.sense(&mut act).unwrap();
        act.inject_fault(true);
        assert!(lift.sense(&mut act).is_err());
        assert_eq!(lift.position(), Some(120.0));

        lift.move_to(500.0);
        match lift.actuate(&mut act, 0.02) {
            Err(MechError::Fault(ActuatorFault::NotResponding(ActId::Lift))) => (),
            r => panic!("Expected fault, got {:?}", r),
        }
    }

    #[test]
    fn test_mode_switch() {
        let mut servo = Mechanism::position_controlled(ActId::Gripper, 0.0, 1.0);
        assert!(servo.set_mode(ControlMode::Power).is_err());

        let mut act = SimActuator::motor(ActId::Lift, 0.0);
        let mut lift = lift();
        lift.set_mode(ControlMode::Position).unwrap();
        assert_eq!(lift.command(&mut act, 2825.0).unwrap(), 2825.0);
        assert_eq!(act.target(), Some(2825.0));
        assert_eq!(lift.target().map(|t| t.mode), Some(ControlMode::Position));
    }
}
