//! Simulated mechanism actuator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::ActuatorParams;
use bot_if::eqpt::mech::{ActId, Actuator, ActuatorFault};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated actuator.
///
/// In position mode the actuator moves towards its target at a fixed slew rate. In power mode it
/// moves at a rate proportional to the demanded power.
#[derive(Debug, Clone)]
pub struct SimActuator {
    id: ActId,
    position: f64,
    target: Option<f64>,
    power: f64,
    power_mode: bool,
    slew_per_s: f64,
    full_power_per_s: f64,

    /// While set every call fails
    fault: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimActuator {
    pub fn new(id: ActId, params: &ActuatorParams) -> Self {
        Self {
            id,
            position: params.initial_pos,
            target: None,
            power: 0.0,
            power_mode: false,
            slew_per_s: params.slew_per_s,
            full_power_per_s: params.full_power_per_s,
            fault: false,
        }
    }

    /// A servo with a normalised position, taking about half a second to sweep its range.
    pub fn servo(id: ActId, position: f64) -> Self {
        Self::new(
            id,
            &ActuatorParams {
                initial_pos: position,
                slew_per_s: 2.0,
                full_power_per_s: 0.0,
            },
        )
    }

    /// A lift motor measured in encoder ticks.
    pub fn motor(id: ActId, position: f64) -> Self {
        Self::new(
            id,
            &ActuatorParams {
                initial_pos: position,
                slew_per_s: 2500.0,
                full_power_per_s: 3000.0,
            },
        )
    }

    /// Advance the simulation.
    pub fn step(&mut self, dt_s: f64) {
        if self.power_mode {
            self.position += self.power * self.full_power_per_s * dt_s;
        } else if let Some(target) = self.target {
            let max_step = self.slew_per_s * dt_s;
            let delta = (target - self.position).max(-max_step).min(max_step);
            self.position += delta;
        }
    }

    /// Make every subsequent call fail, or recover.
    pub fn inject_fault(&mut self, fault: bool) {
        self.fault = fault;
    }

    /// The last position demand, `None` if never set or if in power mode.
    pub fn target(&self) -> Option<f64> {
        match self.power_mode {
            true => None,
            false => self.target,
        }
    }

    /// The last power demand, zero in position mode.
    pub fn power(&self) -> f64 {
        self.power
    }

    /// The true position, regardless of faults.
    pub fn position(&self) -> f64 {
        self.position
    }

    fn check(&self) -> Result<(), ActuatorFault> {
        match self.fault {
            true => Err(ActuatorFault::NotResponding(self.id)),
            false => Ok(()),
        }
    }
}

impl Actuator for SimActuator {
    fn id(&self) -> ActId {
        self.id
    }

    fn set_target(&mut self, value: f64) -> Result<(), ActuatorFault> {
        self.check()?;
        if !value.is_finite() {
            return Err(ActuatorFault::DemandRejected(self.id, value));
        }
        self.target = Some(value);
        self.power_mode = false;
        self.power = 0.0;
        Ok(())
    }

    fn get_position(&mut self) -> Result<f64, ActuatorFault> {
        self.check()?;
        Ok(self.position)
    }

    fn set_raw_power(&mut self, power: f64) -> Result<(), ActuatorFault> {
        self.check()?;
        if !(-1.0..=1.0).contains(&power) {
            return Err(ActuatorFault::DemandRejected(self.id, power));
        }
        self.power = power;
        self.power_mode = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_position_and_power() {
        let mut act = SimActuator::motor(ActId::Lift, 0.0);

        act.set_target(100.0).unwrap();
        act.step(0.02);
        assert!((act.position() - 50.0).abs() < 1e-9);
        act.step(0.02);
        act.step(0.02);
        assert!((act.position() - 100.0).abs() < 1e-9);

        act.set_raw_power(0.5).unwrap();
        assert_eq!(act.target(), None);
        act.step(0.1);
        assert!((act.position() - 250.0).abs() < 1e-9);

        assert_eq!(
            act.set_raw_power(1.5),
            Err(ActuatorFault::DemandRejected(ActId::Lift, 1.5))
        );
    }
}
