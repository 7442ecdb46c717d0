//! # Simulated collaborators
//!
//! Software stand-ins for the drive base, the mechanism actuators and the gamepads. They are used
//! by the executable when running without hardware and by the tests. None of them model dynamics
//! beyond what is needed to close the loops in the engine: the drive tracks segments perfectly at
//! a constant speed, and actuators move towards their demand at a fixed rate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod actuator;
mod drive;
mod gamepad;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
pub use actuator::*;
pub use drive::*;
pub use gamepad::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation parameters
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Speed at which the simulated drive tracks segments and responds to full demand
    pub drive_speed: f64,

    /// Turn rate of the simulated drive at full turn demand
    pub drive_turn_rate_rads: f64,

    pub lift: ActuatorParams,

    pub wrist: ActuatorParams,

    pub gripper: ActuatorParams,

    /// Scripted inputs for the driver gamepad
    #[serde(default)]
    pub driver_script: Vec<ScriptEntry>,

    /// Scripted inputs for the tool (mechanism) gamepad
    #[serde(default)]
    pub tool_script: Vec<ScriptEntry>,
}

/// Parameters of a single simulated actuator.
#[derive(Deserialize, Debug, Clone)]
pub struct ActuatorParams {
    /// Initial position
    pub initial_pos: f64,

    /// Rate at which a position demand is followed
    pub slew_per_s: f64,

    /// Rate of motion at full power
    #[serde(default)]
    pub full_power_per_s: f64,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: Params =
            util::params::load_str(include_str!("../../../params/sim.toml")).unwrap();

        assert!(params.drive_speed > 0.0);
        assert!(params.lift.full_power_per_s > 0.0);
        assert!(!params.tool_script.is_empty());

        // Script entries are in time order
        for pair in params.tool_script.windows(2) {
            assert!(pair[0].at_s <= pair[1].at_s);
        }
    }
}
