//! # Mechanisms Equipment Interface
//!
//! The actuator collaborator is the hardware-facing side of a single mechanism actuator. All calls
//! are fire-and-forget commands or cached reads, none of them may block.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all mechanism actuators on the robot.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ActId {
    /// Vertical lift, position in encoder ticks.
    Lift,

    /// Wrist servo, normalised position.
    Wrist,

    /// Gripper (intake) servo, normalised position.
    Gripper,
}

/// The side the wrist is pointing towards.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum WristSide {
    Front,
    Back,
}

/// Demanded state of the gripper.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum GripperState {
    Open,
    Closed,
}

/// A failure to read from or write to an actuator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorFault {
    #[error("Actuator {0:?} is not responding")]
    NotResponding(ActId),

    #[error("Actuator {0:?} rejected the demand {1}")]
    DemandRejected(ActId, f64),

    #[error("Hardware error on actuator {0:?}: {1}")]
    Hardware(ActId, String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The hardware actuator collaborator.
pub trait Actuator {
    /// The ID of this actuator.
    fn id(&self) -> ActId;

    /// Demand that the actuator holds the given absolute position using its own (hardware)
    /// position control.
    fn set_target(&mut self, value: f64) -> Result<(), ActuatorFault>;

    /// Read the most recent measured position of the actuator.
    fn get_position(&mut self) -> Result<f64, ActuatorFault>;

    /// Demand a raw power, in the range [-1, 1], disabling any hardware position control.
    fn set_raw_power(&mut self, power: f64) -> Result<(), ActuatorFault>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WristSide {
    /// The opposite side.
    pub fn flipped(self) -> Self {
        match self {
            WristSide::Front => WristSide::Back,
            WristSide::Back => WristSide::Front,
        }
    }
}

impl Default for WristSide {
    fn default() -> Self {
        WristSide::Front
    }
}

impl Default for GripperState {
    fn default() -> Self {
        GripperState::Open
    }
}
