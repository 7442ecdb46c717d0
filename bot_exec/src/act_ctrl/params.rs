//! Actuator control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::FeedForward;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for actuator control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    pub lift: LiftParams,

    pub wrist: WristParams,

    pub gripper: GripperParams,
}

/// Lift position loop parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct LiftParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Feed-forward gain
    pub k_ff: f64,

    /// The feed-forward model to scale `k_ff` by
    pub feed_forward: FeedForward,

    /// Lowest allowed lift target
    pub min_ticks: f64,

    /// Highest allowed lift target
    pub max_ticks: f64,

    /// A change in target larger than this resets the integral accumulator
    pub integral_reset_deadband_ticks: f64,

    /// Limit on the magnitude of the raw power applied by the position loop
    pub max_power: f64,
}

/// Wrist servo positions.
#[derive(Deserialize, Debug, Clone)]
pub struct WristParams {
    /// Servo position with the wrist facing the front of the robot
    pub front_pos: f64,

    /// Servo position with the wrist facing the back of the robot
    pub back_pos: f64,
}

/// Gripper servo positions.
#[derive(Deserialize, Debug, Clone)]
pub struct GripperParams {
    pub open_pos: f64,

    pub closed_pos: f64,
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
            util::params::load_str(include_str!("../../../params/act_ctrl.toml")).unwrap();

        assert!(params.lift.min_ticks < params.lift.max_ticks);
        assert!(params.lift.max_power > 0.0 && params.lift.max_power <= 1.0);
        assert_eq!(params.wrist.front_pos, 0.03);
        assert_eq!(params.wrist.back_pos, 1.03);
        assert_eq!(params.gripper.closed_pos, 0.75);
    }
}
