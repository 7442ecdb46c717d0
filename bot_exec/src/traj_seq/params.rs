//! Trajectory sequencer parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory sequencer.
///
/// Distances are in field units, the same units used for poses.
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Maximum velocity used to plan segment durations
    pub max_vel_ms: f64,

    /// Maximum acceleration used to plan segment durations
    pub max_accel_mss: f64,

    /// Position tolerance on the final pose
    pub end_pos_tolerance_m: f64,

    /// Heading tolerance on the final pose
    pub end_head_tolerance_rad: f64,

    /// Time after the last step completes to wait for the final pose before finishing anyway
    pub end_settle_timeout_s: f64,
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
            util::params::load_str(include_str!("../../../params/traj_seq.toml")).unwrap();

        assert!(params.max_vel_ms > 0.0);
        assert!(params.max_accel_mss > 0.0);
        assert!(params.end_settle_timeout_s >= 0.0);
    }
}
