//! # Actuator controllers module
//!
//! This module provides the PID position controller used to close the lift position loop in
//! software, including its static feed-forward term.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};

// Internal
use super::params::LiftParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID position controller with a static feed-forward term.
///
/// The controller owns no state beyond its gains, the latest target and the PID accumulators. It
/// does not clamp its output, the caller is expected to limit the demand to what the actuator
/// accepts.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Feed-forward gain
    k_ff: f64,

    /// Model used to compute the feed-forward term from the target
    feed_forward: FeedForward,

    /// Current target, always within `[min_target, max_target]`
    target: f64,

    min_target: f64,

    max_target: f64,

    /// Target changes larger than this reset the accumulators
    integral_reset_deadband: f64,

    /// Previous error, `None` after a reset
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Feed-forward models.
///
/// The feed-forward term depends only on the target, never on time.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FeedForward {
    /// Constant term, as needed to hold an elevator against gravity.
    Constant,

    /// Term proportional to the cosine of the arm angle, for a rotating arm whose angle is
    /// `target / ticks_per_deg` degrees from horizontal.
    ArmCosine { ticks_per_deg: f64 },
}

/// Errors which can occur during controller computation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("Invalid control input: dt = {dt_s} s, measurement = {measurement}")]
    InvalidControlInput { dt_s: f64, measurement: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains and target limits.
    ///
    /// The initial target is the lower limit.
    pub fn new(
        k_p: f64,
        k_i: f64,
        k_d: f64,
        k_ff: f64,
        feed_forward: FeedForward,
        min_target: f64,
        max_target: f64,
        integral_reset_deadband: f64,
    ) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            k_ff,
            feed_forward,
            target: min_target,
            min_target,
            max_target,
            integral_reset_deadband,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Create a new controller from the lift parameters.
    pub fn from_params(params: &LiftParams) -> Self {
        Self::new(
            params.k_p,
            params.k_i,
            params.k_d,
            params.k_ff,
            params.feed_forward,
            params.min_ticks,
            params.max_ticks,
            params.integral_reset_deadband_ticks,
        )
    }

    /// Replace the gains. The new gains are used from the next call to `compute`.
    pub fn configure(&mut self, k_p: f64, k_i: f64, k_d: f64, k_ff: f64) {
        self.k_p = k_p;
        self.k_i = k_i;
        self.k_d = k_d;
        self.k_ff = k_ff;
    }

    /// Set a new target, returning the target after it has been clamped to the limits.
    ///
    /// If the target moves by more than the integral reset deadband the accumulators are reset,
    /// so that windup from the previous target does not carry over to the new one.
    pub fn set_target(&mut self, value: f64) -> f64 {
        let clamped = value.max(self.min_target).min(self.max_target);

        if (clamped - self.target).abs() > self.integral_reset_deadband {
            trace!(
                "PID target moved from {} to {}, resetting accumulators",
                self.target,
                clamped
            );
            self.reset();
        }

        self.target = clamped;
        clamped
    }

    /// The current (clamped) target.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Clear the integral accumulation and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }

    /// The feed-forward term for the current target, before the feed-forward gain is applied.
    pub fn feed_forward_term(&self) -> f64 {
        match self.feed_forward {
            FeedForward::Constant => 1f64,
            FeedForward::ArmCosine { ticks_per_deg } => {
                (self.target / ticks_per_deg).to_radians().cos()
            }
        }
    }

    /// Get the output of the controller for the given measurement.
    ///
    /// `dt_s` is the time since the previous call. It must be positive and finite, otherwise
    /// `ControlError::InvalidControlInput` is returned and the controller is left untouched.
    pub fn compute(&mut self, measurement: f64, dt_s: f64) -> Result<f64, ControlError> {
        if !(dt_s > 0f64) || !dt_s.is_finite() || !measurement.is_finite() {
            return Err(ControlError::InvalidControlInput { dt_s, measurement });
        }

        let error = self.target - measurement;

        // Accumulate the integral term
        self.integral += error * dt_s;

        // Calculate the derivative. There is no derivative on the first sample since there's
        // nothing to difference against.
        let deriv = match self.prev_error {
            Some(e) => (error - e) / dt_s,
            None => 0f64,
        };

        // Calculate the output
        let out = self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv
            + self.k_ff * self.feed_forward_term();

        // Remember the previous error
        self.prev_error = Some(error);

        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn controller() -> PidController {
        PidController::new(
            0.01,
            0.001,
            0.0005,
            0.1,
            FeedForward::Constant,
            0.0,
            2900.0,
            50.0,
        )
    }

    #[test]
    fn test_pid_reference_sequence() {
        let mut pid = controller();
        pid.set_target(100.0);

        // Worked by hand:
        //  e = 100, i = 2.0, d = 0     -> 1.0 + 0.002 + 0 + 0.1
        //  e = 90,  i = 3.8, d = -500  -> 0.9 + 0.0038 - 0.25 + 0.1
        //  e = 70,  i = 5.2, d = -1000 -> 0.7 + 0.0052 - 0.5 + 0.1
        let expected = [1.102, 0.7538, 0.3052];

        for (meas, exp) in [0.0, 10.0, 30.0].iter().zip(expected.iter()) {
            let out = pid.compute(*meas, 0.02).unwrap();
            assert!((out - exp).abs() < 1e-9, "got {}, expected {}", out, exp);
        }

        assert!((pid.integral() - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_dt() {
        let mut pid = controller();
        pid.set_target(100.0);
        pid.compute(0.0, 0.02).unwrap();
        let integral = pid.integral();

        assert_eq!(
            pid.compute(10.0, 0.0),
            Err(ControlError::InvalidControlInput {
                dt_s: 0.0,
                measurement: 10.0
            })
        );
        assert!(pid.compute(10.0, -0.02).is_err());
        assert!(pid.compute(10.0, f64::NAN).is_err());

        // State is unchanged, so the next valid call differences against the first sample
        assert_eq!(pid.integral(), integral);
        let out = pid.compute(10.0, 0.02).unwrap();
        let expected = 0.9 + 0.001 * 3.8 + 0.0005 * (-500.0) + 0.1;
        assert!((out - expected).abs() < 1e-9);
    }

    #[test]
    fn test_target_clamp_and_reset() {
        let mut pid = controller();

        assert_eq!(pid.set_target(5000.0), 2900.0);
        assert_eq!(pid.set_target(-10.0), 0.0);

        pid.set_target(1000.0);
        pid.compute(900.0, 0.1).unwrap();
        assert!(pid.integral() > 0.0);

        // Small move within the deadband keeps the integral
        pid.set_target(1040.0);
        assert!(pid.integral() > 0.0);

        // Large move resets it
        pid.set_target(2000.0);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_configure() {
        let mut pid = controller();
        pid.set_target(100.0);
        pid.configure(0.02, 0.0, 0.0, 0.0);

        let out = pid.compute(50.0, 0.02).unwrap();
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_arm_cosine_feed_forward() {
        let mut pid = PidController::new(
            0.0,
            0.0,
            0.0,
            0.5,
            FeedForward::ArmCosine { ticks_per_deg: 10.0 },
            0.0,
            1800.0,
            10.0,
        );

        pid.set_target(0.0);
        assert!((pid.compute(0.0, 0.02).unwrap() - 0.5).abs() < 1e-12);

        pid.set_target(600.0);
        assert!((pid.compute(0.0, 0.02).unwrap() - 0.25).abs() < 1e-12);

        pid.set_target(900.0);
        assert!(pid.compute(0.0, 0.02).unwrap().abs() < 1e-12);
    }
}
