//! Wrist interlock parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the wrist interlock
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {
    /// Lowest lift position at which the wrist may be flipped
    pub safe_threshold_ticks: f64,

    /// Tolerance used when checking that the lift has reached a target
    pub tolerance_ticks: f64,

    /// Time allowed for the wrist to complete a flip before the lift is lowered
    pub settle_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable, returning a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.safe_threshold_ticks.is_finite() {
            return Err(format!(
                "safe threshold must be finite, got {}",
                self.safe_threshold_ticks
            ));
        }
        if !(self.tolerance_ticks >= 0.0) {
            return Err(format!(
                "tolerance must not be negative, got {}",
                self.tolerance_ticks
            ));
        }
        if !(self.settle_s >= 0.0) {
            return Err(format!(
                "settle time must not be negative, got {}",
                self.settle_s
            ));
        }
        Ok(())
    }
}
