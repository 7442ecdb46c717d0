//! Parameters structure for teleoperation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for teleoperated control.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {

    // ---- LIFT ----

    /// Lift preset selected with Y.
    ///
    /// Units: encoder ticks
    pub lift_high_ticks: f64,

    /// Lift preset selected with X.
    ///
    /// Units: encoder ticks
    pub lift_medium_ticks: f64,

    /// Lift preset selected with B.
    ///
    /// Units: encoder ticks
    pub lift_low_ticks: f64,

    /// Lift preset selected with A, also the lowest manual target.
    ///
    /// Units: encoder ticks
    pub lift_drive_ticks: f64,

    /// Change in lift target per cycle with the stick fully deflected.
    ///
    /// Units: encoder ticks
    pub lift_increment_ticks: f64,

    /// Stick deflection below which the stick reads as zero.
    pub stick_deadzone: f64,

    // ---- GRIPPER ----

    /// Trigger level at which a trigger counts as pressed.
    pub trigger_full_press: f64,

    // ---- DRIVE ----

    /// Fraction of the drive power removed with the lift at the high preset.
    pub limit_ramp: f64,

    /// Turbo with neither driver trigger pressed.
    pub turbo_base: f64,

    /// Turbo added by the right driver trigger at full press.
    pub turbo_gain: f64,

    /// Turbo removed by the left driver trigger at full press.
    pub slow_gain: f64,

    /// If true drive demands are relative to the field rather than the robot.
    pub field_centric: bool,
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.lift_high_ticks <= self.lift_drive_ticks {
            return Err(format!(
                "lift_high_ticks ({}) must be above lift_drive_ticks ({})",
                self.lift_high_ticks, self.lift_drive_ticks
            ));
        }

        for (name, preset) in [
            ("lift_medium_ticks", self.lift_medium_ticks),
            ("lift_low_ticks", self.lift_low_ticks),
        ]
        .iter()
        {
            if *preset < self.lift_drive_ticks || *preset > self.lift_high_ticks {
                return Err(format!("{} ({}) is outside the lift range", name, preset));
            }
        }

        if !(0.0..=1.0).contains(&self.limit_ramp) {
            return Err(format!("limit_ramp ({}) must be in [0, 1]", self.limit_ramp));
        }

        if self.trigger_full_press <= 0.0 || self.trigger_full_press > 1.0 {
            return Err(format!(
                "trigger_full_press ({}) must be in (0, 1]",
                self.trigger_full_press
            ));
        }

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
    fn test_shipped_params() {
        let params: Params =
            util::params::load_str(include_str!("../../../params/teleop.toml")).unwrap();

        assert_eq!(params.lift_high_ticks, 2900.0);
        assert_eq!(params.lift_medium_ticks, 2100.0);
        assert_eq!(params.lift_low_ticks, 1250.0);
        assert_eq!(params.lift_drive_ticks, 0.0);
        assert!(params.field_centric);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_presets() {
        let mut params: Params =
            util::params::load_str(include_str!("../../../params/teleop.toml")).unwrap();
        params.lift_low_ticks = 3000.0;
        assert!(params.validate().is_err());
    }
}
