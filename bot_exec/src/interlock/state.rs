//! Implementations for the WristInterlock state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::{InterlockError, InterlockState, Params};
use bot_if::eqpt::mech::WristSide;
use util::{module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wrist interlock module state
#[derive(Debug, Default, Clone)]
pub struct WristInterlock {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// Executing state
    state: InterlockState,

    /// The lift target to return to once a flip has completed
    saved_lift_target: f64,

    /// Time spent in `Flipping`
    settle_timer_s: f64,
}

/// Input data to the interlock.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// True if the operator requested a wrist flip this cycle
    pub toggle_requested: bool,

    /// A new lift target set by the operator this cycle, if any
    pub lift_override: Option<f64>,

    /// Measured lift position
    pub lift_pos_ticks: f64,

    /// Current lift target
    pub lift_target_ticks: f64,

    /// Current wrist side
    pub wrist_side: WristSide,

    /// Time since the previous cycle
    pub dt_s: f64,
}

/// Targets produced by the interlock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputData {
    pub lift_target_ticks: f64,
    pub wrist_side: WristSide,
}

/// Status report for interlock processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// State at the end of the cycle
    pub state: InterlockState,

    /// The wrist was flipped this cycle
    pub flipped: bool,

    /// A toggle request was ignored because a sequence is in progress
    pub toggle_ignored: bool,

    /// A sequence was abandoned because the operator overrode the lift target
    pub aborted: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for WristInterlock {
    type InitData = &'static str;
    type InitError = InterlockError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = InterlockError;

    /// Initialise the interlock.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: Params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(InterlockError::ParamLoadError(e)),
        };

        *self = Self::with_params(params)?;

        Ok(())
    }

    /// Step the interlock by one cycle.
    ///
    /// The settle timer only advances on a positive `dt_s`.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let mut output = OutputData {
            lift_target_ticks: input_data.lift_target_ticks,
            wrist_side: input_data.wrist_side,
        };

        // Manual intervention always wins
        if let Some(target) = input_data.lift_override {
            output.lift_target_ticks = target;

            if self.state != InterlockState::Normal {
                info!(
                    "Lift target overridden to {} during {:?}, abandoning wrist sequence",
                    target, self.state
                );
                self.report.aborted = true;
                self.report.toggle_ignored = input_data.toggle_requested;
                self.state = InterlockState::Normal;
                self.report.state = self.state;
                return Ok((output, self.report));
            }
        }

        // Mode execution. Each of the mode functions returns the state to switch to.
        self.state = match self.state {
            InterlockState::Normal => self.mode_normal(input_data, &mut output),
            InterlockState::Raising => self.mode_raising(input_data, &mut output),
            InterlockState::Flipping => self.mode_flipping(input_data, &mut output),
            InterlockState::Lowering => self.mode_lowering(input_data),
        };

        self.report.state = self.state;

        Ok((output, self.report))
    }
}

impl WristInterlock {
    /// Create a new interlock from already loaded parameters.
    pub fn with_params(params: Params) -> Result<Self, InterlockError> {
        params.validate().map_err(InterlockError::InvalidParams)?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// The current state.
    pub fn state(&self) -> InterlockState {
        self.state
    }

    /// The report from the last call to `proc`.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Mode normal.
    ///
    /// A toggle request flips immediately if the lift is high enough, otherwise the lift is
    /// raised first.
    fn mode_normal(&mut self, input: &InputData, output: &mut OutputData) -> InterlockState {
        if !input.toggle_requested {
            return InterlockState::Normal;
        }

        if input.lift_pos_ticks >= self.params.safe_threshold_ticks {
            self.flip(output);
            return InterlockState::Normal;
        }

        self.saved_lift_target = output.lift_target_ticks;
        output.lift_target_ticks = self.params.safe_threshold_ticks;

        info!(
            "Wrist flip requested with lift at {}, raising to {}",
            input.lift_pos_ticks, self.params.safe_threshold_ticks
        );

        InterlockState::Raising
    }

    /// Mode raising.
    ///
    /// Hold the lift at the threshold until it gets there, then flip.
    fn mode_raising(&mut self, input: &InputData, output: &mut OutputData) -> InterlockState {
        self.ignore_toggle(input);

        output.lift_target_ticks = self.params.safe_threshold_ticks;

        if input.lift_pos_ticks >= self.params.safe_threshold_ticks - self.params.tolerance_ticks {
            self.flip(output);
            self.settle_timer_s = 0.0;
            debug!("Lift clear, waiting {} s for the wrist", self.params.settle_s);
            InterlockState::Flipping
        } else {
            InterlockState::Raising
        }
    }

    /// Mode flipping.
    ///
    /// Wait for the wrist to settle before restoring the lift target.
    fn mode_flipping(&mut self, input: &InputData, output: &mut OutputData) -> InterlockState {
        self.ignore_toggle(input);

        if input.dt_s > 0.0 {
            self.settle_timer_s += input.dt_s;
        }

        if self.settle_timer_s >= self.params.settle_s {
            output.lift_target_ticks = self.saved_lift_target;
            debug!("Wrist settled, lowering lift to {}", self.saved_lift_target);
            InterlockState::Lowering
        } else {
            InterlockState::Flipping
        }
    }

    /// Mode lowering.
    ///
    /// Wait for the lift to return to its previous target.
    fn mode_lowering(&mut self, input: &InputData) -> InterlockState {
        self.ignore_toggle(input);

        if util::maths::within(
            input.lift_pos_ticks,
            self.saved_lift_target,
            self.params.tolerance_ticks,
        ) {
            info!("Wrist sequence complete");
            InterlockState::Normal
        } else {
            InterlockState::Lowering
        }
    }

    fn flip(&mut self, output: &mut OutputData) {
        output.wrist_side = output.wrist_side.flipped();
        self.report.flipped = true;
        info!("Wrist flipped to {:?}", output.wrist_side);
    }

    fn ignore_toggle(&mut self, input: &InputData) {
        if input.toggle_requested {
            debug!("Wrist toggle ignored during {:?}", self.state);
            self.report.toggle_ignored = true;
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn interlock() -> WristInterlock {
        WristInterlock::with_params(Params {
            safe_threshold_ticks: 350.0,
            tolerance_ticks: 10.0,
            settle_s: 1.0,
        })
        .unwrap()
    }

    /// Step the interlock, feeding its outputs back into the next input as the robot state would.
    fn step(
        il: &mut WristInterlock,
        out: &mut OutputData,
        pos: f64,
        toggle: bool,
        lift_override: Option<f64>,
    ) -> StatusReport {
        let input = InputData {
            toggle_requested: toggle,
            lift_override,
            lift_pos_ticks: pos,
            lift_target_ticks: out.lift_target_ticks,
            wrist_side: out.wrist_side,
            dt_s: 0.25,
        };
        let (o, r) = il.proc(&input).unwrap();
        *out = o;
        r
    }

    #[test]
    fn test_flip_sequence_from_low_lift() {
        let mut il = interlock();
        let mut out = OutputData {
            lift_target_ticks: 0.0,
            wrist_side: WristSide::Front,
        };

        // Toggle with the lift down
        let r = step(&mut il, &mut out, 0.0, true, None);
        assert_eq!(r.state, InterlockState::Raising);
        assert_eq!(out.lift_target_ticks, 350.0);
        assert_eq!(out.wrist_side, WristSide::Front);

        // Still on the way up, further toggles are ignored
        let r = step(&mut il, &mut out, 200.0, true, None);
        assert_eq!(r.state, InterlockState::Raising);
        assert!(r.toggle_ignored);
        assert_eq!(out.wrist_side, WristSide::Front);

        // Reached the threshold
        let r = step(&mut il, &mut out, 350.0, false, None);
        assert_eq!(r.state, InterlockState::Flipping);
        assert!(r.flipped);
        assert_eq!(out.wrist_side, WristSide::Back);
        assert_eq!(out.lift_target_ticks, 350.0);

        // Settle for 1 s in 0.25 s steps
        for _ in 0..3 {
            let r = step(&mut il, &mut out, 350.0, false, None);
            assert_eq!(r.state, InterlockState::Flipping);
        }
        let r = step(&mut il, &mut out, 350.0, false, None);
        assert_eq!(r.state, InterlockState::Lowering);
        assert_eq!(out.lift_target_ticks, 0.0);

        // Lower back down
        let r = step(&mut il, &mut out, 120.0, false, None);
        assert_eq!(r.state, InterlockState::Lowering);
        let r = step(&mut il, &mut out, 5.0, false, None);
        assert_eq!(r.state, InterlockState::Normal);

        // Exactly one flip overall
        assert_eq!(out.wrist_side, WristSide::Back);
        assert_eq!(out.lift_target_ticks, 0.0);
    }

    #[test]
    fn test_immediate_flip_when_high() {
        let mut il = interlock();
        let mut out = OutputData {
            lift_target_ticks: 2100.0,
            wrist_side: WristSide::Back,
        };

        let r = step(&mut il, &mut out, 2095.0, true, None);
        assert_eq!(r.state, InterlockState::Normal);
        assert!(r.flipped);
        assert_eq!(out.wrist_side, WristSide::Front);
        assert_eq!(out.lift_target_ticks, 2100.0);
    }

    #[test]
    fn test_override_aborts_sequence() {
        let mut il = interlock();
        let mut out = OutputData {
            lift_target_ticks: 0.0,
            wrist_side: WristSide::Front,
        };

        step(&mut il, &mut out, 0.0, true, None);
        assert_eq!(il.state(), InterlockState::Raising);

        // Operator selects the high preset
        let r = step(&mut il, &mut out, 100.0, false, Some(2900.0));
        assert_eq!(r.state, InterlockState::Normal);
        assert!(r.aborted);
        assert_eq!(out.lift_target_ticks, 2900.0);

        // The flip is never completed, even once the lift passes the threshold
        let r = step(&mut il, &mut out, 400.0, false, None);
        assert_eq!(r.state, InterlockState::Normal);
        assert!(!r.flipped);
        assert_eq!(out.wrist_side, WristSide::Front);
    }

    #[test]
    fn test_override_while_normal_passes_through() {
        let mut il = interlock();
        let mut out = OutputData {
            lift_target_ticks: 0.0,
            wrist_side: WristSide::Front,
        };

        let r = step(&mut il, &mut out, 0.0, false, Some(1250.0));
        assert_eq!(r.state, InterlockState::Normal);
        assert!(!r.aborted);
        assert_eq!(out.lift_target_ticks, 1250.0);
    }

    #[test]
    fn test_invalid_params() {
        assert!(WristInterlock::with_params(Params {
            safe_threshold_ticks: 350.0,
            tolerance_ticks: -1.0,
            settle_s: 1.0,
        })
        .is_err());
    }
}
