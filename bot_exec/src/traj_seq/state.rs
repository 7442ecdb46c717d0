//! Trajectory sequencer executor state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::*;
use bot_if::{
    eqpt::drive::{Drive, DriveError},
    tc::{Action, ActionId},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Receiver of marker actions.
///
/// Dispatch must not block. An error disables every remaining marker carrying the same
/// [`ActionId`] for the rest of the plan.
pub trait ActionSink {
    fn dispatch(&mut self, action: &Action) -> Result<(), ActionError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory sequencer executor
pub struct TrajSeq {
    params: Params,

    /// Executing mode
    mode: ExecStatus,

    report: StatusReport,

    /// The executing plan
    plan: Option<TrajectoryPlan>,

    /// Index of the current step
    step_index: usize,

    /// True once the current step has been started
    step_started: bool,

    /// Time spent in the current step
    step_elapsed_s: f64,

    /// Arc length of all completed segments
    completed_displacement: f64,

    /// Time since the start of the plan
    elapsed_s: f64,

    /// Arc length travelled since the start of the plan
    displacement: f64,

    /// Actual start time of each step, plus the end of the final step. `None` until reached.
    step_start_times: Vec<Option<f64>>,

    /// Time since the last step completed
    settle_elapsed_s: f64,

    /// True once the final pose has been reached
    settled: bool,

    /// Marker processed flags, in declaration order
    processed: Vec<bool>,

    /// Actions which have faulted during this plan
    faulted: HashSet<ActionId>,

    /// Cancellation requested with `cancel`
    cancel_requested: bool,
}

/// Status report for sequencer processing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Time since the start of the plan
    pub elapsed_s: f64,

    /// Arc length travelled since the start of the plan
    pub displacement: f64,

    /// Index of the executing step
    pub step_index: usize,

    /// Markers fired since the start of the plan, including any whose action failed
    pub markers_fired: usize,

    /// Markers whose action failed
    pub markers_failed: usize,

    /// Markers skipped because an earlier action with the same ID failed
    pub markers_skipped: usize,

    /// IDs of the actions fired this cycle, in firing order
    pub fired_this_cycle: Vec<ActionId>,

    /// The drive reported an error this cycle
    pub drive_fault: Option<String>,

    /// The final pose was not reached within the settle timeout, see [`ExecStatus::TimedOut`]
    pub settle_timed_out: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of the sequencer, as returned by each call to `proc`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ExecStatus {
    /// No plan has been started
    Off,

    /// Steps are being executed
    Running,

    /// All steps are complete, waiting for the base to settle and remaining markers to fire
    Settling,

    /// The plan completed at the final pose and all markers fired
    Done,

    /// All steps completed but the base did not reach the final pose within the settle timeout.
    /// End of sequence markers are not fired.
    TimedOut,

    /// The plan was cancelled
    Cancelled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajSeq {
    /// Create a new sequencer with no plan.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            mode: ExecStatus::Off,
            report: StatusReport::default(),
            plan: None,
            step_index: 0,
            step_started: false,
            step_elapsed_s: 0.0,
            completed_displacement: 0.0,
            elapsed_s: 0.0,
            displacement: 0.0,
            step_start_times: Vec::new(),
            settle_elapsed_s: 0.0,
            settled: false,
            processed: Vec::new(),
            faulted: HashSet::new(),
            cancel_requested: false,
        }
    }

    /// Begin executing a plan.
    ///
    /// The drive's pose estimate is reset to the start of the plan. Execution begins on the next
    /// call to `proc`. Beginning a plan while another is still executing is an error.
    pub fn begin(&mut self, plan: TrajectoryPlan, drive: &mut dyn Drive) -> Result<(), TrajSeqError> {
        if self.is_active() {
            return Err(TrajSeqError::SequenceAlreadyLoaded);
        }

        drive.set_pose(plan.start());

        info!(
            "Beginning plan of {} steps and {} markers",
            plan.steps().len(),
            plan.markers().len()
        );

        let mut step_start_times = vec![None; plan.steps().len() + 1];
        step_start_times[0] = Some(0.0);

        *self = Self {
            processed: vec![false; plan.markers().len()],
            step_start_times,
            plan: Some(plan),
            mode: ExecStatus::Running,
            ..Self::new(self.params.clone())
        };

        Ok(())
    }

    /// Request cancellation of the executing plan.
    ///
    /// Takes effect at the start of the next call to `proc`, before any marker fires.
    pub fn cancel(&mut self) {
        if self.is_active() {
            self.cancel_requested = true;
        }
    }

    /// The current mode.
    pub fn mode(&self) -> ExecStatus {
        self.mode
    }

    /// True while a plan is running or settling.
    pub fn is_active(&self) -> bool {
        matches!(self.mode, ExecStatus::Running | ExecStatus::Settling)
    }

    pub fn plan(&self) -> Option<&TrajectoryPlan> {
        self.plan.as_ref()
    }

    /// The report from the last call to `proc`.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Process one cycle of the executing plan.
    ///
    /// Processing involves:
    ///  1. Checking for cancellation, either requested with `cancel` or by the `cancel` argument.
    ///  1. Advancing the elapsed time cursor by `dt_s`.
    ///  1. Advancing the current step, and the displacement cursor with it.
    ///  1. Firing all due temporal markers, then all due displacement markers. Temporal markers
    ///     are timed from the actual start of the step they precede.
    ///  1. Once all steps have completed, checking for termination and firing the end of
    ///     sequence markers.
    pub fn proc(
        &mut self,
        dt_s: f64,
        drive: &mut dyn Drive,
        sink: &mut dyn ActionSink,
        cancel: bool,
    ) -> Result<ExecStatus, TrajSeqError> {
        // Setup cycle data
        self.report.fired_this_cycle.clear();
        self.report.drive_fault = None;

        if !self.is_active() {
            return Ok(self.mode);
        }

        // Cancellation takes effect before anything else
        if cancel || self.cancel_requested {
            info!(
                "Plan cancelled at {:.3} s, {:.3} along the path",
                self.elapsed_s, self.displacement
            );
            self.mode = ExecStatus::Cancelled;
            self.cancel_requested = false;
            return Ok(self.mode);
        }

        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return Err(TrajSeqError::InvalidDt(dt_s));
        }

        self.elapsed_s += dt_s;

        // Mode execution. A drive error is recorded and the markers are still processed, so that
        // a dropped reading costs one cycle of progress rather than the plan.
        let result = match self.mode {
            ExecStatus::Running => self.mode_running(dt_s, drive),
            ExecStatus::Settling => {
                self.mode_settling(dt_s, drive);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!("Drive error during plan execution: {}", e);
            self.report.drive_fault = Some(e.to_string());
        }

        self.fire_due_markers(sink);

        // Termination
        if self.mode == ExecStatus::Settling && !self.markers_pending() {
            if self.settled {
                self.fire_end_markers(sink);
                self.mode = ExecStatus::Done;
                info!(
                    "Plan complete in {:.3} s, {} markers fired, {} skipped",
                    self.elapsed_s, self.report.markers_fired, self.report.markers_skipped
                );
            } else if self.report.settle_timed_out {
                self.mode = ExecStatus::TimedOut;
                warn!(
                    "Plan timed out in {:.3} s without reaching the final pose, end markers not \
                    fired",
                    self.elapsed_s
                );
            }
        }

        self.update_report();

        Ok(self.mode)
    }

    /// Mode running.
    ///
    /// Start the current step if needed, then advance it.
    fn mode_running(&mut self, dt_s: f64, drive: &mut dyn Drive) -> Result<(), DriveError> {
        let step = match self.plan.as_ref().and_then(|p| p.steps().get(self.step_index)) {
            Some(s) => s.clone(),
            None => {
                self.enter_settling();
                return Ok(());
            }
        };

        match step {
            Step::Segment { geom, .. } => {
                if !self.step_started {
                    drive.follow_path(&geom)?;
                    self.step_started = true;
                    self.step_elapsed_s = 0.0;
                    debug!("Started step {}, segment of length {:.3}", self.step_index, geom.length());
                }

                let progress = drive.progress(dt_s)?;
                self.step_elapsed_s = progress.elapsed_s;

                let seg_disp = progress.displacement.max(0.0).min(geom.length());
                self.displacement = self.displacement.max(self.completed_displacement + seg_disp);

                if progress.finished {
                    self.completed_displacement += geom.length();
                    self.displacement = self.displacement.max(self.completed_displacement);
                    self.next_step();
                }
            }
            Step::Wait { duration_s, .. } => {
                if !self.step_started {
                    self.step_started = true;
                    self.step_elapsed_s = 0.0;
                    debug!("Started step {}, wait of {} s", self.step_index, duration_s);
                }

                self.step_elapsed_s += dt_s;

                if self.step_elapsed_s + TRIGGER_EPSILON >= duration_s {
                    self.next_step();
                }
            }
        }

        if self.plan.as_ref().map(|p| self.step_index >= p.steps().len()) == Some(true) {
            self.enter_settling();
        }

        Ok(())
    }

    /// Mode settling.
    ///
    /// Wait until the base reaches the final pose, or the settle timeout expires.
    fn mode_settling(&mut self, dt_s: f64, drive: &mut dyn Drive) {
        self.settle_elapsed_s += dt_s;

        if self.settled {
            return;
        }

        let end = match self.plan {
            Some(ref p) => p.end(),
            None => return,
        };
        let pose = drive.get_pose();

        if pose.distance_to(&end) <= self.params.end_pos_tolerance_m
            && pose.heading_error_to(&end) <= self.params.end_head_tolerance_rad
        {
            debug!("Final pose reached");
            self.settled = true;
        } else if !self.report.settle_timed_out
            && self.settle_elapsed_s >= self.params.end_settle_timeout_s
        {
            warn!(
                "Final pose not reached within {} s ({:.3} from target)",
                self.params.end_settle_timeout_s,
                pose.distance_to(&end)
            );
            self.report.settle_timed_out = true;
        }
    }

    fn next_step(&mut self) {
        if let Some(t) = self.step_start_times.get_mut(self.step_index + 1) {
            *t = Some(self.elapsed_s);
        }
        self.step_index += 1;
        self.step_started = false;
        self.step_elapsed_s = 0.0;
    }

    fn enter_settling(&mut self) {
        if self.mode != ExecStatus::Settling {
            debug!("All steps complete, settling");
            self.mode = ExecStatus::Settling;
            self.settle_elapsed_s = 0.0;
        }
    }

    /// True if any temporal or displacement marker has not yet been processed.
    fn markers_pending(&self) -> bool {
        match self.plan {
            Some(ref p) => p
                .markers()
                .iter()
                .any(|m| m.trigger() != Trigger::EndOfSequence && !self.processed[m.index()]),
            None => false,
        }
    }

    /// Fire every temporal marker whose time has been crossed, then every displacement marker
    /// whose arc length has been crossed.
    fn fire_due_markers(&mut self, sink: &mut dyn ActionSink) {
        let due: Vec<usize> = match self.plan {
            Some(ref p) => {
                let elapsed_s = self.elapsed_s;
                let displacement = self.displacement;
                let processed = &self.processed;
                let starts = &self.step_start_times;

                let temporal = p.markers().iter().filter(|m| match m.trigger() {
                    Trigger::ElapsedTime { step, offset_s } => {
                        match starts.get(step).copied().flatten() {
                            Some(t) => t + offset_s <= elapsed_s + TRIGGER_EPSILON,
                            None => false,
                        }
                    }
                    _ => false,
                });
                let spatial = p.markers().iter().filter(|m| match m.trigger() {
                    Trigger::Displacement(d) => d <= displacement + TRIGGER_EPSILON,
                    _ => false,
                });

                temporal
                    .chain(spatial)
                    .filter(|m| !processed[m.index()])
                    .map(|m| m.index())
                    .collect()
            }
            None => return,
        };

        for index in due {
            self.fire(index, sink);
        }
    }

    fn fire_end_markers(&mut self, sink: &mut dyn ActionSink) {
        let due: Vec<usize> = match self.plan {
            Some(ref p) => p
                .markers()
                .iter()
                .filter(|m| m.trigger() == Trigger::EndOfSequence && !self.processed[m.index()])
                .map(|m| m.index())
                .collect(),
            None => return,
        };

        for index in due {
            self.fire(index, sink);
        }
    }

    /// Fire a single marker, unless its action has already faulted.
    fn fire(&mut self, index: usize, sink: &mut dyn ActionSink) {
        self.processed[index] = true;

        let (action, planned_time_s) = match self.plan {
            Some(ref p) => (
                p.markers()[index].action().clone(),
                p.markers()[index].planned_time_s(),
            ),
            None => return,
        };

        if self.faulted.contains(&action.id) {
            debug!("Skipping marker {} ({}), action has faulted", index, action.id);
            self.report.markers_skipped += 1;
            return;
        }

        match planned_time_s {
            Some(t) => debug!(
                "Firing marker {} ({}) at {:.3} s (planned {:.3} s), {:.3} along the path",
                index, action.id, self.elapsed_s, t, self.displacement
            ),
            None => debug!(
                "Firing marker {} ({}) at {:.3} s, {:.3} along the path",
                index, action.id, self.elapsed_s, self.displacement
            ),
        }
        self.report.markers_fired += 1;
        self.report.fired_this_cycle.push(action.id.clone());

        if let Err(e) = sink.dispatch(&action) {
            warn!(
                "Action {} failed: {}. Remaining markers with this action will be skipped",
                action.id, e
            );
            self.report.markers_failed += 1;
            self.faulted.insert(action.id);
        }
    }

    fn update_report(&mut self) {
        self.report.elapsed_s = self.elapsed_s;
        self.report.displacement = self.displacement;
        self.report.step_index = self.step_index;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
