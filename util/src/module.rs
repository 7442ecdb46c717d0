//! Cyclic module interface
//!
//! Modules which are stepped once per control cycle on plain data, without
//! touching any collaborator, implement [`State`]. Parameters are loaded by
//! `init`, and `proc` turns one cycle's inputs into outputs plus a status
//! report that the caller may log or put to telemetry.
//!
//! Drivers which own collaborators (drive, actuators, telemetry) don't fit
//! this shape and expose their own `cycle` functions instead.

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module stepped once per control cycle.
pub trait State {
    /// Data needed by `init`, usually the name of the parameter file.
    type InitData;
    type InitError;

    type InputData;
    type OutputData;
    type StatusReport;
    type ProcError;

    /// Load parameters and reset the module to its initial state.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Process one cycle.
    ///
    /// The status report describes this cycle only.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
