//! # Bot library.
//!
//! This library allows other crates in the workspace, the benchmarks and the executable to access
//! the items defined inside the bot crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator control - mechanism targets and the closed loop lift controller
pub mod act_ctrl;

/// Autonomous control - runs routines through the trajectory sequencer
pub mod auto;

/// Wrist interlock - keeps the wrist from flipping while the lift is too low
pub mod interlock;

/// Executable parameters
pub mod params;

/// Per-match robot state shared by the control cycles
pub mod robot_state;

/// Simulated collaborators, used when running without hardware
pub mod sim;

/// Teleoperated control - turns operator inputs into mechanism and drive demands
pub mod teleop;

/// Telemetry logger - writes telemetry frames to the session
pub mod tm_logger;

/// Trajectory sequencer - builds and executes plans of path segments and markers
pub mod traj_seq;
