//! # Operator command module
//!
//! Operator commands arrive in two forms: live gamepad input during teleoperation, and
//! [`Action`]s scheduled onto a trajectory plan during autonomous operation.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod action;
pub mod gamepad;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use action::*;
pub use gamepad::*;
