//! # Equipment Interface
//!
//! This module defines the interfaces through which the engine commands equipment. None of the
//! calls in these interfaces may block the control cycle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;
pub mod mech;
