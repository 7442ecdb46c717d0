//! # Telemetry interface
//!
//! Telemetry is write-only from the engine's point of view. Values are formatted by the caller and
//! handed over as key/value pairs, the sink decides when and how to display them.

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The telemetry collaborator.
pub trait Telemetry {
    /// Record a value for display.
    fn put(&mut self, key: &str, value: String);

    /// Publish everything recorded since the last flush.
    fn flush(&mut self) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A telemetry sink which discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn put(&mut self, _key: &str, _value: String) {}
}
