//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Zero a value whose magnitude is below the deadband.
///
/// Values outside the deadband are passed through unchanged.
pub fn deadband<T>(value: T, band: T) -> T
where
    T: Float
{
    if value.abs() < band {
        T::zero()
    }
    else {
        value
    }
}

/// True if `value` is within `tolerance` of `target` (inclusive).
pub fn within<T>(value: T, target: T, tolerance: T) -> bool
where
    T: Float
{
    (value - target).abs() <= tolerance
}
