// src/error.rs

//! Error type for the stabilization core.
//!
//! Only configuration problems and misuse surface as errors. Sensor glitches
//! and motor saturation are expected operating conditions and are handled in
//! the control path (held outputs, clamping) and counted in diagnostics.

use thiserror::Error;

/// Errors reported by the stabilization core.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StabilizationError {
    /// A control law was requested before the attitude offsets were computed.
    #[error("attitude offsets have not been computed")]
    Uncalibrated,

    /// The complementary filter time constant is not a positive finite value.
    #[error("filter time constant must be finite and positive")]
    InvalidTimeConstant,

    /// A filter coefficient outside the open interval (0, 1) was supplied.
    #[error("filter coefficient must lie strictly between 0 and 1")]
    InvalidCoefficient,

    /// A control loop configuration has inverted output bounds or a negative
    /// integral limit.
    #[error("control loop limits are inconsistent")]
    InvalidLoopLimits,

    /// Motor actuation reported a minimum power above its maximum power.
    #[error("motor power bounds are inverted: min {min} > max {max}")]
    InvalidMotorBounds {
        /// Reported minimum power.
        min: i32,
        /// Reported maximum power.
        max: i32,
    },

    /// An integer power value could not be represented in the control number type.
    #[error("value cannot be represented in the control number type")]
    NumericConversion,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, StabilizationError>;
