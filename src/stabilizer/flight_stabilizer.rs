// src/stabilizer/flight_stabilizer.rs

//! A module specifying the shared interface for the roll and pitch
//! stabilization cascades. Each cascade owns its own control loops by value,
//! so resetting one cascade never disturbs another.

use core::fmt;

use crate::error::Result;
use crate::pid::LoopConfig;
use crate::AngularState;
use piddiy::Number as PiddiyNumber;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// Returns false for NaN and infinities.
    ///
    /// `x - x` is zero for every finite value and NaN otherwise, which also
    /// holds trivially for fixed point types.
    fn is_finite_number(self) -> bool {
        self - self == Self::zero()
    }
}

impl<T: PiddiyNumber> Number for T {}

/// Gains for the roll and pitch loops of one cascade tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig<T> {
    /// Roll loop configuration.
    pub roll: LoopConfig<T>,
    /// Pitch loop configuration.
    pub pitch: LoopConfig<T>,
}

impl<T: Number> CascadeConfig<T> {
    /// Uses the same loop configuration on roll and pitch.
    pub fn symmetric(config: LoopConfig<T>) -> Self {
        CascadeConfig {
            roll: config,
            pitch: config,
        }
    }

    /// Checks both loop configurations.
    pub fn validate(&self) -> Result<()> {
        self.roll.validate()?;
        self.pitch.validate()
    }
}

impl<T: fmt::Display> fmt::Display for CascadeConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  roll:  {}", self.roll)?;
        writeln!(f, "  pitch: {}", self.pitch)
    }
}

/// A trait for roll and pitch stabilizers driven by the engine once per tick.
pub trait FlightStabilizer<T: Number> {
    /// Takes the desired set points and the measured angular state, then
    /// computes the roll and pitch corrections.
    ///
    /// - `set_point`: A tuple of (roll, pitch) set points. Rates in degrees
    ///   per second or angles in degrees, depending on the stabilizer.
    /// - `state`: The measured angular rates and positions.
    /// - `dt`: Time delta since the last update, in seconds.
    ///
    /// Returns a tuple of (roll correction, pitch correction).
    fn control(&mut self, set_point: (T, T), state: &AngularState<T>, dt: T) -> (T, T);

    /// Zeroes the integrators and derivative memories of every loop.
    fn reset(&mut self);
}
