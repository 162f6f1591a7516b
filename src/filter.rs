// src/filter.rs

//! # Complementary Filter
//!
//! Fuses the integrated gyro rate with the accelerometer angle:
//!
//! ```text
//! position = coeff * (position + rate * dt) + (1 - coeff) * accel_angle
//! coeff    = time_constant / (dt + time_constant)
//! ```
//!
//! The gyro term carries the short term dynamics and the accelerometer term
//! removes the long term drift. A longer time constant pushes `coeff` toward
//! one: more gyro trust, more drift, less accelerometer noise.
//!
//! The coefficient depends on the measured period of each tick, so it is
//! recomputed whenever the period changes.

use crate::error::{Result, StabilizationError};
use crate::Number;

/// Computes the blend coefficient for a time constant and a loop period.
pub fn coefficient_for<T: Number>(time_constant: T, dt: T) -> T {
    time_constant / (dt + time_constant)
}

/// Computes the time constant that a coefficient represents at a loop period.
///
/// Inverse of [`coefficient_for`]: `coeff * dt / (1 - coeff)`.
pub fn time_constant_for<T: Number>(coefficient: T, dt: T) -> T {
    coefficient * dt / (T::one() - coefficient)
}

/// Complementary filter state shared by the horizontal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryFilter<T> {
    time_constant: T,
    period: T,
    coefficient: T,
}

impl<T: Number> ComplementaryFilter<T> {
    /// Creates a filter with the given time constant, in seconds.
    ///
    /// The coefficient stays at zero (pure accelerometer) until the first
    /// period is known.
    pub fn new(time_constant: T) -> Result<Self> {
        if !time_constant.is_finite_number() || time_constant <= T::zero() {
            return Err(StabilizationError::InvalidTimeConstant);
        }
        Ok(ComplementaryFilter {
            time_constant,
            period: T::zero(),
            coefficient: T::zero(),
        })
    }

    /// Creates a filter from a fixed coefficient tuned at a nominal period.
    ///
    /// The time constant is derived from the pair, so later periods still
    /// produce a coefficient consistent with it.
    pub fn with_coefficient(coefficient: T, dt: T) -> Result<Self> {
        let valid = coefficient.is_finite_number()
            && T::zero() < coefficient
            && coefficient < T::one();
        if !valid {
            return Err(StabilizationError::InvalidCoefficient);
        }
        let mut filter = Self::new(time_constant_for(coefficient, dt))?;
        filter.set_period(dt);
        Ok(filter)
    }

    /// The configured time constant, in seconds.
    pub fn time_constant(&self) -> T {
        self.time_constant
    }

    /// The coefficient for the last period seen.
    pub fn coefficient(&self) -> T {
        self.coefficient
    }

    /// The weight of the accelerometer term, `1 - coefficient`.
    pub fn complement(&self) -> T {
        T::one() - self.coefficient
    }

    /// The last period seen, in seconds.
    pub fn period(&self) -> T {
        self.period
    }

    /// Updates the coefficient for a new loop period. Non-positive or
    /// non-finite periods are ignored.
    pub fn set_period(&mut self, dt: T) {
        if !dt.is_finite_number() || dt <= T::zero() || dt == self.period {
            return;
        }
        self.period = dt;
        self.coefficient = coefficient_for(self.time_constant, dt);
    }

    /// Computes the fused angle for one tick.
    ///
    /// - `position`: The fused angle from the previous tick, in degrees.
    /// - `rate`: The gyro rate, in degrees per second.
    /// - `accel_angle`: The accelerometer derived angle, in degrees.
    /// - `dt`: The measured period of this tick, in seconds.
    pub fn fuse(&mut self, position: T, rate: T, accel_angle: T, dt: T) -> T {
        self.set_period(dt);
        self.coefficient * (position + rate * dt) + self.complement() * accel_angle
    }
}
