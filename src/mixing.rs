// src/mixing.rs

//! # Motor Mixing
//!
//! Maps throttle and the roll, pitch and yaw corrections onto individual
//! motor powers:
//!
//! ```text
//! power[i] = throttle + weight * (±roll ±pitch ±yaw)
//! ```
//!
//! The signs of each motor follow from its position on the airframe. Every
//! value is clamped to the actuation's power bounds. Clamped authority is
//! not redistributed to the other motors; saturation is reported, not
//! corrected.

use core::ops::Index;

use num_traits::NumCast;

use crate::error::{Result, StabilizationError};
use crate::Number;

/// Contribution sign of an axis correction to one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sign {
    /// The correction adds power.
    Positive,
    /// The correction removes power.
    Negative,
    /// The motor does not take part in this axis.
    Neutral,
}

impl Sign {
    fn apply<T: Number>(self, value: T) -> T {
        match self {
            Sign::Positive => value,
            Sign::Negative => -value,
            Sign::Neutral => T::zero(),
        }
    }
}

/// Per-motor mixing signs for roll, pitch and yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorMix {
    /// Roll contribution.
    pub roll: Sign,
    /// Pitch contribution.
    pub pitch: Sign,
    /// Yaw contribution; opposite for the two spin directions.
    pub yaw: Sign,
}

impl MotorMix {
    /// Creates a motor mix from its roll, pitch and yaw signs.
    pub const fn new(roll: Sign, pitch: Sign, yaw: Sign) -> Self {
        MotorMix { roll, pitch, yaw }
    }
}

/// Index of the front right motor in [`QUAD_X`].
pub const FRONT_RIGHT: usize = 0;
/// Index of the front left motor in [`QUAD_X`].
pub const FRONT_LEFT: usize = 1;
/// Index of the rear right motor in [`QUAD_X`].
pub const REAR_RIGHT: usize = 2;
/// Index of the rear left motor in [`QUAD_X`].
pub const REAR_LEFT: usize = 3;

/// Quadcopter in X configuration. The front right and rear left motors spin
/// in one direction, the front left and rear right in the other.
pub const QUAD_X: [MotorMix; 4] = [
    MotorMix::new(Sign::Positive, Sign::Positive, Sign::Negative),
    MotorMix::new(Sign::Negative, Sign::Positive, Sign::Positive),
    MotorMix::new(Sign::Positive, Sign::Negative, Sign::Positive),
    MotorMix::new(Sign::Negative, Sign::Negative, Sign::Negative),
];

/// Power range reported by the motor actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerBounds {
    /// Lowest motor power.
    pub min: i32,
    /// Highest motor power.
    pub max: i32,
}

impl PowerBounds {
    /// Creates bounds, rejecting `min > max`.
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if max < min {
            return Err(StabilizationError::InvalidMotorBounds { min, max });
        }
        Ok(PowerBounds { min, max })
    }
}

/// One power value per motor, always inside the actuation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommands<const N: usize>(pub [i32; N]);

impl<const N: usize> MotorCommands<N> {
    /// Every motor at the same power.
    pub const fn splat(power: i32) -> Self {
        MotorCommands([power; N])
    }

    /// The power values, one per motor.
    pub fn power(&self) -> &[i32; N] {
        &self.0
    }
}

impl<const N: usize> Index<usize> for MotorCommands<N> {
    type Output = i32;

    fn index(&self, motor: usize) -> &i32 {
        &self.0[motor]
    }
}

/// Result of mixing one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixOutput<const N: usize> {
    /// Clamped motor commands.
    pub commands: MotorCommands<N>,
    /// Which motors were clamped this tick.
    pub saturated: [bool; N],
}

impl<const N: usize> MixOutput<N> {
    /// Whether any motor was clamped this tick.
    pub fn any_saturated(&self) -> bool {
        self.saturated.iter().any(|&saturated| saturated)
    }
}

/// Converts an integer power into the control number type.
pub(crate) fn from_power<T: NumCast>(power: i32) -> Result<T> {
    <T as NumCast>::from(power).ok_or(StabilizationError::NumericConversion)
}

/// Motor mixer for `N` motors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer<T, const N: usize> {
    weight: T,
    layout: [MotorMix; N],
}

impl<T: Number> Mixer<T, 4> {
    /// Mixer for a quadcopter in X configuration.
    pub fn quad_x(weight: T) -> Self {
        Mixer::new(weight, QUAD_X)
    }
}

impl<T: Number, const N: usize> Mixer<T, N> {
    /// Creates a mixer with the given per-axis weight and motor layout.
    pub fn new(weight: T, layout: [MotorMix; N]) -> Self {
        Mixer { weight, layout }
    }

    /// The per-axis mixing weight.
    pub fn weight(&self) -> T {
        self.weight
    }

    /// The motor layout.
    pub fn layout(&self) -> &[MotorMix; N] {
        &self.layout
    }

    /// Changes the per-axis mixing weight.
    pub fn set_weight(&mut self, weight: T) {
        self.weight = weight;
    }

    /// Unclamped motor powers for a throttle and a (roll, pitch, yaw) correction.
    pub fn raw(&self, throttle: T, correction: (T, T, T)) -> [T; N] {
        let (roll, pitch, yaw) = correction;
        self.layout.map(|mix| {
            let torque = mix.roll.apply(roll) + mix.pitch.apply(pitch) + mix.yaw.apply(yaw);
            throttle + self.weight * torque
        })
    }
}

impl<T: Number + NumCast, const N: usize> Mixer<T, N> {
    /// Mixes and clamps one tick of motor commands.
    ///
    /// A non-finite raw value commands minimum power and counts as saturated.
    pub fn mix(
        &self,
        throttle: T,
        correction: (T, T, T),
        bounds: PowerBounds,
    ) -> Result<MixOutput<N>> {
        let min: T = from_power(bounds.min)?;
        let max: T = from_power(bounds.max)?;

        let mut power = [bounds.min; N];
        let mut saturated = [false; N];
        for (motor, raw) in self.raw(throttle, correction).into_iter().enumerate() {
            if !raw.is_finite_number() {
                saturated[motor] = true;
                continue;
            }
            let clamped = raw.clamp(min, max);
            saturated[motor] = clamped != raw;
            power[motor] = clamped
                .to_i32()
                .map_or(bounds.min, |p| p.max(bounds.min).min(bounds.max));
        }

        Ok(MixOutput {
            commands: MotorCommands(power),
            saturated,
        })
    }
}
