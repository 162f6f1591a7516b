// src/axis.rs

//! # Axis Indexed State
//!
//! Per-axis quantities are stored in fixed three element arrays indexed by
//! the [`Axis`] enumeration rather than in per-axis objects.

use core::ops::{Index, IndexMut};

/// Rotation axis of the airframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Rotation around the longitudinal axis.
    Roll = 0,
    /// Rotation around the lateral axis.
    Pitch = 1,
    /// Rotation around the vertical axis.
    Yaw = 2,
}

impl Axis {
    /// Every axis, in storage order.
    pub const ALL: [Axis; 3] = [Axis::Roll, Axis::Pitch, Axis::Yaw];

    /// Storage index of the axis.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value per axis, indexed by [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerAxis<T>(pub [T; 3]);

impl<T: Copy> PerAxis<T> {
    /// Creates a value from its roll, pitch and yaw components.
    pub const fn new(roll: T, pitch: T, yaw: T) -> Self {
        PerAxis([roll, pitch, yaw])
    }

    /// Creates a value with the same component on every axis.
    pub const fn splat(value: T) -> Self {
        PerAxis([value; 3])
    }

    /// Roll component.
    pub fn roll(&self) -> T {
        self[Axis::Roll]
    }

    /// Pitch component.
    pub fn pitch(&self) -> T {
        self[Axis::Pitch]
    }

    /// Yaw component.
    pub fn yaw(&self) -> T {
        self[Axis::Yaw]
    }
}

impl<T> Index<Axis> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        &self.0[axis.index()]
    }
}

impl<T> IndexMut<Axis> for PerAxis<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self.0[axis.index()]
    }
}

/// Measured angular state of the airframe.
///
/// Rebuilt every tick from the attitude estimator and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularState<T> {
    /// Angular velocity in degrees per second, gyro only.
    pub rate: PerAxis<T>,
    /// Angular displacement in degrees, gyro and accelerometer fused.
    pub position: PerAxis<T>,
}

impl<T: Copy> AngularState<T> {
    /// Creates a state with every rate and position set to `zero`.
    pub const fn at_rest(zero: T) -> Self {
        AngularState {
            rate: PerAxis::splat(zero),
            position: PerAxis::splat(zero),
        }
    }
}
