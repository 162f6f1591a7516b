// src/hal.rs

//! # Collaborator Interfaces
//!
//! Traits for the hardware-facing collaborators the engine drives: the
//! attitude estimator, the pilot command source and the motor actuation.
//! Sensor drivers, receiver decoding and PWM generation live behind these
//! traits and are not part of this crate.

use crate::mixing::MotorCommands;
use crate::{Axis, PerAxis};

/// Flying mode selected by the pilot or forced by a failsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Motors held at minimum power, every control loop reset.
    #[default]
    Idle,
    /// Rate mode: sticks command angular rates.
    Accro,
    /// Self-leveling mode: sticks command tilt angles.
    Angle,
}

/// Inertial measurements after offset calibration.
pub trait AttitudeEstimator<T> {
    /// Whether the zero-rate and zero-angle offsets have been computed.
    fn are_offsets_computed(&self) -> bool;

    /// Computes and stores the offsets. Called while the vehicle is
    /// stationary and level.
    fn compute_offsets(&mut self);

    /// Offset-corrected gyro rates, in degrees per second.
    fn angular_rates(&mut self) -> PerAxis<T>;

    /// Offset-corrected accelerometer angles, in degrees. The yaw component
    /// is ignored, as gravity carries no heading information.
    fn accel_angles(&mut self) -> PerAxis<T>;
}

/// Pilot commands after receiver decoding.
pub trait CommandSource<T> {
    /// Stick demand on an axis, normalized to `[-1, 1]`.
    fn demand(&mut self, axis: Axis) -> T;

    /// The flying mode selected for this tick.
    fn flying_mode(&mut self) -> Mode;

    /// Throttle command mapped onto `[min_power, max_throttle]`.
    fn throttle(&mut self, min_power: i32, max_throttle: i32) -> i32;
}

/// Motor power output for `N` motors.
pub trait MotorActuation<const N: usize> {
    /// Opaque capability over the timer count and compare registers used to
    /// generate the PWM signal.
    type Timer;

    /// Hands the timer capability over to the actuation.
    fn attach_timer(&mut self, timer: Self::Timer);

    /// Highest power a motor may be commanded.
    fn max_power(&self) -> i32;

    /// Lowest power a motor may be commanded; motors spin down or idle here.
    fn min_power(&self) -> i32;

    /// Share of the power range available to the throttle, in percent.
    fn max_throttle_percent(&self) -> i32;

    /// Highest throttle command, leaving headroom for attitude corrections.
    fn max_throttle(&self) -> i32;

    /// Throttle below which the vehicle is considered on the ground.
    fn idle_threshold(&self) -> i32;

    /// Writes one tick's motor commands. Every value is within
    /// `[min_power, max_power]`.
    fn dispatch(&mut self, commands: &MotorCommands<N>);
}
