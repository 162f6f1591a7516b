// src/stabilizer/angle.rs

//! # Angle Stabilizer
//!
//! Self-leveling roll and pitch stabilization for Angle mode, built as a
//! cascade. The outer position loop compares the commanded tilt with the
//! fused attitude, and its output becomes the set point of the inner rate
//! loop, which compares it with the gyro. The rate loops are separate
//! instances from the Accro ones, so integrator state never crosses modes.

use crate::pid::ControlLoop;
use crate::{Axis, AngularState, CascadeConfig, FlightStabilizer, Number};

/// Struct representing the Angle mode cascade stabilizer.
pub struct AngleStabilizer<T: Number> {
    pub(crate) position_roll: ControlLoop<T>,
    pub(crate) position_pitch: ControlLoop<T>,
    pub(crate) rate_roll: ControlLoop<T>,
    pub(crate) rate_pitch: ControlLoop<T>,
}

impl<T: Number> AngleStabilizer<T> {
    /// Creates a new stabilizer from the outer (position) and inner (rate)
    /// tier configurations.
    pub fn with_config(position_config: CascadeConfig<T>, rate_config: CascadeConfig<T>) -> Self {
        AngleStabilizer {
            position_roll: ControlLoop::with_config(position_config.roll),
            position_pitch: ControlLoop::with_config(position_config.pitch),
            rate_roll: ControlLoop::with_config(rate_config.roll),
            rate_pitch: ControlLoop::with_config(rate_config.pitch),
        }
    }

    /// Applies new tier configurations and resets every loop.
    pub fn configure(&mut self, position_config: CascadeConfig<T>, rate_config: CascadeConfig<T>) {
        self.position_roll.configure(position_config.roll);
        self.position_pitch.configure(position_config.pitch);
        self.rate_roll.configure(rate_config.roll);
        self.rate_pitch.configure(rate_config.pitch);
    }
}

impl<T: Number> FlightStabilizer<T> for AngleStabilizer<T> {
    fn control(&mut self, set_point: (T, T), state: &AngularState<T>, dt: T) -> (T, T) {
        let (set_point_roll, set_point_pitch) = set_point;

        // Outer loop: angle error to desired rate
        let rate_set_point_roll =
            self.position_roll
                .compute(set_point_roll, state.position[Axis::Roll], dt);
        let rate_set_point_pitch =
            self.position_pitch
                .compute(set_point_pitch, state.position[Axis::Pitch], dt);

        // Inner loop: rate error to correction
        let roll_output = self
            .rate_roll
            .compute(rate_set_point_roll, state.rate[Axis::Roll], dt);
        let pitch_output = self
            .rate_pitch
            .compute(rate_set_point_pitch, state.rate[Axis::Pitch], dt);

        (roll_output, pitch_output)
    }

    fn reset(&mut self) {
        self.position_roll.reset();
        self.position_pitch.reset();
        self.rate_roll.reset();
        self.rate_pitch.reset();
    }
}
