// src/stabilizer/rate.rs

//! # Rate Stabilizer
//!
//! Roll and pitch stabilization for Accro mode. The pilot's stick commands an
//! angular rate, and one rate loop per axis tracks it against the gyro.
//! No position tier runs in this mode.

use crate::pid::ControlLoop;
use crate::{Axis, AngularState, CascadeConfig, FlightStabilizer, Number};

/// Struct representing the Accro mode rate stabilizer.
pub struct RateStabilizer<T: Number> {
    pub(crate) roll: ControlLoop<T>,
    pub(crate) pitch: ControlLoop<T>,
}

impl<T: Number> RateStabilizer<T> {
    /// Creates a new stabilizer using the provided configuration.
    pub fn with_config(config: CascadeConfig<T>) -> Self {
        RateStabilizer {
            roll: ControlLoop::with_config(config.roll),
            pitch: ControlLoop::with_config(config.pitch),
        }
    }

    /// Applies a new configuration and resets both loops.
    pub fn configure(&mut self, config: CascadeConfig<T>) {
        self.roll.configure(config.roll);
        self.pitch.configure(config.pitch);
    }
}

impl<T: Number> FlightStabilizer<T> for RateStabilizer<T> {
    fn control(&mut self, set_point: (T, T), state: &AngularState<T>, dt: T) -> (T, T) {
        let (set_point_roll, set_point_pitch) = set_point;
        let roll_output = self
            .roll
            .compute(set_point_roll, state.rate[Axis::Roll], dt);
        let pitch_output = self
            .pitch
            .compute(set_point_pitch, state.rate[Axis::Pitch], dt);

        (roll_output, pitch_output)
    }

    fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
    }
}
