// src/pid/compute.rs

//! # PID Compute Callbacks
//!
//! This module provides the control data structure and the compute callbacks
//! handed to [`piddiy::PidController`]. Each callback returns the
//! `(error, integral, derivative)` triple that the controller weights with
//! its gains. The callbacks differ only in where the derivative comes from.

use crate::Number;
use piddiy::PidController;

/// Direction in which the previous output hit its clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Saturation {
    /// The output was inside its bounds.
    #[default]
    None,
    /// The output was clamped to its upper bound.
    Upper,
    /// The output was clamped to its lower bound.
    Lower,
}

/// Control data for the loop compute callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopControlData<T> {
    /// The measured value of the controlled quantity.
    pub measurement: T,
    /// The measurement from the previous tick.
    pub previous_measurement: T,
    /// The time delta since the last computation.
    pub dt: T,
    /// The maximum magnitude of the integral term.
    pub integral_limit: T,
    /// Saturation state of the previous output, used for anti-windup.
    pub saturation: Saturation,
    /// False on the first tick after a reset. The error and derivative
    /// memories are not valid yet, so only the proportional term is used.
    pub primed: bool,
}

/// Loop compute callback taking the derivative of the error.
///
/// Reacts to setpoint steps as well as to disturbances.
pub fn compute_error_derivative<T: Number>(
    pid: &mut PidController<T, LoopControlData<T>>,
    data: LoopControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    if !data.primed {
        return (error, T::zero(), T::zero());
    }
    let integral = integrate(pid.integral, error, &data);
    let derivative = (error - pid.error) / data.dt;

    (error, integral, derivative)
}

/// Loop compute callback taking the negated derivative of the measurement.
///
/// Ignores setpoint steps, so stick inputs and outer loop outputs do not
/// produce derivative kicks.
pub fn compute_measurement_derivative<T: Number>(
    pid: &mut PidController<T, LoopControlData<T>>,
    data: LoopControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    if !data.primed {
        return (error, T::zero(), T::zero());
    }
    let integral = integrate(pid.integral, error, &data);
    let derivative = (data.previous_measurement - data.measurement) / data.dt;

    (error, integral, derivative)
}

// Conditional integration: hold the integral while the output is clamped and
// the error would push it further into the clamp.
fn integrate<T: Number>(integral: T, error: T, data: &LoopControlData<T>) -> T {
    let winding_up = match data.saturation {
        Saturation::None => false,
        Saturation::Upper => error > T::zero(),
        Saturation::Lower => error < T::zero(),
    };
    if winding_up {
        integral
    } else {
        (integral + error * data.dt).clamp(-data.integral_limit, data.integral_limit)
    }
}
