// src/pid/control_loop.rs

//! # Control Loop
//!
//! A single PID loop with its own integrator, derivative memory and output
//! clamp. The stabilizers own one loop per (tier, axis) pair by value, so no
//! state is ever shared between cascades.

use core::fmt;

use crate::error::{Result, StabilizationError};
use crate::pid::{
    compute_error_derivative, compute_measurement_derivative, LoopControlData, Saturation,
};
use crate::Number;
use piddiy::PidController;

/// Source of the derivative term, fixed per loop instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DerivativeSource {
    /// Rate of change of the error. Setpoint steps produce a derivative kick.
    Error,
    /// Negated rate of change of the measurement. Setpoint steps are ignored.
    Measurement,
}

impl fmt::Display for DerivativeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivativeSource::Error => f.write_str("error"),
            DerivativeSource::Measurement => f.write_str("measurement"),
        }
    }
}

/// Gains and limits of one control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig<T> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
    /// Maximum magnitude of the integral accumulator.
    pub integral_limit: T,
    /// Lower bound of the loop output.
    pub output_min: T,
    /// Upper bound of the loop output.
    pub output_max: T,
    /// Where the derivative term is taken from.
    pub derivative: DerivativeSource,
}

impl<T: Number> LoopConfig<T> {
    /// Creates a configuration with the given gains and an output clamped to
    /// `[-output_limit, output_limit]`.
    pub fn new(kp: T, ki: T, kd: T, integral_limit: T, output_limit: T) -> Self {
        LoopConfig {
            kp,
            ki,
            kd,
            integral_limit,
            output_min: -output_limit,
            output_max: output_limit,
            derivative: DerivativeSource::Measurement,
        }
    }

    /// Sets the derivative source.
    pub fn derivative(mut self, derivative: DerivativeSource) -> Self {
        self.derivative = derivative;
        self
    }

    /// Checks that the limits are usable.
    pub fn validate(&self) -> Result<()> {
        let finite = self.kp.is_finite_number()
            && self.ki.is_finite_number()
            && self.kd.is_finite_number()
            && self.integral_limit.is_finite_number()
            && self.output_min.is_finite_number()
            && self.output_max.is_finite_number();
        if !finite || self.integral_limit < T::zero() || self.output_max < self.output_min {
            return Err(StabilizationError::InvalidLoopLimits);
        }
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for LoopConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Kp={} Ki={} Kd={} I-limit={} out=[{}, {}] D-on={}",
            self.kp,
            self.ki,
            self.kd,
            self.integral_limit,
            self.output_min,
            self.output_max,
            self.derivative
        )
    }
}

/// A PID loop with anti-windup, output clamping and a hold-last-output
/// policy for invalid inputs.
pub struct ControlLoop<T: Number> {
    pid: PidController<T, LoopControlData<T>>,
    config: LoopConfig<T>,
    previous_measurement: T,
    primed: bool,
    saturation: Saturation,
    output: T,
}

impl<T: Number> ControlLoop<T> {
    /// Creates a loop using the provided configuration.
    pub fn with_config(config: LoopConfig<T>) -> Self {
        let mut control_loop = ControlLoop {
            pid: PidController::new(),
            config,
            previous_measurement: T::zero(),
            primed: false,
            saturation: Saturation::None,
            output: T::zero(),
        };
        control_loop.configure(config);
        control_loop
    }

    /// Applies a new configuration and resets the loop state.
    pub fn configure(&mut self, config: LoopConfig<T>) {
        match config.derivative {
            DerivativeSource::Error => self.pid.compute_fn(compute_error_derivative),
            DerivativeSource::Measurement => self.pid.compute_fn(compute_measurement_derivative),
        };
        self.pid
            .set_point(T::zero())
            .kp(config.kp)
            .ki(config.ki)
            .kd(config.kd);
        self.config = config;
        self.reset();
    }

    /// Computes the correction for one tick.
    ///
    /// - `set_point`: The desired value of the controlled quantity.
    /// - `measurement`: The measured value of the controlled quantity.
    /// - `dt`: Time delta since the last tick, in seconds.
    ///
    /// Returns the previous output unchanged if any input is not finite, if
    /// `dt` is not positive, or if the raw output is not finite.
    pub fn compute(&mut self, set_point: T, measurement: T, dt: T) -> T {
        let valid = set_point.is_finite_number()
            && measurement.is_finite_number()
            && dt.is_finite_number()
            && dt > T::zero();
        if !valid {
            return self.output;
        }

        let integral = self.pid.integral;
        let error = self.pid.error;
        self.pid.set_point(set_point);
        let data = LoopControlData {
            measurement,
            previous_measurement: self.previous_measurement,
            dt,
            integral_limit: self.config.integral_limit,
            saturation: self.saturation,
            primed: self.primed,
        };
        let raw = self.pid.compute(data);
        if !raw.is_finite_number() {
            self.pid.integral = integral;
            self.pid.error = error;
            return self.output;
        }

        let output = raw.clamp(self.config.output_min, self.config.output_max);
        self.saturation = if self.config.output_max < raw {
            Saturation::Upper
        } else if raw < self.config.output_min {
            Saturation::Lower
        } else {
            Saturation::None
        };
        self.previous_measurement = measurement;
        self.primed = true;
        self.output = output;
        output
    }

    /// Zeroes the integrator, the derivative memory and the held output.
    pub fn reset(&mut self) {
        self.pid.integral = T::zero();
        self.pid.error = T::zero();
        self.previous_measurement = T::zero();
        self.primed = false;
        self.saturation = Saturation::None;
        self.output = T::zero();
    }

    /// The last valid output.
    pub fn output(&self) -> T {
        self.output
    }

    /// The current integral accumulator.
    pub fn integral(&self) -> T {
        self.pid.integral
    }

    /// Saturation state of the last output.
    pub fn saturation(&self) -> Saturation {
        self.saturation
    }

    /// The active configuration.
    pub fn config(&self) -> &LoopConfig<T> {
        &self.config
    }
}
