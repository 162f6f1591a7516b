// src/config.rs

//! # Stabilization Configuration
//!
//! Every tuning constant of the core lives in [`StabilizationConfig`]. It is
//! constructed once at startup and owned by the engine, so tests can run the
//! core with synthetic configurations.

use core::fmt;

use crate::error::{Result, StabilizationError};
use crate::pid::{DerivativeSource, LoopConfig};
use crate::{CascadeConfig, Number};

/// Configuration of the stabilization engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizationConfig<T> {
    /// Angle mode outer tier: tilt error in degrees to desired rate in
    /// degrees per second. The output bounds cap the commanded rate.
    pub angle_position: CascadeConfig<T>,
    /// Angle mode inner tier: rate error to motor correction.
    pub angle_rate: CascadeConfig<T>,
    /// Accro mode tier: rate error to motor correction.
    pub accro_rate: CascadeConfig<T>,
    /// Yaw rate loop, shared by both flying modes.
    pub yaw_rate: LoopConfig<T>,
    /// Roll and pitch rate at full stick in Accro mode, in degrees per second.
    pub max_rate: T,
    /// Yaw rate at full stick, in degrees per second.
    pub max_yaw_rate: T,
    /// Tilt angle at full stick in Angle mode, in degrees.
    pub max_angle: T,
    /// Lever arm weight of each correction in the motor mix.
    pub mixing_weight: T,
    /// Complementary filter time constant, in seconds.
    pub filter_time_constant: T,
}

impl<T: Number> StabilizationConfig<T> {
    /// Creates a neutral configuration: proportional gains of one, every
    /// other gain zero, unit limits and a mixing weight of one half.
    /// These should be replaced with values tuned for the airframe.
    ///
    /// Example Usage
    /// ```
    /// use multirotor_stabilization::StabilizationConfig;
    ///
    /// let mut config = StabilizationConfig::<f32>::new();
    ///
    /// // Accro mode rate gains.
    /// config.accro_rate.roll.kp = 0.2;
    /// config.accro_rate.roll.ki = 0.1;
    /// config.accro_rate.pitch = config.accro_rate.roll;
    ///
    /// // Stick scaling.
    /// config.max_rate = 135.0;
    /// config.max_angle = 30.0;
    ///
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        let neutral = LoopConfig::new(T::one(), T::zero(), T::zero(), T::one(), T::one());
        StabilizationConfig {
            angle_position: CascadeConfig::symmetric(neutral),
            angle_rate: CascadeConfig::symmetric(neutral),
            accro_rate: CascadeConfig::symmetric(neutral),
            yaw_rate: neutral.derivative(DerivativeSource::Error),
            max_rate: T::one(),
            max_yaw_rate: T::one(),
            max_angle: T::one(),
            mixing_weight: T::one() / (T::one() + T::one()),
            filter_time_constant: T::one(),
        }
    }

    /// Checks every loop configuration and the filter time constant.
    pub fn validate(&self) -> Result<()> {
        self.angle_position.validate()?;
        self.angle_rate.validate()?;
        self.accro_rate.validate()?;
        self.yaw_rate.validate()?;
        if !self.filter_time_constant.is_finite_number() || self.filter_time_constant <= T::zero()
        {
            return Err(StabilizationError::InvalidTimeConstant);
        }
        let finite = self.max_rate.is_finite_number()
            && self.max_yaw_rate.is_finite_number()
            && self.max_angle.is_finite_number()
            && self.mixing_weight.is_finite_number();
        if !finite {
            return Err(StabilizationError::InvalidLoopLimits);
        }
        Ok(())
    }
}

impl Default for StabilizationConfig<f32> {
    /// Gains tuned for a 450 mm class X quadcopter on a 2.5 ms loop, with
    /// motor powers in microseconds of ESC pulse width.
    fn default() -> Self {
        let angle_position = LoopConfig::new(4.0, 0.02, 0.0, 50.0, 200.0);
        let angle_rate = LoopConfig::new(0.28, 0.1, 0.006, 100.0, 150.0);
        let accro_rate = LoopConfig::new(0.3, 0.12, 0.008, 100.0, 150.0);
        let yaw_rate =
            LoopConfig::new(0.9, 0.05, 0.0, 100.0, 100.0).derivative(DerivativeSource::Error);

        StabilizationConfig {
            angle_position: CascadeConfig::symmetric(angle_position),
            angle_rate: CascadeConfig::symmetric(angle_rate),
            accro_rate: CascadeConfig::symmetric(accro_rate),
            yaw_rate,
            max_rate: 135.0,
            max_yaw_rate: 135.0,
            max_angle: 30.0,
            mixing_weight: 0.5,
            filter_time_constant: 0.5,
        }
    }
}

impl<T: fmt::Display> fmt::Display for StabilizationConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Angle mode position loops:")?;
        write!(f, "{}", self.angle_position)?;
        writeln!(f, "Angle mode rate loops:")?;
        write!(f, "{}", self.angle_rate)?;
        writeln!(f, "Accro mode rate loops:")?;
        write!(f, "{}", self.accro_rate)?;
        writeln!(f, "Yaw rate loop:")?;
        writeln!(f, "  yaw:   {}", self.yaw_rate)?;
        writeln!(
            f,
            "Max rate {} deg/s, max yaw rate {} deg/s, max angle {} deg",
            self.max_rate, self.max_yaw_rate, self.max_angle
        )?;
        writeln!(
            f,
            "Mixing weight {}, filter time constant {} s",
            self.mixing_weight, self.filter_time_constant
        )
    }
}
