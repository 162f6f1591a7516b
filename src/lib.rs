// src/lib.rs

//! # Multirotor Flight Stabilization
//!
//! This crate provides a `no_std`, no-alloc stabilization core for a
//! multirotor vehicle. On every tick it turns gyro rates, accelerometer
//! angles and pilot commands into one set of motor power commands.
//!
//! - [`filter`]: complementary filter fusing gyro and accelerometer.
//! - [`pid`]: PID loops with anti-windup and output clamping.
//! - [`stabilizer`]: rate (Accro) and cascaded angle (Angle) control laws.
//! - [`mixing`]: throttle and corrections to clamped per-motor powers.
//! - [`engine`]: mode selection, idle gating and the control tick.
//!
//! Sensors, the receiver and the motors are reached through the traits in
//! [`hal`]. Generic code accepts any [`Number`], floating or fixed point.

#![no_std]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod axis;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hal;
pub mod mixing;
pub mod pid;
pub mod stabilizer;

pub use axis::*;
pub use config::StabilizationConfig;
pub use engine::{Diagnostics, Stabilization};
pub use error::{Result, StabilizationError};
pub use filter::ComplementaryFilter;
pub use hal::{AttitudeEstimator, CommandSource, Mode, MotorActuation};
pub use mixing::{Mixer, MotorCommands, MotorMix, PowerBounds, Sign, QUAD_X};
#[doc(inline)]
pub use stabilizer::*;

#[cfg(test)]
mod test_utils;
