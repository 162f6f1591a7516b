// src/test_utils.rs

//! This module contains utilities for testing: float comparisons and mock
//! collaborators for driving the engine without hardware.

use core::fmt;

use crate::hal::{AttitudeEstimator, CommandSource, Mode, MotorActuation};
use crate::mixing::MotorCommands;
use crate::{Axis, PerAxis};

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if two floating point numbers are not close enough to be
/// considered equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` exceeds
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_not_close(target: f32, value: f32) -> bool {
    TEST_TOLERANCE <= (target - value).abs()
}

/// Checks if each of the components in a vector is close enough to
/// be considered equal.
///
/// # Arguments
/// * `target` - The target vector as a tuple of three `f32` values.
/// * `value` - The vector to compare against the target.
///
/// # Returns
/// `true` if each component of `target` and `value` is close as per `value_close`,
/// otherwise `false`.
pub fn vector_close(target: (f32, f32, f32), value: (f32, f32, f32)) -> bool {
    value_close(target.0, value.0)
        && value_close(target.1, value.1)
        && value_close(target.2, value.2)
}

pub const MOCK_MIN_POWER: i32 = 0;
pub const MOCK_MAX_POWER: i32 = 1023;
pub const MOCK_MAX_THROTTLE: i32 = 1000;
pub const MOCK_MAX_THROTTLE_PERCENT: i32 = 98;
pub const MOCK_IDLE_THRESHOLD: i32 = 100;

/// Attitude estimator returning fixed samples.
#[derive(Debug, Default)]
pub struct MockAttitude {
    pub offsets_computed: bool,
    pub offset_requests: u32,
    pub rates: PerAxis<f32>,
    pub accel: PerAxis<f32>,
}

impl MockAttitude {
    pub fn calibrated() -> Self {
        MockAttitude {
            offsets_computed: true,
            ..Default::default()
        }
    }
}

impl AttitudeEstimator<f32> for MockAttitude {
    fn are_offsets_computed(&self) -> bool {
        self.offsets_computed
    }

    fn compute_offsets(&mut self) {
        self.offset_requests += 1;
        self.offsets_computed = true;
    }

    fn angular_rates(&mut self) -> PerAxis<f32> {
        self.rates
    }

    fn accel_angles(&mut self) -> PerAxis<f32> {
        self.accel
    }
}

/// Command source with fixed sticks, mode and throttle.
#[derive(Debug)]
pub struct MockCommands {
    pub demand: PerAxis<f32>,
    pub mode: Mode,
    pub throttle: i32,
}

impl MockCommands {
    pub fn flying(mode: Mode, throttle: i32) -> Self {
        MockCommands {
            demand: PerAxis::splat(0.0),
            mode,
            throttle,
        }
    }
}

impl CommandSource<f32> for MockCommands {
    fn demand(&mut self, axis: Axis) -> f32 {
        self.demand[axis]
    }

    fn flying_mode(&mut self) -> Mode {
        self.mode
    }

    fn throttle(&mut self, min_power: i32, max_throttle: i32) -> i32 {
        self.throttle.max(min_power).min(max_throttle)
    }
}

/// Four-motor actuation recording the last dispatch.
#[derive(Debug)]
pub struct MockMotors {
    pub min_power: i32,
    pub max_power: i32,
    pub timer: Option<u8>,
    pub dispatched: Option<MotorCommands<4>>,
    pub dispatch_count: u32,
}

impl MockMotors {
    pub fn new() -> Self {
        MockMotors {
            min_power: MOCK_MIN_POWER,
            max_power: MOCK_MAX_POWER,
            timer: None,
            dispatched: None,
            dispatch_count: 0,
        }
    }
}

impl MotorActuation<4> for MockMotors {
    type Timer = u8;

    fn attach_timer(&mut self, timer: u8) {
        self.timer = Some(timer);
    }

    fn max_power(&self) -> i32 {
        self.max_power
    }

    fn min_power(&self) -> i32 {
        self.min_power
    }

    fn max_throttle_percent(&self) -> i32 {
        MOCK_MAX_THROTTLE_PERCENT
    }

    fn max_throttle(&self) -> i32 {
        MOCK_MAX_THROTTLE
    }

    fn idle_threshold(&self) -> i32 {
        MOCK_IDLE_THRESHOLD
    }

    fn dispatch(&mut self, commands: &MotorCommands<4>) {
        self.dispatched = Some(*commands);
        self.dispatch_count += 1;
    }
}

/// Fixed capacity text sink for the parameter dumps.
pub struct TextBuffer {
    bytes: [u8; 2048],
    len: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        TextBuffer {
            bytes: [0; 2048],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap()
    }
}

impl fmt::Write for TextBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if self.bytes.len() < end {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
