// src/pid.rs

//! # PID Control Module
//!
//! This module provides compute functions and control data structures
//! to perform PID (Proportional-Integral-Derivative) control calculations,
//! and the [`ControlLoop`] built on top of them.

pub mod compute;
pub use compute::*;
pub mod control_loop;
pub use control_loop::*;
