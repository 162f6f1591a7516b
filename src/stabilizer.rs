// src/stabilizer.rs

//! # Stabilizer Module
//!
//! Roll and pitch control laws for the two flying modes, behind the shared
//! [`FlightStabilizer`] trait.

pub mod angle;
pub use angle::*;
pub mod flight_stabilizer;
pub use flight_stabilizer::*;
pub mod rate;
pub use rate::*;
