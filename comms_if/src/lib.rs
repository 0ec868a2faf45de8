//! # Communications interface crate.
//!
//! Provides the interface structures exchanged between the navigation core and the outside world:
//! sensor samples coming in, velocity demands going out, and the goal telecommand which starts a
//! run. The transport carrying them is not defined here.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands, instructions sent to the robot
pub mod tc;

/// Sensor data and demand definitions for equipment
pub mod eqpt;
