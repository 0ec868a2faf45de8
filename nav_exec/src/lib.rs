//! # Navigation library.
//!
//! Drives a wheeled robot to a goal pose using feedback from a fiducial marker, or dead reckoning
//! when no marker is in view.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Frame calibration - fixed transforms between the camera and the robot body
pub mod calib;

/// Convergence monitor - decides when the goal has been reached
pub mod convergence;

/// Pose fuser - selects a localisation source and computes the goal pose relative to the robot
pub mod fuser;

/// Navigation control - runs the pipeline at a fixed rate and publishes the demands
pub mod nav_ctrl;

/// Sensor normalisation - removes heading biases and remaps marker axes
pub mod norm;

/// Executable parameters
pub mod params;

/// Polar controller - computes velocity demands from the goal pose
pub mod polar_ctrl;

/// Shared sensor state - latest sample of each source and its new data flag
pub mod sensor_state;

/// Simulation client - kinematic simulation of the robot and its sensors
#[cfg(feature = "sim")]
pub mod sim_client;
