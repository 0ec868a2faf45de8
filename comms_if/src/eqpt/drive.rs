//! # Drive Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Body velocity demand sent to the actuation sink.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct VelocityCmd {
    /// Forward speed of the robot body.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards".
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Yaw rate of the robot body.
    ///
    /// Follows the right hand rule about the robot's Z+ (upwards) axis, so that a positive rate
    /// turns the robot to the left.
    ///
    /// Units: radians/second
    pub angular_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelocityCmd {
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self {
            linear_ms,
            angular_rads,
        }
    }

    /// Command bringing the robot to a full stop.
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        self.linear_ms == 0.0 && self.angular_rads == 0.0
    }
}
