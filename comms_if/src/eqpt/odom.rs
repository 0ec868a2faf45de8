//! # Dead Reckoning Sensor Data
//!
//! Displacement and heading arrive on independent streams, both expressed in the same fixed
//! inertial (world) frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position of the robot from the odometry stream.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Displacement {
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Units: meters,
    /// Frame: Inertial
    pub position_m_inr: [f64; 3],
}

/// Attitude of the robot from the inertial measurement unit.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Heading {
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Attitude as an `[x, y, z, w]` quaternion.
    ///
    /// Frame: Inertial
    pub attitude_q_inr: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Displacement {
    pub fn new(position_m_inr: [f64; 3]) -> Self {
        Self {
            timestamp: Utc::now(),
            position_m_inr,
        }
    }
}

impl Heading {
    pub fn new(attitude_q_inr: [f64; 4]) -> Self {
        Self {
            timestamp: Utc::now(),
            attitude_q_inr,
        }
    }

    /// Build a heading sample from a pure rotation about the vertical axis.
    pub fn from_yaw(yaw_rad: f64) -> Self {
        let half = 0.5 * yaw_rad;
        Self::new([0.0, 0.0, half.sin(), half.cos()])
    }
}
