//! # Convergence monitor
//!
//! Decides when the robot has reached the goal. The check is a one-shot test of the current fused
//! pose against fixed tolerances, re-evaluated every cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use util::{
    maths::wrap_pi,
    transform::{Pose2D, RigidTransform},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tolerances for the goal to be considered reached.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Maximum error along each of the X and Y axes.
    ///
    /// Units: meters
    pub linear_tol_m: f64,

    /// Maximum heading error.
    ///
    /// Units: radians
    pub angular_tol_rad: f64,
}

/// Error between the robot and the goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GoalError {
    /// Units: meters,
    /// Frame: Robot body
    pub x_m: f64,

    /// Units: meters,
    /// Frame: Robot body
    pub y_m: f64,

    /// Goal heading minus current heading, in (-pi, pi].
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConvergenceError {
    #[error("Convergence tolerances must be finite and greater than zero, found {0:?}")]
    InvalidThresholds(Thresholds),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            linear_tol_m: 0.05,
            angular_tol_rad: 0.1,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConvergenceError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;

        if valid(self.linear_tol_m) && valid(self.angular_tol_rad) {
            Ok(())
        } else {
            Err(ConvergenceError::InvalidThresholds(*self))
        }
    }

    /// Check whether the goal has been reached.
    pub fn is_reached(&self, error: &GoalError) -> bool {
        error.x_m.abs() <= self.linear_tol_m
            && error.y_m.abs() <= self.linear_tol_m
            && wrap_pi(error.heading_rad).abs() <= self.angular_tol_rad
    }
}

impl GoalError {
    /// Error from the pose of the goal in the robot body frame.
    pub fn from_robot_from_goal(robot_from_goal: &RigidTransform) -> Self {
        let Pose2D { x, y, theta } = robot_from_goal.to_pose2d();

        Self {
            x_m: x,
            y_m: y,
            heading_rad: theta,
        }
    }
}
