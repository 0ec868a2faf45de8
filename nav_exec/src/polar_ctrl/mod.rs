//! # Polar controller module
//!
//! Point stabilisation of a unicycle in polar coordinates. With the robot at `(x, y, theta)` in
//! the goal frame:
//!
//! ```text
//! rho   = sqrt(x^2 + y^2)
//! alpha = wrap(atan2(-y, -x) - theta)
//! beta  = wrap(-alpha - theta)
//!
//! v = k_rho * rho
//! w = k_alpha * alpha + k_beta * beta
//! ```
//!
//! `alpha` is the bearing of the goal relative to the robot's heading and `beta` the heading the
//! robot will need to turn through once it arrives.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use comms_if::eqpt::drive::VelocityCmd;
pub use params::Params;
use util::{
    maths::wrap_pi,
    transform::{Pose2D, RigidTransform},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The polar controller.
#[derive(Debug, Clone, Copy)]
pub struct PolarCtrl {
    params: Params,
}

/// Error state in polar coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarState {
    /// Distance to the goal.
    ///
    /// Units: meters
    pub rho: f64,

    /// Bearing of the goal relative to the robot's heading, in (-pi, pi].
    ///
    /// Units: radians
    pub alpha: f64,

    /// Units: radians
    pub beta: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PolarCtrlError {
    #[error(
        "Invalid controller gains {0:?}, must be finite with k_rho > 0, k_alpha > k_rho and \
         k_beta < 0"
    )]
    InvalidGains(Params),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PolarState {
    /// Compute the polar state from the robot's pose in the goal frame.
    ///
    /// The bearing is undefined on the goal itself, it's taken as zero there.
    pub fn from_pose(goal_to_robot: &Pose2D) -> Self {
        let rho = goal_to_robot.range();

        let bearing = if rho == 0.0 {
            0.0
        } else {
            (-goal_to_robot.y).atan2(-goal_to_robot.x)
        };

        let alpha = wrap_pi(bearing - goal_to_robot.theta);
        let beta = wrap_pi(-alpha - goal_to_robot.theta);

        Self { rho, alpha, beta }
    }
}

impl PolarCtrl {
    pub fn new(params: Params) -> Result<Self, PolarCtrlError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Polar state for the fused goal pose.
    ///
    /// The law is stated for the robot's pose in the goal frame, which is the inverse of
    /// `robot_from_goal`.
    pub fn polar_state(&self, robot_from_goal: &RigidTransform) -> PolarState {
        PolarState::from_pose(&robot_from_goal.inverse().to_pose2d())
    }

    /// Velocity demand for the given polar state.
    pub fn command(&self, state: &PolarState) -> VelocityCmd {
        VelocityCmd::new(
            self.params.k_rho * state.rho,
            self.params.k_alpha * state.alpha + self.params.k_beta * state.beta,
        )
    }
}
