//! # Goal telecommand
//!
//! A run is started by a single goal pose. The goal cannot be changed once the run has started.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drive to a pose in the inertial frame.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, StructOpt, PartialEq)]
#[structopt(name = "goal")]
pub struct GoalCmd {
    /// X position of the goal in meters.
    #[structopt(allow_hyphen_values = true)]
    pub x_m: f64,

    /// Y position of the goal in meters.
    #[structopt(allow_hyphen_values = true)]
    pub y_m: f64,

    /// Final heading at the goal in degrees.
    ///
    /// Follows the right hand rule about the Z+ (upwards) axis, zero along the inertial X axis.
    #[structopt(allow_hyphen_values = true)]
    pub heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GoalCmd {
    pub fn new(x_m: f64, y_m: f64, heading_deg: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_deg,
        }
    }

    /// Final heading at the goal in radians.
    pub fn heading_rad(&self) -> f64 {
        self.heading_deg.to_radians()
    }

    /// True if all components are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.x_m.is_finite() && self.y_m.is_finite() && self.heading_deg.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_goal_from_args() {
        let goal = GoalCmd::from_iter(vec!["goal", "1.5", "-2", "-90"]);
        assert_eq!(goal, GoalCmd::new(1.5, -2.0, -90.0));
        assert!((goal.heading_rad() + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(goal.is_valid());
        assert!(!GoalCmd::new(std::f64::NAN, 0.0, 0.0).is_valid());
    }
}
