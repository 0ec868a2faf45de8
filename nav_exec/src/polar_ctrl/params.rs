//! Polar controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::PolarCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of the polar control law, fixed for a run.
///
/// The law is locally exponentially stable for `k_rho > 0`, `k_beta < 0` and
/// `k_alpha > k_rho`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Gain on distance to the goal.
    ///
    /// Units: 1/seconds
    pub k_rho: f64,

    /// Gain on the bearing of the goal relative to the robot's heading.
    ///
    /// Units: 1/seconds
    pub k_alpha: f64,

    /// Gain on the heading error at the goal.
    ///
    /// Units: 1/seconds
    pub k_beta: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_rho: 0.2,
            k_alpha: 0.35,
            k_beta: -0.15,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), PolarCtrlError> {
        let finite = self.k_rho.is_finite() && self.k_alpha.is_finite() && self.k_beta.is_finite();

        if !finite || self.k_rho <= 0.0 || self.k_alpha <= self.k_rho || self.k_beta >= 0.0 {
            return Err(PolarCtrlError::InvalidGains(*self));
        }

        Ok(())
    }
}
