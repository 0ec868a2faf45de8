//! Navigation control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;

use serde::Deserialize;

use super::NavCtrlError;
use crate::convergence::Thresholds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control loop.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// If set the run is cancelled once it has lasted this long.
    ///
    /// Units: seconds
    pub max_run_duration_s: Option<f64>,

    /// Tolerances for the goal to be reached.
    pub thresholds: Thresholds,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            max_run_duration_s: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), NavCtrlError> {
        self.cycle_period()?;
        self.max_run_duration()?;
        self.thresholds.validate()?;

        Ok(())
    }

    /// The cycle period as a `Duration`.
    ///
    /// Fails if the period is not positive or too large to be represented.
    pub fn cycle_period(&self) -> Result<Duration, NavCtrlError> {
        to_duration(self.cycle_period_s)
            .ok_or(NavCtrlError::InvalidCyclePeriod(self.cycle_period_s))
    }

    /// The maximum run duration as a `Duration`, if one is set.
    pub fn max_run_duration(&self) -> Result<Option<Duration>, NavCtrlError> {
        self.max_run_duration_s
            .map(|d| to_duration(d).ok_or(NavCtrlError::InvalidMaxRunDuration(d)))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn to_duration(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
