//! # Navigation control module
//!
//! Sequences the pipeline which turns sensor data into drive demands:
//!
//! ```text
//! SensorSnapshot -> PoseFuser -> PolarCtrl -> VelocityCmd
//!                            \-> Thresholds -> goal reached?
//! ```
//!
//! `NavCtrl` performs one cycle of the pipeline. The `Driver` runs it at a fixed rate against the
//! shared sensor state and publishes the demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod driver;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use driver::*;
pub use params::Params;
pub use state::*;

use crate::{
    calib::CalibError, convergence::ConvergenceError, fuser::FuserError,
    polar_ctrl::PolarCtrlError,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("NavCtrl has not been initialised")]
    NotInit,

    #[error("The cycle period must be a positive duration no longer than u64::MAX seconds, found {0}")]
    InvalidCyclePeriod(f64),

    #[error(
        "The maximum run duration must be a positive duration no longer than u64::MAX seconds, found {0}"
    )]
    InvalidMaxRunDuration(f64),

    #[error("Invalid frame calibration: {0}")]
    CalibError(#[from] CalibError),

    #[error("Could not initialise the pose fuser: {0}")]
    FuserError(#[from] FuserError),

    #[error("Could not initialise the polar controller: {0}")]
    PolarCtrlError(#[from] PolarCtrlError),

    #[error(transparent)]
    ConvergenceError(#[from] ConvergenceError),
}
