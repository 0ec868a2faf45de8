//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::NavCtrlError;
use crate::{
    calib::{self, FrameCalib},
    convergence::{GoalError, Thresholds},
    fuser::{self, select_source, FuserMode, PoseFuser},
    polar_ctrl::{self, PolarCtrl, PolarState},
    sensor_state::SensorSnapshot,
};
use comms_if::{eqpt::drive::VelocityCmd, tc::goal::GoalCmd};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
#[derive(Debug, Default)]
pub struct NavCtrl {
    fuser: Option<PoseFuser>,

    ctrl: Option<PolarCtrl>,

    thresholds: Thresholds,
}

/// Data needed to initialise NavCtrl.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    pub calib: calib::Params,
    pub fuser: fuser::Params,
    pub polar_ctrl: polar_ctrl::Params,
    pub thresholds: Thresholds,

    /// The goal, fixed for the whole run
    pub goal: GoalCmd,
}

/// Output of one NavCtrl cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// The demand to publish, or `None` if the cycle was skipped.
    pub cmd: Option<VelocityCmd>,

    /// True if the goal has been reached.
    pub goal_reached: bool,
}

/// Status report for NavCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// Source selected for this cycle
    pub source: FuserMode,

    /// A source was selected but gave a degenerate transform, so the cycle was skipped
    pub degenerate: bool,

    pub polar_state: Option<PolarState>,

    pub goal_error: Option<GoalError>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for NavCtrl {
    type InitData = InitData;
    type InitError = NavCtrlError;

    type InputData = SensorSnapshot;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = NavCtrlError;

    /// Initialise the NavCtrl module.
    ///
    /// All parameters are validated here, any invalid parameter is a fatal error.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        init_data.thresholds.validate()?;

        let calib = FrameCalib::new(&init_data.calib)?;
        let fuser = PoseFuser::new(calib, &init_data.fuser, &init_data.goal)?;
        let ctrl = PolarCtrl::new(init_data.polar_ctrl)?;

        if let Some(s) = session {
            s.save("nav_ctrl/goal.json", init_data.goal);
        }

        self.fuser = Some(fuser);
        self.ctrl = Some(ctrl);
        self.thresholds = init_data.thresholds;

        Ok(())
    }

    /// Perform one cycle of navigation control.
    ///
    /// Cycles with no usable data, or whose data gives a degenerate transform, produce no
    /// demand.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let fuser = self.fuser.as_mut().ok_or(NavCtrlError::NotInit)?;
        let ctrl = self.ctrl.as_ref().ok_or(NavCtrlError::NotInit)?;

        let mut report = StatusReport {
            source: select_source(input_data),
            ..Default::default()
        };

        let fused = match fuser.fuse(input_data) {
            Ok(Some(f)) => f,
            Ok(None) => {
                trace!("No new sensor data, skipping cycle");
                return Ok((OutputData::default(), report));
            }
            Err(e) => {
                warn!("{}, skipping cycle", e);
                report.degenerate = true;
                return Ok((OutputData::default(), report));
            }
        };

        let polar_state = ctrl.polar_state(&fused.robot_from_goal);
        let cmd = ctrl.command(&polar_state);

        let goal_error = GoalError::from_robot_from_goal(&fused.robot_from_goal);
        let goal_reached = self.thresholds.is_reached(&goal_error);

        debug!(
            "{:?}: rho = {:.4}, alpha = {:.4}, beta = {:.4}, v = {:.4}, w = {:.4}",
            fused.source,
            polar_state.rho,
            polar_state.alpha,
            polar_state.beta,
            cmd.linear_ms,
            cmd.angular_rads
        );

        report.polar_state = Some(polar_state);
        report.goal_error = Some(goal_error);

        Ok((
            OutputData {
                cmd: Some(cmd),
                goal_reached,
            },
            report,
        ))
    }
}
