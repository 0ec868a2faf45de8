//! # Pose fuser module
//!
//! Selects a single localisation source on each cycle and computes the pose of the goal in the
//! robot body frame (`robot_from_goal`) from it.
//!
//! A visible marker always takes priority. When no marker is in view the robot falls back on dead
//! reckoning, which needs both a displacement and a heading sample on the same cycle. The two
//! sources are never blended.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use crate::{
    calib::FrameCalib,
    norm::{DisplacementSample, HeadingSample, MarkerObservation},
    sensor_state::SensorSnapshot,
};
use comms_if::tc::goal::GoalCmd;
pub use params::Params;
use util::transform::{RigidTransform, TransformError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fuses the sensor snapshot into a goal pose relative to the robot.
#[derive(Debug, Clone)]
pub struct PoseFuser {
    calib: FrameCalib,

    /// Pose of the goal in the marker frame
    marker_from_goal: RigidTransform,

    /// Pose of the goal in the inertial frame
    inertial_from_goal: RigidTransform,

    /// Source used on the last cycle which had data, for transition logging
    last_source: Option<FuserMode>,
}

/// Output of the fuser on a cycle with usable data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusedPose {
    pub source: FuserMode,

    /// Pose of the goal in the robot body frame
    pub robot_from_goal: RigidTransform,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Localisation source selected for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FuserMode {
    /// No usable data arrived, the cycle must be skipped
    NoData,

    /// Pose from the displacement and heading streams
    DeadReckoning,

    /// Pose from an observed marker
    MarkerTracking,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum FuserError {
    #[error("The goal {0:?} contains non-finite values")]
    InvalidGoal(GoalCmd),

    #[error("The marker to goal parameters are invalid: {0:?}")]
    InvalidParams(Params),

    #[error("Degenerate transform while fusing {0:?}: {1}")]
    DegenerateTransform(FuserMode, TransformError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FuserMode {
    fn default() -> Self {
        FuserMode::NoData
    }
}

impl PoseFuser {
    /// Create a new fuser driving towards `goal`.
    pub fn new(calib: FrameCalib, params: &Params, goal: &GoalCmd) -> Result<Self, FuserError> {
        if !goal.is_valid() {
            return Err(FuserError::InvalidGoal(*goal));
        }

        if !params
            .goal_pos_m_mkr
            .iter()
            .chain(params.goal_att_euler_rad_mkr.iter())
            .all(|v| v.is_finite())
        {
            return Err(FuserError::InvalidParams(params.clone()));
        }

        let [roll, pitch, yaw] = params.goal_att_euler_rad_mkr;

        Ok(Self {
            calib,
            marker_from_goal: RigidTransform::from_euler(
                Vector3::from(params.goal_pos_m_mkr),
                roll,
                pitch,
                yaw,
            ),
            inertial_from_goal: RigidTransform::planar(goal.x_m, goal.y_m, goal.heading_rad()),
            last_source: None,
        })
    }

    /// Fuse the snapshot into a goal pose, selecting the source as `select_source` does.
    ///
    /// Returns `Ok(None)` if there's no usable data this cycle. A source that was selected but
    /// produced a degenerate transform gives an error, which the caller should treat the same as
    /// no data.
    pub fn fuse(&mut self, snapshot: &SensorSnapshot) -> Result<Option<FusedPose>, FuserError> {
        let (source, robot_from_goal) = if let Some(marker) = snapshot.visible_marker() {
            (FuserMode::MarkerTracking, self.fuse_marker(marker))
        } else if let Some((disp, heading)) = snapshot.dead_reckoning() {
            (
                FuserMode::DeadReckoning,
                self.fuse_dead_reckoning(disp, heading),
            )
        } else {
            return Ok(None);
        };

        let robot_from_goal =
            robot_from_goal.map_err(|e| FuserError::DegenerateTransform(source, e))?;

        if self.last_source != Some(source) {
            match self.last_source {
                Some(last) => info!("Localisation source changed from {:?} to {:?}", last, source),
                None => info!("Localisation source is {:?}", source),
            }
            self.last_source = Some(source);
        }

        Ok(Some(FusedPose {
            source,
            robot_from_goal,
        }))
    }

    /// The source used on the most recent cycle with data.
    pub fn last_source(&self) -> Option<FuserMode> {
        self.last_source
    }

    fn fuse_marker(&self, marker: &MarkerObservation) -> Result<RigidTransform, TransformError> {
        let camera_from_marker = marker.camera_from_marker();
        camera_from_marker.validate()?;

        let robot_from_goal =
            *self.calib.robot_from_camera() * camera_from_marker * self.marker_from_goal;
        robot_from_goal.validate()?;

        Ok(robot_from_goal)
    }

    fn fuse_dead_reckoning(
        &self,
        disp: &DisplacementSample,
        heading: &HeadingSample,
    ) -> Result<RigidTransform, TransformError> {
        let inertial_from_robot =
            RigidTransform::from_euler(disp.position_m_inr, 0.0, 0.0, heading.yaw_rad);

        let robot_from_goal = inertial_from_robot.try_inverse()? * self.inertial_from_goal;
        robot_from_goal.validate()?;

        Ok(robot_from_goal)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Select the localisation source for the given snapshot.
pub fn select_source(snapshot: &SensorSnapshot) -> FuserMode {
    if snapshot.visible_marker().is_some() {
        FuserMode::MarkerTracking
    } else if snapshot.dead_reckoning().is_some() {
        FuserMode::DeadReckoning
    } else {
        FuserMode::NoData
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{calib, norm, sensor_state::SensorState};
    use approx::assert_abs_diff_eq;
    use comms_if::eqpt::{
        marker::{MarkerDetection, MarkerDetections},
        odom::{Displacement, Heading},
    };

    fn state() -> SensorState {
        SensorState::new(&norm::Params::default()).unwrap()
    }

    fn fuser(goal: GoalCmd) -> PoseFuser {
        let calib = FrameCalib::new(&calib::Params::default()).unwrap();
        PoseFuser::new(calib, &Params::default(), &goal).unwrap()
    }

    fn marker() -> MarkerDetections {
        MarkerDetections::new(vec![MarkerDetection {
            position_m_cam: [0.0, 0.0, 1.0],
            orientation_q_cam: [0.0, 0.0, 0.0, 1.0],
        }])
    }

    #[test]
    fn test_select_source() {
        let s = state();
        assert_eq!(select_source(&s.snapshot()), FuserMode::NoData);

        // Displacement alone isn't enough
        s.push_displacement(&Displacement::new([0.0; 3])).unwrap();
        assert_eq!(select_source(&s.snapshot()), FuserMode::NoData);

        s.push_heading(&Heading::from_yaw(0.0)).unwrap();
        assert_eq!(select_source(&s.snapshot()), FuserMode::DeadReckoning);

        // A marker that isn't in view doesn't override dead reckoning
        s.push_marker(&MarkerDetections::none()).unwrap();
        assert_eq!(select_source(&s.snapshot()), FuserMode::DeadReckoning);

        // A visible marker always wins
        s.push_marker(&marker()).unwrap();
        assert_eq!(select_source(&s.snapshot()), FuserMode::MarkerTracking);
    }

    #[test]
    fn test_dead_reckoning_at_origin() {
        let s = state();
        s.push_displacement(&Displacement::new([0.0; 3])).unwrap();
        s.push_heading(&Heading::from_yaw(0.0)).unwrap();

        let mut f = fuser(GoalCmd::new(1.0, 0.0, 0.0));
        let fused = f.fuse(&s.snapshot()).unwrap().unwrap();

        assert_eq!(fused.source, FuserMode::DeadReckoning);
        let pose = fused.robot_from_goal.to_pose2d();
        assert_abs_diff_eq!(pose.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.theta, 0.0, epsilon = 1e-12);
        assert_eq!(f.last_source(), Some(FuserMode::DeadReckoning));
    }

    #[test]
    fn test_dead_reckoning_rotated() {
        let s = state();

        // First heading latches the bias, so start facing "zero" then turn left by 90 degrees
        s.push_heading(&Heading::from_yaw(0.4)).unwrap();
        s.consume(&s.snapshot());
        s.push_heading(&Heading::from_yaw(0.4 + std::f64::consts::FRAC_PI_2))
            .unwrap();
        s.push_displacement(&Displacement::new([1.0, 1.0, 0.0])).unwrap();

        // Goal 1 m further along the starting heading
        let mut f = fuser(GoalCmd::new(2.0, 1.0, 0.0));
        let pose = f.fuse(&s.snapshot()).unwrap().unwrap().robot_from_goal.to_pose2d();

        // The goal is now on the robot's right
        assert_abs_diff_eq!(pose.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.theta, -std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_marker_tracking() {
        let s = state();
        s.push_marker(&marker()).unwrap();

        let calib = FrameCalib::new(&calib::Params::default()).unwrap();
        let mut f = fuser(GoalCmd::new(0.0, 0.0, 0.0));
        let fused = f.fuse(&s.snapshot()).unwrap().unwrap();

        assert_eq!(fused.source, FuserMode::MarkerTracking);

        // With the marker at the goal, the goal sits where the marker is seen from the robot
        let obs = s.snapshot().marker.unwrap();
        let expected = *calib.robot_from_camera() * obs.camera_from_marker();
        assert_abs_diff_eq!(
            (fused.robot_from_goal.translation - expected.translation).amax(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_no_data() {
        let mut f = fuser(GoalCmd::new(1.0, 0.0, 0.0));
        assert_eq!(f.fuse(&SensorSnapshot::default()).unwrap(), None);
        assert_eq!(f.last_source(), None);
    }

    #[test]
    fn test_invalid_goal() {
        let calib = FrameCalib::new(&calib::Params::default()).unwrap();
        assert!(matches!(
            PoseFuser::new(
                calib,
                &Params::default(),
                &GoalCmd::new(std::f64::INFINITY, 0.0, 0.0)
            ),
            Err(FuserError::InvalidGoal(_))
        ));
    }
}
