//! # Frame calibration module
//!
//! Holds the fixed transforms between the camera (CAM) frame and the robot body (RB) frame. These
//! are computed once from the extrinsic parameters of the rig and never change afterwards.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector3;

// Internal
pub use params::Params;
use util::transform::{RigidTransform, TransformError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Camera extrinsics of the rig.
#[derive(Debug, Clone, Copy)]
pub struct FrameCalib {
    /// Pose of the camera in the robot body frame.
    robot_from_camera: RigidTransform,

    /// Pose of the robot body in the camera frame.
    camera_from_robot: RigidTransform,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error("Camera extrinsics contain non-finite values: {0:?}")]
    NonFiniteExtrinsics(Params),

    #[error("Camera extrinsics do not form a valid transform: {0}")]
    InvalidTransform(TransformError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FrameCalib {
    /// Compute the calibration transforms from the extrinsic parameters.
    pub fn new(params: &Params) -> Result<Self, CalibError> {
        if !params
            .cam_att_euler_rad_rb
            .iter()
            .chain(params.cam_pos_m_rb.iter())
            .all(|v| v.is_finite())
        {
            return Err(CalibError::NonFiniteExtrinsics(params.clone()));
        }

        let [roll, pitch, yaw] = params.cam_att_euler_rad_rb;
        let robot_from_camera = RigidTransform::from_euler(
            Vector3::from(params.cam_pos_m_rb),
            roll,
            pitch,
            yaw,
        );

        let camera_from_robot = robot_from_camera
            .try_inverse()
            .map_err(CalibError::InvalidTransform)?;

        debug!("Camera pose in robot body: {:?}", robot_from_camera);

        Ok(Self {
            robot_from_camera,
            camera_from_robot,
        })
    }

    /// Transform taking points in the camera frame into the robot body frame.
    pub fn robot_from_camera(&self) -> &RigidTransform {
        &self.robot_from_camera
    }

    /// Transform taking points in the robot body frame into the camera frame.
    pub fn camera_from_robot(&self) -> &RigidTransform {
        &self.camera_from_robot
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    #[test]
    fn test_reference_rig() {
        let calib = FrameCalib::new(&Params::default()).unwrap();

        // Round trip through both transforms
        let round = *calib.camera_from_robot() * *calib.robot_from_camera();
        assert_abs_diff_eq!(round.translation.amax(), 0.0, epsilon = 1e-12);

        // The camera's origin sits at the configured offset in the body frame
        let origin = calib.robot_from_camera().transform_point(&Point3::origin());
        assert_abs_diff_eq!(origin.x, 0.015, epsilon = 1e-12);
        assert_abs_diff_eq!(origin.y, -0.009439617, epsilon = 1e-12);
        assert_abs_diff_eq!(origin.z, 0.185, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut params = Params::default();
        params.cam_att_euler_rad_rb[1] = std::f64::INFINITY;

        assert!(matches!(
            FrameCalib::new(&params),
            Err(CalibError::NonFiniteExtrinsics(_))
        ));
    }
}
