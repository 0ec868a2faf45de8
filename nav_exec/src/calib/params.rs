//! Frame calibration parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Extrinsic parameters of the camera.
///
/// Defaults are those of the reference rig.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Attitude of the camera in the robot body frame as roll, pitch, yaw (static XYZ).
    ///
    /// Units: radians,
    /// Frame: Robot body
    pub cam_att_euler_rad_rb: [f64; 3],

    /// Position of the camera's optical centre in the robot body frame.
    ///
    /// Units: meters,
    /// Frame: Robot body
    pub cam_pos_m_rb: [f64; 3],
}

impl Default for Params {
    fn default() -> Self {
        Self {
            cam_att_euler_rad_rb: [-1.67493, 0.01726275, -1.575038333],
            cam_pos_m_rb: [0.015, -0.009439617, 0.185],
        }
    }
}
