//! Pose fuser parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pose fuser.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Position of the goal in the marker frame.
    ///
    /// Zero when the marker is placed at the goal itself.
    ///
    /// Units: meters,
    /// Frame: Marker
    pub goal_pos_m_mkr: [f64; 3],

    /// Attitude of the goal in the marker frame as roll, pitch, yaw (static XYZ).
    ///
    /// Units: radians,
    /// Frame: Marker
    pub goal_att_euler_rad_mkr: [f64; 3],
}
