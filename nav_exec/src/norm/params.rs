//! Sensor normalisation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::AxisRemap;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for sensor normalisation
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Params {
    /// Remap from the marker detector's axes into the robot body convention.
    ///
    /// This is a property of the rig, the default is the reference rig's remap.
    pub marker_axis_remap: AxisRemap,
}
