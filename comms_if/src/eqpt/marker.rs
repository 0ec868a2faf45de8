//! # Fiducial Marker Observations

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single detected marker.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MarkerDetection {
    /// Position of the marker in the camera frame.
    ///
    /// Units: meters,
    /// Frame: Camera
    pub position_m_cam: [f64; 3],

    /// Orientation of the marker in the camera frame as an `[x, y, z, w]` quaternion.
    pub orientation_q_cam: [f64; 4],
}

/// All markers detected in one camera update.
///
/// An empty list means no marker is in view, which is not an error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MarkerDetections {
    /// UTC timestamp at which the frame the markers were detected in was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub markers: Vec<MarkerDetection>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MarkerDetections {
    /// Create a new set of detections stamped with the current time.
    pub fn new(markers: Vec<MarkerDetection>) -> Self {
        Self {
            timestamp: Utc::now(),
            markers,
        }
    }

    /// Detections for a frame in which no marker was seen.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// The marker used for localisation, the first one detected. `None` if no marker is in view.
    pub fn primary(&self) -> Option<&MarkerDetection> {
        self.markers.first()
    }
}
