//! # Sensor normalisation module
//!
//! Raw headings from the marker and inertial streams are each relative to an unknown zero. The
//! first valid heading received from a source is latched as that source's bias and subtracted
//! from every later heading of the same source, so each stream reads zero at the start of the run.
//! Biases are never shared between sources.
//!
//! Marker observations are additionally remapped from the marker detector's axis convention into
//! the robot body convention before the bias is removed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod remap;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use comms_if::eqpt::{
    marker::MarkerDetections,
    odom::{Displacement, Heading},
};
pub use params::Params;
pub use remap::AxisRemap;
use util::transform::{quat_to_rotation, quat_yaw, RigidTransform, TransformError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading bias of a single source.
///
/// Empty until the first sample is seen, then fixed for the rest of the run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct HeadingBias {
    bias_rad: Option<f64>,
}

/// A normalised marker observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerObservation {
    /// True if at least one marker was in view. If false the pose fields are zero.
    pub visible: bool,

    /// Position of the marker, remapped into the body axis convention.
    ///
    /// Units: meters,
    /// Frame: Camera
    pub position_m_cam: Vector3<f64>,

    /// Roll, pitch and bias-corrected yaw of the marker (static XYZ).
    ///
    /// Units: radians,
    /// Frame: Camera
    pub att_euler_rad_cam: [f64; 3],
}

/// A bias-corrected heading sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadingSample {
    /// Units: radians,
    /// Frame: Inertial
    pub yaw_rad: f64,
}

/// A displacement sample. Positions are passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplacementSample {
    /// Units: meters,
    /// Frame: Inertial
    pub position_m_inr: Vector3<f64>,
}

/// Normaliser for the marker stream.
#[derive(Debug, Clone)]
pub struct MarkerNormaliser {
    remap: AxisRemap,
    bias: HeadingBias,
}

/// Normaliser for the inertial heading stream.
#[derive(Debug, Default, Clone)]
pub struct HeadingNormaliser {
    bias: HeadingBias,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum NormError {
    #[error("The axis remap {0:?} is not a proper rotation")]
    InvalidRemap(AxisRemap),

    #[error("Invalid marker orientation: {0}")]
    InvalidMarkerOrientation(TransformError),

    #[error("Invalid heading: {0}")]
    InvalidHeading(TransformError),

    #[error("Position contains non-finite values: {0:?}")]
    NonFinitePosition([f64; 3]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingBias {
    /// Remove the bias from a raw heading, latching it first if this is the first sample.
    pub fn normalise(&mut self, raw_rad: f64) -> f64 {
        let bias = *self.bias_rad.get_or_insert(raw_rad);
        raw_rad - bias
    }

    pub fn bias_rad(&self) -> Option<f64> {
        self.bias_rad
    }
}

impl MarkerObservation {
    /// Observation of a frame with no marker in view.
    pub fn not_visible() -> Self {
        Self {
            visible: false,
            position_m_cam: Vector3::zeros(),
            att_euler_rad_cam: [0.0; 3],
        }
    }

    /// Pose of the marker in the camera frame.
    pub fn camera_from_marker(&self) -> RigidTransform {
        let [roll, pitch, yaw] = self.att_euler_rad_cam;
        RigidTransform::from_euler(self.position_m_cam, roll, pitch, yaw)
    }
}

impl MarkerNormaliser {
    pub fn new(params: &Params) -> Result<Self, NormError> {
        params.marker_axis_remap.validate()?;

        Ok(Self {
            remap: params.marker_axis_remap,
            bias: HeadingBias::default(),
        })
    }

    /// Normalise a set of detections.
    ///
    /// Only the first detection is used. Invalid detections are rejected before the bias is
    /// latched, so a bad first sample can't corrupt the zero reference.
    pub fn normalise(&mut self, dets: &MarkerDetections) -> Result<MarkerObservation, NormError> {
        let det = match dets.primary() {
            Some(d) => d,
            None => return Ok(MarkerObservation::not_visible()),
        };

        check_finite(&det.position_m_cam)?;

        let position = self.remap.apply_vec(det.position_m_cam);
        let orientation = self.remap.apply_quat(det.orientation_q_cam);

        let (roll, pitch, raw_yaw) = quat_to_rotation(orientation)
            .map_err(NormError::InvalidMarkerOrientation)?
            .euler_angles();

        let first = self.bias.bias_rad().is_none();
        let yaw = self.bias.normalise(raw_yaw);
        if first {
            info!("Marker heading bias latched at {:.4} rad", raw_yaw);
        }

        Ok(MarkerObservation {
            visible: true,
            position_m_cam: Vector3::from(position),
            att_euler_rad_cam: [roll, pitch, yaw],
        })
    }

    pub fn bias(&self) -> &HeadingBias {
        &self.bias
    }
}

impl HeadingNormaliser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalise(&mut self, heading: &Heading) -> Result<HeadingSample, NormError> {
        let raw_yaw = quat_yaw(heading.attitude_q_inr).map_err(NormError::InvalidHeading)?;

        let first = self.bias.bias_rad().is_none();
        let yaw_rad = self.bias.normalise(raw_yaw);
        if first {
            info!("Inertial heading bias latched at {:.4} rad", raw_yaw);
        }

        Ok(HeadingSample { yaw_rad })
    }

    pub fn bias(&self) -> &HeadingBias {
        &self.bias
    }
}

impl DisplacementSample {
    pub fn from_displacement(disp: &Displacement) -> Result<Self, NormError> {
        check_finite(&disp.position_m_inr)?;

        Ok(Self {
            position_m_inr: Vector3::from(disp.position_m_inr),
        })
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_finite(position: &[f64; 3]) -> Result<(), NormError> {
    if position.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(NormError::NonFinitePosition(*position))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use comms_if::eqpt::marker::MarkerDetection;

    fn yaw_quat(yaw: f64) -> [f64; 4] {
        [0.0, 0.0, (0.5 * yaw).sin(), (0.5 * yaw).cos()]
    }

    #[test]
    fn test_bias_latch() {
        let raw = [0.7, 0.9, -0.2, 3.0];
        let mut bias = HeadingBias::default();

        assert_eq!(bias.normalise(raw[0]), 0.0);
        for r in raw.iter().skip(1) {
            assert_eq!(bias.normalise(*r), r - raw[0]);
        }
        assert_eq!(bias.bias_rad(), Some(0.7));
    }

    #[test]
    fn test_heading_normaliser() {
        let mut norm = HeadingNormaliser::new();

        let first = norm.normalise(&Heading::new(yaw_quat(1.2))).unwrap();
        assert_eq!(first.yaw_rad, 0.0);

        let second = norm.normalise(&Heading::new(yaw_quat(1.5))).unwrap();
        assert_abs_diff_eq!(second.yaw_rad, 0.3, epsilon = 1e-12);

        // A degenerate sample is rejected and doesn't touch the bias
        let mut fresh = HeadingNormaliser::new();
        assert!(fresh.normalise(&Heading::new([0.0; 4])).is_err());
        assert_eq!(fresh.bias().bias_rad(), None);
    }

    #[test]
    fn test_sources_have_independent_biases() {
        let mut heading = HeadingNormaliser::new();
        let mut marker = MarkerNormaliser::new(&Params::default()).unwrap();

        heading.normalise(&Heading::new(yaw_quat(0.5))).unwrap();

        // The marker stream latches its own bias, unaffected by the inertial one
        let det = MarkerDetection {
            position_m_cam: [0.0, 0.0, 1.0],
            orientation_q_cam: [0.0, 0.0, 0.0, 1.0],
        };
        let obs = marker.normalise(&MarkerDetections::new(vec![det])).unwrap();

        assert!(obs.visible);
        assert_eq!(obs.att_euler_rad_cam[2], 0.0);
        assert_eq!(heading.bias().bias_rad(), Some(0.5));
        assert_eq!(marker.bias().bias_rad(), Some(0.0));
    }

    #[test]
    fn test_marker_remap() {
        let mut marker = MarkerNormaliser::new(&Params::default()).unwrap();

        let det = MarkerDetection {
            position_m_cam: [0.1, 0.2, 1.5],
            orientation_q_cam: [0.0, 0.0, 0.0, 1.0],
        };
        let obs = marker.normalise(&MarkerDetections::new(vec![det])).unwrap();

        // new_x = raw_z, new_y = raw_y, new_z = -raw_x
        assert_eq!(obs.position_m_cam, Vector3::new(1.5, 0.2, -0.1));
    }

    #[test]
    fn test_marker_not_visible() {
        let mut marker = MarkerNormaliser::new(&Params::default()).unwrap();
        let obs = marker.normalise(&MarkerDetections::none()).unwrap();

        assert_eq!(obs, MarkerObservation::not_visible());
        assert_eq!(marker.bias().bias_rad(), None);
    }
}
