//! Rigid transforms between coordinate frames.
//!
//! Transforms are named `a_from_b`: applying `a_from_b` to a point expressed in frame `b` gives the
//! same point expressed in frame `a`. Equivalently, `a_from_b` is the pose of frame `b` in frame
//! `a`. Composition then chains naturally, `a_from_c = a_from_b * b_from_c`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix3, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;
use thiserror::Error;

use crate::maths::wrap_pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance on `R^T R = I` and `det(R) = 1` for a rotation to be considered orthonormal.
pub const ORTHONORMAL_TOL: f64 = 1e-6;

/// Minimum norm of a quaternion before it's considered degenerate.
pub const MIN_QUAT_NORM: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rotation followed by a translation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

/// Planar projection of a transform.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,

    /// Heading about the Z axis, in (-pi, pi]
    pub theta: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("The transform contains non-finite values")]
    NonFinite,

    #[error("The rotation is not orthonormal (error {0:e})")]
    NotOrthonormal(f64),

    #[error("The quaternion {0:?} has a near zero norm")]
    DegenerateQuaternion([f64; 4]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build from a translation and roll/pitch/yaw angles in the static XYZ convention, i.e.
    /// `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.
    pub fn from_euler(translation: Vector3<f64>, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(Rotation3::from_euler_angles(roll, pitch, yaw), translation)
    }

    /// Build from a translation and an `[x, y, z, w]` quaternion.
    ///
    /// The quaternion is normalised. Quaternions with a near zero norm, or containing non-finite
    /// values, are rejected.
    pub fn from_quaternion(
        translation: Vector3<f64>,
        q_xyzw: [f64; 4],
    ) -> Result<Self, TransformError> {
        Ok(Self::new(
            quat_to_rotation(q_xyzw)?,
            translation,
        ))
    }

    /// Build a planar transform, a rotation of `theta` about Z and a translation in the XY plane.
    pub fn planar(x: f64, y: f64, theta: f64) -> Self {
        Self::new(
            Rotation3::from_axis_angle(&Vector3::z_axis(), theta),
            Vector3::new(x, y, 0.0),
        )
    }

    /// The inverse transform, `b_from_a` for `a_from_b`.
    pub fn inverse(&self) -> Self {
        let inv_rot = self.rotation.inverse();
        Self {
            rotation: inv_rot,
            translation: -(inv_rot * self.translation),
        }
    }

    /// Checked inverse, fails if the transform is non-finite or its rotation isn't orthonormal.
    pub fn try_inverse(&self) -> Result<Self, TransformError> {
        self.validate()?;
        Ok(self.inverse())
    }

    /// Check that the transform is finite and the rotation is orthonormal with `det = +1`.
    pub fn validate(&self) -> Result<(), TransformError> {
        let m = self.rotation.matrix();

        if !m.iter().chain(self.translation.iter()).all(|v| v.is_finite()) {
            return Err(TransformError::NonFinite);
        }

        let ortho_err = (m.transpose() * m - Matrix3::identity()).amax();
        let det_err = (m.determinant() - 1.0).abs();
        let err = ortho_err.max(det_err);

        if err > ORTHONORMAL_TOL {
            return Err(TransformError::NotOrthonormal(err));
        }

        Ok(())
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Roll, pitch and yaw of the rotation, static XYZ convention.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.rotation.euler_angles()
    }

    /// Rotation about the Z axis, in (-pi, pi].
    pub fn yaw(&self) -> f64 {
        wrap_pi(self.euler_angles().2)
    }

    /// Project the transform onto the XY plane.
    pub fn to_pose2d(&self) -> Pose2D {
        Pose2D {
            x: self.translation[0],
            y: self.translation[1],
            theta: self.yaw(),
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: self.rotation * rhs.rotation,
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}

impl<'a> Mul<&'a RigidTransform> for &'a RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &'a RigidTransform) -> RigidTransform {
        *self * *rhs
    }
}

impl Pose2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: wrap_pi(theta),
        }
    }

    /// Distance from the origin
    pub fn range(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<Pose2D> for RigidTransform {
    fn from(pose: Pose2D) -> Self {
        RigidTransform::planar(pose.x, pose.y, pose.theta)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an `[x, y, z, w]` quaternion to a rotation.
pub fn quat_to_rotation(q_xyzw: [f64; 4]) -> Result<Rotation3<f64>, TransformError> {
    if !q_xyzw.iter().all(|v| v.is_finite()) {
        return Err(TransformError::NonFinite);
    }

    let q = Quaternion::new(q_xyzw[3], q_xyzw[0], q_xyzw[1], q_xyzw[2]);

    UnitQuaternion::try_new(q, MIN_QUAT_NORM)
        .map(|uq| uq.to_rotation_matrix())
        .ok_or(TransformError::DegenerateQuaternion(q_xyzw))
}

/// Yaw (static XYZ convention) of an `[x, y, z, w]` quaternion.
pub fn quat_yaw(q_xyzw: [f64; 4]) -> Result<f64, TransformError> {
    Ok(wrap_pi(quat_to_rotation(q_xyzw)?.euler_angles().2))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_is_identity(t: &RigidTransform) {
        let id = Matrix3::identity();
        assert!((t.rotation.matrix() - id).amax() < 1e-9, "rotation {:?}", t.rotation);
        assert!(t.translation.amax() < 1e-9, "translation {:?}", t.translation);
    }

    #[test]
    fn test_inverse_round_trip() {
        let transforms = [
            RigidTransform::from_euler(Vector3::new(0.015, -0.0094, 0.185), -1.67493, 0.01726, -1.57504),
            RigidTransform::planar(3.0, -2.0, 2.5),
            RigidTransform::from_euler(Vector3::new(-10.0, 4.0, 7.0), 3.0, -1.2, 0.4),
            RigidTransform::identity(),
        ];

        for t in transforms.iter() {
            assert_is_identity(&(*t * t.inverse()));
            assert_is_identity(&(t.inverse() * *t));
        }
    }

    #[test]
    fn test_compose_frames() {
        // Robot at (1, 1) facing +Y, point 1 m ahead of the robot
        let world_from_robot = RigidTransform::planar(1.0, 1.0, FRAC_PI_2);
        let robot_from_target = RigidTransform::planar(1.0, 0.0, 0.0);

        let world_from_target = world_from_robot * robot_from_target;
        let pose = world_from_target.to_pose2d();

        assert_abs_diff_eq!(pose.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.theta, FRAC_PI_2, epsilon = 1e-12);

        let p = world_from_robot.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion() {
        let half = PI / 4.0;
        let t = RigidTransform::from_quaternion(
            Vector3::zeros(),
            [0.0, 0.0, half.sin() * 2.0, half.cos() * 2.0],
        )
        .unwrap();
        assert_abs_diff_eq!(t.yaw(), FRAC_PI_2, epsilon = 1e-12);
        assert!(t.validate().is_ok());

        assert_eq!(
            quat_yaw([0.0; 4]),
            Err(TransformError::DegenerateQuaternion([0.0; 4]))
        );
        assert_eq!(
            quat_yaw([0.0, 0.0, std::f64::NAN, 1.0]),
            Err(TransformError::NonFinite)
        );
    }

    #[test]
    fn test_validate() {
        let skewed = RigidTransform::new(
            Rotation3::from_matrix_unchecked(Matrix3::new(
                1.0, 0.2, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
            )),
            Vector3::zeros(),
        );
        assert!(matches!(
            skewed.try_inverse(),
            Err(TransformError::NotOrthonormal(_))
        ));

        let nan = RigidTransform::planar(std::f64::NAN, 0.0, 0.0);
        assert_eq!(nan.try_inverse(), Err(TransformError::NonFinite));

        let reflection = RigidTransform::new(
            Rotation3::from_matrix_unchecked(Matrix3::new(
                -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
            )),
            Vector3::zeros(),
        );
        assert!(reflection.validate().is_err());
    }

    #[test]
    fn test_pose2d_wraps() {
        let pose = Pose2D::new(1.0, 2.0, 3.0 * PI);
        assert_abs_diff_eq!(pose.theta, PI, epsilon = 1e-12);
        assert_abs_diff_eq!(Pose2D::new(3.0, 4.0, 0.0).range(), 5.0);

        let t: RigidTransform = Pose2D::new(1.0, -1.0, -2.0).into();
        assert_abs_diff_eq!(t.yaw(), -2.0, epsilon = 1e-12);
    }
}
