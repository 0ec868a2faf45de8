//! Axis remapping between sensor conventions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::NormError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A signed permutation of the X, Y and Z axes.
///
/// Output axis `i` is `signs[i] * input[axes[i]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRemap {
    pub axes: [usize; 3],
    pub signs: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisRemap {
    /// The remap that leaves all axes unchanged.
    pub fn identity() -> Self {
        Self {
            axes: [0, 1, 2],
            signs: [1.0, 1.0, 1.0],
        }
    }

    /// Check the remap is a proper rotation, i.e. a permutation with unit signs and `det = +1`.
    ///
    /// The quaternion remap is only valid for proper rotations, a reflection would flip the
    /// handedness of the orientation.
    pub fn validate(&self) -> Result<(), NormError> {
        let mut seen = [false; 3];
        for &a in self.axes.iter() {
            if a > 2 || seen[a] {
                return Err(NormError::InvalidRemap(*self));
            }
            seen[a] = true;
        }

        if !self.signs.iter().all(|s| *s == 1.0 || *s == -1.0) {
            return Err(NormError::InvalidRemap(*self));
        }

        if (self.matrix().determinant() - 1.0).abs() > 1e-9 {
            return Err(NormError::InvalidRemap(*self));
        }

        Ok(())
    }

    /// Matrix form of the remap, `output = M * input`.
    ///
    /// Only meaningful once `validate` has passed.
    pub fn matrix(&self) -> Matrix3<f64> {
        let mut m = Matrix3::zeros();
        for i in 0..3 {
            m[(i, self.axes[i])] = self.signs[i];
        }
        m
    }

    pub fn apply_vec(&self, v: [f64; 3]) -> [f64; 3] {
        [
            self.signs[0] * v[self.axes[0]],
            self.signs[1] * v[self.axes[1]],
            self.signs[2] * v[self.axes[2]],
        ]
    }

    /// Remap the vector part of an `[x, y, z, w]` quaternion, leaving the scalar part unchanged.
    pub fn apply_quat(&self, q: [f64; 4]) -> [f64; 4] {
        let [x, y, z] = self.apply_vec([q[0], q[1], q[2]]);
        [x, y, z, q[3]]
    }
}

impl Default for AxisRemap {
    /// The reference rig's marker remap: `x = z`, `y = y`, `z = -x`.
    fn default() -> Self {
        Self {
            axes: [2, 1, 0],
            signs: [1.0, 1.0, -1.0],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(AxisRemap::default().validate().is_ok());
        assert!(AxisRemap::identity().validate().is_ok());

        // Plain swap of two axes is a reflection
        let swap = AxisRemap {
            axes: [1, 0, 2],
            signs: [1.0, 1.0, 1.0],
        };
        assert_eq!(swap.validate(), Err(NormError::InvalidRemap(swap)));

        let repeated = AxisRemap {
            axes: [0, 0, 2],
            signs: [1.0, 1.0, 1.0],
        };
        assert!(repeated.validate().is_err());

        let scaled = AxisRemap {
            axes: [0, 1, 2],
            signs: [2.0, 1.0, 0.5],
        };
        assert!(scaled.validate().is_err());
    }

    #[test]
    fn test_apply() {
        let remap = AxisRemap::default();
        assert_eq!(remap.apply_vec([1.0, 2.0, 3.0]), [3.0, 2.0, -1.0]);
        assert_eq!(remap.apply_quat([1.0, 2.0, 3.0, 4.0]), [3.0, 2.0, -1.0, 4.0]);

        let v = nalgebra::Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(remap.matrix() * v, nalgebra::Vector3::new(3.0, 2.0, -1.0));
    }
}
