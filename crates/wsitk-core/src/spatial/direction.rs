//! Direction type for representing grid orientation.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};
use super::Vector;

/// Direction matrix representing grid orientation.
///
/// Column i is the direction of the i-th grid axis in physical space.
/// Parameter files list the matrix row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Create an identity direction matrix (no rotation).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build from a row-major listing, or `None` if the length is not `D * D`.
    pub fn from_row_major(values: &[f64]) -> Option<Self> {
        if values.len() != D * D {
            return None;
        }
        Some(Self(SMatrix::from_row_slice(values)))
    }

    /// Row-major listing of the matrix entries.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                out.push(self.0[(r, c)]);
            }
        }
        out
    }

    /// Try to compute the inverse of the direction matrix.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Get the inner nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl<const D: usize> Default for Direction<D> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}
