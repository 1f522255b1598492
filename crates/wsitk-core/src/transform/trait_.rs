//! Transform trait and the evaluation result every transform returns.

use nalgebra::Matrix3;
use crate::spatial::Point2;

/// How far an evaluation can be trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accuracy {
    /// Closed-form evaluation.
    Exact,
    /// Iterative evaluation; `residual` is the physical-space error of the
    /// final estimate.
    Approximate {
        residual: f64,
        iterations: usize,
        converged: bool,
    },
}

impl Accuracy {
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact)
    }

    /// Accuracy of two evaluations applied one after the other.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Exact, a) | (a, Self::Exact) => a,
            (
                Self::Approximate { residual: r1, iterations: i1, converged: c1 },
                Self::Approximate { residual: r2, iterations: i2, converged: c2 },
            ) => Self::Approximate {
                residual: r1.max(r2),
                iterations: i1 + i2,
                converged: c1 && c2,
            },
        }
    }
}

/// A transformed point plus the flags the caller must check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedPoint {
    pub point: Point2,
    pub accuracy: Accuracy,
    /// The point lay outside the transform's domain and was evaluated at the
    /// nearest valid location.
    pub clamped: bool,
}

impl MappedPoint {
    pub fn exact(point: Point2) -> Self {
        Self {
            point,
            accuracy: Accuracy::Exact,
            clamped: false,
        }
    }

    /// Chain a later evaluation onto this one, keeping the later point.
    pub fn then(self, next: MappedPoint) -> MappedPoint {
        MappedPoint {
            point: next.point,
            accuracy: self.accuracy.combine(next.accuracy),
            clamped: self.clamped || next.clamped,
        }
    }

    /// Neither approximate nor clamped.
    pub fn is_trusted(&self) -> bool {
        self.accuracy.is_exact() && !self.clamped
    }
}

/// Transform trait for 2-D point mapping.
///
/// The forward direction maps fixed (output) space to moving (input) space,
/// the direction a resampler walks.
pub trait Transform {
    /// Forward evaluation.
    fn transform_point(&self, point: &Point2) -> MappedPoint;

    /// Inverse evaluation. Exact for linear kinds, approximate otherwise.
    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint;

    /// Homogeneous 3×3 matrix of the forward map, for linear transforms.
    fn linear_matrix(&self) -> Option<Matrix3<f64>> {
        None
    }

    fn is_linear(&self) -> bool {
        self.linear_matrix().is_some()
    }
}
