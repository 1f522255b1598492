//! Affine transform implementation.

use nalgebra::{Matrix2, Matrix3};
use crate::error::{Result, TransformError};
use crate::spatial::{Point2, Vector, Vector2};
use super::kind::TransformKind;
use super::trait_::{MappedPoint, Transform};

/// Affine Transform (Linear transformation + Translation).
///
/// T(x) = A(x - c) + c + t
///
/// where:
/// * A is the 2×2 matrix, listed row-major as the first four parameters
/// * t is the translation, the last two parameters
/// * c is the fixed center
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix2<f64>,
    inverse_matrix: Matrix2<f64>,
    translation: Vector2,
    center: Point2,
}

impl AffineTransform {
    pub const NUM_PARAMETERS: usize = 6;

    /// Fails with `SingularMatrix` when `matrix` cannot be inverted.
    pub fn new(matrix: Matrix2<f64>, translation: Vector2, center: Point2) -> Result<Self> {
        let det = matrix.determinant();
        let inverse_matrix = matrix
            .try_inverse()
            .filter(|inv| det.is_finite() && det != 0.0 && inv.iter().all(|v| v.is_finite()))
            .ok_or_else(|| TransformError::SingularMatrix(format!("affine matrix determinant {}", det)))?;
        Ok(Self {
            matrix,
            inverse_matrix,
            translation,
            center,
        })
    }

    /// Build from `[a00, a01, a10, a11, tx, ty]`.
    pub fn from_parameters(parameters: &[f64], center: Point2) -> Result<Self> {
        match parameters {
            [a00, a01, a10, a11, tx, ty] => Self::new(
                Matrix2::new(*a00, *a01, *a10, *a11),
                Vector2::new([*tx, *ty]),
                center,
            ),
            _ => Err(TransformError::parameter_count(
                TransformKind::Affine.name(),
                Self::NUM_PARAMETERS,
                parameters.len(),
            )),
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        let m = &self.matrix;
        vec![
            m[(0, 0)],
            m[(0, 1)],
            m[(1, 0)],
            m[(1, 1)],
            self.translation[0],
            self.translation[1],
        ]
    }

    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.matrix
    }

    pub fn translation(&self) -> &Vector2 {
        &self.translation
    }

    pub fn center(&self) -> &Point2 {
        &self.center
    }
}

impl Transform for AffineTransform {
    fn transform_point(&self, point: &Point2) -> MappedPoint {
        let centered = (*point - self.center).0;
        MappedPoint::exact(self.center + Vector(self.matrix * centered) + self.translation)
    }

    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint {
        let shifted = (*point - self.center - self.translation).0;
        MappedPoint::exact(self.center + Vector(self.inverse_matrix * shifted))
    }

    fn linear_matrix(&self) -> Option<Matrix3<f64>> {
        Some(super::homogeneous(&self.matrix, &self.center, &self.translation))
    }
}
