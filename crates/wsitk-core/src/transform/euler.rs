//! 2-D Euler (rigid) transform: rotation about a fixed center plus translation.

use nalgebra::{Matrix2, Matrix3};
use crate::error::{Result, TransformError};
use crate::spatial::{Point2, Vector, Vector2};
use super::kind::TransformKind;
use super::trait_::{MappedPoint, Transform};

/// Rigid Transform (Rotation + Translation).
///
/// T(x) = R(x - c) + c + t, parameters `[angle, tx, ty]` with the angle in
/// radians, counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct EulerTransform {
    angle: f64,
    translation: Vector2,
    center: Point2,
    rotation: Matrix2<f64>,
}

impl EulerTransform {
    pub const NUM_PARAMETERS: usize = 3;

    pub fn new(angle: f64, translation: Vector2, center: Point2) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            angle,
            translation,
            center,
            rotation: Matrix2::new(c, -s, s, c),
        }
    }

    /// Build from the flat `[angle, tx, ty]` parameter vector.
    pub fn from_parameters(parameters: &[f64], center: Point2) -> Result<Self> {
        match parameters {
            [angle, tx, ty] => Ok(Self::new(*angle, Vector2::new([*tx, *ty]), center)),
            _ => Err(TransformError::parameter_count(
                TransformKind::Euler.name(),
                Self::NUM_PARAMETERS,
                parameters.len(),
            )),
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        vec![self.angle, self.translation[0], self.translation[1]]
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn translation(&self) -> &Vector2 {
        &self.translation
    }

    pub fn center(&self) -> &Point2 {
        &self.center
    }
}

impl Transform for EulerTransform {
    fn transform_point(&self, point: &Point2) -> MappedPoint {
        let centered = (*point - self.center).0;
        let rotated = Vector(self.rotation * centered);
        MappedPoint::exact(self.center + rotated + self.translation)
    }

    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint {
        // R is orthonormal, so R^-1 = R^T.
        let shifted = (*point - self.center - self.translation).0;
        let unrotated = Vector(self.rotation.transpose() * shifted);
        MappedPoint::exact(self.center + unrotated)
    }

    fn linear_matrix(&self) -> Option<Matrix3<f64>> {
        Some(super::homogeneous(&self.rotation, &self.center, &self.translation))
    }
}
