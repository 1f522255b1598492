//! Transform types and operations.
//!
//! One module per transform kind, plus [`ParametricTransform`], the tagged
//! union a parameter map is parsed into.

pub mod trait_;
pub mod kind;
pub mod definition;
pub mod euler;
pub mod affine;
pub mod bspline;
pub mod parametric;

pub use trait_::{Accuracy, MappedPoint, Transform};
pub use kind::{Interpolator, TransformKind};
pub use definition::{ParameterValue, TransformDefinition};
pub use euler::EulerTransform;
pub use affine::AffineTransform;
pub use bspline::{BSplineTransform, InverseConfig, SplineOrder};
pub use parametric::{ParametricTransform, TransformModel};

use nalgebra::{Matrix2, Matrix3};
use crate::spatial::{Point2, Vector2};

/// Homogeneous matrix of `x -> A(x - c) + c + t`.
pub(crate) fn homogeneous(a: &Matrix2<f64>, center: &Point2, translation: &Vector2) -> Matrix3<f64> {
    let c = center.0.coords;
    let offset = c + translation.0 - a * c;
    Matrix3::new(
        a[(0, 0)], a[(0, 1)], offset[0],
        a[(1, 0)], a[(1, 1)], offset[1],
        0.0, 0.0, 1.0,
    )
}
