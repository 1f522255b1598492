//! Transform kinds and resample interpolators named in parameter files.

use std::fmt;
use std::str::FromStr;
use crate::error::TransformError;

/// The closed set of transform kinds a parameter file can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// 2-D rigid: rotation angle plus translation.
    Euler,
    /// 2-D affine: 2×2 matrix plus translation.
    Affine,
    /// Free-form deformation on a B-spline control grid.
    BSpline,
}

impl TransformKind {
    /// Name used in the `Transform` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euler => "EulerTransform",
            Self::Affine => "AffineTransform",
            Self::BSpline => "BSplineTransform",
        }
    }

    /// Fixed parameter count, `None` when it depends on the control grid.
    pub fn fixed_parameter_count(&self) -> Option<usize> {
        match self {
            Self::Euler => Some(3),
            Self::Affine => Some(6),
            Self::BSpline => None,
        }
    }

    pub fn is_linear(&self) -> bool {
        !matches!(self, Self::BSpline)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransformKind {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EulerTransform" => Ok(Self::Euler),
            "AffineTransform" => Ok(Self::Affine),
            "BSplineTransform" => Ok(Self::BSpline),
            other => Err(TransformError::UnsupportedTransform(other.to_string())),
        }
    }
}

/// Interpolator the external resampler should use for the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolator {
    #[default]
    NearestNeighbor,
    Linear,
    BSpline,
}

impl Interpolator {
    /// Name used in the `ResampleInterpolator` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "FinalNearestNeighborInterpolator",
            Self::Linear => "FinalLinearInterpolator",
            Self::BSpline => "FinalBSplineInterpolator",
        }
    }
}

impl fmt::Display for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interpolator {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FinalNearestNeighborInterpolator" => Ok(Self::NearestNeighbor),
            "FinalLinearInterpolator" => Ok(Self::Linear),
            "FinalBSplineInterpolator" | "FinalBSplineInterpolatorFloat" => Ok(Self::BSpline),
            other => Err(TransformError::UnsupportedInterpolator(other.to_string())),
        }
    }
}
