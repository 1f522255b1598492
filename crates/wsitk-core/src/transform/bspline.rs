//! B-Spline transform implementation.
//!
//! Free-form deformation defined by displacement coefficients on a regular
//! control grid. Forward evaluation is exact; the inverse is found by
//! fixed-point iteration and is only as good as its reported residual.

use crate::error::{Result, TransformError};
use crate::geometry::GridGeometry;
use crate::spatial::{Point2, Vector2};
use super::kind::TransformKind;
use super::trait_::{Accuracy, MappedPoint, Transform};

/// Polynomial order of the B-spline basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplineOrder {
    Linear,
    Quadratic,
    #[default]
    Cubic,
}

impl SplineOrder {
    pub fn from_degree(degree: usize) -> Result<Self> {
        match degree {
            1 => Ok(Self::Linear),
            2 => Ok(Self::Quadratic),
            3 => Ok(Self::Cubic),
            other => Err(TransformError::invalid_geometry(format!(
                "B-spline order must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }

    pub fn degree(&self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
        }
    }

    /// Centered basis function β(t).
    fn weight(&self, t: f64) -> f64 {
        let a = t.abs();
        match self {
            Self::Linear => (1.0 - a).max(0.0),
            Self::Quadratic => {
                if a < 0.5 {
                    0.75 - a * a
                } else if a < 1.5 {
                    0.5 * (1.5 - a) * (1.5 - a)
                } else {
                    0.0
                }
            }
            Self::Cubic => {
                if a < 1.0 {
                    (4.0 - 6.0 * a * a + 3.0 * a * a * a) / 6.0
                } else if a < 2.0 {
                    (2.0 - a).powi(3) / 6.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Lowest continuous grid index whose support stays on the grid.
    fn support_offset(&self) -> f64 {
        (self.degree() as f64 - 1.0) / 2.0
    }
}

/// Settings for the iterative inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseConfig {
    /// Stop once `|T(x) - y|` falls below this, in physical units.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 50,
        }
    }
}

impl InverseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// B-Spline Transform (Free-form deformation).
///
/// `T(x) = x + Σ β(u - k) c_k` where `u` is the continuous control-grid index
/// of `x`. Coefficients are physical displacements stored x-fastest, all x
/// components first and then all y components.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineTransform {
    grid: GridGeometry,
    order: SplineOrder,
    coefficients_x: Vec<f64>,
    coefficients_y: Vec<f64>,
    inverse_config: InverseConfig,
}

impl BSplineTransform {
    pub fn new(grid: GridGeometry, order: SplineOrder, parameters: &[f64]) -> Result<Self> {
        let [gx, gy] = grid.size();
        let needed = order.degree() + 1;
        if gx < needed || gy < needed {
            return Err(TransformError::invalid_geometry(format!(
                "control grid {:?} too small for spline order {}",
                grid.size(),
                order.degree()
            )));
        }
        let expected = Self::parameter_count_for(&grid);
        if parameters.len() != expected {
            return Err(TransformError::parameter_count(
                TransformKind::BSpline.name(),
                expected,
                parameters.len(),
            ));
        }
        let (xs, ys) = parameters.split_at(expected / 2);
        Ok(Self {
            grid,
            order,
            coefficients_x: xs.to_vec(),
            coefficients_y: ys.to_vec(),
            inverse_config: InverseConfig::default(),
        })
    }

    /// Two displacement components per control point.
    pub fn parameter_count_for(grid: &GridGeometry) -> usize {
        2 * grid.num_points()
    }

    pub fn with_inverse_config(mut self, config: InverseConfig) -> Self {
        self.inverse_config = config;
        self
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn order(&self) -> SplineOrder {
        self.order
    }

    pub fn inverse_config(&self) -> &InverseConfig {
        &self.inverse_config
    }

    pub fn parameters(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.coefficients_x.len() * 2);
        out.extend_from_slice(&self.coefficients_x);
        out.extend_from_slice(&self.coefficients_y);
        out
    }

    /// Displacement at `point`, and whether the point had to be clamped onto
    /// the valid region of the control grid.
    pub fn displacement(&self, point: &Point2) -> (Vector2, bool) {
        let index = self.grid.physical_to_index(point);
        let size = self.grid.size();
        let offset = self.order.support_offset();
        let degree = self.order.degree();
        let mut clamped = false;

        let mut starts = [0usize; 2];
        let mut weights = [[0.0f64; 4]; 2];
        for axis in 0..2 {
            let lo = offset;
            let hi = size[axis] as f64 - (degree as f64 + 1.0) / 2.0;
            let mut u = index[axis];
            if !(lo..=hi).contains(&u) {
                clamped = true;
                u = if u.is_nan() { lo } else { u.clamp(lo, hi) };
            }
            let start = (u - offset).floor();
            starts[axis] = start as usize;
            for (k, w) in weights[axis].iter_mut().enumerate().take(degree + 1) {
                *w = self.order.weight(u - (start + k as f64));
            }
        }

        let (gx, gy) = (size[0], size[1]);
        let mut dx = 0.0;
        let mut dy = 0.0;
        for j in 0..=degree {
            let wy = weights[1][j];
            if wy == 0.0 {
                continue;
            }
            let iy = (starts[1] + j).min(gy - 1);
            for i in 0..=degree {
                let w = weights[0][i] * wy;
                if w == 0.0 {
                    continue;
                }
                let ix = (starts[0] + i).min(gx - 1);
                let flat = iy * gx + ix;
                dx += w * self.coefficients_x[flat];
                dy += w * self.coefficients_y[flat];
            }
        }
        (Vector2::new([dx, dy]), clamped)
    }
}

impl Transform for BSplineTransform {
    fn transform_point(&self, point: &Point2) -> MappedPoint {
        let (displacement, clamped) = self.displacement(point);
        MappedPoint {
            point: *point + displacement,
            accuracy: Accuracy::Exact,
            clamped,
        }
    }

    /// Solves `x + d(x) = y` by iterating `x ← y - d(x)`.
    ///
    /// Converges when the deformation is a contraction (displacement gradient
    /// below one), which holds for the smooth fields registration produces.
    /// The result is always reported as approximate.
    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint {
        let InverseConfig { tolerance, max_iterations } = self.inverse_config;
        let mut estimate = *point;
        let mut iterations = 0;
        let (mut displacement, mut clamped) = self.displacement(&estimate);
        let mut residual = displacement.norm();

        while residual > tolerance && iterations < max_iterations {
            estimate = *point - displacement;
            iterations += 1;
            let (d, c) = self.displacement(&estimate);
            displacement = d;
            clamped = c;
            residual = (estimate + displacement - *point).norm();
        }

        let converged = residual <= tolerance;
        if !converged {
            tracing::warn!(
                "B-spline inverse did not converge after {} iterations (residual {:.3e})",
                iterations,
                residual
            );
        }
        MappedPoint {
            point: estimate,
            accuracy: Accuracy::Approximate {
                residual,
                iterations,
                converged,
            },
            clamped,
        }
    }
}
