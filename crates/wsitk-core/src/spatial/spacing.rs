//! Spacing between adjacent pixels along each axis.

use super::Vector;

/// Physical distance between adjacent pixels along each axis.
///
/// This is a type alias to Vector for semantic clarity.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Create uniform spacing (same value for all dimensions).
    pub fn uniform(value: f64) -> Self {
        Self::new([value; D])
    }

    /// Check if spacing is uniform (all components equal).
    pub fn is_uniform(&self) -> bool {
        if D == 0 {
            return true;
        }
        let first = self[0];
        (1..D).all(|i| (self[i] - first).abs() < 1e-9)
    }

    /// True when every component is finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0.iter().all(|s| s.is_finite() && *s > 0.0)
    }

    /// Elementwise `self / other`.
    pub fn ratio(&self, other: &Self) -> Self {
        Self(self.0.component_div(&other.0))
    }
}
