//! Point type for representing physical coordinates.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};
use super::Vector;

/// A point in D-dimensional physical space.
///
/// Used for grid origins, centers of rotation and every coordinate that flows
/// through a transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// The point with all coordinates zero.
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Create a point from a slice, or `None` if the length is not `D`.
    pub fn from_slice(coords: &[f64]) -> Option<Self> {
        if coords.len() != D {
            return None;
        }
        let mut point = Self::origin();
        for (i, c) in coords.iter().enumerate() {
            point.0.coords[i] = *c;
        }
        Some(point)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.coords.iter().copied().collect()
    }

    pub fn to_array(&self) -> [f64; D] {
        std::array::from_fn(|i| self.0.coords[i])
    }

    /// Multiply every coordinate by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(NaPoint::from(self.0.coords * factor))
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.0 - other.0).norm()
    }

    /// Get the inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

impl<const D: usize> std::ops::Sub<Vector<D>> for Point<D> {
    type Output = Self;

    fn sub(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 - vector.0)
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Self::new(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Point2 = Point<2>;
    type Vector2 = Vector<2>;

    #[test]
    fn test_point_from_slice() {
        let p = Point2::from_slice(&[1.0, 2.0]).unwrap();
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
        assert!(Point2::from_slice(&[1.0]).is_none());
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point2::new([5.0, 5.0]);
        let q = Point2::new([2.0, 3.0]);
        assert_eq!(p - q, Vector2::new([3.0, 2.0]));
        assert_eq!(q + Vector2::new([3.0, 2.0]), p);
        assert_eq!(p - Vector2::new([3.0, 2.0]), q);
    }

    #[test]
    fn test_point_scaled() {
        let p = Point2::new([2.0, -4.0]).scaled(0.5);
        assert_eq!(p.to_array(), [1.0, -2.0]);
    }
}
