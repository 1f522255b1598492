//! Spatial types for representing points, vectors, spacing, and direction matrices.
//!
//! All types are thin nalgebra wrappers. Transform parameter files are 2-D, so
//! the 2-D aliases are what the rest of the crate uses.

pub mod point;
pub mod vector;
pub mod spacing;
pub mod direction;

pub use point::Point;
pub use vector::Vector;
pub use spacing::Spacing;
pub use direction::Direction;

pub type Point2 = Point<2>;
pub type Vector2 = Vector<2>;
pub type Spacing2 = Spacing<2>;
pub type Direction2 = Direction<2>;
