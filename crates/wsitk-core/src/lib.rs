//! Transform chains for whole-slide image registration.
//!
//! Parses per-stage parametric transforms (Euler, affine, B-spline), composes
//! them in the order a resampler needs, and maps point sets between image
//! spaces.

pub mod error;
pub mod spatial;
pub mod geometry;
pub mod transform;
pub mod composite;
pub mod sequence;
pub mod resample;

pub use error::{Result, TransformError};
pub use geometry::GridGeometry;
pub use spatial::{Direction2, Point2, Spacing2, Vector2};
pub use transform::{
    Accuracy, InverseConfig, Interpolator, MappedPoint, ParametricTransform, Transform,
    TransformDefinition, TransformKind,
};
pub use composite::{composite_order, CompositeTransform};
pub use sequence::{PointMapping, TransformSequence};
pub use resample::ResampleDescriptor;
