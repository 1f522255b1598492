//! Ordered, stage-indexed transform sequences.
//!
//! A sequence owns the transforms from one or more `add_transforms` calls and
//! derives two consumers from them:
//!
//! * the [`ResampleDescriptor`], whose composite transform uses composite
//!   order (per-stage reversal, see [`composite_order`]), and
//! * [`TransformSequence::transform_points`], which applies the inverse of
//!   every transform in plain insertion order.
//!
//! Derived state is recomputed from scratch after every mutation.

use std::sync::Arc;
use rayon::prelude::*;
use crate::composite::{composite_order, CompositeTransform};
use crate::error::{Result, TransformError};
use crate::geometry::GridGeometry;
use crate::resample::ResampleDescriptor;
use crate::spatial::{Point2, Spacing2};
use crate::transform::{Accuracy, MappedPoint, ParametricTransform, Transform};

/// How `transform_points` interprets its input and output coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMapping {
    /// Inputs are pixel indices and are multiplied by `input_resolution`.
    pub input_is_pixel_index: bool,
    /// Physical size of an input pixel.
    pub input_resolution: f64,
    /// Outputs are divided by the sequence's output spacing.
    pub output_is_pixel_index: bool,
}

impl Default for PointMapping {
    fn default() -> Self {
        Self {
            input_is_pixel_index: true,
            input_resolution: 1.0,
            output_is_pixel_index: true,
        }
    }
}

impl PointMapping {
    /// Physical coordinates in and out.
    pub fn physical() -> Self {
        Self {
            input_is_pixel_index: false,
            input_resolution: 1.0,
            output_is_pixel_index: false,
        }
    }

    pub fn with_input_pixels(mut self, resolution: f64) -> Self {
        self.input_is_pixel_index = true;
        self.input_resolution = resolution;
        self
    }

    pub fn with_physical_input(mut self) -> Self {
        self.input_is_pixel_index = false;
        self
    }

    pub fn with_output_pixels(mut self, enabled: bool) -> Self {
        self.output_is_pixel_index = enabled;
        self
    }
}

/// State derived from the transform list.
#[derive(Debug, Clone)]
struct Derived {
    composite_order: Vec<usize>,
    geometry: GridGeometry,
    descriptor: ResampleDescriptor,
}

/// Sequence of parametric transforms grouped by registration stage.
#[derive(Debug, Clone, Default)]
pub struct TransformSequence {
    transforms: Vec<Arc<ParametricTransform>>,
    stage_indices: Vec<usize>,
    derived: Option<Derived>,
}

impl TransformSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence from one batch of transforms.
    pub fn from_transforms(transforms: Vec<ParametricTransform>, stage_indices: &[usize]) -> Result<Self> {
        let mut sequence = Self::new();
        sequence.add_transforms(transforms, stage_indices)?;
        Ok(sequence)
    }

    /// Append transforms with their stage indices.
    ///
    /// Indices are shifted by one past the largest index already present,
    /// so stages from separate calls never merge. The output grid is reset
    /// to that of the last transform added.
    pub fn add_transforms(&mut self, transforms: Vec<ParametricTransform>, stage_indices: &[usize]) -> Result<()> {
        let shared = transforms.into_iter().map(Arc::new).collect();
        self.add_shared(shared, stage_indices)
    }

    /// Append every transform of `other`, keeping its stage grouping.
    pub fn append(&mut self, other: &TransformSequence) -> Result<()> {
        self.add_shared(other.transforms.clone(), &other.stage_indices)
    }

    fn add_shared(&mut self, transforms: Vec<Arc<ParametricTransform>>, stage_indices: &[usize]) -> Result<()> {
        if transforms.len() != stage_indices.len() {
            return Err(TransformError::StageIndexMismatch {
                transforms: transforms.len(),
                indices: stage_indices.len(),
            });
        }
        if transforms.is_empty() {
            return Ok(());
        }
        let offset = self.stage_indices.iter().max().map_or(0, |m| m + 1);
        self.transforms.extend(transforms);
        self.stage_indices.extend(stage_indices.iter().map(|s| s + offset));

        let geometry = *self.transforms[self.transforms.len() - 1].geometry();
        self.rebuild(geometry)
    }

    /// Resample at `spacing`, scaling the output size to keep the physical
    /// extent: `size = ceil(size * old_spacing / spacing)`.
    pub fn set_output_spacing(&mut self, spacing: Spacing2) -> Result<()> {
        let current = self.derived()?.geometry;
        let geometry = current.rescaled(spacing)?;
        tracing::debug!(
            "Output spacing {:?} -> {:?}, size {:?} -> {:?}",
            current.spacing().to_array(),
            spacing.to_array(),
            current.size(),
            geometry.size()
        );
        self.rebuild(geometry)
    }

    fn rebuild(&mut self, geometry: GridGeometry) -> Result<()> {
        let order = composite_order(&self.stage_indices);
        let ordered = order.iter().map(|&i| Arc::clone(&self.transforms[i])).collect();
        let composite = CompositeTransform::new(ordered)?;

        let last = &self.transforms[self.transforms.len() - 1];
        let descriptor = ResampleDescriptor::new(
            geometry,
            last.resample_interpolator(),
            last.default_pixel_value(),
            composite,
        );
        tracing::debug!(
            "Rebuilt composite of {} transforms, composite order {:?}, output size {:?}",
            self.transforms.len(),
            order,
            geometry.size()
        );
        self.derived = Some(Derived {
            composite_order: order,
            geometry,
            descriptor,
        });
        Ok(())
    }

    fn derived(&self) -> Result<&Derived> {
        self.derived.as_ref().ok_or(TransformError::EmptySequence)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transforms in insertion order.
    pub fn transforms(&self) -> &[Arc<ParametricTransform>] {
        &self.transforms
    }

    pub fn stage_indices(&self) -> &[usize] {
        &self.stage_indices
    }

    /// Insertion positions in composite order.
    pub fn composite_order(&self) -> Result<&[usize]> {
        Ok(&self.derived()?.composite_order)
    }

    /// Transforms in composite order.
    pub fn transforms_in_composite_order(&self) -> Result<&[Arc<ParametricTransform>]> {
        Ok(self.composite()?.transforms())
    }

    pub fn composite(&self) -> Result<&CompositeTransform> {
        Ok(self.derived()?.descriptor.transform())
    }

    pub fn resample_descriptor(&self) -> Result<&ResampleDescriptor> {
        Ok(&self.derived()?.descriptor)
    }

    pub fn output_geometry(&self) -> Result<&GridGeometry> {
        Ok(&self.derived()?.geometry)
    }

    pub fn output_size(&self) -> Result<[usize; 2]> {
        Ok(self.derived()?.geometry.size())
    }

    pub fn output_spacing(&self) -> Result<Spacing2> {
        Ok(*self.derived()?.geometry.spacing())
    }

    /// Map points through the inverse of every transform in insertion order.
    ///
    /// Output order matches input order. Points are independent and are
    /// processed in parallel. Each result carries its accuracy and clamping
    /// flags; nothing is dropped.
    pub fn transform_points(&self, points: &[Point2], mapping: &PointMapping) -> Result<Vec<MappedPoint>> {
        let derived = self.derived()?;
        let spacing = derived.geometry.spacing();
        let pixel_size = spacing[0];
        if mapping.output_is_pixel_index && !spacing.is_uniform() {
            tracing::warn!(
                "Output spacing {:?} is anisotropic; pixel coordinates use {} on both axes",
                spacing.to_array(),
                pixel_size
            );
        }

        let mapped: Vec<MappedPoint> = points
            .par_iter()
            .map(|p| {
                let start = if mapping.input_is_pixel_index {
                    p.scaled(mapping.input_resolution)
                } else {
                    *p
                };
                let mut result = self
                    .transforms
                    .iter()
                    .fold(MappedPoint::exact(start), |acc, t| acc.then(t.inverse_transform_point(&acc.point)));
                if mapping.output_is_pixel_index {
                    result.point = result.point.scaled(1.0 / pixel_size);
                }
                result
            })
            .collect();

        let clamped = mapped.iter().filter(|m| m.clamped).count();
        let unconverged = mapped
            .iter()
            .filter(|m| matches!(m.accuracy, Accuracy::Approximate { converged: false, .. }))
            .count();
        if clamped > 0 || unconverged > 0 {
            tracing::warn!(
                "{} of {} points clamped to a transform domain, {} with an unconverged inverse",
                clamped,
                mapped.len(),
                unconverged
            );
        }
        Ok(mapped)
    }

    /// [`transform_points`](Self::transform_points) without the flags.
    pub fn transform_points_xy(&self, points: &[Point2], mapping: &PointMapping) -> Result<Vec<Point2>> {
        Ok(self
            .transform_points(points, mapping)?
            .into_iter()
            .map(|m| m.point)
            .collect())
    }
}
