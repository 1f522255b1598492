//! Resampling descriptor handed to an external resampling primitive.
//!
//! The output grid is walked pixel by pixel; each pixel's physical point is
//! sent through the composite transform into input space, where the
//! resampler interpolates.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rayon::prelude::*;
use crate::composite::CompositeTransform;
use crate::geometry::GridGeometry;
use crate::spatial::Point2;
use crate::transform::{Interpolator, MappedPoint, Transform};

/// Output geometry, interpolator and composite transform for one resampling.
#[derive(Debug, Clone)]
pub struct ResampleDescriptor {
    geometry: GridGeometry,
    interpolator: Interpolator,
    default_pixel_value: f64,
    transform: CompositeTransform,
}

impl ResampleDescriptor {
    pub fn new(
        geometry: GridGeometry,
        interpolator: Interpolator,
        default_pixel_value: f64,
        transform: CompositeTransform,
    ) -> Self {
        Self {
            geometry,
            interpolator,
            default_pixel_value,
            transform,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn size(&self) -> [usize; 2] {
        self.geometry.size()
    }

    pub fn interpolator(&self) -> Interpolator {
        self.interpolator
    }

    /// Value for output pixels that map outside the input image.
    pub fn default_pixel_value(&self) -> f64 {
        self.default_pixel_value
    }

    pub fn transform(&self) -> &CompositeTransform {
        &self.transform
    }

    /// Composite evaluation at every output pixel, x fastest, with the
    /// clamping flag of each sample.
    pub fn mapped_sampling_points(&self) -> Vec<MappedPoint> {
        let [width, _] = self.geometry.size();
        let mapped: Vec<MappedPoint> = (0..self.geometry.num_points())
            .into_par_iter()
            .map(|i| {
                let index = Point2::new([(i % width) as f64, (i / width) as f64]);
                let physical = self.geometry.index_to_physical(&index);
                self.transform.transform_point(&physical)
            })
            .collect();

        let clamped = mapped.iter().filter(|m| m.clamped).count();
        if clamped > 0 {
            tracing::warn!(
                "{} of {} sampling points fall outside a B-spline control grid",
                clamped,
                mapped.len()
            );
        }
        mapped
    }

    /// Input-space physical point for every output pixel, x fastest.
    pub fn sampling_points(&self) -> Vec<Point2> {
        self.mapped_sampling_points().into_iter().map(|m| m.point).collect()
    }

    /// Sampling points as a `[N, 2]` tensor of physical coordinates.
    pub fn sampling_grid_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        points_to_tensor(&self.sampling_points(), device)
    }

    /// Sampling points as continuous indices into `input`, shape `[N, 2]`.
    ///
    /// This is the form index-space interpolators consume.
    pub fn sampling_index_tensor<B: Backend>(&self, input: &GridGeometry, device: &B::Device) -> Tensor<B, 2> {
        let indices: Vec<Point2> = self
            .sampling_points()
            .par_iter()
            .map(|p| input.physical_to_index(p))
            .collect();
        points_to_tensor(&indices, device)
    }
}

fn points_to_tensor<B: Backend>(points: &[Point2], device: &B::Device) -> Tensor<B, 2> {
    let total = points.len();
    let mut flat = Vec::with_capacity(total * 2);
    for p in points {
        flat.push(p[0] as f32);
        flat.push(p[1] as f32);
    }
    Tensor::<B, 1>::from_data(TensorData::new(flat, [total * 2]), device).reshape([total, 2])
}
