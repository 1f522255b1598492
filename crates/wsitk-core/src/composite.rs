//! Composite transform built from a stage-indexed transform list.
//!
//! Parameter files describe each registration run as a chain in estimation
//! order. To resample, a multi-transform run has to be unwound, so its members
//! are reversed; single-transform runs and the order between runs are kept.

use std::sync::Arc;
use nalgebra::Matrix3;
use crate::error::{Result, TransformError};
use crate::spatial::Point2;
use crate::transform::{MappedPoint, ParametricTransform, Transform};

/// Positions of `stage_indices` in composite order.
///
/// Stages are visited in ascending index order; within a stage holding more
/// than one transform the insertion order is reversed.
pub fn composite_order(stage_indices: &[usize]) -> Vec<usize> {
    let mut stages = stage_indices.to_vec();
    stages.sort_unstable();
    stages.dedup();

    let mut order = Vec::with_capacity(stage_indices.len());
    for stage in stages {
        let group: Vec<usize> = stage_indices
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == stage)
            .map(|(i, _)| i)
            .collect();
        if group.len() > 1 {
            order.extend(group.into_iter().rev());
        } else {
            order.extend(group);
        }
    }
    order
}

/// Transforms in composite order, evaluated as one operator.
///
/// The last transform is applied first: for `[T0, T1, T2]` the forward map is
/// `T0(T1(T2(p)))`, walking from output space back to input space.
#[derive(Debug, Clone)]
pub struct CompositeTransform {
    transforms: Vec<Arc<ParametricTransform>>,
}

impl CompositeTransform {
    /// Fails with `EmptySequence` when `transforms` is empty.
    pub fn new(transforms: Vec<Arc<ParametricTransform>>) -> Result<Self> {
        if transforms.is_empty() {
            return Err(TransformError::EmptySequence);
        }
        Ok(Self { transforms })
    }

    pub fn transforms(&self) -> &[Arc<ParametricTransform>] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Collapse into one homogeneous matrix if every member is linear.
    pub fn compose_linear(&self) -> Option<Matrix3<f64>> {
        self.transforms
            .iter()
            .try_fold(Matrix3::identity(), |acc, t| t.linear_matrix().map(|m| acc * m))
    }
}

impl Transform for CompositeTransform {
    fn transform_point(&self, point: &Point2) -> MappedPoint {
        self.transforms
            .iter()
            .rev()
            .fold(MappedPoint::exact(*point), |acc, t| acc.then(t.transform_point(&acc.point)))
    }

    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint {
        self.transforms
            .iter()
            .fold(MappedPoint::exact(*point), |acc, t| acc.then(t.inverse_transform_point(&acc.point)))
    }

    fn linear_matrix(&self) -> Option<Matrix3<f64>> {
        self.compose_linear()
    }
}
