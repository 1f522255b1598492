//! Output-grid geometry shared by transforms and the resampling descriptor.

use crate::error::{Result, TransformError};
use crate::spatial::{Direction2, Point2, Spacing2, Vector2};

/// Size, spacing, origin and direction of a 2-D sampling grid.
///
/// Index `i` maps to physical `origin + direction * (spacing ⊙ i)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    size: [usize; 2],
    spacing: Spacing2,
    origin: Point2,
    direction: Direction2,
    inverse_direction: Direction2,
}

impl GridGeometry {
    /// Validate and create a grid.
    pub fn new(
        size: [usize; 2],
        spacing: Spacing2,
        origin: Point2,
        direction: Direction2,
    ) -> Result<Self> {
        if size.iter().any(|s| *s == 0) {
            return Err(TransformError::invalid_geometry(format!(
                "grid size must be positive, got {:?}",
                size
            )));
        }
        if !spacing.is_positive() {
            return Err(TransformError::InvalidSpacing(spacing.to_vec()));
        }
        let inverse_direction = direction
            .try_inverse()
            .ok_or_else(|| TransformError::SingularDirection(format!("{:?}", direction.to_row_major())))?;
        Ok(Self {
            size,
            spacing,
            origin,
            direction,
            inverse_direction,
        })
    }

    pub fn size(&self) -> [usize; 2] {
        self.size
    }

    pub fn spacing(&self) -> &Spacing2 {
        &self.spacing
    }

    pub fn origin(&self) -> &Point2 {
        &self.origin
    }

    pub fn direction(&self) -> &Direction2 {
        &self.direction
    }

    /// Number of grid points.
    pub fn num_points(&self) -> usize {
        self.size[0] * self.size[1]
    }

    /// Physical extent `size * spacing` per axis.
    pub fn physical_extent(&self) -> [f64; 2] {
        [
            self.size[0] as f64 * self.spacing[0],
            self.size[1] as f64 * self.spacing[1],
        ]
    }

    /// Physical point at the centre of the grid's pixel extent.
    pub fn center(&self) -> Point2 {
        let half = Point2::new([
            (self.size[0] as f64 - 1.0) / 2.0,
            (self.size[1] as f64 - 1.0) / 2.0,
        ]);
        self.index_to_physical(&half)
    }

    /// Continuous index to physical point.
    pub fn index_to_physical(&self, index: &Point2) -> Point2 {
        let scaled = Vector2::new([index[0] * self.spacing[0], index[1] * self.spacing[1]]);
        self.origin + self.direction * scaled
    }

    /// Physical point to continuous index.
    pub fn physical_to_index(&self, point: &Point2) -> Point2 {
        let local = self.inverse_direction * (*point - self.origin);
        Point2::new([local[0] / self.spacing[0], local[1] / self.spacing[1]])
    }

    /// Same physical extent at a new spacing.
    ///
    /// The new size is `ceil(size * old_spacing / new_spacing)` per axis.
    pub fn rescaled(&self, new_spacing: Spacing2) -> Result<Self> {
        if !new_spacing.is_positive() {
            return Err(TransformError::InvalidSpacing(new_spacing.to_vec()));
        }
        let scale = self.spacing.ratio(&new_spacing);
        let size = [
            (self.size[0] as f64 * scale[0]).ceil() as usize,
            (self.size[1] as f64 * scale[1]).ceil() as usize,
        ];
        Self::new(size, new_spacing, self.origin, self.direction)
    }
}
