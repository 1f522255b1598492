//! One registration stage: a transform model plus the grid it was estimated on.

use crate::error::{Result, TransformError};
use crate::geometry::GridGeometry;
use crate::spatial::{Direction2, Point2, Spacing2};
use nalgebra::Matrix3;
use super::affine::AffineTransform;
use super::bspline::{BSplineTransform, InverseConfig, SplineOrder};
use super::definition::{keys, TransformDefinition};
use super::euler::EulerTransform;
use super::kind::{Interpolator, TransformKind};
use super::trait_::{MappedPoint, Transform};

/// Evaluation model for each transform kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformModel {
    Euler(EulerTransform),
    Affine(AffineTransform),
    BSpline(BSplineTransform),
}

impl TransformModel {
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Euler(_) => TransformKind::Euler,
            Self::Affine(_) => TransformKind::Affine,
            Self::BSpline(_) => TransformKind::BSpline,
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Self::Euler(t) => t.parameters(),
            Self::Affine(t) => t.parameters(),
            Self::BSpline(t) => t.parameters(),
        }
    }
}

/// A single parametric transform and the output grid it was computed against.
///
/// Immutable once built. Every check happens in the constructors, so a value
/// of this type always evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricTransform {
    model: TransformModel,
    geometry: GridGeometry,
    center_of_rotation: Point2,
    resample_interpolator: Interpolator,
    default_pixel_value: f64,
    /// Keys not interpreted here, kept for serialisation.
    extra: TransformDefinition,
}

const INTERPRETED_KEYS: &[&str] = &[
    keys::TRANSFORM,
    keys::NUMBER_OF_PARAMETERS,
    keys::TRANSFORM_PARAMETERS,
    keys::SIZE,
    keys::SPACING,
    keys::ORIGIN,
    keys::DIRECTION,
    keys::CENTER_OF_ROTATION,
    keys::RESAMPLE_INTERPOLATOR,
    keys::DEFAULT_PIXEL_VALUE,
    keys::GRID_SIZE,
    keys::GRID_SPACING,
    keys::GRID_ORIGIN,
    keys::GRID_DIRECTION,
    keys::SPLINE_ORDER,
];

fn read_grid(
    def: &TransformDefinition,
    size_key: &str,
    spacing_key: &str,
    origin_key: &str,
    direction_key: &str,
) -> Result<GridGeometry> {
    let size = def.usize_array::<2>(size_key)?;
    let spacing = Spacing2::new(def.float_array::<2>(spacing_key)?);
    let origin = Point2::new(def.float_array::<2>(origin_key)?);
    let direction = match def.get(direction_key) {
        Some(_) => {
            let values = def.float_array::<4>(direction_key)?;
            Direction2::from_row_major(&values)
                .ok_or_else(|| TransformError::invalid_field(direction_key, "expected 4 values"))?
        }
        None => Direction2::identity(),
    };
    GridGeometry::new(size, spacing, origin, direction)
}

fn write_grid(
    def: &mut TransformDefinition,
    grid: &GridGeometry,
    size_key: &str,
    spacing_key: &str,
    origin_key: &str,
    direction_key: &str,
) {
    def.set_usizes(size_key, &grid.size());
    def.set_floats(spacing_key, &grid.spacing().to_vec());
    def.set_floats(origin_key, &grid.origin().to_vec());
    def.set_floats(direction_key, &grid.direction().to_row_major());
}

impl ParametricTransform {
    /// Assemble from parts already validated by their own constructors.
    pub fn new(model: TransformModel, geometry: GridGeometry, resample_interpolator: Interpolator) -> Self {
        let center_of_rotation = match &model {
            TransformModel::Euler(t) => *t.center(),
            TransformModel::Affine(t) => *t.center(),
            TransformModel::BSpline(_) => Point2::origin(),
        };
        Self {
            model,
            geometry,
            center_of_rotation,
            resample_interpolator,
            default_pixel_value: 0.0,
            extra: TransformDefinition::new(),
        }
    }

    pub fn with_default_pixel_value(mut self, value: f64) -> Self {
        self.default_pixel_value = value;
        self
    }

    /// Replace the output grid, keeping the model.
    pub fn with_geometry(mut self, geometry: GridGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Parse and validate a parameter map.
    ///
    /// Fails on an unknown kind or interpolator, a missing or malformed field,
    /// a parameter count that disagrees with `NumberOfParameters` or with the
    /// kind, and singular matrices.
    pub fn from_definition(def: &TransformDefinition) -> Result<Self> {
        Self::from_definition_with(def, InverseConfig::default())
    }

    /// As [`from_definition`](Self::from_definition), with settings for
    /// iterative inverses.
    pub fn from_definition_with(def: &TransformDefinition, inverse_config: InverseConfig) -> Result<Self> {
        let kind: TransformKind = def.text(keys::TRANSFORM)?.parse()?;
        let parameters = def.floats(keys::TRANSFORM_PARAMETERS)?;
        let declared = def.usize_array::<1>(keys::NUMBER_OF_PARAMETERS)?[0];
        if declared != parameters.len() {
            return Err(TransformError::parameter_count(kind.name(), declared, parameters.len()));
        }

        let geometry = read_grid(def, keys::SIZE, keys::SPACING, keys::ORIGIN, keys::DIRECTION)?;
        let resample_interpolator = match def.get(keys::RESAMPLE_INTERPOLATOR) {
            Some(_) => def.text(keys::RESAMPLE_INTERPOLATOR)?.parse()?,
            None => Interpolator::default(),
        };
        let default_pixel_value = match def.get(keys::DEFAULT_PIXEL_VALUE) {
            Some(_) => def.float_array::<1>(keys::DEFAULT_PIXEL_VALUE)?[0],
            None => 0.0,
        };

        let model = match kind {
            TransformKind::Euler => {
                let center = Point2::new(def.float_array::<2>(keys::CENTER_OF_ROTATION)?);
                TransformModel::Euler(EulerTransform::from_parameters(&parameters, center)?)
            }
            TransformKind::Affine => {
                let center = Point2::new(def.float_array::<2>(keys::CENTER_OF_ROTATION)?);
                TransformModel::Affine(AffineTransform::from_parameters(&parameters, center)?)
            }
            TransformKind::BSpline => {
                let grid = read_grid(
                    def,
                    keys::GRID_SIZE,
                    keys::GRID_SPACING,
                    keys::GRID_ORIGIN,
                    keys::GRID_DIRECTION,
                )?;
                let order = match def.get(keys::SPLINE_ORDER) {
                    Some(_) => SplineOrder::from_degree(def.usize_array::<1>(keys::SPLINE_ORDER)?[0])?,
                    None => SplineOrder::default(),
                };
                TransformModel::BSpline(
                    BSplineTransform::new(grid, order, &parameters)?.with_inverse_config(inverse_config),
                )
            }
        };

        let center_of_rotation = match def.get(keys::CENTER_OF_ROTATION) {
            Some(_) => Point2::new(def.float_array::<2>(keys::CENTER_OF_ROTATION)?),
            None => Point2::origin(),
        };
        let extra = def
            .keys()
            .filter(|k| !INTERPRETED_KEYS.contains(k))
            .filter_map(|k| def.get(k).map(|v| (k.to_string(), v.to_vec())))
            .collect();

        Ok(Self {
            model,
            geometry,
            center_of_rotation,
            resample_interpolator,
            default_pixel_value,
            extra,
        })
    }

    /// Serialise back to a parameter map that `from_definition` accepts.
    pub fn to_definition(&self) -> TransformDefinition {
        let mut def = self.extra.clone();
        let parameters = self.parameters();
        def.set_text(keys::TRANSFORM, self.kind().name());
        def.set_usizes(keys::NUMBER_OF_PARAMETERS, &[parameters.len()]);
        def.set_floats(keys::TRANSFORM_PARAMETERS, &parameters);
        write_grid(&mut def, &self.geometry, keys::SIZE, keys::SPACING, keys::ORIGIN, keys::DIRECTION);
        def.set_floats(keys::CENTER_OF_ROTATION, &self.center_of_rotation.to_vec());
        def.set_text(keys::RESAMPLE_INTERPOLATOR, self.resample_interpolator.name());
        def.set_floats(keys::DEFAULT_PIXEL_VALUE, &[self.default_pixel_value]);
        if let TransformModel::BSpline(t) = &self.model {
            write_grid(
                &mut def,
                t.grid(),
                keys::GRID_SIZE,
                keys::GRID_SPACING,
                keys::GRID_ORIGIN,
                keys::GRID_DIRECTION,
            );
            def.set_usizes(keys::SPLINE_ORDER, &[t.order().degree()]);
        }
        def
    }

    pub fn kind(&self) -> TransformKind {
        self.model.kind()
    }

    pub fn model(&self) -> &TransformModel {
        &self.model
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.model.parameters()
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn output_size(&self) -> [usize; 2] {
        self.geometry.size()
    }

    pub fn output_spacing(&self) -> &Spacing2 {
        self.geometry.spacing()
    }

    pub fn output_origin(&self) -> &Point2 {
        self.geometry.origin()
    }

    pub fn output_direction(&self) -> &Direction2 {
        self.geometry.direction()
    }

    pub fn center_of_rotation(&self) -> &Point2 {
        &self.center_of_rotation
    }

    pub fn resample_interpolator(&self) -> Interpolator {
        self.resample_interpolator
    }

    pub fn default_pixel_value(&self) -> f64 {
        self.default_pixel_value
    }
}

impl Transform for ParametricTransform {
    fn transform_point(&self, point: &Point2) -> MappedPoint {
        match &self.model {
            TransformModel::Euler(t) => t.transform_point(point),
            TransformModel::Affine(t) => t.transform_point(point),
            TransformModel::BSpline(t) => t.transform_point(point),
        }
    }

    fn inverse_transform_point(&self, point: &Point2) -> MappedPoint {
        match &self.model {
            TransformModel::Euler(t) => t.inverse_transform_point(point),
            TransformModel::Affine(t) => t.inverse_transform_point(point),
            TransformModel::BSpline(t) => t.inverse_transform_point(point),
        }
    }

    fn linear_matrix(&self) -> Option<Matrix3<f64>> {
        match &self.model {
            TransformModel::Euler(t) => t.linear_matrix(),
            TransformModel::Affine(t) => t.linear_matrix(),
            TransformModel::BSpline(_) => None,
        }
    }
}
