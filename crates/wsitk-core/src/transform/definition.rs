//! Parameter maps: the string-keyed description of one transform stage.
//!
//! Values are lists whose entries are either strings (as elastix writes them)
//! or bare numbers. Keys this crate does not interpret are carried along
//! untouched so a definition survives a load/store cycle.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::error::{Result, TransformError};

/// Keys the transform models read and write.
pub mod keys {
    pub const TRANSFORM: &str = "Transform";
    pub const NUMBER_OF_PARAMETERS: &str = "NumberOfParameters";
    pub const TRANSFORM_PARAMETERS: &str = "TransformParameters";
    pub const SIZE: &str = "Size";
    pub const SPACING: &str = "Spacing";
    pub const ORIGIN: &str = "Origin";
    pub const DIRECTION: &str = "Direction";
    pub const CENTER_OF_ROTATION: &str = "CenterOfRotationPoint";
    pub const RESAMPLE_INTERPOLATOR: &str = "ResampleInterpolator";
    pub const DEFAULT_PIXEL_VALUE: &str = "DefaultPixelValue";
    pub const GRID_SIZE: &str = "GridSize";
    pub const GRID_SPACING: &str = "GridSpacing";
    pub const GRID_ORIGIN: &str = "GridOrigin";
    pub const GRID_DIRECTION: &str = "GridDirection";
    pub const SPLINE_ORDER: &str = "BSplineTransformSplineOrder";
}

/// One entry of a parameter-map value list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl ParameterValue {
    fn as_f64(&self, field: &str) -> Result<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| TransformError::invalid_field(field, format!("'{}' is not a number", s))),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A transform stage as a key → value-list map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformDefinition(BTreeMap<String, Vec<ParameterValue>>);

impl TransformDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[ParameterValue]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<ParameterValue>) {
        self.0.insert(key.into(), values);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<ParameterValue>> {
        self.0.remove(key)
    }

    fn required(&self, key: &str) -> Result<&[ParameterValue]> {
        self.get(key).ok_or_else(|| TransformError::missing_field(key))
    }

    /// First entry of `key` as text. Numbers are rendered back to text.
    pub fn text(&self, key: &str) -> Result<String> {
        match self.required(key)?.first() {
            Some(ParameterValue::Text(s)) => Ok(s.clone()),
            Some(ParameterValue::Number(v)) => Ok(v.to_string()),
            None => Err(TransformError::invalid_field(key, "empty value list")),
        }
    }

    pub fn floats(&self, key: &str) -> Result<Vec<f64>> {
        self.required(key)?.iter().map(|v| v.as_f64(key)).collect()
    }

    /// Exactly `N` floats.
    pub fn float_array<const N: usize>(&self, key: &str) -> Result<[f64; N]> {
        let values = self.floats(key)?;
        values.try_into().map_err(|v: Vec<f64>| {
            TransformError::invalid_field(key, format!("expected {} values, got {}", N, v.len()))
        })
    }

    pub fn usizes(&self, key: &str) -> Result<Vec<usize>> {
        self.floats(key)?
            .into_iter()
            .map(|v| {
                if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(TransformError::invalid_field(key, format!("{} is not a non-negative integer", v)))
                }
            })
            .collect()
    }

    /// Exactly `N` non-negative integers.
    pub fn usize_array<const N: usize>(&self, key: &str) -> Result<[usize; N]> {
        let values = self.usizes(key)?;
        values.try_into().map_err(|v: Vec<usize>| {
            TransformError::invalid_field(key, format!("expected {} values, got {}", N, v.len()))
        })
    }

    /// Store floats as text, the way elastix writes them.
    ///
    /// `f64`'s `Display` is the shortest representation that parses back to
    /// the same value.
    pub fn set_floats(&mut self, key: &str, values: &[f64]) {
        let text = values.iter().map(|v| ParameterValue::Text(v.to_string())).collect();
        self.insert(key, text);
    }

    pub fn set_usizes(&mut self, key: &str, values: &[usize]) {
        let text = values.iter().map(|v| ParameterValue::Text(v.to_string())).collect();
        self.insert(key, text);
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.insert(key, vec![ParameterValue::from(value)]);
    }
}

impl FromIterator<(String, Vec<ParameterValue>)> for TransformDefinition {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ParameterValue>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
