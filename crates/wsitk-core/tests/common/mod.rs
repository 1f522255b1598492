#![allow(dead_code)]

use serde_json::json;
use wsitk_core::{ParametricTransform, TransformDefinition};

pub fn definition(value: serde_json::Value) -> TransformDefinition {
    serde_json::from_value(value).expect("fixture is a valid parameter map")
}

pub fn euler(angle: f64, tx: f64, ty: f64, center: [f64; 2], size: [usize; 2], spacing: f64) -> ParametricTransform {
    let def = definition(json!({
        "Transform": ["EulerTransform"],
        "NumberOfParameters": ["3"],
        "TransformParameters": [angle.to_string(), tx.to_string(), ty.to_string()],
        "Size": [size[0].to_string(), size[1].to_string()],
        "Spacing": [spacing.to_string(), spacing.to_string()],
        "Origin": ["0.0000", "0.0000"],
        "Direction": ["1.0000000000", "0.0000000000", "0.0000000000", "1.0000000000"],
        "CenterOfRotationPoint": [center[0].to_string(), center[1].to_string()],
        "ResampleInterpolator": ["FinalNearestNeighborInterpolator"],
    }));
    ParametricTransform::from_definition(&def).unwrap()
}

pub fn affine(params: [f64; 6], center: [f64; 2], size: [usize; 2], spacing: f64) -> ParametricTransform {
    let def = definition(json!({
        "Transform": ["AffineTransform"],
        "NumberOfParameters": ["6"],
        "TransformParameters": params.to_vec(),
        "Size": [size[0], size[1]],
        "Spacing": [spacing, spacing],
        "Origin": [0, 0],
        "Direction": [1, 0, 0, 1],
        "CenterOfRotationPoint": center.to_vec(),
        "ResampleInterpolator": ["FinalLinearInterpolator"],
    }));
    ParametricTransform::from_definition(&def).unwrap()
}

/// Cubic B-spline on a 6x6 grid covering roughly [-100, 400]^2 with a
/// smooth, small displacement field.
pub fn bspline(amplitude: f64) -> ParametricTransform {
    let (gx, gy) = (6usize, 6usize);
    let mut params = Vec::with_capacity(gx * gy * 2);
    for axis in 0..2 {
        for iy in 0..gy {
            for ix in 0..gx {
                let phase = (ix as f64 * 0.7 + iy as f64 * 1.3 + axis as f64).sin();
                params.push(amplitude * phase);
            }
        }
    }
    let def = definition(json!({
        "Transform": ["BSplineTransform"],
        "NumberOfParameters": [params.len().to_string()],
        "TransformParameters": params,
        "Size": ["256", "256"],
        "Spacing": ["1.0", "1.0"],
        "Origin": ["0", "0"],
        "Direction": ["1", "0", "0", "1"],
        "GridSize": [gx.to_string(), gy.to_string()],
        "GridSpacing": ["100", "100"],
        "GridOrigin": ["-100", "-100"],
        "GridDirection": ["1", "0", "0", "1"],
        "GridIndex": ["0", "0"],
        "BSplineTransformSplineOrder": ["3"],
        "ResampleInterpolator": ["FinalBSplineInterpolator"],
    }));
    ParametricTransform::from_definition(&def).unwrap()
}
