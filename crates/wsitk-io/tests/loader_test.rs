use proptest::prelude::*;
use serde_json::{json, Value};
use wsitk_core::transform::TransformModel;
use wsitk_core::{InverseConfig, Point2, PointMapping, Spacing2, TransformKind, TransformSequence};
use wsitk_io::{
    parse_sequence, parse_sequence_str, read_sequence, read_sequence_file, sequence_to_value, write_sequence,
    InitialGrouping, LoaderConfig, LoaderError,
};

fn euler(angle: f64, tx: f64, ty: f64) -> Value {
    json!({
        "Transform": ["EulerTransform"],
        "NumberOfParameters": ["3"],
        "TransformParameters": [angle.to_string(), tx.to_string(), ty.to_string()],
        "Size": ["200", "200"],
        "Spacing": ["1.0", "1.0"],
        "Origin": ["0", "0"],
        "Direction": ["1", "0", "0", "1"],
        "CenterOfRotationPoint": ["100", "100"],
        "ResampleInterpolator": ["FinalNearestNeighborInterpolator"],
    })
}

fn affine(params: [f64; 6]) -> Value {
    json!({
        "Transform": ["AffineTransform"],
        "NumberOfParameters": ["6"],
        "TransformParameters": params.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "Size": ["200", "200"],
        "Spacing": ["1.0", "1.0"],
        "Origin": ["0", "0"],
        "Direction": ["1", "0", "0", "1"],
        "CenterOfRotationPoint": ["100", "100"],
        "ResampleInterpolator": ["FinalLinearInterpolator"],
    })
}

fn bspline() -> Value {
    let params: Vec<String> = (0..32).map(|i| format!("{}", (i as f64 * 0.37).sin() * 0.5)).collect();
    json!({
        "Transform": ["BSplineTransform"],
        "NumberOfParameters": ["32"],
        "TransformParameters": params,
        "Size": ["200", "200"],
        "Spacing": ["1.0", "1.0"],
        "Origin": ["0", "0"],
        "Direction": ["1", "0", "0", "1"],
        "GridSize": ["4", "4"],
        "GridSpacing": ["100", "100"],
        "GridOrigin": ["-50", "-50"],
        "GridDirection": ["1", "0", "0", "1"],
        "BSplineTransformSplineOrder": ["3"],
        "ResampleInterpolator": ["FinalBSplineInterpolator"],
    })
}

fn three_stage() -> Value {
    json!({
        "initial": [euler(0.05, 3.0, -2.0), affine([1.01, 0.02, -0.01, 0.99, 1.5, 0.5])],
        "0": [euler(-0.02, 0.5, 1.0), bspline()],
        "1": [euler(0.01, -1.0, 0.0), affine([0.98, 0.0, 0.0, 1.02, 0.0, -0.5])],
    })
}

#[test]
fn test_three_stage_default_indices() {
    let parsed = parse_sequence(&three_stage(), &LoaderConfig::default()).unwrap();
    assert_eq!(parsed.stage_indices, vec![0, 1, 2, 2, 3, 3]);

    let sequence = parsed.into_sequence().unwrap();
    assert_eq!(sequence.len(), 6);
    assert_eq!(sequence.composite_order().unwrap(), &[0, 1, 3, 2, 5, 4]);
    let kinds: Vec<_> = sequence.transforms().iter().map(|t| t.kind()).collect();
    assert_eq!(kinds[3], TransformKind::BSpline);
    assert_eq!(sequence.output_size().unwrap(), [200, 200]);
}

#[test]
fn test_inverse_config_reaches_bspline() {
    let inverse = InverseConfig::new().with_tolerance(1e-3).with_max_iterations(7);
    let config = LoaderConfig::new().with_inverse_config(inverse);
    let sequence = parse_sequence(&three_stage(), &config)
        .unwrap()
        .into_sequence()
        .unwrap();
    match sequence.transforms()[3].model() {
        TransformModel::BSpline(b) => assert_eq!(*b.inverse_config(), inverse),
        other => panic!("expected a B-spline, got {:?}", other.kind()),
    }
}

#[test]
fn test_three_stage_shared_initial() {
    let config = LoaderConfig::new().with_initial_grouping(InitialGrouping::Shared);
    let parsed = parse_sequence(&three_stage(), &config).unwrap();
    assert_eq!(parsed.stage_indices, vec![0, 0, 1, 1, 2, 2]);

    let sequence = parsed.into_sequence().unwrap();
    assert_eq!(sequence.composite_order().unwrap(), &[1, 0, 3, 2, 5, 4]);
}

#[test]
fn test_invalid_transform_reports_position() {
    let mut bad = euler(0.0, 0.0, 0.0);
    bad["NumberOfParameters"] = json!(["4"]);
    let value = json!({ "0": [euler(0.0, 1.0, 1.0)], "1": [euler(0.0, 0.0, 0.0), bad] });
    let parsed = parse_sequence(&value, &LoaderConfig::default()).unwrap();
    match parsed.into_sequence() {
        Err(LoaderError::Transform { position, stage, .. }) => {
            assert_eq!(position, 2);
            assert_eq!(stage, "1");
        }
        other => panic!("expected a transform error, got {:?}", other),
    }
}

#[test]
fn test_invalid_json_text() {
    let result = parse_sequence_str("{\"0\": [", &LoaderConfig::default());
    assert!(matches!(result, Err(LoaderError::Json(_))));
}

#[test]
fn test_round_trip_through_writer() {
    let sequence = parse_sequence(&three_stage(), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();

    let mut buffer = Vec::new();
    write_sequence(&sequence, &mut buffer).unwrap();
    let reloaded = read_sequence(buffer.as_slice(), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();

    assert_eq!(reloaded.stage_indices(), sequence.stage_indices());
    for (a, b) in sequence.transforms().iter().zip(reloaded.transforms()) {
        assert_eq!(a.as_ref(), b.as_ref());
    }
}

#[test]
fn test_rescaled_output_grid_survives_write() {
    let mut sequence = parse_sequence(&three_stage(), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();
    sequence.set_output_spacing(Spacing2::uniform(2.0)).unwrap();
    assert_eq!(sequence.output_size().unwrap(), [100, 100]);

    let reloaded = parse_sequence(&sequence_to_value(&sequence).unwrap(), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();
    assert_eq!(reloaded.output_size().unwrap(), [100, 100]);
    assert_eq!(reloaded.output_spacing().unwrap(), Spacing2::uniform(2.0));

    // Only the grid of the last transform changes.
    assert_eq!(reloaded.transforms()[0].output_size(), [200, 200]);
    for (a, b) in sequence.transforms().iter().zip(reloaded.transforms()) {
        assert_eq!(a.model(), b.model());
    }
}

#[test]
fn test_anisotropic_rescale_survives_write() {
    let mut sequence = parse_sequence(&json!({ "0": euler(0.0, 1.0, 0.0) }), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();
    sequence.set_output_spacing(Spacing2::new([2.0, 4.0])).unwrap();
    let reloaded = parse_sequence(&sequence_to_value(&sequence).unwrap(), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();
    assert_eq!(reloaded.output_size().unwrap(), [100, 50]);
    assert_eq!(reloaded.output_spacing().unwrap(), Spacing2::new([2.0, 4.0]));
}

#[test]
fn test_writer_rejects_unordered_stages() {
    let parsed = parse_sequence(
        &json!({ "0": euler(0.0, 1.0, 0.0), "1": euler(0.0, 2.0, 0.0) }),
        &LoaderConfig::default(),
    )
    .unwrap();
    let transforms = parsed.transforms().unwrap();
    let sequence = TransformSequence::from_transforms(transforms, &[1, 0]).unwrap();
    assert!(matches!(sequence_to_value(&sequence), Err(LoaderError::UnorderedStage(0))));
}

#[test]
fn test_read_from_file() {
    let path = std::env::temp_dir().join(format!("wsitk-io-sequence-{}.json", std::process::id()));
    std::fs::write(&path, three_stage().to_string()).unwrap();
    let parsed = read_sequence_file(&path, &LoaderConfig::default());
    std::fs::remove_file(&path).unwrap();
    assert_eq!(parsed.unwrap().len(), 6);

    let missing = read_sequence_file(std::env::temp_dir().join("wsitk-io-missing.json"), &LoaderConfig::default());
    assert!(matches!(missing, Err(LoaderError::Io(_))));
}

#[test]
fn test_append_loaded_stages() {
    let mut sequence = parse_sequence(&json!({ "0": euler(0.0, 1.0, 0.0) }), &LoaderConfig::default())
        .unwrap()
        .into_sequence()
        .unwrap();
    let more = parse_sequence(&json!({ "0": [euler(0.0, 0.0, 1.0), euler(0.0, 0.0, 2.0)] }), &LoaderConfig::default())
        .unwrap();
    more.append_to(&mut sequence).unwrap();
    assert_eq!(sequence.stage_indices(), &[0, 1, 1]);
}

proptest! {
    #[test]
    fn prop_written_sequence_maps_points_identically(
        stages in prop::collection::vec(
            prop::collection::vec((-0.3f64..0.3, -20.0f64..20.0, -20.0f64..20.0), 1..3),
            1..4,
        ),
        x in 0.0f64..200.0,
        y in 0.0f64..200.0,
    ) {
        let mut document = serde_json::Map::new();
        for (i, stage) in stages.iter().enumerate() {
            let entries: Vec<Value> = stage.iter().map(|&(a, tx, ty)| euler(a, tx, ty)).collect();
            document.insert(i.to_string(), Value::Array(entries));
        }
        let sequence = parse_sequence(&Value::Object(document), &LoaderConfig::default())
            .unwrap()
            .into_sequence()
            .unwrap();
        let reloaded = parse_sequence(&sequence_to_value(&sequence).unwrap(), &LoaderConfig::default())
            .unwrap()
            .into_sequence()
            .unwrap();

        let points = [Point2::new([x, y])];
        let mapping = PointMapping::physical();
        let a = sequence.transform_points_xy(&points, &mapping).unwrap();
        let b = reloaded.transform_points_xy(&points, &mapping).unwrap();
        prop_assert!(a[0].distance(&b[0]) < 1e-9);
        prop_assert_eq!(reloaded.composite_order().unwrap(), sequence.composite_order().unwrap());
    }
}
