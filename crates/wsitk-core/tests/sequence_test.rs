mod common;

use std::f64::consts::FRAC_PI_2;
use proptest::prelude::*;
use wsitk_core::{
    composite_order, Accuracy, Point2, PointMapping, Spacing2, Transform, TransformError, TransformSequence,
};

#[test]
fn test_rigid_example_end_to_end() {
    let center = [6598.8, 7200.375];
    let (tx, ty) = (601.5749999999998, -601.5749999999998);
    let t = common::euler(FRAC_PI_2, tx, ty, center, [6769, 7386], 1.95);
    let seq = TransformSequence::from_transforms(vec![t], &[0]).unwrap();

    let descriptor = seq.resample_descriptor().unwrap();
    let p = descriptor.geometry().center();
    assert!((p[0] - 6768.0 * 1.95 / 2.0).abs() < 1e-9);

    // R(pi/2)(p - c) + c + t
    let (dx, dy) = (p[0] - center[0], p[1] - center[1]);
    let expected = [center[0] - dy + tx, center[1] + dx + ty];

    let mapped = seq.composite().unwrap().transform_point(&p);
    assert!(mapped.accuracy.is_exact());
    assert!((mapped.point[0] - expected[0]).abs() < 1e-6, "x: {} vs {}", mapped.point[0], expected[0]);
    assert!((mapped.point[1] - expected[1]).abs() < 1e-6, "y: {} vs {}", mapped.point[1], expected[1]);
}

#[test]
fn test_composite_applies_last_first() {
    // Two translations sharing a stage and one rotation in its own stage.
    let a = common::euler(0.0, 10.0, 0.0, [0.0, 0.0], [10, 10], 1.0);
    let b = common::euler(0.0, 0.0, 5.0, [0.0, 0.0], [10, 10], 1.0);
    let r = common::euler(FRAC_PI_2, 0.0, 0.0, [0.0, 0.0], [10, 10], 1.0);
    let seq = TransformSequence::from_transforms(vec![a, b, r], &[0, 0, 1]).unwrap();
    assert_eq!(seq.composite_order().unwrap(), &[1, 0, 2]);

    // Composite [b, a, r]: r first, then a, then b.
    let q = seq.composite().unwrap().transform_point(&Point2::new([1.0, 0.0])).point;
    assert!((q[0] - 10.0).abs() < 1e-12);
    assert!((q[1] - 6.0).abs() < 1e-12);
}

#[test]
fn test_compose_linear_matches_chain() {
    let a = common::euler(0.4, 3.0, -2.0, [50.0, 60.0], [100, 100], 1.0);
    let b = common::affine([1.1, 0.05, -0.02, 0.95, 4.0, 7.0], [20.0, 10.0], [100, 100], 1.0);
    let seq = TransformSequence::from_transforms(vec![a, b], &[0, 0]).unwrap();
    let composite = seq.composite().unwrap();
    let m = composite.compose_linear().unwrap();
    let p = Point2::new([33.0, -12.0]);
    let q = composite.transform_point(&p).point;
    let h = m * nalgebra::Vector3::new(p[0], p[1], 1.0);
    assert!((h[0] - q[0]).abs() < 1e-9);
    assert!((h[1] - q[1]).abs() < 1e-9);

    let with_bspline = TransformSequence::from_transforms(vec![common::bspline(1.0)], &[0]).unwrap();
    assert!(with_bspline.composite().unwrap().compose_linear().is_none());
}

#[test]
fn test_append_offsets_stage_indices() {
    let mut first = TransformSequence::from_transforms(
        vec![
            common::euler(0.1, 1.0, 1.0, [0.0, 0.0], [10, 10], 1.0),
            common::euler(0.2, 1.0, 1.0, [0.0, 0.0], [10, 10], 1.0),
        ],
        &[0, 1],
    )
    .unwrap();
    let second = TransformSequence::from_transforms(
        vec![
            common::euler(0.3, 1.0, 1.0, [0.0, 0.0], [20, 20], 1.0),
            common::euler(0.4, 1.0, 1.0, [0.0, 0.0], [20, 20], 1.0),
        ],
        &[0, 0],
    )
    .unwrap();
    first.append(&second).unwrap();

    let indices = first.stage_indices();
    assert_eq!(indices, &[0, 1, 2, 2]);
    assert_eq!(first.composite_order().unwrap(), &[0, 1, 3, 2]);
    assert_eq!(first.output_size().unwrap(), [20, 20]);
}

#[test]
fn test_bspline_point_mapping_is_flagged_approximate() {
    let seq = TransformSequence::from_transforms(vec![common::bspline(2.0)], &[0]).unwrap();
    let p = Point2::new([120.0, 80.0]);
    let forward = seq.composite().unwrap().transform_point(&p);
    assert!(forward.accuracy.is_exact());

    let back = seq.transform_points(&[forward.point], &PointMapping::physical()).unwrap();
    match back[0].accuracy {
        Accuracy::Approximate { converged, .. } => assert!(converged),
        Accuracy::Exact => panic!("free-form inverse reported as exact"),
    }
    assert!(back[0].point.distance(&p) < 1e-4);
}

#[test]
fn test_out_of_domain_points_are_flagged() {
    let seq = TransformSequence::from_transforms(vec![common::bspline(2.0)], &[0]).unwrap();
    let out = seq
        .transform_points(&[Point2::new([5000.0, 5000.0]), Point2::new([100.0, 100.0])], &PointMapping::physical())
        .unwrap();
    assert_eq!(out.len(), 2);
    assert!(out[0].clamped);
    assert!(!out[1].clamped);
}

#[test]
fn test_mixed_sequence_mapping_order() {
    // Insertion order, not composite order: the affine inverse runs first.
    let affine = common::affine([2.0, 0.0, 0.0, 2.0, 0.0, 0.0], [0.0, 0.0], [10, 10], 1.0);
    let shift = common::euler(0.0, 1.0, 0.0, [0.0, 0.0], [10, 10], 0.5);
    let seq = TransformSequence::from_transforms(vec![affine, shift], &[0, 0]).unwrap();
    let out = seq.transform_points_xy(&[Point2::new([4.0, 2.0])], &PointMapping::physical()).unwrap();
    // (4, 2) / 2 = (2, 1); minus (1, 0) = (1, 1).
    assert!((out[0][0] - 1.0).abs() < 1e-12);
    assert!((out[0][1] - 1.0).abs() < 1e-12);

    let pixels = seq
        .transform_points_xy(&[Point2::new([4.0, 2.0])], &PointMapping::default().with_input_pixels(1.0))
        .unwrap();
    // Divided by the output spacing of the last transform (0.5).
    assert!((pixels[0][0] - 2.0).abs() < 1e-12);
}

#[test]
fn test_zero_transform_append_leaves_sequence_empty() {
    let mut seq = TransformSequence::new();
    seq.append(&TransformSequence::new()).unwrap();
    assert!(seq.is_empty());
    assert_eq!(seq.resample_descriptor().unwrap_err(), TransformError::EmptySequence);
}

fn stage_runs() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 1..6).prop_map(|runs| {
        runs.iter()
            .enumerate()
            .flat_map(|(stage, len)| std::iter::repeat(stage).take(*len))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_linear_roundtrip(
        angle in -3.1f64..3.1,
        tx in -500.0f64..500.0, ty in -500.0f64..500.0,
        cx in 0.0f64..5000.0, cy in 0.0f64..5000.0,
        px in -1000.0f64..10000.0, py in -1000.0f64..10000.0,
        use_affine in any::<bool>(),
        shear in -0.3f64..0.3,
    ) {
        let t = if use_affine {
            let (s, c) = angle.sin_cos();
            common::affine([c * 1.2, -s + shear, s, c * 0.8, tx, ty], [cx, cy], [100, 100], 1.0)
        } else {
            common::euler(angle, tx, ty, [cx, cy], [100, 100], 1.0)
        };
        let seq = TransformSequence::from_transforms(vec![t], &[0]).unwrap();
        let p = Point2::new([px, py]);
        let forward = seq.composite().unwrap().transform_point(&p).point;
        let back = seq.transform_points(&[forward], &PointMapping::physical()).unwrap();
        prop_assert!(back[0].accuracy.is_exact());
        prop_assert!(back[0].point.distance(&p) < 1e-6, "{:?} vs {:?}", back[0].point, p);
    }

    #[test]
    fn prop_composite_order_groups(indices in stage_runs()) {
        let order = composite_order(&indices);
        prop_assert_eq!(order.len(), indices.len());

        let mut cursor = 0;
        let stages = indices.iter().copied().max().unwrap_or(0) + 1;
        for stage in 0..stages {
            let members: Vec<usize> = (0..indices.len()).filter(|i| indices[*i] == stage).collect();
            let chunk = &order[cursor..cursor + members.len()];
            if members.len() == 1 {
                prop_assert_eq!(chunk, members.as_slice());
            } else {
                let reversed: Vec<usize> = members.iter().rev().copied().collect();
                prop_assert_eq!(chunk, reversed.as_slice());
            }
            cursor += members.len();
        }
    }

    #[test]
    fn prop_output_spacing_roundtrip(
        w in 1usize..10000, h in 1usize..10000,
        spacing in 0.2f64..5.0,
        factor in 0.2f64..1.0,
    ) {
        // Refining first; coarsening first loses up to old/new pixels.
        let new_spacing = spacing * factor;
        let t = common::euler(0.0, 0.0, 0.0, [0.0, 0.0], [w, h], spacing);
        let mut seq = TransformSequence::from_transforms(vec![t], &[0]).unwrap();
        let original = seq.output_spacing().unwrap();
        seq.set_output_spacing(Spacing2::uniform(new_spacing)).unwrap();
        seq.set_output_spacing(original).unwrap();
        let size = seq.output_size().unwrap();
        prop_assert_eq!(seq.output_spacing().unwrap(), original);
        prop_assert!(size[0].abs_diff(w) <= 1, "{} vs {}", size[0], w);
        prop_assert!(size[1].abs_diff(h) <= 1, "{} vs {}", size[1], h);
    }

    #[test]
    fn prop_append_indices_strictly_greater(
        first in prop::collection::vec(0usize..5, 1..6),
        second in prop::collection::vec(0usize..5, 1..6),
    ) {
        let make = |indices: &[usize]| {
            let ts = indices.iter().map(|_| common::euler(0.0, 1.0, 0.0, [0.0, 0.0], [4, 4], 1.0)).collect();
            TransformSequence::from_transforms(ts, indices).unwrap()
        };
        let mut seq = make(&first);
        let other = make(&second);
        seq.append(&other).unwrap();
        let max_first = *first.iter().max().unwrap();
        for idx in &seq.stage_indices()[first.len()..] {
            prop_assert!(*idx > max_first);
        }
    }
}
