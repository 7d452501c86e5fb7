mod common;

use approx::assert_relative_eq;
use common::SceneBuilder;
use cv_bundle::{
    alignment_constraints, detect_alignment_constraints, is_line, AlignMethod, BundleSettings,
    GroundControlPoint, Scene,
};
use cv_core::nalgebra::{Point2, Point3, Vector3};
use cv_geom::topocentric::Lla;

fn scene_with_gps(positions: &[Point3<f64>]) -> Scene {
    let mut builder = SceneBuilder::new();
    for (i, &position) in positions.iter().enumerate() {
        let id = format!("shot{}", i);
        builder = builder
            .shot(&id, position)
            .gps(&id, position + Vector3::new(0.1, 0.0, 0.0), 5.0);
    }
    builder.build()
}

#[test]
fn collinear_points_are_a_line() {
    let points: Vec<_> = (0..5)
        .map(|i| Point3::new(i as f64, 2.0 * i as f64, -(i as f64)))
        .collect();
    assert!(is_line(&points));
}

#[test]
fn spread_points_are_not_a_line() {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(3.0, 3.0, 1.0),
    ];
    assert!(!is_line(&points));
}

#[test]
fn nearly_collinear_points_are_a_line() {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(100.0, 0.0, 0.0),
        Point3::new(200.0, 0.01, 0.0),
        Point3::new(300.0, 0.0, 0.0),
    ];
    assert!(is_line(&points));
}

#[test]
fn gps_pairs_shot_origins() {
    let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 1.0, 0.0)];
    let scene = scene_with_gps(&positions);
    let (measured, mut reconstructed) =
        alignment_constraints(&scene, &BundleSettings::default(), &[]);
    assert_eq!(measured.len(), 2);
    reconstructed.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    for (reconstructed, expected) in reconstructed.iter().zip(&positions) {
        assert_relative_eq!(*reconstructed, *expected, epsilon = 1e-12);
    }

    let settings = BundleSettings {
        bundle_use_gps: false,
        ..Default::default()
    };
    let (measured, reconstructed) = alignment_constraints(&scene, &settings, &[]);
    assert!(measured.is_empty() && reconstructed.is_empty());
}

#[test]
fn gcp_pairs_need_geodetic_coordinates_and_triangulation() {
    let scene = scene_with_gps(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)]);
    let surveyed = GroundControlPoint::new("surveyed")
        .lla(Lla::new(0.0, 0.0, 5.0), true)
        .observation("shot0", Point2::new(0.1, 0.0))
        .observation("shot1", Point2::new(-0.1, 0.0));
    let unsurveyed = GroundControlPoint::new("unsurveyed")
        .observation("shot0", Point2::new(0.1, 0.0))
        .observation("shot1", Point2::new(-0.1, 0.0));
    let gcps = [surveyed, unsurveyed];

    let settings = BundleSettings {
        bundle_use_gps: false,
        bundle_use_gcp: true,
        ..Default::default()
    };
    let (measured, reconstructed) = alignment_constraints(&scene, &settings, &gcps);
    assert_eq!(measured.len(), 1);
    assert_relative_eq!(measured[0], Point3::new(0.0, 0.0, 5.0), epsilon = 1e-6);
    assert_relative_eq!(reconstructed[0], Point3::new(1.0, 0.0, 10.0), epsilon = 1e-9);

    let (measured, _) = alignment_constraints(&scene, &BundleSettings::default(), &gcps);
    assert_eq!(measured.len(), 2, "GCPs are ignored unless enabled");
}

#[test]
fn too_few_constraints_need_an_orientation_prior() {
    let scene = scene_with_gps(&[Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 1.0, 0.0)]);
    assert_eq!(
        detect_alignment_constraints(&scene, &BundleSettings::default(), &[]),
        AlignMethod::OrientationPrior
    );
}

#[test]
fn straight_flight_needs_an_orientation_prior() {
    let positions: Vec<_> = (0..6).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
    let scene = scene_with_gps(&positions);
    assert_eq!(
        detect_alignment_constraints(&scene, &BundleSettings::default(), &[]),
        AlignMethod::OrientationPrior
    );
}

#[test]
fn spread_shots_align_naively() {
    let scene = scene_with_gps(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(3.0, 3.0, 1.0),
    ]);
    assert_eq!(
        detect_alignment_constraints(&scene, &BundleSettings::default(), &[]),
        AlignMethod::Naive
    );
}
