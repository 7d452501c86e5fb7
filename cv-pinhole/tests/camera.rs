use approx::assert_relative_eq;
use cv_core::nalgebra::{Point2, Vector3};
use cv_core::CameraModel;
use cv_pinhole::{Camera, CameraParameter, ProjectionType};
use quickcheck_macros::quickcheck;

fn distorted_brown() -> Camera {
    let mut camera = Camera::brown(0.85, 1.02, Point2::new(-0.01, 0.015));
    camera.k1 = -0.12;
    camera.k2 = 0.03;
    camera.k3 = -0.002;
    camera.p1 = 0.0007;
    camera.p2 = -0.0004;
    camera
}

#[quickcheck]
fn brown_reprojects_calibrated_points(x: i16, y: i16) -> bool {
    // Keep the points inside the image where the distortion is invertible.
    let point = Point2::new(x as f64 / 65536.0, y as f64 / 65536.0);
    let camera = distorted_brown();
    let reprojected = camera.uncalibrate(camera.calibrate(point)).unwrap();
    (reprojected - point).norm() < 1e-9
}

#[test]
fn perspective_ignores_brown_parameters() {
    let mut camera = Camera::perspective(1.0);
    camera.p1 = 0.5;
    camera.principal_point = Point2::new(0.3, 0.3);
    let bearing = camera.calibrate(Point2::new(0.0, 0.0));
    assert_relative_eq!(bearing.into_inner(), Vector3::z(), epsilon = 1e-12);
}

#[test]
fn points_behind_camera_do_not_project() {
    let camera = distorted_brown();
    let behind = cv_core::nalgebra::UnitVector3::new_normalize(Vector3::new(0.1, 0.2, -1.0));
    assert!(camera.uncalibrate(behind).is_none());
}

#[test]
fn parameters_follow_projection() {
    let perspective = Camera::perspective(0.8);
    assert_eq!(
        perspective.parameters().map(|(p, _)| p).collect::<Vec<_>>(),
        vec![CameraParameter::Focal, CameraParameter::K1, CameraParameter::K2]
    );
    assert_eq!(ProjectionType::Brown.parameters().len(), 9);
}

#[test]
fn set_parameter_round_trips_every_brown_value() {
    let mut camera = Camera::brown(1.0, 1.0, Point2::origin());
    for (ix, &parameter) in ProjectionType::Brown.parameters().iter().enumerate() {
        camera.set_parameter(parameter, ix as f64 + 0.5);
    }
    for (ix, (_, value)) in camera.parameters().enumerate() {
        assert_eq!(value, ix as f64 + 0.5);
    }
    assert!(camera.is_finite());
    camera.set_parameter(CameraParameter::K3, f64::NAN);
    assert!(!camera.is_finite());
}
