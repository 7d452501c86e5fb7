use crate::gcp::triangulate_gcp;
use crate::{AlignMethod, BundleSettings, GroundControlPoint, Scene};
use cv_core::nalgebra::{Matrix3, Point3, Vector3};
use cv_geom::topocentric::Georeferencer;
use float_ord::FloatOrd;
use log::*;

/// Eigenvalues of the scatter matrix below this are considered to be zero.
const DEGENERATE_EIGENVALUE: f64 = 1e-10;
/// Points are collinear if the largest eigenvalue exceeds the middle one by this factor.
const LINE_EIGENVALUE_RATIO: f64 = 5e3;

/// Gathers matching pairs of absolute measurements and reconstructed positions.
///
/// Returns `(measured, reconstructed)`. Ground control points with geodetic coordinates which
/// triangulate contribute a pair when `bundle_use_gcp` is set, and shots with a GPS position
/// contribute their optical center when `bundle_use_gps` is set.
pub fn alignment_constraints(
    scene: &Scene,
    settings: &BundleSettings,
    gcps: &[GroundControlPoint],
) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
    let mut measured = vec![];
    let mut reconstructed = vec![];

    if settings.bundle_use_gcp {
        for gcp in gcps {
            if let (Some(lla), Some(triangulated)) = (&gcp.lla, triangulate_gcp(gcp, scene)) {
                measured.push(scene.reference().to_topocentric(lla));
                reconstructed.push(triangulated);
            }
        }
    }

    if settings.bundle_use_gps {
        for (key, shot) in scene.shots() {
            if let Some(gps) = shot.measurements.gps_position {
                measured.push(gps);
                reconstructed.push(scene.shot_origin(key));
            }
        }
    }

    (measured, reconstructed)
}

/// Checks if a set of points lies on a line, or is even more degenerate.
///
/// At least one point is expected.
pub fn is_line(points: &[Point3<f64>]) -> bool {
    let centroid = points
        .iter()
        .fold(Vector3::zeros(), |sum, point| sum + point.coords)
        / points.len().max(1) as f64;
    let scatter: Matrix3<f64> = points
        .iter()
        .map(|point| point.coords - centroid)
        .map(|centered| centered * centered.transpose())
        .sum();

    let mut eigenvalues: Vec<f64> = scatter.symmetric_eigenvalues().iter().copied().collect();
    eigenvalues.sort_unstable_by_key(|&e| FloatOrd(e));

    let ratio = (eigenvalues[2] / eigenvalues[1]).abs();
    let degenerate = eigenvalues
        .iter()
        .filter(|&&e| e < DEGENERATE_EIGENVALUE)
        .count();
    debug!(
        "alignment eigenvalues {:?}, ratio {}, {} degenerate",
        eigenvalues, ratio, degenerate
    );
    degenerate > 1 || ratio > LINE_EIGENVALUE_RATIO
}

/// Picks the alignment method the measurements of a scene support.
///
/// A full similarity needs at least three non-collinear pairs. Otherwise only the up direction
/// can be constrained.
pub fn detect_alignment_constraints(
    scene: &Scene,
    settings: &BundleSettings,
    gcps: &[GroundControlPoint],
) -> AlignMethod {
    let (_, reconstructed) = alignment_constraints(scene, settings, gcps);
    let method = if reconstructed.len() < 3 || is_line(&reconstructed) {
        AlignMethod::OrientationPrior
    } else {
        AlignMethod::Naive
    };
    info!(
        "detected {:?} alignment from {} constraints",
        method,
        reconstructed.len()
    );
    method
}
