use crate::{BundleAdjuster, BundleSettings, Error, Result, Scene};
use cv_core::nalgebra::{Point2, Point3, Vector3};
use cv_core::{CameraModel, Pose, TriangulatorBearings};
use cv_geom::topocentric::{Georeferencer, Lla};
use cv_geom::triangulation::MidpointTriangulator;
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Maximum angle between a ray and the triangulated ground control point.
const GCP_REPROJECTION_THRESHOLD: f64 = 1.0;
/// Minimum angle between the most divergent pair of rays, in degrees.
const GCP_MIN_RAY_ANGLE_DEGREES: f64 = 0.1;
/// Ground control points are assumed to be at least 1mm away from the camera.
const GCP_MIN_DEPTH: f64 = 1e-3;
/// Standard deviation of a ground control point projection before global weighting.
const GCP_PROJECTION_SD: f64 = 0.001;

/// The measured position of a ground control point on a shot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct GcpObservation {
    pub shot_id: String,
    /// Position in normalized image coordinates.
    pub projection: Point2<f64>,
}

/// A surveyed point with known geodetic coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct GroundControlPoint {
    pub id: String,
    pub lla: Option<Lla>,
    /// Whether the altitude of `lla` was surveyed, rather than filled in.
    pub has_altitude: bool,
    pub observations: Vec<GcpObservation>,
}

impl GroundControlPoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lla: None,
            has_altitude: false,
            observations: vec![],
        }
    }

    #[must_use]
    pub fn lla(self, lla: Lla, has_altitude: bool) -> Self {
        Self {
            lla: Some(lla),
            has_altitude,
            ..self
        }
    }

    #[must_use]
    pub fn observation(mut self, shot_id: impl Into<String>, projection: Point2<f64>) -> Self {
        self.observations.push(GcpObservation {
            shot_id: shot_id.into(),
            projection,
        });
        self
    }

    /// The id of the point this ground control point is added to a problem as.
    pub fn point_id(&self) -> String {
        format!("gcp-{}", self.id)
    }
}

/// The triangulator used for ground control points.
pub fn gcp_triangulator() -> MidpointTriangulator {
    MidpointTriangulator::new()
        .threshold(GCP_REPROJECTION_THRESHOLD)
        .min_angle(GCP_MIN_RAY_ANGLE_DEGREES.to_radians())
        .min_depth(GCP_MIN_DEPTH)
}

/// Triangulates a ground control point from its observations on shots of the scene.
///
/// Observations on shots that are not in the scene are ignored. At least two remaining
/// observations are needed.
pub fn triangulate_gcp(gcp: &GroundControlPoint, scene: &Scene) -> Option<Point3<f64>> {
    let rays: Vec<_> = gcp
        .observations
        .iter()
        .filter_map(|observation| {
            let shot = scene.shot_key(&observation.shot_id)?;
            let camera = &scene.camera(scene.shot(shot).camera).model;
            let pose = scene.shot_pose(shot);
            let bearing = pose.inverse().rotation() * camera.calibrate(observation.projection);
            Some((pose.origin(), bearing))
        })
        .collect();
    if rays.len() < 2 {
        return None;
    }
    gcp_triangulator().triangulate_bearings(rays)
}

/// The position of a ground control point: triangulated if possible, otherwise converted from its
/// geodetic coordinates.
pub fn resolve_gcp_position(gcp: &GroundControlPoint, scene: &Scene) -> Option<Point3<f64>> {
    triangulate_gcp(gcp, scene).or_else(|| {
        gcp.lla
            .as_ref()
            .map(|lla| scene.reference().to_topocentric(lla))
    })
}

/// Counts the residual terms the ground control points will contribute: one position term per
/// usable point and one projection term per observation on a shot of the scene.
pub fn count_gcp_terms(scene: &Scene, gcps: &[GroundControlPoint]) -> usize {
    gcps.iter()
        .map(|gcp| {
            let usable = gcp.lla.is_some() || triangulate_gcp(gcp, scene).is_some();
            let observations = gcp
                .observations
                .iter()
                .filter(|observation| scene.shot_key(&observation.shot_id).is_some())
                .count();
            usize::from(usable) + observations
        })
        .sum()
}

/// Scales the ground control points so that, as a whole, they weigh `configured_weight` relative to
/// the `dominant_terms` already in the problem, no matter how many of them there are.
pub fn gcp_global_weight(configured_weight: f64, dominant_terms: usize, gcp_terms: usize) -> f64 {
    configured_weight * dominant_terms as f64 / gcp_terms.max(1) as f64
}

/// Adds ground control points to a problem as free points with a position prior and projections.
///
/// This must be called after every other residual is added, since the global weight depends on them.
/// Returns the number of projections added.
pub fn add_gcp_to_bundle(
    adjuster: &mut impl BundleAdjuster,
    scene: &Scene,
    gcps: &[GroundControlPoint],
    settings: &BundleSettings,
) -> Result<usize> {
    let dominant_terms = adjuster.rig_instance_count()
        + adjuster.projection_count()
        + adjuster.relative_motion_count();
    let gcp_terms = count_gcp_terms(scene, gcps);
    let global_weight = gcp_global_weight(settings.gcp_global_weight, dominant_terms, gcp_terms);

    let std_deviation = Vector3::new(
        settings.gcp_horizontal_sd,
        settings.gcp_horizontal_sd,
        settings.gcp_vertical_sd,
    ) / global_weight;
    let projection_sd = GCP_PROJECTION_SD / global_weight;
    let valid = std_deviation
        .iter()
        .chain(Some(&projection_sd))
        .all(|sd| sd.is_finite() && *sd >= 0.0);

    let mut added = 0;
    for gcp in gcps {
        let position = match resolve_gcp_position(gcp, scene) {
            Some(position) => position,
            None => {
                debug!("skipping GCP {} with no usable position", gcp.id);
                continue;
            }
        };
        if !valid {
            return Err(Error::InvalidGcpWeight {
                id: gcp.id.clone(),
                weight: global_weight,
            });
        }

        let point_id = gcp.point_id();
        adjuster.add_point(&point_id, position, false);
        if let Some(lla) = &gcp.lla {
            adjuster.add_point_prior(
                &point_id,
                scene.reference().to_topocentric(lla),
                std_deviation,
                gcp.has_altitude,
            );
        }

        for observation in &gcp.observations {
            if scene.shot_key(&observation.shot_id).is_some() {
                adjuster.add_point_projection_observation(
                    &observation.shot_id,
                    &point_id,
                    observation.projection,
                    projection_sd,
                    None,
                );
                added += 1;
            }
        }
    }
    info!(
        "added {} GCP observations with global weight {} ({} dominant terms, {} GCP terms)",
        added, global_weight, dominant_terms, gcp_terms
    );
    Ok(added)
}
