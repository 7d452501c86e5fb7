use crate::{
    BundleAdjuster, CameraKey, ConvergedPoint, Entity, Error, LandmarkKey, Result,
    RigCameraKey, RigInstanceKey, Scene,
};
use cv_core::{Pose, RigToCamera, Similarity, WorldToRig};
use cv_pinhole::Camera;
use log::*;

/// Converged values read back from an adjuster, validated but not yet written to the scene.
#[derive(Debug, Default)]
struct Converged {
    cameras: Vec<(CameraKey, Camera)>,
    biases: Vec<(CameraKey, Similarity)>,
    rig_cameras: Vec<(RigCameraKey, RigToCamera)>,
    rig_instances: Vec<(RigInstanceKey, WorldToRig)>,
    points: Vec<(LandmarkKey, ConvergedPoint)>,
}

impl Converged {
    fn apply(self, scene: &mut Scene) {
        for (key, camera) in self.cameras {
            for (parameter, value) in camera.parameters() {
                scene.set_camera_parameter(key, parameter, value);
            }
        }
        for (key, bias) in self.biases {
            scene.set_bias(key, bias);
        }
        for (key, pose) in self.rig_cameras {
            scene.set_rig_camera_pose(key, pose);
        }
        for (key, pose) in self.rig_instances {
            scene.set_rig_instance_pose(key, pose);
        }
        for (key, point) in self.points {
            scene.set_landmark_position(key, point.position);
            scene.set_landmark_reprojection_errors(key, point.reprojection_errors);
        }
    }
}

fn converged_rig_instances(
    adjuster: &impl BundleAdjuster,
    scene: &Scene,
    keys: impl IntoIterator<Item = RigInstanceKey>,
) -> Result<Vec<(RigInstanceKey, WorldToRig)>> {
    keys.into_iter()
        .map(|key| {
            let id = &scene.rig_instance(key).id;
            let pose = adjuster
                .rig_instance(id)
                .ok_or_else(|| Error::missing_result(Entity::RigInstance, id))?;
            if !pose.is_finite() {
                return Err(Error::non_finite(Entity::RigInstance, id));
            }
            Ok((key, pose))
        })
        .collect()
}

fn converged_points(
    adjuster: &impl BundleAdjuster,
    scene: &Scene,
    keys: impl IntoIterator<Item = LandmarkKey>,
) -> Result<Vec<(LandmarkKey, ConvergedPoint)>> {
    keys.into_iter()
        .map(|key| {
            let id = &scene.landmark(key).id;
            let point = adjuster
                .point(id)
                .ok_or_else(|| Error::missing_result(Entity::Point, id))?;
            let finite = point.position.iter().all(|n| n.is_finite())
                && point
                    .reprojection_errors
                    .values()
                    .all(|error| error.iter().all(|n| n.is_finite()));
            if !finite {
                return Err(Error::non_finite(Entity::Point, id));
            }
            Ok((key, point))
        })
        .collect()
}

/// Writes every converged parameter block of a full problem back into the scene.
///
/// Camera intrinsics are only written when `update_cameras` is set. Biases are written for
/// cameras the adjuster has a bias for. Nothing is written if any value is missing or not finite.
pub fn bundle_to_scene(
    adjuster: &impl BundleAdjuster,
    scene: &mut Scene,
    update_cameras: bool,
) -> Result<()> {
    let mut converged = Converged::default();

    for (key, camera) in scene.cameras() {
        if update_cameras {
            let model = adjuster
                .camera(&camera.id)
                .ok_or_else(|| Error::missing_result(Entity::Camera, &camera.id))?;
            if !model.is_finite() {
                return Err(Error::non_finite(Entity::Camera, &camera.id));
            }
            converged.cameras.push((key, model));
        }
        if let Some(bias) = adjuster.bias(&camera.id) {
            if !bias.is_finite() {
                return Err(Error::non_finite(Entity::Bias, &camera.id));
            }
            converged.biases.push((key, bias));
        }
    }

    for (key, rig_camera) in scene.rig_cameras() {
        let pose = adjuster
            .rig_camera(&rig_camera.id)
            .ok_or_else(|| Error::missing_result(Entity::RigCamera, &rig_camera.id))?;
        if !pose.is_finite() {
            return Err(Error::non_finite(Entity::RigCamera, &rig_camera.id));
        }
        converged.rig_cameras.push((key, pose));
    }

    converged.rig_instances =
        converged_rig_instances(adjuster, scene, scene.rig_instances().map(|(key, _)| key))?;
    converged.points = converged_points(adjuster, scene, scene.landmarks().map(|(key, _)| key))?;

    debug!(
        "committing {} cameras, {} biases, {} rig cameras, {} rig instances and {} points",
        converged.cameras.len(),
        converged.biases.len(),
        converged.rig_cameras.len(),
        converged.rig_instances.len(),
        converged.points.len()
    );
    converged.apply(scene);
    Ok(())
}

/// Writes the converged poses of the given rig instances and the converged positions of the given
/// landmarks into the scene.
///
/// Nothing is written if any value is missing or not finite.
pub fn commit_rig_instances_and_points(
    adjuster: &impl BundleAdjuster,
    scene: &mut Scene,
    rig_instances: impl IntoIterator<Item = RigInstanceKey>,
    points: impl IntoIterator<Item = LandmarkKey>,
) -> Result<()> {
    let converged = Converged {
        rig_instances: converged_rig_instances(adjuster, scene, rig_instances)?,
        points: converged_points(adjuster, scene, points)?,
        ..Default::default()
    };
    converged.apply(scene);
    Ok(())
}

/// Writes the converged poses of the given rig instances into the scene.
///
/// Nothing is written if any pose is missing or not finite.
pub fn commit_rig_instances(
    adjuster: &impl BundleAdjuster,
    scene: &mut Scene,
    keys: impl IntoIterator<Item = RigInstanceKey>,
) -> Result<()> {
    commit_rig_instances_and_points(adjuster, scene, keys, None::<LandmarkKey>)
}

/// Writes the converged positions and reprojection errors of the given landmarks into the scene.
///
/// Nothing is written if any point is missing or not finite.
pub fn commit_points(
    adjuster: &impl BundleAdjuster,
    scene: &mut Scene,
    keys: impl IntoIterator<Item = LandmarkKey>,
) -> Result<()> {
    commit_rig_instances_and_points(adjuster, scene, None::<RigInstanceKey>, keys)
}
