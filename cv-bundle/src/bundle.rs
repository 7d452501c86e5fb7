use crate::alignment::detect_alignment_constraints;
use crate::commit::{bundle_to_scene, commit_rig_instances, commit_rig_instances_and_points};
use crate::gcp::add_gcp_to_bundle;
use crate::neighborhood::{shot_neighborhood, Neighborhood};
use crate::{
    AlignMethod, BundleAdjuster, BundleReport, BundleSettings, CameraKey, Entity, Error,
    GroundControlPoint, LandmarkKey, LinearSolverType, OrientationPrior, Result, RigCameraKey,
    RigInstanceKey, Scene, ShotKey, WallTimes, GPS_SCALE_GROUP,
};
use cv_core::nalgebra::{Point3, Vector3};
use cv_core::RigToCamera;
use cv_pinhole::Camera;
use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

/// Iteration cap of the small problems solved while a reconstruction grows.
const LOCAL_MAX_ITERATIONS: usize = 10;
/// Rig cameras are only adjusted once they have been seen this many times on average.
const MIN_RIG_INSTANCES_FOR_ADJUST: usize = 10;
/// Standard deviation of the absolute up vector constraint, in radians.
const UP_VECTOR_SD: f64 = 1e-3;

/// Measures the phases of a bundle adjustment.
struct Timer {
    start: Instant,
    setup: f64,
    run: f64,
}

impl Timer {
    fn start() -> Self {
        Self {
            start: Instant::now(),
            setup: 0.0,
            run: 0.0,
        }
    }

    fn setup_done(&mut self) {
        self.setup = self.start.elapsed().as_secs_f64();
    }

    fn run_done(&mut self) {
        self.run = self.start.elapsed().as_secs_f64() - self.setup;
    }

    fn finish(self) -> WallTimes {
        let total = self.start.elapsed().as_secs_f64();
        WallTimes {
            setup: self.setup,
            run: self.run,
            teardown: total - self.setup - self.run,
        }
    }
}

fn add_camera(
    adjuster: &mut impl BundleAdjuster,
    scene: &Scene,
    key: CameraKey,
    priors: &HashMap<String, Camera>,
    fixed: bool,
) -> Result<()> {
    let camera = scene.camera(key);
    let prior = priors.get(&camera.id).ok_or_else(|| Error::MissingPrior {
        entity: Entity::Camera,
        id: camera.id.clone(),
    })?;
    adjuster.add_camera(&camera.id, &camera.model, prior, fixed);
    Ok(())
}

fn add_rig_camera(
    adjuster: &mut impl BundleAdjuster,
    scene: &Scene,
    key: RigCameraKey,
    priors: &HashMap<String, RigToCamera>,
    fixed: bool,
) -> Result<()> {
    let rig_camera = scene.rig_camera(key);
    let prior = priors.get(&rig_camera.id).ok_or_else(|| Error::MissingPrior {
        entity: Entity::RigCamera,
        id: rig_camera.id.clone(),
    })?;
    adjuster.add_rig_camera(&rig_camera.id, rig_camera.pose, *prior, fixed);
    Ok(())
}

/// Averages the GPS position and accuracy of the shots which have both.
fn average_gps(
    scene: &Scene,
    shots: impl IntoIterator<Item = ShotKey>,
) -> Result<Option<(Point3<f64>, f64)>> {
    let mut position = Vector3::zeros();
    let mut accuracy = 0.0;
    let mut count = 0;
    for key in shots {
        let shot = scene.shot(key);
        if let (Some(gps), Some(gps_accuracy)) = (
            shot.measurements.gps_position,
            shot.measurements.gps_accuracy,
        ) {
            if gps_accuracy <= 0.0 {
                return Err(Error::NonPositiveGpsAccuracy {
                    shot: shot.id.clone(),
                    accuracy: gps_accuracy,
                });
            }
            position += gps.coords;
            accuracy += gps_accuracy;
            count += 1;
        }
    }
    Ok((count > 0).then(|| {
        let count = count as f64;
        (Point3::from(position / count), accuracy / count)
    }))
}

/// Adds a rig instance, fixing it if any of its shots is not editable.
///
/// Free instances receive a position prior averaged from the GPS of their editable shots.
/// Returns whether the instance is fixed.
fn add_rig_instance(
    adjuster: &mut impl BundleAdjuster,
    scene: &Scene,
    key: RigInstanceKey,
    editable: impl Fn(ShotKey) -> bool,
    use_gps: bool,
) -> Result<bool> {
    let instance = scene.rig_instance(key);
    let mut shot_cameras = BTreeMap::new();
    let mut shot_rig_cameras = BTreeMap::new();
    for (&shot_key, &rig_camera) in &instance.shots {
        let shot = scene.shot(shot_key);
        shot_cameras.insert(shot.id.clone(), scene.camera(shot.camera).id.clone());
        shot_rig_cameras.insert(shot.id.clone(), scene.rig_camera(rig_camera).id.clone());
    }
    let fixed = !instance.shots.keys().all(|&shot| editable(shot));

    let gps = if use_gps {
        average_gps(
            scene,
            instance.shots.keys().copied().filter(|&shot| editable(shot)),
        )?
    } else {
        None
    };

    adjuster.add_rig_instance(
        &instance.id,
        instance.pose,
        &shot_cameras,
        &shot_rig_cameras,
        fixed,
    );
    if let (false, Some((position, accuracy))) = (fixed, gps) {
        adjuster.add_rig_instance_position_prior(
            &instance.id,
            position,
            Vector3::repeat(accuracy),
            GPS_SCALE_GROUP,
        );
    }
    Ok(fixed)
}

/// Adds a landmark projection on a shot. The landmark must already be in the problem.
fn add_observation(
    adjuster: &mut impl BundleAdjuster,
    scene: &Scene,
    shot: ShotKey,
    landmark: LandmarkKey,
) {
    let shot = scene.shot(shot);
    let observation = &shot.observations[&landmark];
    adjuster.add_point_projection_observation(
        &shot.id,
        &scene.landmark(landmark).id,
        observation.point,
        observation.scale,
        observation.depth_prior,
    );
}

fn configure_solver(
    adjuster: &mut impl BundleAdjuster,
    settings: &BundleSettings,
    max_iterations: usize,
    solver: LinearSolverType,
) {
    adjuster.set_use_analytic_derivatives(settings.bundle_analytic_derivatives);
    adjuster.set_point_projection_loss_function(
        settings.loss_function,
        settings.loss_function_threshold,
    );
    adjuster.set_internal_parameters_prior_sd(&settings.intrinsics_prior_sd());
    adjuster.set_rig_parameters_prior_sd(settings.rig_translation_sd, settings.rig_rotation_sd);
    adjuster.set_num_threads(settings.processes);
    adjuster.set_max_num_iterations(max_iterations);
    adjuster.set_linear_solver_type(solver);
}

/// The absolute up vector assumed for every shot, if any.
fn up_vector(prior: OrientationPrior) -> Option<Vector3<f64>> {
    match prior {
        OrientationPrior::Vertical => Some(Vector3::new(0.0, 0.0, -1.0)),
        OrientationPrior::Horizontal => Some(Vector3::new(0.0, -1.0, 0.0)),
        OrientationPrior::NoRoll => None,
    }
}

/// Adjusts the neighborhood of a shot.
///
/// The interior and boundary are selected with [`shot_neighborhood`] using the local bundle
/// settings. Cameras and rig cameras are fixed. Rig instances are free only if every one of their
/// shots is in the interior. Landmarks observed by the interior are free, and boundary shots only
/// contribute projections of those landmarks.
///
/// Afterwards the rig instances and landmarks of the problem are written back to the scene.
/// Returns the ids of the landmarks that were adjusted.
pub fn bundle_local(
    scene: &mut Scene,
    central_shot: &str,
    camera_priors: &HashMap<String, Camera>,
    rig_camera_priors: &HashMap<String, RigToCamera>,
    gcps: &[GroundControlPoint],
    settings: &BundleSettings,
    adjuster: &mut impl BundleAdjuster,
) -> Result<(Vec<String>, BundleReport)> {
    let mut timer = Timer::start();
    let Neighborhood { interior, boundary } = shot_neighborhood(
        scene,
        central_shot,
        settings.local_bundle_radius,
        settings.local_bundle_min_common_points,
        settings.local_bundle_max_shots,
    )?;

    let cameras: Vec<CameraKey> = scene.cameras().map(|(key, _)| key).collect();
    for key in cameras {
        add_camera(adjuster, scene, key, camera_priors, true)?;
    }

    let rig_instances: BTreeSet<RigInstanceKey> = interior
        .iter()
        .chain(&boundary)
        .map(|&shot| scene.shot(shot).rig_instance)
        .collect();
    let rig_cameras: BTreeSet<RigCameraKey> = rig_instances
        .iter()
        .flat_map(|&instance| scene.rig_instance(instance).shots.values().copied())
        .collect();
    for &key in &rig_cameras {
        add_rig_camera(adjuster, scene, key, rig_camera_priors, true)?;
    }
    for &key in &rig_instances {
        add_rig_instance(
            adjuster,
            scene,
            key,
            |shot| interior.contains(&shot),
            settings.bundle_use_gps,
        )?;
    }

    let mut points = BTreeSet::new();
    let mut point_ids = vec![];
    let mut num_reprojections = 0;
    for &shot in &interior {
        for &landmark in scene.shot(shot).observations.keys() {
            if points.insert(landmark) {
                let landmark_data = scene.landmark(landmark);
                adjuster.add_point(&landmark_data.id, landmark_data.position, false);
                point_ids.push(landmark_data.id.clone());
            }
            add_observation(adjuster, scene, shot, landmark);
            num_reprojections += 1;
        }
    }
    for &shot in &boundary {
        for &landmark in scene.shot(shot).observations.keys() {
            if points.contains(&landmark) {
                add_observation(adjuster, scene, shot, landmark);
                num_reprojections += 1;
            }
        }
    }

    if settings.bundle_use_gcp && !gcps.is_empty() {
        add_gcp_to_bundle(adjuster, scene, gcps, settings)?;
    }

    configure_solver(
        adjuster,
        settings,
        LOCAL_MAX_ITERATIONS,
        LinearSolverType::DenseSchur,
    );
    timer.setup_done();

    adjuster.run();
    timer.run_done();

    commit_rig_instances_and_points(&*adjuster, scene, rig_instances, points)?;

    let report = BundleReport {
        brief_report: adjuster.brief_report(),
        wall_times: timer.finish(),
        num_images: interior.len(),
        num_interior_images: interior.len(),
        num_boundary_images: boundary.len(),
        num_other_images: scene
            .num_shots()
            .saturating_sub(interior.len() + boundary.len()),
        num_points: point_ids.len(),
        num_reprojections,
    };
    info!(
        "local bundle around {}: {} interior, {} boundary, {} points, {}",
        central_shot,
        report.num_interior_images,
        report.num_boundary_images,
        report.num_points,
        report.brief_report
    );
    Ok((point_ids, report))
}

/// Adjusts only the poses of the given shots.
///
/// Cameras, rig cameras and landmarks are fixed. A rig instance is free only if every one of its
/// shots is in `shot_ids`. Only the projections of the given shots are added.
///
/// Afterwards the rig instances of the given shots are written back to the scene.
pub fn bundle_shot_poses(
    scene: &mut Scene,
    shot_ids: &BTreeSet<String>,
    camera_priors: &HashMap<String, Camera>,
    rig_camera_priors: &HashMap<String, RigToCamera>,
    settings: &BundleSettings,
    adjuster: &mut impl BundleAdjuster,
) -> Result<BundleReport> {
    let mut timer = Timer::start();
    let shots = shot_ids
        .iter()
        .map(|id| {
            scene
                .shot_key(id)
                .ok_or_else(|| Error::unknown(Entity::Shot, id))
        })
        .collect::<Result<BTreeSet<ShotKey>>>()?;

    let rig_instances: BTreeSet<RigInstanceKey> = shots
        .iter()
        .map(|&shot| scene.shot(shot).rig_instance)
        .collect();
    let members: Vec<ShotKey> = rig_instances
        .iter()
        .flat_map(|&instance| scene.rig_instance(instance).shots.keys().copied())
        .collect();
    let rig_cameras: BTreeSet<RigCameraKey> = members
        .iter()
        .map(|&shot| scene.shot(shot).rig_camera)
        .collect();
    let cameras: BTreeSet<CameraKey> = members
        .iter()
        .map(|&shot| scene.shot(shot).camera)
        .collect();

    for &key in &rig_cameras {
        add_rig_camera(adjuster, scene, key, rig_camera_priors, true)?;
    }
    for &key in &cameras {
        add_camera(adjuster, scene, key, camera_priors, true)?;
    }

    let landmarks: BTreeSet<LandmarkKey> = shots
        .iter()
        .flat_map(|&shot| scene.shot(shot).observations.keys().copied())
        .collect();
    for &key in &landmarks {
        let landmark = scene.landmark(key);
        adjuster.add_point(&landmark.id, landmark.position, true);
    }

    for &key in &rig_instances {
        add_rig_instance(
            adjuster,
            scene,
            key,
            |shot| shots.contains(&shot),
            settings.bundle_use_gps,
        )?;
    }

    let mut num_reprojections = 0;
    for &shot in &shots {
        for &landmark in scene.shot(shot).observations.keys() {
            add_observation(adjuster, scene, shot, landmark);
            num_reprojections += 1;
        }
    }

    configure_solver(
        adjuster,
        settings,
        LOCAL_MAX_ITERATIONS,
        LinearSolverType::DenseQr,
    );
    timer.setup_done();

    adjuster.run();
    timer.run_done();

    commit_rig_instances(&*adjuster, scene, rig_instances)?;

    let report = BundleReport {
        brief_report: adjuster.brief_report(),
        wall_times: timer.finish(),
        num_images: shots.len(),
        num_interior_images: shots.len(),
        num_boundary_images: 0,
        num_other_images: scene.num_shots().saturating_sub(shots.len()),
        num_points: landmarks.len(),
        num_reprojections,
    };
    debug!(
        "adjusted the poses of {} shots: {}",
        report.num_images, report.brief_report
    );
    Ok(report)
}

/// Adjusts the whole scene.
///
/// Cameras are free if `optimize_camera_parameters` is set. Every rig instance and landmark is
/// free. Rig cameras which share an id with a camera, or which were seen too few times to be
/// estimated, are fixed. When the alignment method is (or is detected as)
/// [`AlignMethod::OrientationPrior`], every shot is constrained to the up vector of
/// `align_orientation_prior`.
///
/// Afterwards every parameter block is written back to the scene.
pub fn bundle(
    scene: &mut Scene,
    camera_priors: &HashMap<String, Camera>,
    rig_camera_priors: &HashMap<String, RigToCamera>,
    gcps: &[GroundControlPoint],
    settings: &BundleSettings,
    adjuster: &mut impl BundleAdjuster,
) -> Result<BundleReport> {
    let mut timer = Timer::start();
    let fix_cameras = !settings.optimize_camera_parameters;

    let cameras: Vec<CameraKey> = scene.cameras().map(|(key, _)| key).collect();
    for &key in &cameras {
        add_camera(adjuster, scene, key, camera_priors, fix_cameras)?;
    }

    for (_, landmark) in scene.landmarks() {
        adjuster.add_point(&landmark.id, landmark.position, false);
    }

    let align_method = match settings.align_method {
        AlignMethod::Auto => detect_alignment_constraints(scene, settings, gcps),
        method => method,
    };
    let up = match align_method {
        AlignMethod::OrientationPrior => up_vector(settings.align_orientation_prior),
        _ => None,
    };

    let shots_per_rig_camera = match scene.num_rig_cameras() {
        0 => 1,
        rig_cameras => scene.num_shots() / rig_cameras,
    };
    let lock_rig_cameras = shots_per_rig_camera <= MIN_RIG_INSTANCES_FOR_ADJUST;
    let rig_cameras: Vec<(RigCameraKey, bool)> = scene
        .rig_cameras()
        .map(|(key, rig_camera)| {
            let is_lever_arm = scene.camera_key(&rig_camera.id).is_some();
            (key, is_lever_arm || lock_rig_cameras)
        })
        .collect();
    for (key, fixed) in rig_cameras {
        add_rig_camera(adjuster, scene, key, rig_camera_priors, fixed)?;
    }

    let rig_instances: Vec<RigInstanceKey> = scene.rig_instances().map(|(key, _)| key).collect();
    for key in rig_instances {
        add_rig_instance(adjuster, scene, key, |_| true, settings.bundle_use_gps)?;
    }

    let mut num_reprojections = 0;
    for (shot_key, shot) in scene.shots() {
        if let Some(up) = up {
            adjuster.add_absolute_up_vector(&shot.id, up, UP_VECTOR_SD);
        }
        for &landmark in shot.observations.keys() {
            add_observation(adjuster, scene, shot_key, landmark);
            num_reprojections += 1;
        }
    }

    if settings.bundle_use_gcp && !gcps.is_empty() {
        add_gcp_to_bundle(adjuster, scene, gcps, settings)?;
    }

    if settings.bundle_compensate_gps_bias {
        for &key in &cameras {
            let camera = scene.camera(key);
            adjuster.set_camera_bias(&camera.id, &camera.bias);
        }
    }

    configure_solver(
        adjuster,
        settings,
        settings.bundle_max_iterations,
        LinearSolverType::SparseSchur,
    );
    timer.setup_done();

    adjuster.run();
    timer.run_done();

    bundle_to_scene(&*adjuster, scene, !fix_cameras)?;

    let report = BundleReport {
        brief_report: adjuster.brief_report(),
        wall_times: timer.finish(),
        num_images: scene.num_shots(),
        num_interior_images: scene.num_shots(),
        num_boundary_images: 0,
        num_other_images: 0,
        num_points: scene.num_landmarks(),
        num_reprojections,
    };
    info!(
        "bundle of {} shots and {} points with {:?} alignment: {}",
        report.num_images, report.num_points, align_method, report.brief_report
    );
    Ok(report)
}
