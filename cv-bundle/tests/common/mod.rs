#![allow(dead_code)]

use cv_bundle::{
    BundleAdjuster, ConvergedPoint, IntrinsicsPriorSd, LinearSolverType, LossFunctionKind,
    Observation, Scene, ShotMeasurements,
};
use cv_core::nalgebra::{Point2, Point3, Rotation3, Vector2, Vector3};
use cv_core::{Pose, RigToCamera, Similarity, WorldToRig};
use cv_geom::topocentric::TopocentricConverter;
use cv_pinhole::Camera;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedInstance {
    pub pose: WorldToRig,
    pub shot_cameras: BTreeMap<String, String>,
    pub shot_rig_cameras: BTreeMap<String, String>,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedProjection {
    pub shot_id: String,
    pub point_id: String,
    pub observation: Point2<f64>,
    pub std_deviation: f64,
    pub depth_prior: Option<f64>,
}

/// Records every call made to it. Running moves every free rig instance and point by `shift`.
#[derive(Debug, Default)]
pub struct RecordingAdjuster {
    pub cameras: BTreeMap<String, (Camera, Camera, bool)>,
    pub biases: BTreeMap<String, Similarity>,
    pub rig_cameras: BTreeMap<String, (RigToCamera, RigToCamera, bool)>,
    pub rig_instances: BTreeMap<String, RecordedInstance>,
    pub position_priors: BTreeMap<String, (Point3<f64>, Vector3<f64>, String)>,
    pub points: BTreeMap<String, (Point3<f64>, bool)>,
    pub point_priors: BTreeMap<String, (Point3<f64>, Vector3<f64>, bool)>,
    pub projections: Vec<RecordedProjection>,
    pub up_vectors: Vec<(String, Vector3<f64>, f64)>,
    pub loss: Option<(LossFunctionKind, f64)>,
    pub intrinsics_prior_sd: Option<IntrinsicsPriorSd>,
    pub rig_prior_sd: Option<(f64, f64)>,
    pub threads: Option<usize>,
    pub max_iterations: Option<usize>,
    pub solver: Option<LinearSolverType>,
    pub analytic_derivatives: Option<bool>,
    pub relative_motions: usize,
    pub runs: usize,
    pub shift: Vector3<f64>,
    /// Ids whose converged values are replaced by NaN.
    pub poisoned: BTreeSet<String>,
    /// Point ids whose reprojection errors are replaced by NaN and INF.
    pub poisoned_reprojections: BTreeSet<String>,
}

impl RecordingAdjuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shifting(shift: Vector3<f64>) -> Self {
        Self {
            shift,
            ..Self::default()
        }
    }

    pub fn poison(mut self, id: &str) -> Self {
        self.poisoned.insert(id.to_owned());
        self
    }

    pub fn poison_reprojections(mut self, point_id: &str) -> Self {
        self.poisoned_reprojections.insert(point_id.to_owned());
        self
    }

    pub fn projections_of(&self, shot_id: &str) -> usize {
        self.projections
            .iter()
            .filter(|projection| projection.shot_id == shot_id)
            .count()
    }
}

impl BundleAdjuster for RecordingAdjuster {
    fn add_camera(&mut self, id: &str, camera: &Camera, prior: &Camera, fixed: bool) {
        self.cameras.insert(id.to_owned(), (*camera, *prior, fixed));
    }

    fn set_camera_bias(&mut self, camera_id: &str, bias: &Similarity) {
        self.biases.insert(camera_id.to_owned(), *bias);
    }

    fn add_rig_camera(&mut self, id: &str, pose: RigToCamera, prior: RigToCamera, fixed: bool) {
        self.rig_cameras.insert(id.to_owned(), (pose, prior, fixed));
    }

    fn add_rig_instance(
        &mut self,
        id: &str,
        pose: WorldToRig,
        shot_cameras: &BTreeMap<String, String>,
        shot_rig_cameras: &BTreeMap<String, String>,
        fixed: bool,
    ) {
        self.rig_instances.insert(
            id.to_owned(),
            RecordedInstance {
                pose,
                shot_cameras: shot_cameras.clone(),
                shot_rig_cameras: shot_rig_cameras.clone(),
                fixed,
            },
        );
    }

    fn add_rig_instance_position_prior(
        &mut self,
        instance_id: &str,
        position: Point3<f64>,
        std_deviation: Vector3<f64>,
        scale_group: &str,
    ) {
        self.position_priors.insert(
            instance_id.to_owned(),
            (position, std_deviation, scale_group.to_owned()),
        );
    }

    fn add_point(&mut self, id: &str, position: Point3<f64>, fixed: bool) {
        self.points.insert(id.to_owned(), (position, fixed));
    }

    fn add_point_prior(
        &mut self,
        id: &str,
        position: Point3<f64>,
        std_deviation: Vector3<f64>,
        has_altitude: bool,
    ) {
        self.point_priors
            .insert(id.to_owned(), (position, std_deviation, has_altitude));
    }

    fn add_point_projection_observation(
        &mut self,
        shot_id: &str,
        point_id: &str,
        observation: Point2<f64>,
        std_deviation: f64,
        depth_prior: Option<f64>,
    ) {
        self.projections.push(RecordedProjection {
            shot_id: shot_id.to_owned(),
            point_id: point_id.to_owned(),
            observation,
            std_deviation,
            depth_prior,
        });
    }

    fn add_absolute_up_vector(&mut self, shot_id: &str, up: Vector3<f64>, std_deviation: f64) {
        self.up_vectors.push((shot_id.to_owned(), up, std_deviation));
    }

    fn set_point_projection_loss_function(&mut self, kind: LossFunctionKind, threshold: f64) {
        self.loss = Some((kind, threshold));
    }

    fn set_internal_parameters_prior_sd(&mut self, sd: &IntrinsicsPriorSd) {
        self.intrinsics_prior_sd = Some(*sd);
    }

    fn set_rig_parameters_prior_sd(&mut self, translation_sd: f64, rotation_sd: f64) {
        self.rig_prior_sd = Some((translation_sd, rotation_sd));
    }

    fn set_num_threads(&mut self, threads: usize) {
        self.threads = Some(threads);
    }

    fn set_max_num_iterations(&mut self, iterations: usize) {
        self.max_iterations = Some(iterations);
    }

    fn set_linear_solver_type(&mut self, solver: LinearSolverType) {
        self.solver = Some(solver);
    }

    fn set_use_analytic_derivatives(&mut self, analytic: bool) {
        self.analytic_derivatives = Some(analytic);
    }

    fn run(&mut self) {
        self.runs += 1;
        let shift = self.shift;
        for instance in self.rig_instances.values_mut() {
            if !instance.fixed {
                let pose = instance.pose.isometry();
                instance.pose = WorldToRig::from_parts(
                    pose.translation.vector - pose.rotation * shift,
                    pose.rotation,
                );
            }
        }
        for (position, fixed) in self.points.values_mut() {
            if !*fixed {
                *position += shift;
            }
        }
    }

    fn rig_instance_count(&self) -> usize {
        self.rig_instances.len()
    }

    fn projection_count(&self) -> usize {
        self.projections.len()
    }

    fn relative_motion_count(&self) -> usize {
        self.relative_motions
    }

    fn camera(&self, id: &str) -> Option<Camera> {
        let mut camera = self.cameras.get(id)?.0;
        if self.poisoned.contains(id) {
            camera.focal = f64::NAN;
        }
        Some(camera)
    }

    fn bias(&self, camera_id: &str) -> Option<Similarity> {
        let mut bias = *self.biases.get(camera_id)?;
        if self.poisoned.contains(camera_id) {
            bias.scale = f64::NAN;
        }
        Some(bias)
    }

    fn rig_instance(&self, id: &str) -> Option<WorldToRig> {
        let pose = self.rig_instances.get(id)?.pose;
        if self.poisoned.contains(id) {
            return Some(WorldToRig::from_parts(
                Vector3::repeat(f64::NAN),
                pose.rotation(),
            ));
        }
        Some(pose)
    }

    fn rig_camera(&self, id: &str) -> Option<RigToCamera> {
        let pose = self.rig_cameras.get(id)?.0;
        if self.poisoned.contains(id) {
            return Some(RigToCamera::from_parts(
                Vector3::new(f64::INFINITY, 0.0, 0.0),
                pose.rotation(),
            ));
        }
        Some(pose)
    }

    fn point(&self, id: &str) -> Option<ConvergedPoint> {
        let mut position = self.points.get(id)?.0;
        if self.poisoned.contains(id) {
            position.x = f64::NAN;
        }
        let error = if self.poisoned_reprojections.contains(id) {
            Vector2::new(f64::NAN, f64::INFINITY)
        } else {
            Vector2::new(0.001, -0.001)
        };
        let reprojection_errors = self
            .projections
            .iter()
            .filter(|projection| projection.point_id == id)
            .map(|projection| (projection.shot_id.clone(), error))
            .collect();
        Some(ConvergedPoint {
            position,
            reprojection_errors,
        })
    }

    fn brief_report(&self) -> String {
        format!(
            "recorded {} projections, {} runs",
            self.projections.len(),
            self.runs
        )
    }
}

pub const CAMERA: &str = "camera";
pub const RIG_CAMERA: &str = "main";

/// Builds scenes of perspective cameras looking down `+z`.
///
/// Every builder starts with one camera, [`CAMERA`], and one identity rig camera, [`RIG_CAMERA`].
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new() -> Self {
        let mut scene = Scene::new(TopocentricConverter::default());
        scene.add_camera(CAMERA, Camera::perspective(1.0)).unwrap();
        scene
            .add_rig_camera(RIG_CAMERA, RigToCamera::identity())
            .unwrap();
        Self { scene }
    }

    pub fn camera(mut self, id: &str) -> Self {
        self.scene.add_camera(id, Camera::perspective(1.0)).unwrap();
        self
    }

    pub fn rig_camera(mut self, id: &str, offset: Vector3<f64>) -> Self {
        self.scene
            .add_rig_camera(id, RigToCamera::from_parts(offset, Rotation3::identity()))
            .unwrap();
        self
    }

    /// Adds a rig instance at `position` whose shots are `(shot id, camera id, rig camera id)`.
    pub fn rig_instance(mut self, id: &str, position: Point3<f64>, shots: &[(&str, &str, &str)]) -> Self {
        self.scene
            .add_rig_instance(
                id,
                WorldToRig::from_parts(-position.coords, Rotation3::identity()),
            )
            .unwrap();
        for &(shot, camera, rig_camera) in shots {
            self.scene.add_shot(shot, camera, rig_camera, id).unwrap();
        }
        self
    }

    /// Adds a single shot rig instance named after the shot.
    pub fn shot(self, id: &str, position: Point3<f64>) -> Self {
        let instance = format!("{}-instance", id);
        self.rig_instance(&instance, position, &[(id, CAMERA, RIG_CAMERA)])
    }

    /// Adds a landmark observed by `observers`, projected exactly onto each of them.
    pub fn landmark(mut self, id: &str, position: Point3<f64>, observers: &[&str]) -> Self {
        self.scene.add_landmark(id, position).unwrap();
        for &shot in observers {
            let key = self.scene.shot_key(shot).unwrap();
            let camera_point = self.scene.shot_pose(key).transform(position);
            let projection = Point2::new(
                camera_point.x / camera_point.z,
                camera_point.y / camera_point.z,
            );
            self.scene
                .add_observation(shot, id, Observation::new(projection, 0.004))
                .unwrap();
        }
        self
    }

    pub fn gps(mut self, shot: &str, position: Point3<f64>, accuracy: f64) -> Self {
        let key = self.scene.shot_key(shot).unwrap();
        self.scene
            .set_shot_measurements(key, ShotMeasurements::gps(position, accuracy));
        self
    }

    pub fn build(self) -> Scene {
        self.scene
    }
}

pub fn shot_id(index: usize) -> String {
    format!("shot{:02}", index)
}

/// Single shot rig instances along the x axis. Each consecutive pair of shots shares
/// `shared_points` landmarks, and no other shots share landmarks.
pub fn strip(num_shots: usize, shared_points: usize) -> Scene {
    let mut builder = SceneBuilder::new();
    for i in 0..num_shots {
        builder = builder.shot(&shot_id(i), Point3::new(i as f64, 0.0, 0.0));
    }
    for i in 1..num_shots {
        for j in 0..shared_points {
            let position = Point3::new(i as f64 - 0.5, j as f64 * 0.1, 10.0);
            let a = shot_id(i - 1);
            let b = shot_id(i);
            builder = builder.landmark(&format!("point{}-{}", i, j), position, &[&a, &b]);
        }
    }
    builder.build()
}

/// The current cameras and rig cameras of a scene, to be used as priors.
pub fn priors(scene: &Scene) -> (HashMap<String, Camera>, HashMap<String, RigToCamera>) {
    let cameras = scene
        .cameras()
        .map(|(_, camera)| (camera.id.clone(), camera.model))
        .collect();
    let rig_cameras = scene
        .rig_cameras()
        .map(|(_, rig_camera)| (rig_camera.id.clone(), rig_camera.pose))
        .collect();
    (cameras, rig_cameras)
}
