use crate::{Entity, Error, Result};
use cv_core::nalgebra::{Point2, Point3, Vector2};
use cv_core::{RigToCamera, Similarity, WorldToCamera, WorldToRig};
use cv_geom::topocentric::TopocentricConverter;
use cv_pinhole::{Camera, CameraParameter};
use log::*;
use slotmap::{new_key_type, DenseSlotMap, Key};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

new_key_type! {
    pub struct CameraKey;
    pub struct RigCameraKey;
    pub struct RigInstanceKey;
    pub struct ShotKey;
    pub struct LandmarkKey;
}

/// The measurement of a landmark on a shot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Position in normalized image coordinates.
    pub point: Point2<f64>,
    /// The standard deviation of the measurement, in normalized image coordinates.
    pub scale: f64,
    /// Depth of the landmark along the optical axis, when a depth sensor measured it.
    pub depth_prior: Option<f64>,
}

impl Observation {
    pub fn new(point: Point2<f64>, scale: f64) -> Self {
        Self {
            point,
            scale,
            depth_prior: None,
        }
    }

    #[must_use]
    pub fn depth_prior(self, depth: f64) -> Self {
        Self {
            depth_prior: Some(depth),
            ..self
        }
    }
}

/// Absolute measurements attached to a shot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ShotMeasurements {
    /// GPS position in topocentric coordinates.
    pub gps_position: Option<Point3<f64>>,
    /// GPS accuracy in meters.
    pub gps_accuracy: Option<f64>,
}

impl ShotMeasurements {
    pub fn gps(position: Point3<f64>, accuracy: f64) -> Self {
        Self {
            gps_position: Some(position),
            gps_accuracy: Some(accuracy),
        }
    }
}

/// A camera along with the GPS bias of the shots it takes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SceneCamera {
    pub id: String,
    pub model: Camera,
    pub bias: Similarity,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RigCamera {
    pub id: String,
    pub pose: RigToCamera,
}

/// Shots captured together, sharing a single pose.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RigInstance {
    pub id: String,
    pub pose: WorldToRig,
    /// The rig camera each member shot was taken with.
    pub shots: BTreeMap<ShotKey, RigCameraKey>,
}

/// A posed image.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Shot {
    pub id: String,
    pub camera: CameraKey,
    pub rig_camera: RigCameraKey,
    pub rig_instance: RigInstanceKey,
    pub measurements: ShotMeasurements,
    pub observations: BTreeMap<LandmarkKey, Observation>,
}

/// A 3d point observed by two or more shots.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Landmark {
    pub id: String,
    pub position: Point3<f64>,
    pub observations: BTreeSet<ShotKey>,
    /// The residual of each observation after the last optimization, keyed by shot id.
    pub reprojection_errors: BTreeMap<String, Vector2<f64>>,
}

/// A partial reconstruction: cameras, rigs, shots, and the landmarks they observe.
///
/// Entities live in arenas and refer to each other by key. Each entity also has a string id
/// which is unique among entities of its kind.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Scene {
    cameras: DenseSlotMap<CameraKey, SceneCamera>,
    rig_cameras: DenseSlotMap<RigCameraKey, RigCamera>,
    rig_instances: DenseSlotMap<RigInstanceKey, RigInstance>,
    shots: DenseSlotMap<ShotKey, Shot>,
    landmarks: DenseSlotMap<LandmarkKey, Landmark>,
    camera_ids: HashMap<String, CameraKey>,
    rig_camera_ids: HashMap<String, RigCameraKey>,
    rig_instance_ids: HashMap<String, RigInstanceKey>,
    shot_ids: HashMap<String, ShotKey>,
    landmark_ids: HashMap<String, LandmarkKey>,
    reference: TopocentricConverter,
}

/// Inserts into an arena, failing if the id is already taken.
fn insert_unique<K: Key, V>(
    arena: &mut DenseSlotMap<K, V>,
    ids: &mut HashMap<String, K>,
    entity: Entity,
    id: String,
    make: impl FnOnce(String) -> V,
) -> Result<K> {
    if ids.contains_key(&id) {
        return Err(Error::DuplicateEntity { entity, id });
    }
    let key = arena.insert(make(id.clone()));
    ids.insert(id, key);
    Ok(key)
}

impl Scene {
    /// Creates an empty scene whose topocentric frame is anchored at `reference`.
    pub fn new(reference: TopocentricConverter) -> Self {
        Self {
            reference,
            ..Default::default()
        }
    }

    /// The georeferencer of the scene.
    pub fn reference(&self) -> &TopocentricConverter {
        &self.reference
    }

    /// Adds a camera with an identity GPS bias.
    pub fn add_camera(&mut self, id: impl Into<String>, model: Camera) -> Result<CameraKey> {
        insert_unique(
            &mut self.cameras,
            &mut self.camera_ids,
            Entity::Camera,
            id.into(),
            |id| SceneCamera {
                id,
                model,
                bias: Similarity::identity(),
            },
        )
    }

    pub fn add_rig_camera(
        &mut self,
        id: impl Into<String>,
        pose: RigToCamera,
    ) -> Result<RigCameraKey> {
        insert_unique(
            &mut self.rig_cameras,
            &mut self.rig_camera_ids,
            Entity::RigCamera,
            id.into(),
            |id| RigCamera { id, pose },
        )
    }

    pub fn add_rig_instance(
        &mut self,
        id: impl Into<String>,
        pose: WorldToRig,
    ) -> Result<RigInstanceKey> {
        insert_unique(
            &mut self.rig_instances,
            &mut self.rig_instance_ids,
            Entity::RigInstance,
            id.into(),
            |id| RigInstance {
                id,
                pose,
                shots: BTreeMap::new(),
            },
        )
    }

    /// Adds a shot taken by `camera` mounted as `rig_camera` on `rig_instance`.
    pub fn add_shot(
        &mut self,
        id: impl Into<String>,
        camera: &str,
        rig_camera: &str,
        rig_instance: &str,
    ) -> Result<ShotKey> {
        let camera = self
            .camera_key(camera)
            .ok_or_else(|| Error::unknown(Entity::Camera, camera))?;
        let rig_camera = self
            .rig_camera_key(rig_camera)
            .ok_or_else(|| Error::unknown(Entity::RigCamera, rig_camera))?;
        let rig_instance = self
            .rig_instance_key(rig_instance)
            .ok_or_else(|| Error::unknown(Entity::RigInstance, rig_instance))?;
        let shot = insert_unique(
            &mut self.shots,
            &mut self.shot_ids,
            Entity::Shot,
            id.into(),
            |id| Shot {
                id,
                camera,
                rig_camera,
                rig_instance,
                measurements: ShotMeasurements::default(),
                observations: BTreeMap::new(),
            },
        )?;
        self.rig_instances[rig_instance]
            .shots
            .insert(shot, rig_camera);
        Ok(shot)
    }

    pub fn add_landmark(
        &mut self,
        id: impl Into<String>,
        position: Point3<f64>,
    ) -> Result<LandmarkKey> {
        insert_unique(
            &mut self.landmarks,
            &mut self.landmark_ids,
            Entity::Point,
            id.into(),
            |id| Landmark {
                id,
                position,
                observations: BTreeSet::new(),
                reprojection_errors: BTreeMap::new(),
            },
        )
    }

    /// Records that `shot` observes `landmark`, replacing any previous observation between the two.
    pub fn add_observation(
        &mut self,
        shot: &str,
        landmark: &str,
        observation: Observation,
    ) -> Result<()> {
        let shot_key = self
            .shot_key(shot)
            .ok_or_else(|| Error::unknown(Entity::Shot, shot))?;
        let landmark_key = self
            .landmark_key(landmark)
            .ok_or_else(|| Error::unknown(Entity::Point, landmark))?;
        self.shots[shot_key]
            .observations
            .insert(landmark_key, observation);
        self.landmarks[landmark_key].observations.insert(shot_key);
        trace!("shot {} observes landmark {}", shot, landmark);
        Ok(())
    }

    pub fn camera_key(&self, id: &str) -> Option<CameraKey> {
        self.camera_ids.get(id).copied()
    }

    pub fn rig_camera_key(&self, id: &str) -> Option<RigCameraKey> {
        self.rig_camera_ids.get(id).copied()
    }

    pub fn rig_instance_key(&self, id: &str) -> Option<RigInstanceKey> {
        self.rig_instance_ids.get(id).copied()
    }

    pub fn shot_key(&self, id: &str) -> Option<ShotKey> {
        self.shot_ids.get(id).copied()
    }

    pub fn landmark_key(&self, id: &str) -> Option<LandmarkKey> {
        self.landmark_ids.get(id).copied()
    }

    /// Panics if the key does not belong to this scene.
    pub fn camera(&self, key: CameraKey) -> &SceneCamera {
        &self.cameras[key]
    }

    pub fn rig_camera(&self, key: RigCameraKey) -> &RigCamera {
        &self.rig_cameras[key]
    }

    pub fn rig_instance(&self, key: RigInstanceKey) -> &RigInstance {
        &self.rig_instances[key]
    }

    pub fn shot(&self, key: ShotKey) -> &Shot {
        &self.shots[key]
    }

    pub fn landmark(&self, key: LandmarkKey) -> &Landmark {
        &self.landmarks[key]
    }

    pub fn cameras(&self) -> impl Iterator<Item = (CameraKey, &SceneCamera)> + '_ {
        self.cameras.iter()
    }

    pub fn rig_cameras(&self) -> impl Iterator<Item = (RigCameraKey, &RigCamera)> + '_ {
        self.rig_cameras.iter()
    }

    pub fn rig_instances(&self) -> impl Iterator<Item = (RigInstanceKey, &RigInstance)> + '_ {
        self.rig_instances.iter()
    }

    pub fn shots(&self) -> impl Iterator<Item = (ShotKey, &Shot)> + '_ {
        self.shots.iter()
    }

    pub fn landmarks(&self) -> impl Iterator<Item = (LandmarkKey, &Landmark)> + '_ {
        self.landmarks.iter()
    }

    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    pub fn num_rig_cameras(&self) -> usize {
        self.rig_cameras.len()
    }

    pub fn num_shots(&self) -> usize {
        self.shots.len()
    }

    pub fn num_landmarks(&self) -> usize {
        self.landmarks.len()
    }

    /// The world to camera pose of a shot, composed from its rig camera and rig instance.
    pub fn shot_pose(&self, key: ShotKey) -> WorldToCamera {
        let shot = &self.shots[key];
        WorldToCamera::from_rig(
            self.rig_cameras[shot.rig_camera].pose,
            self.rig_instances[shot.rig_instance].pose,
        )
    }

    /// The optical center of a shot in world coordinates.
    pub fn shot_origin(&self, key: ShotKey) -> Point3<f64> {
        self.shot_pose(key).origin()
    }

    pub fn set_shot_measurements(&mut self, key: ShotKey, measurements: ShotMeasurements) {
        self.shots[key].measurements = measurements;
    }

    pub fn set_camera_parameter(&mut self, key: CameraKey, parameter: CameraParameter, value: f64) {
        self.cameras[key].model.set_parameter(parameter, value);
    }

    pub fn set_bias(&mut self, key: CameraKey, bias: Similarity) {
        self.cameras[key].bias = bias;
    }

    pub fn set_rig_instance_pose(&mut self, key: RigInstanceKey, pose: WorldToRig) {
        self.rig_instances[key].pose = pose;
    }

    pub fn set_rig_camera_pose(&mut self, key: RigCameraKey, pose: RigToCamera) {
        self.rig_cameras[key].pose = pose;
    }

    pub fn set_landmark_position(&mut self, key: LandmarkKey, position: Point3<f64>) {
        self.landmarks[key].position = position;
    }

    pub fn set_landmark_reprojection_errors(
        &mut self,
        key: LandmarkKey,
        errors: BTreeMap<String, Vector2<f64>>,
    ) {
        self.landmarks[key].reprojection_errors = errors;
    }
}

