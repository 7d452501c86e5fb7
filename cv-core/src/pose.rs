use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix4, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by all the different poses in this library:
///
/// * [`WorldToCamera`] - Transforms world points into the frame of a single camera
/// * [`CameraToWorld`] - Transforms camera points into world points
/// * [`WorldToRig`] - The pose of a rig instance, transforming world points into the rig frame
/// * [`RigToWorld`] - Transforms points in the rig frame into world points
/// * [`RigToCamera`] - The lever-arm of a rig camera, transforming rig points into one camera of the rig
/// * [`CameraToRig`] - Transforms camera points into the rig frame
pub trait Pose: From<IsometryMatrix3<f64>> + Clone + Copy {
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> IsometryMatrix3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }

    /// Retrieve the rotation component.
    fn rotation(self) -> Rotation3<f64> {
        self.isometry().rotation
    }

    /// Retrieve the translation component.
    fn translation(self) -> Vector3<f64> {
        self.isometry().translation.vector
    }

    /// Retrieve the homogeneous matrix.
    fn homogeneous(self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// Transform the given point into the output frame.
    fn transform(self, input: Point3<f64>) -> Point3<f64> {
        self.isometry() * input
    }

    /// Checks that neither the rotation nor the translation contain NaN or infinity.
    fn is_finite(self) -> bool {
        self.homogeneous().iter().all(|n| n.is_finite())
    }
}

macro_rules! pose_type {
    ($(#[$meta:meta])* $name:ident, $inverse:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
        #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
        pub struct $name(pub IsometryMatrix3<f64>);

        impl Pose for $name {
            type Inverse = $inverse;

            #[inline(always)]
            fn isometry(self) -> IsometryMatrix3<f64> {
                self.into()
            }
        }
    };
}

pose_type!(
    /// This contains a world pose, which is a pose of the world relative to the camera.
    /// This maps world points into camera points, changing an absolute position into
    /// a vector relative to the camera.
    WorldToCamera,
    CameraToWorld
);

pose_type!(
    /// This contains a camera pose, which is a pose of the camera relative to the world.
    /// This transforms camera points (with depth as `z`) into world coordinates.
    /// This also tells you where the camera is located and oriented in the world.
    CameraToWorld,
    WorldToCamera
);

pose_type!(
    /// The pose of a rig instance. All cameras captured at the same instant on a rig share this pose.
    WorldToRig,
    RigToWorld
);

pose_type!(
    /// Transforms points from the rig frame into world coordinates.
    RigToWorld,
    WorldToRig
);

pose_type!(
    /// The fixed offset of a camera relative to the rig it is mounted on (its lever-arm).
    ///
    /// A single camera rig has an identity [`RigToCamera`].
    RigToCamera,
    CameraToRig
);

pose_type!(
    /// Transforms camera points into the rig frame.
    CameraToRig,
    RigToCamera
);

impl WorldToCamera {
    /// Composes the pose of a camera on a rig from the rig camera offset and the rig instance pose.
    ///
    /// ```
    /// use cv_core::nalgebra::{Point3, Rotation3, Vector3};
    /// use cv_core::{Pose, RigToCamera, WorldToCamera, WorldToRig};
    ///
    /// let instance = WorldToRig::from_parts(Vector3::new(1.0, 0.0, 0.0), Rotation3::identity());
    /// let rig_camera = RigToCamera::from_parts(Vector3::new(0.0, 2.0, 0.0), Rotation3::identity());
    /// let pose = WorldToCamera::from_rig(rig_camera, instance);
    /// assert_eq!(pose.transform(Point3::origin()), Point3::new(1.0, 2.0, 0.0));
    /// ```
    pub fn from_rig(rig_camera: RigToCamera, instance: WorldToRig) -> Self {
        (rig_camera.isometry() * instance.isometry()).into()
    }

    /// The optical center of the camera in world coordinates.
    pub fn origin(self) -> Point3<f64> {
        self.inverse().isometry().translation.vector.into()
    }
}

impl WorldToRig {
    /// The position of the rig in world coordinates.
    pub fn origin(self) -> Point3<f64> {
        self.inverse().isometry().translation.vector.into()
    }
}

/// A 7 degree of freedom similarity transform (rotation, translation, and scale) used to
/// correct a systematic offset between a reconstruction and an absolute measurement, such as
/// the GPS bias of a camera.
///
/// A point `x` is mapped to `scale * (rotation * x) + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Similarity {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub scale: f64,
}

impl Similarity {
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// The similarity which leaves every point unchanged.
    pub fn identity() -> Self {
        Self::new(Rotation3::identity(), Vector3::zeros(), 1.0)
    }

    pub fn transform(&self, point: Point3<f64>) -> Point3<f64> {
        (self.rotation * point) * self.scale + self.translation
    }

    /// Checks that every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite()
            && self.translation.iter().all(|n| n.is_finite())
            && self.rotation.matrix().iter().all(|n| n.is_finite())
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self::identity()
    }
}
