use cv_core::nalgebra::{Point2, UnitVector3, Vector2, Vector3};
use cv_core::CameraModel;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The number of fixed point iterations used to remove distortion.
const UNDISTORT_ITERATIONS: usize = 20;

/// The projection model of a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ProjectionType {
    /// Square pixels, a centered principal point, and two radial distortion coefficients.
    Perspective,
    /// Full [Brown-Conrady][b71] model with three radial and two tangential coefficients.
    ///
    /// [b71]: https://www.asprs.org/wp-content/uploads/pers/1971journal/aug/1971_aug_855-866.pdf
    Brown,
}

impl ProjectionType {
    /// The parameters which are meaningful for this projection.
    pub fn parameters(self) -> &'static [CameraParameter] {
        use CameraParameter::*;
        match self {
            ProjectionType::Perspective => &[Focal, K1, K2],
            ProjectionType::Brown => &[Focal, AspectRatio, Cx, Cy, K1, K2, K3, P1, P2],
        }
    }
}

/// A single named intrinsic value of a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum CameraParameter {
    Focal,
    AspectRatio,
    Cx,
    Cy,
    K1,
    K2,
    K3,
    P1,
    P2,
}

/// Intrinsic camera parameters with lens distortion.
///
/// All values are expressed in normalized image coordinates, where the unit of distance is the
/// largest dimension of the image and the origin is the center of the image. Given the undistorted
/// normalized coordinates $(x, y)$ and $r^2 = x^2 + y^2$ the distorted coordinates are:
///
/// $$
/// x_d = x ⋅ (1 + k_1 r^2 + k_2 r^4 + k_3 r^6) + 2 p_1 x y + p_2 (r^2 + 2 x^2)
/// $$
///
/// $$
/// y_d = y ⋅ (1 + k_1 r^2 + k_2 r^4 + k_3 r^6) + p_1 (r^2 + 2 y^2) + 2 p_2 x y
/// $$
///
/// and the image point is $(f x_d + c_x, f a y_d + c_y)$, where $a$ is the aspect ratio.
///
/// ```
/// use cv_core::CameraModel;
/// use cv_core::nalgebra::Point2;
/// use cv_pinhole::Camera;
///
/// let mut camera = Camera::brown(0.9, 1.0, Point2::new(0.01, -0.02));
/// camera.k1 = -0.1;
/// camera.p1 = 0.001;
/// let point = Point2::new(0.2, -0.1);
/// let bearing = camera.calibrate(point);
/// let reprojected = camera.uncalibrate(bearing).unwrap();
/// assert!((reprojected - point).norm() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Camera {
    pub projection: ProjectionType,
    pub focal: f64,
    pub aspect_ratio: f64,
    pub principal_point: Point2<f64>,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
}

impl Camera {
    /// Creates a perspective camera with no distortion.
    pub fn perspective(focal: f64) -> Self {
        Self {
            projection: ProjectionType::Perspective,
            focal,
            aspect_ratio: 1.0,
            principal_point: Point2::origin(),
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            p1: 0.0,
            p2: 0.0,
        }
    }

    /// Creates a Brown camera with no distortion.
    pub fn brown(focal: f64, aspect_ratio: f64, principal_point: Point2<f64>) -> Self {
        Self {
            projection: ProjectionType::Brown,
            aspect_ratio,
            principal_point,
            ..Self::perspective(focal)
        }
    }

    /// The parameters of this camera which an optimizer may refine.
    pub fn parameters(&self) -> impl Iterator<Item = (CameraParameter, f64)> + '_ {
        self.projection
            .parameters()
            .iter()
            .map(move |&parameter| (parameter, self.parameter(parameter)))
    }

    pub fn parameter(&self, parameter: CameraParameter) -> f64 {
        match parameter {
            CameraParameter::Focal => self.focal,
            CameraParameter::AspectRatio => self.aspect_ratio,
            CameraParameter::Cx => self.principal_point.x,
            CameraParameter::Cy => self.principal_point.y,
            CameraParameter::K1 => self.k1,
            CameraParameter::K2 => self.k2,
            CameraParameter::K3 => self.k3,
            CameraParameter::P1 => self.p1,
            CameraParameter::P2 => self.p2,
        }
    }

    pub fn set_parameter(&mut self, parameter: CameraParameter, value: f64) {
        let slot = match parameter {
            CameraParameter::Focal => &mut self.focal,
            CameraParameter::AspectRatio => &mut self.aspect_ratio,
            CameraParameter::Cx => &mut self.principal_point.x,
            CameraParameter::Cy => &mut self.principal_point.y,
            CameraParameter::K1 => &mut self.k1,
            CameraParameter::K2 => &mut self.k2,
            CameraParameter::K3 => &mut self.k3,
            CameraParameter::P1 => &mut self.p1,
            CameraParameter::P2 => &mut self.p2,
        };
        *slot = value;
    }

    /// Checks that every refinable parameter is a finite number.
    pub fn is_finite(&self) -> bool {
        self.parameters().all(|(_, value)| value.is_finite())
    }

    /// Applies lens distortion to undistorted normalized coordinates.
    pub fn distort(&self, point: Vector2<f64>) -> Vector2<f64> {
        let r2 = point.norm_squared();
        point * self.radial(r2) + self.tangential(point)
    }

    /// Removes lens distortion from distorted normalized coordinates by fixed point iteration.
    pub fn undistort(&self, distorted: Vector2<f64>) -> Vector2<f64> {
        let mut point = distorted;
        for _ in 0..UNDISTORT_ITERATIONS {
            let r2 = point.norm_squared();
            point = (distorted - self.tangential(point)) / self.radial(r2);
        }
        point
    }

    fn radial(&self, r2: f64) -> f64 {
        match self.projection {
            ProjectionType::Perspective => 1.0 + r2 * (self.k1 + r2 * self.k2),
            ProjectionType::Brown => 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3)),
        }
    }

    fn tangential(&self, point: Vector2<f64>) -> Vector2<f64> {
        match self.projection {
            ProjectionType::Perspective => Vector2::zeros(),
            ProjectionType::Brown => {
                let (x, y) = (point.x, point.y);
                let r2 = point.norm_squared();
                Vector2::new(
                    2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x),
                    self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y,
                )
            }
        }
    }

    fn focals(&self) -> Vector2<f64> {
        match self.projection {
            ProjectionType::Perspective => Vector2::new(self.focal, self.focal),
            ProjectionType::Brown => Vector2::new(self.focal, self.focal * self.aspect_ratio),
        }
    }

    fn center(&self) -> Vector2<f64> {
        match self.projection {
            ProjectionType::Perspective => Vector2::zeros(),
            ProjectionType::Brown => self.principal_point.coords,
        }
    }
}

impl CameraModel for Camera {
    fn calibrate(&self, point: Point2<f64>) -> UnitVector3<f64> {
        let distorted = (point.coords - self.center()).component_div(&self.focals());
        let undistorted = self.undistort(distorted);
        UnitVector3::new_normalize(undistorted.push(1.0))
    }

    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<Point2<f64>> {
        let bearing: Vector3<f64> = bearing.into_inner();
        if bearing.z <= f64::EPSILON {
            return None;
        }
        let undistorted = bearing.xy() / bearing.z;
        let distorted = self.distort(undistorted);
        Some(Point2::from(
            distorted.component_mul(&self.focals()) + self.center(),
        ))
    }
}
