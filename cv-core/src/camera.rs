use nalgebra::{Point2, UnitVector3};

/// Allows conversion between the point on an image and the bearing of the projection out of the camera.
///
/// Image points are expressed in normalized image coordinates: the origin is the center of the
/// image and the unit is the largest image dimension.
pub trait CameraModel {
    /// Extracts a bearing from a normalized image point, removing any lens distortion.
    ///
    /// The bearings X axis points right, Y axis points down, and Z axis points forwards.
    /// The image point uses the same coordiate frame. Its Y is down and its X is right.
    fn calibrate(&self, point: Point2<f64>) -> UnitVector3<f64>;

    /// Extracts the normalized image point from the bearing, applying lens distortion.
    ///
    /// Since this might not be possible (if bearing is behind the camera),
    /// this operation is fallible.
    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<Point2<f64>>;
}
