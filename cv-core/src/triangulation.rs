use nalgebra::{Point3, UnitVector3};

/// This trait is for algorithms which triangulate a point from two or more world-space rays.
/// Each ray is the optical center of a camera and the [`UnitVector3`] bearing of the observation,
/// already rotated into the world frame.
///
/// If the rays are not sufficient to produce a reliable point, `None` is returned.
pub trait TriangulatorBearings {
    fn triangulate_bearings<I>(&self, rays: I) -> Option<Point3<f64>>
    where
        I: IntoIterator<Item = (Point3<f64>, UnitVector3<f64>)>,
        I::IntoIter: Clone;
}
