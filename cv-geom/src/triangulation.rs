use cv_core::{
    nalgebra::{Matrix3, Point3, UnitVector3, Vector3},
    TriangulatorBearings,
};
use float_ord::FloatOrd;

/// Triangulates the point which minimizes the sum of squared distances to every ray.
///
/// For each ray with optical center `c` and bearing `b`, the matrix `I - b * b^T` projects
/// a vector onto the plane orthogonal to the bearing. Summing these projections over all rays
/// gives a 3x3 linear system `sum(I - b * b^T) * x = sum(I - b * b^T) * c` whose solution is
/// the midpoint of the rays.
///
/// The result is rejected when:
///
/// * fewer than two rays are provided
/// * no pair of rays converges by at least the minimum angle
/// * the point is further than the threshold angle from any of the rays
/// * the point is closer than the minimum depth in front of any camera (or behind it)
///
/// ```
/// use cv_core::nalgebra::{Point3, UnitVector3};
/// use cv_core::TriangulatorBearings;
/// use cv_geom::triangulation::MidpointTriangulator;
///
/// let point = Point3::new(0.3, 0.1, 5.0);
/// let a = Point3::new(0.0, 0.0, 0.0);
/// let b = Point3::new(1.0, 0.0, 0.0);
/// let rays = [
///     (a, UnitVector3::new_normalize(point - a)),
///     (b, UnitVector3::new_normalize(point - b)),
/// ];
/// let triangulated = MidpointTriangulator::new().triangulate_bearings(rays).unwrap();
/// assert!((triangulated - point).norm() < 1e-9);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct MidpointTriangulator {
    threshold: f64,
    min_angle: f64,
    min_depth: f64,
}

impl MidpointTriangulator {
    /// Creates a `MidpointTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the maximum angle in radians between a ray and the triangulated point as seen from
    /// the optical center of that ray.
    ///
    /// Default is `1.0`.
    #[must_use]
    pub fn threshold(self, threshold: f64) -> Self {
        Self { threshold, ..self }
    }

    /// Set the minimum angle in radians that at least one pair of rays must converge by.
    ///
    /// Default is `0.1` degrees.
    #[must_use]
    pub fn min_angle(self, min_angle: f64) -> Self {
        Self { min_angle, ..self }
    }

    /// Set the minimum depth of the point along each ray.
    ///
    /// Default is `1e-3`.
    #[must_use]
    pub fn min_depth(self, min_depth: f64) -> Self {
        Self { min_depth, ..self }
    }
}

impl Default for MidpointTriangulator {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            min_angle: 0.1f64.to_radians(),
            min_depth: 1e-3,
        }
    }
}

impl TriangulatorBearings for MidpointTriangulator {
    fn triangulate_bearings<I>(&self, rays: I) -> Option<Point3<f64>>
    where
        I: IntoIterator<Item = (Point3<f64>, UnitVector3<f64>)>,
        I::IntoIter: Clone,
    {
        let rays = rays.into_iter();
        if rays.clone().count() < 2 {
            return None;
        }

        // At least one pair of rays must be far enough apart to constrain depth.
        let widest = rays
            .clone()
            .enumerate()
            .flat_map(|(ix, (_, a))| {
                rays.clone()
                    .skip(ix + 1)
                    .map(move |(_, b)| FloatOrd(a.angle(&b.into_inner())))
            })
            .max()?;
        if widest.0 < self.min_angle {
            return None;
        }

        let mut design: Matrix3<f64> = Matrix3::zeros();
        let mut target: Vector3<f64> = Vector3::zeros();
        for (center, bearing) in rays.clone() {
            let projection = Matrix3::identity() - bearing.into_inner() * bearing.transpose();
            design += projection;
            target += projection * center.coords;
        }
        let point = Point3::from(design.try_inverse()? * target);

        if !point.iter().all(|n| n.is_finite()) {
            return None;
        }

        rays.clone()
            .all(|(center, bearing)| {
                let projected = point - center;
                let bearing = bearing.into_inner();
                projected.angle(&bearing) <= self.threshold
                    && projected.dot(&bearing) >= self.min_depth
            })
            .then(|| point)
    }
}
