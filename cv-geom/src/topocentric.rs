use cv_core::nalgebra::{Matrix3, Point3, Vector3};
use num_traits::Float;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters.
const WGS84_B: f64 = 6_356_752.314_245;

/// A geodetic coordinate on the WGS84 ellipsoid.
///
/// Latitude and longitude are in degrees and altitude is in meters above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Lla {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Lla {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Converts the coordinate to earth-centered earth-fixed cartesian coordinates.
    pub fn ecef(&self) -> Point3<f64> {
        let a2 = WGS84_A * WGS84_A;
        let b2 = WGS84_B * WGS84_B;
        let (sin_lat, cos_lat) = Float::sin_cos(self.latitude.to_radians());
        let (sin_lon, cos_lon) = Float::sin_cos(self.longitude.to_radians());
        let l = 1.0 / Float::sqrt(a2 * cos_lat * cos_lat + b2 * sin_lat * sin_lat);
        Point3::new(
            (a2 * l + self.altitude) * cos_lat * cos_lon,
            (a2 * l + self.altitude) * cos_lat * sin_lon,
            (b2 * l + self.altitude) * sin_lat,
        )
    }
}

/// Converts geodetic coordinates into a local Euclidean frame.
pub trait Georeferencer {
    /// Converts a geodetic coordinate to local topocentric (east, north, up) coordinates in meters.
    fn to_topocentric(&self, lla: &Lla) -> Point3<f64>;
}

/// A local east-north-up tangent plane anchored at a reference geodetic coordinate.
///
/// ```
/// use cv_geom::topocentric::{Georeferencer, Lla, TopocentricConverter};
///
/// let reference = Lla::new(52.519, 13.4, 30.0);
/// let converter = TopocentricConverter::new(reference);
/// let up = converter.to_topocentric(&Lla::new(52.519, 13.4, 40.0));
/// assert!((up.z - 10.0).abs() < 1e-6);
/// assert!(up.x.abs() < 1e-6 && up.y.abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TopocentricConverter {
    reference: Lla,
    origin: Point3<f64>,
    /// Rotates ECEF deltas into the east-north-up frame.
    rotation: Matrix3<f64>,
}

impl TopocentricConverter {
    pub fn new(reference: Lla) -> Self {
        let (sin_lat, cos_lat) = Float::sin_cos(reference.latitude.to_radians());
        let (sin_lon, cos_lon) = Float::sin_cos(reference.longitude.to_radians());
        #[rustfmt::skip]
        let rotation = Matrix3::new(
            -sin_lon,            cos_lon,            0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon,  cos_lat,
             cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat,
        );
        Self {
            reference,
            origin: reference.ecef(),
            rotation,
        }
    }

    pub fn reference(&self) -> Lla {
        self.reference
    }
}

impl Default for TopocentricConverter {
    fn default() -> Self {
        Self::new(Lla::new(0.0, 0.0, 0.0))
    }
}

impl Georeferencer for TopocentricConverter {
    fn to_topocentric(&self, lla: &Lla) -> Point3<f64> {
        let delta: Vector3<f64> = lla.ecef() - self.origin;
        Point3::from(self.rotation * delta)
    }
}
