#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Time spent in each phase of a bundle adjustment, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WallTimes {
    pub setup: f64,
    pub run: f64,
    pub teardown: f64,
}

/// A summary of a bundle adjustment.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BundleReport {
    /// The summary produced by the optimizer.
    pub brief_report: String,
    pub wall_times: WallTimes,
    pub num_images: usize,
    pub num_interior_images: usize,
    pub num_boundary_images: usize,
    /// Shots which were neither interior nor boundary, but were added through their rig instance.
    pub num_other_images: usize,
    pub num_points: usize,
    pub num_reprojections: usize,
}
