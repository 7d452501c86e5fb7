use crate::{IntrinsicsPriorSd, LossFunctionKind};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// How a reconstruction is anchored to GPS and ground control measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
pub enum AlignMethod {
    /// Choose between [`AlignMethod::Naive`] and [`AlignMethod::OrientationPrior`] from the measurements.
    Auto,
    /// Anchor position, orientation and scale on matched coordinates.
    Naive,
    /// The measurements are degenerate, so only constrain the up direction.
    OrientationPrior,
}

/// The orientation of cameras assumed by [`AlignMethod::OrientationPrior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
pub enum OrientationPrior {
    /// Cameras look down, such as an aerial survey.
    Vertical,
    /// Cameras look towards the horizon with no roll.
    Horizontal,
    /// Cameras have no roll, but the pitch is unconstrained.
    NoRoll,
}

/// The settings for building and solving bundle adjustment problems.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BundleSettings {
    /// The number of co-visibility hops used to grow the interior of a local bundle.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_local_bundle_radius")
    )]
    pub local_bundle_radius: usize,
    /// The minimum number of landmarks a shot must share with the interior to be added to it.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_local_bundle_min_common_points")
    )]
    pub local_bundle_min_common_points: usize,
    /// The maximum number of shots in the interior of a local bundle.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_local_bundle_max_shots")
    )]
    pub local_bundle_max_shots: usize,
    /// Use analytic rather than automatic derivatives in the optimizer.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_bundle_analytic_derivatives")
    )]
    pub bundle_analytic_derivatives: bool,
    /// Add GPS position priors to rig instances.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_bundle_use_gps")
    )]
    pub bundle_use_gps: bool,
    /// Add ground control points to the problem.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_bundle_use_gcp")
    )]
    pub bundle_use_gcp: bool,
    /// Estimate a per-camera GPS bias in the full bundle.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_bundle_compensate_gps_bias")
    )]
    pub bundle_compensate_gps_bias: bool,
    /// The robust loss applied to reprojection residuals.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_loss_function")
    )]
    pub loss_function: LossFunctionKind,
    /// The scale of the robust loss.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_loss_function_threshold")
    )]
    pub loss_function_threshold: f64,
    /// The standard deviation of the focal length prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_exif_focal_sd")
    )]
    pub exif_focal_sd: f64,
    /// The standard deviation of the principal point prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_principal_point_sd")
    )]
    pub principal_point_sd: f64,
    /// The standard deviation of the k1 radial distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_radial_distortion_k1_sd")
    )]
    pub radial_distortion_k1_sd: f64,
    /// The standard deviation of the k2 radial distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_radial_distortion_k2_sd")
    )]
    pub radial_distortion_k2_sd: f64,
    /// The standard deviation of the p1 tangential distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_tangential_distortion_p1_sd")
    )]
    pub tangential_distortion_p1_sd: f64,
    /// The standard deviation of the p2 tangential distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_tangential_distortion_p2_sd")
    )]
    pub tangential_distortion_p2_sd: f64,
    /// The standard deviation of the k3 radial distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_radial_distortion_k3_sd")
    )]
    pub radial_distortion_k3_sd: f64,
    /// The standard deviation of the k4 radial distortion prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_radial_distortion_k4_sd")
    )]
    pub radial_distortion_k4_sd: f64,
    /// The standard deviation of the rig camera translation prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_rig_translation_sd")
    )]
    pub rig_translation_sd: f64,
    /// The standard deviation of the rig camera rotation prior.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_rig_rotation_sd")
    )]
    pub rig_rotation_sd: f64,
    /// The number of threads the optimizer may use.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_processes")
    )]
    pub processes: usize,
    /// The maximum iterations of the full bundle.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_bundle_max_iterations")
    )]
    pub bundle_max_iterations: usize,
    /// Refine camera intrinsics in the full bundle.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_optimize_camera_parameters")
    )]
    pub optimize_camera_parameters: bool,
    /// How the reconstruction is anchored to absolute measurements.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_align_method")
    )]
    pub align_method: AlignMethod,
    /// The orientation assumed when an orientation prior is used.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_align_orientation_prior")
    )]
    pub align_orientation_prior: OrientationPrior,
    /// The weight of all ground control points relative to the rest of the problem.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_gcp_global_weight")
    )]
    pub gcp_global_weight: f64,
    /// The horizontal standard deviation of ground control point positions.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_gcp_horizontal_sd")
    )]
    pub gcp_horizontal_sd: f64,
    /// The vertical standard deviation of ground control point positions.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_gcp_vertical_sd")
    )]
    pub gcp_vertical_sd: f64,
}

impl BundleSettings {
    /// Gathers the intrinsic prior standard deviations in the form handed to the optimizer.
    pub fn intrinsics_prior_sd(&self) -> IntrinsicsPriorSd {
        IntrinsicsPriorSd {
            focal: self.exif_focal_sd,
            principal_point: self.principal_point_sd,
            k1: self.radial_distortion_k1_sd,
            k2: self.radial_distortion_k2_sd,
            p1: self.tangential_distortion_p1_sd,
            p2: self.tangential_distortion_p2_sd,
            k3: self.radial_distortion_k3_sd,
            k4: self.radial_distortion_k4_sd,
        }
    }
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            local_bundle_radius: default_local_bundle_radius(),
            local_bundle_min_common_points: default_local_bundle_min_common_points(),
            local_bundle_max_shots: default_local_bundle_max_shots(),
            bundle_analytic_derivatives: default_bundle_analytic_derivatives(),
            bundle_use_gps: default_bundle_use_gps(),
            bundle_use_gcp: default_bundle_use_gcp(),
            bundle_compensate_gps_bias: default_bundle_compensate_gps_bias(),
            loss_function: default_loss_function(),
            loss_function_threshold: default_loss_function_threshold(),
            exif_focal_sd: default_exif_focal_sd(),
            principal_point_sd: default_principal_point_sd(),
            radial_distortion_k1_sd: default_radial_distortion_k1_sd(),
            radial_distortion_k2_sd: default_radial_distortion_k2_sd(),
            tangential_distortion_p1_sd: default_tangential_distortion_p1_sd(),
            tangential_distortion_p2_sd: default_tangential_distortion_p2_sd(),
            radial_distortion_k3_sd: default_radial_distortion_k3_sd(),
            radial_distortion_k4_sd: default_radial_distortion_k4_sd(),
            rig_translation_sd: default_rig_translation_sd(),
            rig_rotation_sd: default_rig_rotation_sd(),
            processes: default_processes(),
            bundle_max_iterations: default_bundle_max_iterations(),
            optimize_camera_parameters: default_optimize_camera_parameters(),
            align_method: default_align_method(),
            align_orientation_prior: default_align_orientation_prior(),
            gcp_global_weight: default_gcp_global_weight(),
            gcp_horizontal_sd: default_gcp_horizontal_sd(),
            gcp_vertical_sd: default_gcp_vertical_sd(),
        }
    }
}

fn default_local_bundle_radius() -> usize {
    3
}

fn default_local_bundle_min_common_points() -> usize {
    20
}

fn default_local_bundle_max_shots() -> usize {
    30
}

fn default_bundle_analytic_derivatives() -> bool {
    true
}

fn default_bundle_use_gps() -> bool {
    true
}

fn default_bundle_use_gcp() -> bool {
    false
}

fn default_bundle_compensate_gps_bias() -> bool {
    false
}

fn default_loss_function() -> LossFunctionKind {
    LossFunctionKind::SoftLOne
}

fn default_loss_function_threshold() -> f64 {
    1.0
}

fn default_exif_focal_sd() -> f64 {
    0.01
}

fn default_principal_point_sd() -> f64 {
    0.01
}

fn default_radial_distortion_k1_sd() -> f64 {
    0.01
}

fn default_radial_distortion_k2_sd() -> f64 {
    0.01
}

fn default_tangential_distortion_p1_sd() -> f64 {
    0.01
}

fn default_tangential_distortion_p2_sd() -> f64 {
    0.01
}

fn default_radial_distortion_k3_sd() -> f64 {
    0.01
}

fn default_radial_distortion_k4_sd() -> f64 {
    0.01
}

fn default_rig_translation_sd() -> f64 {
    0.1
}

fn default_rig_rotation_sd() -> f64 {
    0.1
}

fn default_processes() -> usize {
    1
}

fn default_bundle_max_iterations() -> usize {
    100
}

fn default_optimize_camera_parameters() -> bool {
    true
}

fn default_align_method() -> AlignMethod {
    AlignMethod::Auto
}

fn default_align_orientation_prior() -> OrientationPrior {
    OrientationPrior::Horizontal
}

fn default_gcp_global_weight() -> f64 {
    0.01
}

fn default_gcp_horizontal_sd() -> f64 {
    0.01
}

fn default_gcp_vertical_sd() -> f64 {
    0.1
}
