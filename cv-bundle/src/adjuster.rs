use cv_core::nalgebra::{Point2, Point3, Vector2, Vector3};
use cv_core::{RigToCamera, Similarity, WorldToRig};
use cv_pinhole::Camera;
use std::collections::BTreeMap;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Every rig instance position prior is placed in this scale group.
///
/// The optimizer supports estimating one scale per group of GPS measurements, but only a
/// single group is ever used.
pub const GPS_SCALE_GROUP: &str = "dummy";

/// The robust loss applied to reprojection residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum LossFunctionKind {
    #[cfg_attr(feature = "serde-serialize", serde(rename = "TrivialLoss"))]
    Trivial,
    #[cfg_attr(feature = "serde-serialize", serde(rename = "HuberLoss"))]
    Huber,
    #[cfg_attr(feature = "serde-serialize", serde(rename = "SoftLOneLoss"))]
    SoftLOne,
    #[cfg_attr(feature = "serde-serialize", serde(rename = "CauchyLoss"))]
    Cauchy,
    #[cfg_attr(feature = "serde-serialize", serde(rename = "ArctanLoss"))]
    Arctan,
}

/// The linear solver used by the optimizer for each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum LinearSolverType {
    /// Schur complement with dense reduced camera system, for small problems.
    DenseSchur,
    /// Dense QR factorization, for problems with very few parameters.
    DenseQr,
    /// Schur complement with sparse reduced camera system, for large problems.
    SparseSchur,
}

/// Standard deviations of the priors on each intrinsic camera parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IntrinsicsPriorSd {
    pub focal: f64,
    pub principal_point: f64,
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
    pub k4: f64,
}

/// The converged state of a point parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergedPoint {
    pub position: Point3<f64>,
    /// Residual of each projection of the point, keyed by shot id.
    pub reprojection_errors: BTreeMap<String, Vector2<f64>>,
}

/// A nonlinear least squares solver for bundle adjustment problems.
///
/// An implementor receives parameter blocks (cameras, biases, rig cameras, rig instances, and points)
/// and residual blocks (reprojections, priors, and up vector constraints) identified by string ids.
/// After [`BundleAdjuster::run`] the converged value of every parameter block can be read back.
///
/// A fresh adjuster is expected for each problem.
pub trait BundleAdjuster {
    /// Adds the intrinsics of a camera, regularized towards `prior`.
    fn add_camera(&mut self, id: &str, camera: &Camera, prior: &Camera, fixed: bool);

    /// Adds the GPS bias of a camera as a free parameter.
    fn set_camera_bias(&mut self, camera_id: &str, bias: &Similarity);

    fn add_rig_camera(&mut self, id: &str, pose: RigToCamera, prior: RigToCamera, fixed: bool);

    /// Adds a rig instance along with the camera and rig camera of each of its shots.
    fn add_rig_instance(
        &mut self,
        id: &str,
        pose: WorldToRig,
        shot_cameras: &BTreeMap<String, String>,
        shot_rig_cameras: &BTreeMap<String, String>,
        fixed: bool,
    );

    fn add_rig_instance_position_prior(
        &mut self,
        instance_id: &str,
        position: Point3<f64>,
        std_deviation: Vector3<f64>,
        scale_group: &str,
    );

    fn add_point(&mut self, id: &str, position: Point3<f64>, fixed: bool);

    /// Adds a prior on the absolute position of a point. When `has_altitude` is false the
    /// vertical component is left unconstrained.
    fn add_point_prior(
        &mut self,
        id: &str,
        position: Point3<f64>,
        std_deviation: Vector3<f64>,
        has_altitude: bool,
    );

    fn add_point_projection_observation(
        &mut self,
        shot_id: &str,
        point_id: &str,
        observation: Point2<f64>,
        std_deviation: f64,
        depth_prior: Option<f64>,
    );

    fn add_absolute_up_vector(&mut self, shot_id: &str, up: Vector3<f64>, std_deviation: f64);

    fn set_point_projection_loss_function(&mut self, kind: LossFunctionKind, threshold: f64);
    fn set_internal_parameters_prior_sd(&mut self, sd: &IntrinsicsPriorSd);
    fn set_rig_parameters_prior_sd(&mut self, translation_sd: f64, rotation_sd: f64);
    fn set_num_threads(&mut self, threads: usize);
    fn set_max_num_iterations(&mut self, iterations: usize);
    fn set_linear_solver_type(&mut self, solver: LinearSolverType);
    fn set_use_analytic_derivatives(&mut self, analytic: bool);

    /// Solves the problem. This blocks until convergence or until the iteration cap is reached.
    fn run(&mut self);

    fn rig_instance_count(&self) -> usize;
    fn projection_count(&self) -> usize;
    fn relative_motion_count(&self) -> usize;

    fn camera(&self, id: &str) -> Option<Camera>;
    fn bias(&self, camera_id: &str) -> Option<Similarity>;
    fn rig_instance(&self, id: &str) -> Option<WorldToRig>;
    fn rig_camera(&self, id: &str) -> Option<RigToCamera>;
    fn point(&self, id: &str) -> Option<ConvergedPoint>;

    /// A one line summary of the solve.
    fn brief_report(&self) -> String;
}
