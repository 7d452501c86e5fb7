//! # Rust CV Bundle
//!
//! This crate builds rig-aware bundle adjustment problems out of a [`Scene`] and writes the
//! optimized values back into it. The nonlinear solver itself is not part of this crate. Anything
//! that implements [`BundleAdjuster`] can be used to solve the problems built here.
//!
//! There are three kinds of problems:
//!
//! - [`bundle_local`] adjusts the neighborhood of a shot, as found by [`shot_neighborhood`]
//! - [`bundle_shot_poses`] adjusts only the poses of a set of shots
//! - [`bundle`] adjusts the whole scene
//!
//! Each of them returns a [`BundleReport`].
//!
//! ## Rigs
//!
//! Shots are never posed directly. A shot is taken by a rig camera mounted on a rig instance,
//! and the rig instance is what gets optimized. If any shot of a rig instance may not be moved
//! by a problem, then the whole instance is fixed.
//!
//! ## Ground control points
//!
//! Surveyed [`GroundControlPoint`]s are added to a problem with a weight that keeps their
//! overall influence constant no matter how many there are. See [`add_gcp_to_bundle`].

mod adjuster;
pub mod alignment;
mod bundle;
pub mod commit;
mod error;
pub mod gcp;
pub mod neighborhood;
mod report;
mod scene;
mod settings;

pub use adjuster::*;
pub use alignment::{alignment_constraints, detect_alignment_constraints, is_line};
pub use bundle::*;
pub use commit::{bundle_to_scene, commit_points, commit_rig_instances};
pub use error::*;
pub use gcp::{add_gcp_to_bundle, GcpObservation, GroundControlPoint};
pub use neighborhood::{shot_neighborhood, shot_neighborhood_ids, Neighborhood};
pub use report::*;
pub use scene::*;
pub use settings::*;
