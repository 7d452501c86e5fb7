//! # Rust CV Core
//!
//! This library provides common abstractions and types shared by the bundle adjustment crates.
//! This includes things like camera model traits, bearings, rig poses, and triangulation traits.
//! The crate is designed to be very small so that it adds negligable build time. The core concept
//! is that the geometry, camera, and bundle crates can work together by using the abstractions and
//! types specified in this crate.
//!
//! The crate is designed to work with `#![no_std]`, even without an allocator. `libm` is used
//! (through `nalgebra`) for all math algorithms that aren't present in `core`.
//!
//! ## Rigs
//!
//! A camera is never posed directly. Cameras which are captured together at the same instant
//! are grouped into a rig instance, which has a single pose in the world ([`WorldToRig`]).
//! Every camera mounted on the rig has a fixed offset from the rig ([`RigToCamera`]).
//! The pose of an individual image is the composition of the two:
//!
//! ```text
//!   world --WorldToRig--> rig --RigToCamera--> camera
//! ```
//!
//! See [`WorldToCamera::from_rig`].
//!
//! ## Triangulation
//!
//! Traits such as [`TriangulatorBearings`] perform a process called
//! [triangulation](https://en.wikipedia.org/wiki/Triangulation). We have rays protruding from the
//! optical center of each camera in world coordinates, each approximately pointing towards a 3d point.
//! Due to noise, the rays will not actually intersect, which is why several different triangulation
//! algorithms exist.
//!
//! - `p` the point we are trying to triangulate
//! - `a` the normalized keypoint on camera A
//! - `b` the normalized keypoint on camera B
//! - `O` the optical center of a camera
//! - `@` the virtual image plane
//!
//! ```text
//!                        @
//!                        @
//!               p--------b--------O
//!              /         @
//!             /          @
//!            /           @
//!           /            @
//!   @@@@@@@a@@@@@
//!         /
//!        /
//!       /
//!      O
//! ```

#![no_std]

mod camera;
mod pose;
mod triangulation;

pub use camera::*;
pub use nalgebra;
pub use pose::*;
pub use triangulation::*;
