//! This crate contains computational geometry algorithms for [Rust CV](https://github.com/rust-cv/).
//!
//! ## Triangulation
//!
//! In this problem we know the optical center of several cameras in world coordinates and the bearing
//! of the same feature observed in each camera frame, already rotated into the world frame. We want
//! to find the point of intersection from all cameras.
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
//!
//! ## Topocentric coordinates
//!
//! Surveyed points and GPS fixes arrive as geodetic latitude, longitude, and altitude. Before they can be
//! compared with a reconstruction they are converted into a local east-north-up frame anchored at a
//! reference coordinate, see [`topocentric::TopocentricConverter`].

#![no_std]

pub mod topocentric;
pub mod triangulation;
