//! This crate seamlessly plugs into `cv-core` and provides pinhole camera models with and without distortion correction.
//! It can be used to convert normalized image coordinates into real 3d direction vectors (called bearings) pointing
//! towards where the light came from that hit that pixel. It can also be used to convert backwards from the 3d back
//! to the 2d using the `uncalibrate` method from the [`cv_core::CameraModel`] trait.
//!
//! Every intrinsic value of a [`Camera`] is addressable by a [`CameraParameter`] so that values refined by an
//! optimizer can be copied back one parameter at a time.

#![no_std]

mod camera;

pub use camera::*;
