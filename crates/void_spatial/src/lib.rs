//! # void_spatial - Rotation Math
//!
//! Single-precision quaternions with the vector, matrix and axis-angle types
//! they convert between. Quaternion composition uses post-multiplication,
//! matching the column-major matrices: in `a * b`, `b` is applied first.
//!
//! Every quaternion operation is available as a pure by-value method and as
//! an in-place `*_mut` twin that returns `&mut Self` for chaining.

pub mod axis_angle;
pub mod config;
pub mod error;
pub mod matrix;
pub mod quaternion;
pub mod scalar;
pub mod vector;

pub use axis_angle::*;
pub use config::*;
pub use error::*;
pub use matrix::*;
pub use quaternion::*;
pub use scalar::{clamp, cos_from_sin, degrees, lerp, radians};
pub use vector::*;

pub use scalar::consts;

pub mod prelude {
    pub use crate::axis_angle::AxisAngle;
    pub use crate::config::FormatConfig;
    pub use crate::error::{Result, SpatialError};
    pub use crate::matrix::{Mat3, Mat4, Mat4x3};
    pub use crate::quaternion::Quat;
    pub use crate::vector::{Vec2, Vec3, Vec3d, Vec4};
    pub use crate::{clamp, degrees, lerp, radians};
}
