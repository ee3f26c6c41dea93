//! Rotation-capable matrix types
//!
//! All matrices are column-major: `cols[i]` is column `i`, so element
//! `mIJ` (column I, row J) is `cols[I].<J>`. This is the layout the
//! quaternion conversions are written against.

use core::ops::Mul;

use crate::error::{Result, SpatialError};
use crate::quaternion::Quat;
use crate::vector::{Vec3, Vec4};

/// 3x3 matrix (column-major)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Mat3 {
    pub cols: [Vec3; 3],
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula)
    ///
    /// The axis is normalized first.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let axis = axis.normalize();
        let t = 1.0 - cos;
        let (x, y, z) = (axis.x, axis.y, axis.z);

        Self::from_cols(
            Vec3::new(t * x * x + cos, t * x * y + sin * z, t * x * z - sin * y),
            Vec3::new(t * x * y - sin * z, t * y * y + cos, t * y * z + sin * x),
            Vec3::new(t * x * z + sin * y, t * y * z - sin * x, t * z * z + cos),
        )
    }

    /// Rotation (and uniform scale, for non-unit input) represented by `q`
    pub fn from_quat(q: Quat) -> Self {
        let w2 = q.w * q.w;
        let x2 = q.x * q.x;
        let y2 = q.y * q.y;
        let z2 = q.z * q.z;
        let zw = q.z * q.w;
        let xy = q.x * q.y;
        let xz = q.x * q.z;
        let yw = q.y * q.w;
        let yz = q.y * q.z;
        let xw = q.x * q.w;

        Self::from_cols(
            Vec3::new(w2 + x2 - z2 - y2, xy + zw + zw + xy, xz - yw + xz - yw),
            Vec3::new(-zw + xy - zw + xy, y2 - z2 + w2 - x2, yz + yz + xw + xw),
            Vec3::new(yw + xz + xz + yw, yz + yz - xw - xw, z2 - y2 - x2 + w2),
        )
    }

    /// Element at `column`, `row`
    pub fn element(&self, column: usize, row: usize) -> Result<f32> {
        if column >= 3 || row >= 3 {
            return Err(SpatialError::ElementOutOfRange { column, row, columns: 3, rows: 3 });
        }
        self.cols[column].get(row)
    }

    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
            Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
            Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
        )
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.cols[0].x * (self.cols[1].y * self.cols[2].z - self.cols[2].y * self.cols[1].z)
            - self.cols[1].x * (self.cols[0].y * self.cols[2].z - self.cols[2].y * self.cols[0].z)
            + self.cols[2].x * (self.cols[0].y * self.cols[1].z - self.cols[1].y * self.cols[0].z)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols(
            self.cols[0].extend(0.0),
            self.cols[1].extend(0.0),
            self.cols[2].extend(0.0),
            Vec4::W,
        )
    }

    pub fn to_mat4x3(&self) -> Mat4x3 {
        Mat4x3::from_cols(self.cols[0], self.cols[1], self.cols[2], Vec3::ZERO)
    }

    /// Column-major flat array
    pub fn to_cols_array(&self) -> [f32; 9] {
        [
            self.cols[0].x, self.cols[0].y, self.cols[0].z,
            self.cols[1].x, self.cols[1].y, self.cols[1].z,
            self.cols[2].x, self.cols[2].y, self.cols[2].z,
        ]
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z
    }
}

impl Mul for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_cols(self * rhs.cols[0], self * rhs.cols[1], self * rhs.cols[2])
    }
}

/// Affine 4x3 matrix: four columns of three rows, the last column holding
/// the translation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Mat4x3 {
    pub cols: [Vec3; 4],
}

impl Mat4x3 {
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ZERO],
    };

    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3, c3: Vec3) -> Self {
        Self { cols: [c0, c1, c2, c3] }
    }

    pub fn from_quat(q: Quat) -> Self {
        Mat3::from_quat(q).to_mat4x3()
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let mut m = Self::from_quat(rotation);
        m.cols[3] = translation;
        m
    }

    /// The upper-left 3x3 block
    #[inline]
    pub fn mat3(&self) -> Mat3 {
        Mat3::from_cols(self.cols[0], self.cols[1], self.cols[2])
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3]
    }

    /// Element at `column`, `row`
    pub fn element(&self, column: usize, row: usize) -> Result<f32> {
        if column >= 4 || row >= 3 {
            return Err(SpatialError::ElementOutOfRange { column, row, columns: 4, rows: 3 });
        }
        self.cols[column].get(row)
    }

    /// Transform a point (translation applied)
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.mat3() * point + self.cols[3]
    }

    /// Transform a direction (translation ignored)
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.mat3() * vector
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols(
            self.cols[0].extend(0.0),
            self.cols[1].extend(0.0),
            self.cols[2].extend(0.0),
            self.cols[3].extend(1.0),
        )
    }
}

impl Default for Mat4x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 4x4 matrix (column-major)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C, align(16))]
pub struct Mat4 {
    pub cols: [Vec4; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self { cols: [c0, c1, c2, c3] }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, translation.extend(1.0))
    }

    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        Mat3::from_axis_angle(axis, angle).to_mat4()
    }

    pub fn from_quat(q: Quat) -> Self {
        Mat3::from_quat(q).to_mat4()
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let mut m = Self::from_quat(rotation);
        m.cols[3] = translation.extend(1.0);
        m
    }

    /// The upper-left 3x3 block
    #[inline]
    pub fn mat3(&self) -> Mat3 {
        Mat3::from_cols(self.cols[0].xyz(), self.cols[1].xyz(), self.cols[2].xyz())
    }

    /// Element at `column`, `row`
    pub fn element(&self, column: usize, row: usize) -> Result<f32> {
        if column >= 4 || row >= 4 {
            return Err(SpatialError::ElementOutOfRange { column, row, columns: 4, rows: 4 });
        }
        self.cols[column].get(row)
    }

    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let v = *self * point.extend(1.0);
        v.xyz() * (1.0 / v.w)
    }

    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        (*self * vector.extend(0.0)).xyz()
    }

    /// Column-major flat array
    pub fn to_cols_array(&self) -> [f32; 16] {
        [
            self.cols[0].x, self.cols[0].y, self.cols[0].z, self.cols[0].w,
            self.cols[1].x, self.cols[1].y, self.cols[1].z, self.cols[1].w,
            self.cols[2].x, self.cols[2].y, self.cols[2].z, self.cols[2].w,
            self.cols[3].x, self.cols[3].y, self.cols[3].z, self.cols[3].w,
        ]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}
