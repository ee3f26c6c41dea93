//! Quaternion algebra for 3D rotations
//!
//! [`Quat`] is a plain value type. Every operation comes in two shapes: a
//! by-value method returning the result, and a `*_mut` twin that writes the
//! result back into `self` and returns `&mut Self` for chaining. The pure
//! result is fully computed before `self` is overwritten, so the in-place
//! forms are always alias-safe.
//!
//! Composition follows the post-multiplication convention of the matrix
//! types: `a.mul(b)` is `a * b`, so a vector transformed by the product is
//! rotated by `b` first, then by `a`. Rotations about world axes
//! (`rotate_x`, `rotate_axis`, ...) are appended on the right; rotations
//! about the local axes (`rotate_local_x`, ...) are prepended on the left.
//!
//! No unit-length invariant is enforced. Most operations assume a unit
//! quaternion; call [`Quat::normalize`] when drift matters.

use core::fmt;
use core::ops::{Add, Div, Mul, MulAssign, Neg};

use crate::axis_angle::AxisAngle;
use crate::config::FormatConfig;
use crate::error::{Result, SpatialError};
use crate::matrix::{Mat3, Mat4, Mat4x3};
use crate::scalar::{self, cos_from_sin, inv_sqrt};
use crate::vector::{Vec3, Vec3d, Vec4};

/// Below this distance from `|cos| = 1`, slerp blends linearly
const SLERP_EPSILON: f32 = 1e-6;

/// Fourth-order term bound for the small-angle Taylor branch
const TAYLOR_EPSILON: f64 = 1e-8;

/// `sin(angle / 2)` below which the rotation axis is left unnormalized
const AXIS_EPSILON: f32 = 0.001;

/// Quaternion `w + xi + yj + zk`, four `f32` laid out as x, y, z, w
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C, align(16))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Branch selection when the trace of a rotation basis is negative
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TieBreak {
    /// `m00 >= m11 && m00 >= m22` selects the x branch (matrix conversions)
    Inclusive,
    /// `m00 > m11 && m00 > m22` selects the x branch (look-along basis)
    Strict,
}

/// Quaternion from an orthonormal basis given as `m[column][row]`
fn quat_from_basis(m: [[f64; 3]; 3], tie_break: TieBreak) -> Quat {
    let [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]] = m;
    let x_first = match tie_break {
        TieBreak::Inclusive => m00 >= m11 && m00 >= m22,
        TieBreak::Strict => m00 > m11 && m00 > m22,
    };

    let trace = m00 + m11 + m22;
    let (x, y, z, w) = if trace >= 0.0 {
        let t = (trace + 1.0).sqrt();
        let w = t * 0.5;
        let t = 0.5 / t;
        ((m12 - m21) * t, (m20 - m02) * t, (m01 - m10) * t, w)
    } else if x_first {
        let t = (m00 - (m11 + m22) + 1.0).sqrt();
        let x = t * 0.5;
        let t = 0.5 / t;
        (x, (m10 + m01) * t, (m02 + m20) * t, (m12 - m21) * t)
    } else if m11 > m22 {
        let t = (m11 - (m22 + m00) + 1.0).sqrt();
        let y = t * 0.5;
        let t = 0.5 / t;
        ((m10 + m01) * t, y, (m21 + m12) * t, (m20 - m02) * t)
    } else {
        let t = (m22 - (m00 + m11) + 1.0).sqrt();
        let z = t * 0.5;
        let t = 0.5 / t;
        ((m02 + m20) * t, (m21 + m12) * t, z, (m01 - m10) * t)
    };

    Quat::new(x as f32, y as f32, z as f32, w as f32)
}

fn basis_from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> [[f64; 3]; 3] {
    [c0, c1, c2].map(|c| [c.x as f64, c.y as f64, c.z as f64])
}

/// `(dqx, dqy, dqz, dqw)` for the rotation vector `2 * theta`
fn rotation_vector_quat(theta: [f64; 3]) -> [f64; 4] {
    let [tx, ty, tz] = theta;
    let mag_sq = tx * tx + ty * ty + tz * tz;
    let (s, w) = if mag_sq * mag_sq / 24.0 < TAYLOR_EPSILON {
        (1.0 - mag_sq / 6.0, 1.0 - mag_sq / 2.0)
    } else {
        let mag = mag_sq.sqrt();
        let sin = mag.sin();
        (sin / mag, cos_from_sin(sin, mag))
    };
    [tx * s, ty * s, tz * s, w]
}

impl Quat {
    /// No rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Quaternion `w + xi + yj + zk`
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Components taken from `v` in x, y, z, w order
    #[inline]
    pub const fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }

    /// Rotation of `angle` radians about `axis`, which need not be unit length
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle / 2.0;
        let sin = (half as f64).sin();
        let inv_len = inv_sqrt(axis.length_squared());
        let s = sin as f32;
        Self::new(
            axis.x * inv_len * s,
            axis.y * inv_len * s,
            axis.z * inv_len * s,
            cos_from_sin(sin, half as f64) as f32,
        )
    }

    /// Rotation of `angle` radians about an axis that is already unit length
    pub fn from_unit_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// [`from_axis_angle`](Self::from_axis_angle) with the angle in degrees
    pub fn from_axis_angle_deg(axis: Vec3, degrees: f32) -> Self {
        Self::from_axis_angle(axis, scalar::radians(degrees))
    }

    /// Rotation about +X
    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(s, 0.0, 0.0, c)
    }

    /// Rotation about +Y
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(0.0, s, 0.0, c)
    }

    /// Rotation about +Z
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(0.0, 0.0, s, c)
    }

    /// Rotation of a matrix whose columns are already unit length
    pub fn from_normalized_mat3(m: &Mat3) -> Self {
        quat_from_basis(basis_from_cols(m.cols[0], m.cols[1], m.cols[2]), TieBreak::Inclusive)
    }

    /// Rotation of a matrix whose columns may carry scale
    pub fn from_unnormalized_mat3(m: &Mat3) -> Self {
        Self::from_scaled_cols(m.cols[0], m.cols[1], m.cols[2])
    }

    /// Rotation of the upper-left 3x3 block, columns already unit length
    pub fn from_normalized_mat4(m: &Mat4) -> Self {
        Self::from_normalized_mat3(&m.mat3())
    }

    /// Rotation of the upper-left 3x3 block, columns may carry scale
    pub fn from_unnormalized_mat4(m: &Mat4) -> Self {
        Self::from_unnormalized_mat3(&m.mat3())
    }

    /// Rotation of the linear part, columns already unit length
    pub fn from_normalized_mat4x3(m: &Mat4x3) -> Self {
        Self::from_normalized_mat3(&m.mat3())
    }

    /// Rotation of the linear part, columns may carry scale
    pub fn from_unnormalized_mat4x3(m: &Mat4x3) -> Self {
        Self::from_unnormalized_mat3(&m.mat3())
    }

    fn from_scaled_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        let c0 = c0 * inv_sqrt(c0.length_squared());
        let c1 = c1 * inv_sqrt(c1.length_squared());
        let c2 = c2 * inv_sqrt(c2.length_squared());
        quat_from_basis(basis_from_cols(c0, c1, c2), TieBreak::Inclusive)
    }

    /// Euler angles in the XYZ sequence
    ///
    /// Equivalent to `IDENTITY.rotate_x(ax).rotate_y(ay).rotate_z(az)`.
    pub fn from_euler_xyz(angle_x: f32, angle_y: f32, angle_z: f32) -> Self {
        let (sx, cx) = scalar::sin_cos(angle_x * 0.5);
        let (sy, cy) = scalar::sin_cos(angle_y * 0.5);
        let (sz, cz) = scalar::sin_cos(angle_z * 0.5);

        let cycz = cy * cz;
        let sysz = sy * sz;
        let sycz = sy * cz;
        let cysz = cy * sz;
        Self::new(
            sx * cycz + cx * sysz,
            cx * sycz - sx * cysz,
            cx * cysz + sx * sycz,
            cx * cycz - sx * sysz,
        )
    }

    /// Equivalent to `IDENTITY.rotate_z(az).rotate_y(ay).rotate_x(ax)`
    pub fn from_euler_zyx(angle_z: f32, angle_y: f32, angle_x: f32) -> Self {
        let (sx, cx) = scalar::sin_cos(angle_x * 0.5);
        let (sy, cy) = scalar::sin_cos(angle_y * 0.5);
        let (sz, cz) = scalar::sin_cos(angle_z * 0.5);

        let cycz = cy * cz;
        let sysz = sy * sz;
        let sycz = sy * cz;
        let cysz = cy * sz;
        Self::new(
            sx * cycz - cx * sysz,
            cx * sycz + sx * cysz,
            cx * cysz - sx * sycz,
            cx * cycz + sx * sysz,
        )
    }

    /// Equivalent to `IDENTITY.rotate_y(ay).rotate_x(ax).rotate_z(az)`
    /// (yaw, pitch, roll for a Y-up camera)
    pub fn from_euler_yxz(angle_y: f32, angle_x: f32, angle_z: f32) -> Self {
        let (sx, cx) = scalar::sin_cos(angle_x * 0.5);
        let (sy, cy) = scalar::sin_cos(angle_y * 0.5);
        let (sz, cz) = scalar::sin_cos(angle_z * 0.5);

        let yx = cy * sx;
        let yy = sy * cx;
        let yz = sy * sx;
        let yw = cy * cx;
        Self::new(
            yx * cz + yy * sz,
            yy * cz - yx * sz,
            yw * sz - yz * cz,
            yw * cz + yz * sz,
        )
    }

    /// Rotation about `angles` by `|angles|` radians
    pub fn from_rotation_vector(angles: Vec3) -> Self {
        let [x, y, z, w] = rotation_vector_quat([
            angles.x as f64 * 0.5,
            angles.y as f64 * 0.5,
            angles.z as f64 * 0.5,
        ]);
        Self::new(x as f32, y as f32, z as f32, w as f32)
    }

    /// Pure scaling: transformed vectors have their length multiplied by `factor`
    pub fn from_scale(factor: f32) -> Self {
        Self::new(0.0, 0.0, 0.0, (factor as f64).sqrt() as f32)
    }

    /// Shortest-arc rotation taking direction `from` onto direction `to`
    ///
    /// Neither vector needs to be unit length. For antiparallel input the
    /// axis falls back to `to × +Z`, then `to × +X`.
    pub fn from_rotation_to(from: Vec3, to: Vec3) -> Self {
        let axis = from.cross(to);
        let w = ((from.length_squared() * to.length_squared()) as f64).sqrt() as f32 + from.dot(to);
        let q = Self::new(axis.x, axis.y, axis.z, w);
        let inv_norm = inv_sqrt(q.length_squared());
        if !inv_norm.is_infinite() {
            return q.scale_components(inv_norm);
        }

        log::trace!("Antiparallel directions {} and {}, using fallback axis", from, to);
        let q = Self::new(to.y, -to.x, 0.0, 0.0);
        let inv_norm = inv_sqrt(q.x * q.x + q.y * q.y);
        if !inv_norm.is_infinite() {
            return q.scale_components(inv_norm);
        }
        let q = Self::new(0.0, to.z, -to.y, 0.0);
        q.scale_components(inv_sqrt(q.y * q.y + q.z * q.z))
    }

    /// View rotation mapping `dir` onto -Z with `up` in the YZ plane
    pub fn from_look_along(dir: Vec3, up: Vec3) -> Self {
        Self::IDENTITY.look_along(dir, up)
    }

    /// Yaw about +Z then pitch about +Y so that +X points along `direction`
    pub fn from_look_at(direction: Vec3) -> Self {
        let yaw = direction.xy().angle();
        let pitch = -((direction.z as f64).atan2(direction.xy().length() as f64) as f32);
        Self::IDENTITY.rotate_z(yaw).rotate_y(pitch)
    }

    // Composition

    /// Hamilton product `self * q`; `q` is applied first
    #[allow(clippy::should_implement_trait)]
    #[inline]
    pub fn mul(self, q: Quat) -> Self {
        Self::new(
            self.w * q.x + self.x * q.w + self.y * q.z - self.z * q.y,
            self.w * q.y - self.x * q.z + self.y * q.w + self.z * q.x,
            self.w * q.z + self.x * q.y - self.y * q.x + self.z * q.w,
            self.w * q.w - self.x * q.x - self.y * q.y - self.z * q.z,
        )
    }

    /// Hamilton product `q * self`; `self` is applied first
    #[inline]
    pub fn premul(self, q: Quat) -> Self {
        q.mul(self)
    }

    /// Post-multiply by a delta computed in double precision
    fn mul_f64(self, [qx, qy, qz, qw]: [f64; 4]) -> Self {
        let (x, y, z, w) = (self.x as f64, self.y as f64, self.z as f64, self.w as f64);
        Self::new(
            (w * qx + x * qw + y * qz - z * qy) as f32,
            (w * qy - x * qz + y * qw + z * qx) as f32,
            (w * qz + x * qy - y * qx + z * qw) as f32,
            (w * qw - x * qx - y * qy - z * qz) as f32,
        )
    }

    /// `self * inverse(b)`
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, b: Quat) -> Self {
        self.mul(b.invert())
    }

    /// Rotate about world X; the new rotation is applied first
    pub fn rotate_x(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            self.w * s + self.x * c,
            self.y * c + self.z * s,
            self.z * c - self.y * s,
            self.w * c - self.x * s,
        )
    }

    /// Rotate about world Y; the new rotation is applied first
    pub fn rotate_y(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            self.x * c - self.z * s,
            self.w * s + self.y * c,
            self.x * s + self.z * c,
            self.w * c - self.y * s,
        )
    }

    /// Rotate about world Z; the new rotation is applied first
    pub fn rotate_z(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            self.x * c + self.y * s,
            self.y * c - self.x * s,
            self.w * s + self.z * c,
            self.w * c - self.z * s,
        )
    }

    /// Rotate about the local X axis; `self` is applied first
    pub fn rotate_local_x(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            c * self.x + s * self.w,
            c * self.y - s * self.z,
            c * self.z + s * self.y,
            c * self.w - s * self.x,
        )
    }

    /// Rotate about the local Y axis; `self` is applied first
    pub fn rotate_local_y(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            c * self.x + s * self.z,
            c * self.y + s * self.w,
            c * self.z - s * self.x,
            c * self.w - s * self.y,
        )
    }

    /// Rotate about the local Z axis; `self` is applied first
    pub fn rotate_local_z(self, angle: f32) -> Self {
        let (s, c) = scalar::sin_cos(angle * 0.5);
        Self::new(
            c * self.x - s * self.y,
            c * self.y + s * self.x,
            c * self.z + s * self.w,
            c * self.w - s * self.z,
        )
    }

    /// Append [`from_euler_xyz`](Self::from_euler_xyz)
    pub fn rotate_xyz(self, angle_x: f32, angle_y: f32, angle_z: f32) -> Self {
        self.mul(Self::from_euler_xyz(angle_x, angle_y, angle_z))
    }

    /// Append [`from_euler_zyx`](Self::from_euler_zyx)
    pub fn rotate_zyx(self, angle_z: f32, angle_y: f32, angle_x: f32) -> Self {
        self.mul(Self::from_euler_zyx(angle_z, angle_y, angle_x))
    }

    /// Append [`from_euler_yxz`](Self::from_euler_yxz)
    pub fn rotate_yxz(self, angle_y: f32, angle_x: f32, angle_z: f32) -> Self {
        self.mul(Self::from_euler_yxz(angle_y, angle_x, angle_z))
    }

    /// Rotate about an arbitrary (not necessarily unit) world axis
    pub fn rotate_axis(self, angle: f32, axis: Vec3) -> Self {
        let half = angle as f64 / 2.0;
        let sin = half.sin();
        let inv_len = 1.0 / (axis.length_squared() as f64).sqrt();
        let axis = axis.as_f64() * (inv_len * sin);
        self.mul_f64([axis.x, axis.y, axis.z, cos_from_sin(sin, half)])
    }

    /// Apply the rotation vector `angles` in world space
    pub fn rotate(self, angles: Vec3) -> Self {
        self.mul_f64(rotation_vector_quat([
            angles.x as f64 * 0.5,
            angles.y as f64 * 0.5,
            angles.z as f64 * 0.5,
        ]))
    }

    /// Apply the rotation vector `angles` about the local axes
    pub fn rotate_local(self, angles: Vec3) -> Self {
        let half = angles * 0.5;
        let mag_sq = half.length_squared();
        let (s, dw) = if mag_sq * mag_sq / 24.0 < TAYLOR_EPSILON as f32 {
            (1.0 - mag_sq / 6.0, 1.0 - mag_sq * 0.5)
        } else {
            let mag = (mag_sq as f64).sqrt() as f32;
            let sin = (mag as f64).sin();
            ((sin as f32) / mag, cos_from_sin(sin, mag as f64) as f32)
        };
        let d = half * s;
        Self::new(d.x, d.y, d.z, dw).mul(self)
    }

    /// Advance by angular velocity `omega` over `dt` seconds (local frame)
    pub fn integrate(self, dt: f32, omega: Vec3) -> Self {
        self.rotate_local(omega * dt)
    }

    /// Append the shortest-arc rotation from `from` to `to`
    pub fn rotate_to(self, from: Vec3, to: Vec3) -> Self {
        self.mul(Self::from_rotation_to(from, to))
    }

    /// Append the view rotation of [`from_look_along`](Self::from_look_along)
    pub fn look_along(self, dir: Vec3, up: Vec3) -> Self {
        let dirn = -dir * inv_sqrt(dir.length_squared());
        let left = up.cross(dirn);
        let left = left * inv_sqrt(left.length_squared());
        let upn = dirn.cross(left);

        // Rows of the view matrix are left, up and -dir
        let basis = [
            [left.x as f64, upn.x as f64, dirn.x as f64],
            [left.y as f64, upn.y as f64, dirn.y as f64],
            [left.z as f64, upn.z as f64, dirn.z as f64],
        ];
        self.mul(quat_from_basis(basis, TieBreak::Strict))
    }

    // Inversion

    /// Inverse of a unit quaternion
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// General inverse: conjugate divided by the squared norm
    ///
    /// A zero quaternion yields NaN components.
    pub fn invert(self) -> Self {
        let inv_norm = 1.0 / self.length_squared();
        Self::new(
            -self.x * inv_norm,
            -self.y * inv_norm,
            -self.z * inv_norm,
            self.w * inv_norm,
        )
    }

    /// Rotation taking `self` onto `other`: `inverse(self) * other`
    pub fn difference(self, other: Quat) -> Self {
        self.invert().mul(other)
    }

    /// Angle in radians of [`difference`](Self::difference)
    pub fn distance(self, other: Quat) -> f32 {
        self.difference(other).angle()
    }

    // Interpolation

    /// Spherical linear interpolation along the shorter arc
    pub fn slerp(self, target: Quat, alpha: f32) -> Self {
        let cosom = self.dot(target);
        let abs_cosom = cosom.abs();
        let (scale0, scale1) = if 1.0 - abs_cosom > SLERP_EPSILON {
            let sin_sqr = 1.0 - abs_cosom * abs_cosom;
            let sinom = inv_sqrt(sin_sqr) as f64;
            let omega = ((sin_sqr as f64) * sinom).atan2(abs_cosom as f64);
            (
                (((1.0 - alpha as f64) * omega).sin() * sinom) as f32,
                ((alpha as f64 * omega).sin() * sinom) as f32,
            )
        } else {
            (1.0 - alpha, alpha)
        };
        let scale1 = if cosom >= 0.0 { scale1 } else { -scale1 };
        self.blend(scale0, target, scale1)
    }

    /// Normalized linear interpolation along the shorter arc
    pub fn nlerp(self, q: Quat, factor: f32) -> Self {
        let scale1 = if self.dot(q) >= 0.0 { factor } else { -factor };
        self.blend(1.0 - factor, q, scale1).normalize()
    }

    /// Approximate slerp by bisecting the arc with nlerp steps
    ///
    /// Halves the arc until the endpoints' `|dot|` reaches `dot_threshold`,
    /// then blends linearly at the remaining fraction. Returns `self`
    /// unchanged when the inputs already coincide.
    pub fn nlerp_iterative(self, q: Quat, alpha: f32, dot_threshold: f32) -> Self {
        let mut q1 = self;
        let mut q2 = q;
        let mut dot = q1.dot(q2);
        let mut abs_dot = dot.abs();
        if 1.0 - SLERP_EPSILON < abs_dot {
            log::trace!("nlerp_iterative endpoints coincide (|dot| = {})", abs_dot);
            return self;
        }

        let mut alpha_n = alpha;
        while abs_dot < dot_threshold {
            let scale1 = if dot >= 0.0 { 0.5 } else { -0.5 };
            if alpha_n < 0.5 {
                q2 = q2.blend(0.5, q1, scale1).normalize();
                alpha_n += alpha_n;
            } else {
                q1 = q1.blend(0.5, q2, scale1).normalize();
                alpha_n = alpha_n + alpha_n - 1.0;
            }
            dot = q1.dot(q2);
            abs_dot = dot.abs();
        }

        let scale1 = if dot >= 0.0 { alpha_n } else { -alpha_n };
        q1.blend(1.0 - alpha_n, q2, scale1).normalize()
    }

    /// Weighted [`slerp`](Self::slerp) over a sequence, folded left to right
    pub fn slerp_weighted(qs: &[Quat], weights: &[f32]) -> Result<Self> {
        Self::fold_weighted(qs, weights, |acc, q, t| acc.slerp(q, t))
    }

    /// Weighted [`nlerp`](Self::nlerp) over a sequence, folded left to right
    pub fn nlerp_weighted(qs: &[Quat], weights: &[f32]) -> Result<Self> {
        Self::fold_weighted(qs, weights, |acc, q, t| acc.nlerp(q, t))
    }

    /// Weighted [`nlerp_iterative`](Self::nlerp_iterative) over a sequence
    pub fn nlerp_iterative_weighted(qs: &[Quat], weights: &[f32], dot_threshold: f32) -> Result<Self> {
        Self::fold_weighted(qs, weights, |acc, q, t| acc.nlerp_iterative(q, t, dot_threshold))
    }

    fn fold_weighted(
        qs: &[Quat],
        weights: &[f32],
        step: impl Fn(Quat, Quat, f32) -> Quat,
    ) -> Result<Self> {
        if qs.len() != weights.len() {
            log::debug!(
                "Rejecting weighted interpolation: {} quaternions, {} weights",
                qs.len(),
                weights.len()
            );
            return Err(SpatialError::WeightCountMismatch {
                quaternions: qs.len(),
                weights: weights.len(),
            });
        }
        let ((&first, rest), (&first_weight, rest_weights)) =
            match (qs.split_first(), weights.split_first()) {
                (Some(q), Some(w)) => (q, w),
                _ => {
                    log::debug!("Rejecting weighted interpolation over an empty sequence");
                    return Err(SpatialError::EmptySequence);
                }
            };

        let mut total = first_weight;
        let mut result = first;
        for (&q, &weight) in rest.iter().zip(rest_weights) {
            let relative = weight / (total + weight);
            total += weight;
            result = step(result, q, relative);
        }
        Ok(result)
    }

    #[inline]
    fn blend(self, scale0: f32, other: Quat, scale1: f32) -> Self {
        Self::new(
            scale0 * self.x + scale1 * other.x,
            scale0 * self.y + scale1 * other.y,
            scale0 * self.z + scale1 * other.z,
            scale0 * self.w + scale1 * other.w,
        )
    }

    // Vector transform

    /// Rotate `v`; for non-unit quaternions the result is also scaled by `|q|²`
    #[inline]
    pub fn transform(self, v: Vec3) -> Vec3 {
        self.to_mat3() * v
    }

    /// Rotate the xyz part of `v`, keeping `w`
    pub fn transform_vec4(self, v: Vec4) -> Vec4 {
        self.transform(v.xyz()).extend(v.w)
    }

    /// Rotate a double-precision vector
    pub fn transform_f64(self, v: Vec3d) -> Vec3d {
        let m = self.to_mat3();
        let [c0, c1, c2] = m.cols.map(Vec3::as_f64);
        c0 * v.x + c1 * v.y + c2 * v.z
    }

    /// Rotate `v` assuming `self` is unit length
    pub fn transform_unit(self, v: Vec3) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (xx, xy, xz, xw) = (x * x, x * y, x * z, x * w);
        let (yy, yz, yw) = (y * y, y * z, y * w);
        let (zz, zw) = (z * z, z * w);
        Vec3::new(
            (1.0 - 2.0 * (yy + zz)) * v.x + 2.0 * (xy - zw) * v.y + 2.0 * (xz + yw) * v.z,
            2.0 * (xy + zw) * v.x + (1.0 - 2.0 * (xx + zz)) * v.y + 2.0 * (yz - xw) * v.z,
            2.0 * (xz - yw) * v.x + 2.0 * (yz + xw) * v.y + (1.0 - 2.0 * (xx + yy)) * v.z,
        )
    }

    /// `transform(Vec3::X)` without the zero terms
    pub fn transform_positive_x(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (xy, zw, xz, yw) = (x * y, z * w, x * z, y * w);
        Vec3::new(w * w + x * x - z * z - y * y, xy + zw + zw + xy, xz - yw + xz - yw)
    }

    /// `transform(Vec3::Y)` without the zero terms
    pub fn transform_positive_y(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (zw, xy, yz, xw) = (z * w, x * y, y * z, x * w);
        Vec3::new(-zw + xy - zw + xy, y * y - z * z + w * w - x * x, yz + yz + xw + xw)
    }

    /// `transform(Vec3::Z)` without the zero terms
    pub fn transform_positive_z(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (yw, xz, yz, xw) = (y * w, x * z, y * z, x * w);
        Vec3::new(yw + xz + xz + yw, yz + yz - xw - xw, z * z - y * y - x * x + w * w)
    }

    /// `transform_unit(Vec3::X)` without the zero terms
    pub fn transform_unit_positive_x(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        Vec3::new(1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y + z * w), 2.0 * (x * z - y * w))
    }

    /// `transform_unit(Vec3::Y)` without the zero terms
    pub fn transform_unit_positive_y(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        Vec3::new(2.0 * (x * y - z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z + x * w))
    }

    /// `transform_unit(Vec3::Z)` without the zero terms
    pub fn transform_unit_positive_z(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        Vec3::new(2.0 * (x * z + y * w), 2.0 * (y * z - x * w), 1.0 - 2.0 * (x * x + y * y))
    }

    /// The direction this rotation maps onto +X, i.e. +X under the inverse rotation
    pub fn positive_x(self) -> Vec3 {
        self.invert().transform_unit_positive_x()
    }

    /// +Y under the inverse rotation
    pub fn positive_y(self) -> Vec3 {
        self.invert().transform_unit_positive_y()
    }

    /// +Z under the inverse rotation
    pub fn positive_z(self) -> Vec3 {
        self.invert().transform_unit_positive_z()
    }

    /// [`positive_x`](Self::positive_x) for a unit quaternion, skipping the inversion
    pub fn normalized_positive_x(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (dy, dz) = (y + y, z + z);
        Vec3::new(-y * dy - z * dz + 1.0, x * dy - w * dz, x * dz + w * dy)
    }

    /// [`positive_y`](Self::positive_y) for a unit quaternion
    pub fn normalized_positive_y(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (dx, dy, dz) = (x + x, y + y, z + z);
        Vec3::new(x * dy + w * dz, -x * dx - z * dz + 1.0, y * dz - w * dx)
    }

    /// [`positive_z`](Self::positive_z) for a unit quaternion
    pub fn normalized_positive_z(self) -> Vec3 {
        let Self { x, y, z, w } = self;
        let (dx, dy, dz) = (x + x, y + y, z + z);
        Vec3::new(x * dz - w * dy, y * dz + w * dx, -x * dx - y * dy + 1.0)
    }

    // Conversions

    /// Euler angles for the XYZ sequence, so that
    /// `from_euler_xyz(e.x, e.y, e.z)` reproduces `self`
    ///
    /// Not unique at `y = ±π/2` (gimbal lock); no special handling is done.
    pub fn to_euler_xyz(self) -> Vec3 {
        let (x, y, z, w) = (self.x as f64, self.y as f64, self.z as f64, self.w as f64);
        Vec3::new(
            (2.0 * (x * w - y * z)).atan2(1.0 - 2.0 * (x * x + y * y)) as f32,
            (2.0 * (x * z + y * w)).asin() as f32,
            (2.0 * (z * w - x * y)).atan2(1.0 - 2.0 * (y * y + z * z)) as f32,
        )
    }

    /// X component of [`to_euler_xyz`](Self::to_euler_xyz)
    pub fn angle_x(self) -> f32 {
        self.to_euler_xyz().x
    }

    /// Y component of [`to_euler_xyz`](Self::to_euler_xyz)
    pub fn angle_y(self) -> f32 {
        self.to_euler_xyz().y
    }

    /// Z component of [`to_euler_xyz`](Self::to_euler_xyz)
    pub fn angle_z(self) -> f32 {
        self.to_euler_xyz().z
    }

    /// Axis-angle form
    ///
    /// When `sin(angle / 2)` is below 0.001 the axis is undefined and the raw
    /// `(x, y, z)` is returned without normalization.
    pub fn to_axis_angle(self) -> AxisAngle {
        let q = if self.w > 1.0 { self.normalize() } else { self };
        let angle = (2.0 * (q.w as f64).acos()) as f32;
        let s = (1.0 - (q.w * q.w) as f64).sqrt() as f32;
        if s < AXIS_EPSILON {
            log::trace!("Degenerate rotation axis, sin(angle/2) = {}", s);
            AxisAngle::new(angle, Vec3::new(q.x, q.y, q.z))
        } else {
            let inv = 1.0 / s;
            AxisAngle::new(angle, Vec3::new(q.x * inv, q.y * inv, q.z * inv))
        }
    }

    /// Rotation angle folded into `[0, π]`
    pub fn angle(self) -> f32 {
        let angle = (2.0 * (self.w as f64).acos()) as f32;
        if angle <= scalar::consts::PI {
            angle
        } else {
            scalar::consts::TAU - angle
        }
    }

    /// Rotation matrix, scaled by `|q|²` for non-unit input
    #[inline]
    pub fn to_mat3(self) -> Mat3 {
        Mat3::from_quat(self)
    }

    /// Affine 4x4 rotation with no translation
    #[inline]
    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_quat(self)
    }

    /// Affine 4x3 rotation with no translation
    #[inline]
    pub fn to_mat4x3(self) -> Mat4x3 {
        Mat4x3::from_quat(self)
    }

    /// Components as a `Vec4`
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, self.w)
    }

    /// Components in x, y, z, w order
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    // Elementwise

    /// Four-component dot product
    #[inline]
    pub fn dot(self, other: Quat) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Squared norm
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Norm
    #[inline]
    pub fn length(self) -> f32 {
        (self.length_squared() as f64).sqrt() as f32
    }

    /// Unit quaternion; a zero quaternion yields NaN components
    #[inline]
    pub fn normalize(self) -> Self {
        self.scale_components(inv_sqrt(self.length_squared()))
    }

    /// Component-wise sum
    #[allow(clippy::should_implement_trait)]
    #[inline]
    pub fn add(self, q: Quat) -> Self {
        Self::new(self.x + q.x, self.y + q.y, self.z + q.z, self.w + q.w)
    }

    /// Scale transformed vectors by `factor` (components grow by `sqrt(factor)`)
    pub fn scale(self, factor: f32) -> Self {
        self.scale_components((factor as f64).sqrt() as f32)
    }

    /// Every component negated; the same rotation
    #[inline]
    pub fn negate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }

    #[inline]
    fn scale_components(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// Component by index (0 = x, 1 = y, 2 = z, 3 = w)
    pub fn get(self, index: usize) -> Result<f32> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            2 => Ok(self.z),
            3 => Ok(self.w),
            _ => Err(SpatialError::ComponentOutOfRange { index, len: 4 }),
        }
    }

    /// Overwrite a component by index
    pub fn set_component(&mut self, index: usize, value: f32) -> Result<&mut Self> {
        match index {
            0 => self.x = value,
            1 => self.y = value,
            2 => self.z = value,
            3 => self.w = value,
            _ => return Err(SpatialError::ComponentOutOfRange { index, len: 4 }),
        }
        Ok(self)
    }

    /// `"(x y z w)"` rendered with `format`
    pub fn to_string_with(self, format: &FormatConfig) -> String {
        format.format_components(&[self.x as f64, self.y as f64, self.z as f64, self.w as f64])
    }
}

/// In-place twins: `name_mut(&mut self, ..)` stores `self.name(..)` and
/// returns `self`
macro_rules! in_place {
    ($($name:ident => $pure:ident($($arg:ident: $ty:ty),*);)*) => {
        impl Quat {
            $(
                #[doc = concat!("In-place [`", stringify!($pure), "`](Self::", stringify!($pure), ")")]
                #[inline]
                pub fn $name(&mut self, $($arg: $ty),*) -> &mut Self {
                    *self = self.$pure($($arg),*);
                    self
                }
            )*
        }
    };
}

in_place! {
    mul_mut => mul(q: Quat);
    premul_mut => premul(q: Quat);
    div_mut => div(b: Quat);
    rotate_x_mut => rotate_x(angle: f32);
    rotate_y_mut => rotate_y(angle: f32);
    rotate_z_mut => rotate_z(angle: f32);
    rotate_local_x_mut => rotate_local_x(angle: f32);
    rotate_local_y_mut => rotate_local_y(angle: f32);
    rotate_local_z_mut => rotate_local_z(angle: f32);
    rotate_xyz_mut => rotate_xyz(angle_x: f32, angle_y: f32, angle_z: f32);
    rotate_zyx_mut => rotate_zyx(angle_z: f32, angle_y: f32, angle_x: f32);
    rotate_yxz_mut => rotate_yxz(angle_y: f32, angle_x: f32, angle_z: f32);
    rotate_axis_mut => rotate_axis(angle: f32, axis: Vec3);
    rotate_mut => rotate(angles: Vec3);
    rotate_local_mut => rotate_local(angles: Vec3);
    integrate_mut => integrate(dt: f32, omega: Vec3);
    rotate_to_mut => rotate_to(from: Vec3, to: Vec3);
    look_along_mut => look_along(dir: Vec3, up: Vec3);
    conjugate_mut => conjugate();
    invert_mut => invert();
    difference_mut => difference(other: Quat);
    slerp_mut => slerp(target: Quat, alpha: f32);
    nlerp_mut => nlerp(q: Quat, factor: f32);
    nlerp_iterative_mut => nlerp_iterative(q: Quat, alpha: f32, dot_threshold: f32);
    normalize_mut => normalize();
    add_mut => add(q: Quat);
    scale_mut => scale(factor: f32);
    negate_mut => negate();
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<AxisAngle> for Quat {
    fn from(aa: AxisAngle) -> Self {
        Self::from_axis_angle(aa.axis(), aa.angle)
    }
}

impl From<Vec4> for Quat {
    fn from(v: Vec4) -> Self {
        Self::from_vec4(v)
    }
}

impl Mul for Quat {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Quat::mul(self, rhs)
    }
}

impl MulAssign for Quat {
    fn mul_assign(&mut self, rhs: Self) {
        self.mul_mut(rhs);
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.transform(rhs)
    }
}

impl Div for Quat {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Quat::div(self, rhs)
    }
}

impl Add for Quat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Quat::add(self, rhs)
    }
}

/// `-q` negates every component: the same rotation, not its inverse
/// (see [`Quat::conjugate`] for that)
impl Neg for Quat {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Display for Quat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::vector::write_components(f, &self.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f32::consts::{FRAC_PI_2, PI};

    fn assert_quat_eq(a: Quat, b: Quat, epsilon: f32) {
        for (x, y) in a.to_array().iter().zip(b.to_array().iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
        }
    }

    fn assert_vec_eq(a: Vec3, b: Vec3, epsilon: f32) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = epsilon);
        assert_abs_diff_eq!(a.y, b.y, epsilon = epsilon);
        assert_abs_diff_eq!(a.z, b.z, epsilon = epsilon);
    }

    /// Equal up to the sign of the whole quaternion
    fn assert_same_rotation(a: Quat, b: Quat, epsilon: f32) {
        let b = if a.dot(b) < 0.0 { b.negate() } else { b };
        assert_quat_eq(a, b, epsilon);
    }

    fn sample() -> Quat {
        Quat::from_axis_angle(Vec3::new(0.3, -1.0, 0.6), 1.3)
    }

    #[test]
    fn test_quaternion_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Quat::IDENTITY * v, v);
        assert_eq!(Quat::default(), Quat::IDENTITY);
    }

    #[test]
    fn test_quaternion_rotation_y() {
        let q = Quat::from_rotation_y(FRAC_PI_2);
        assert_vec_eq(q * Vec3::X, Vec3::NEG_Z, 1e-6);
    }

    #[test]
    fn test_axis_angle_normalizes_axis() {
        let a = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 5.0), 0.8);
        let b = Quat::from_unit_axis_angle(Vec3::Z, 0.8);
        assert_quat_eq(a, b, 1e-6);
        assert_abs_diff_eq!(a.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_axis_angle_degrees() {
        let a = Quat::from_axis_angle_deg(Vec3::Y, 90.0);
        assert_quat_eq(a, Quat::from_rotation_y(FRAC_PI_2), 1e-6);
    }

    #[test]
    fn test_composition_order() {
        // X is applied first: (0,0,1) -> (0,-1,0), then Z: -> (1,0,0)
        let q = Quat::from_rotation_z(FRAC_PI_2).mul(Quat::from_rotation_x(FRAC_PI_2));
        assert_vec_eq(q.transform(Vec3::Z), Vec3::X, 1e-6);

        let p = Quat::from_rotation_z(FRAC_PI_2).premul(Quat::from_rotation_x(FRAC_PI_2));
        assert_quat_eq(p, Quat::from_rotation_x(FRAC_PI_2) * Quat::from_rotation_z(FRAC_PI_2), 1e-7);
    }

    #[test]
    fn test_world_rotations_post_multiply() {
        let q = sample();
        assert_quat_eq(q.rotate_x(0.7), q.mul(Quat::from_rotation_x(0.7)), 1e-6);
        assert_quat_eq(q.rotate_y(-1.1), q.mul(Quat::from_rotation_y(-1.1)), 1e-6);
        assert_quat_eq(q.rotate_z(2.4), q.mul(Quat::from_rotation_z(2.4)), 1e-6);
        let axis = Vec3::new(1.0, 1.0, -2.0);
        assert_quat_eq(q.rotate_axis(0.9, axis), q.mul(Quat::from_axis_angle(axis, 0.9)), 1e-6);
    }

    #[test]
    fn test_local_rotations_pre_multiply() {
        let q = sample();
        assert_quat_eq(q.rotate_local_x(0.7), q.premul(Quat::from_rotation_x(0.7)), 1e-6);
        assert_quat_eq(q.rotate_local_y(-1.1), q.premul(Quat::from_rotation_y(-1.1)), 1e-6);
        assert_quat_eq(q.rotate_local_z(2.4), q.premul(Quat::from_rotation_z(2.4)), 1e-6);
    }

    #[test]
    fn test_euler_orders_match_rotation_chains() {
        let (a, b, c) = (0.3, -0.8, 1.9);
        let id = Quat::IDENTITY;
        assert_quat_eq(Quat::from_euler_xyz(a, b, c), id.rotate_x(a).rotate_y(b).rotate_z(c), 1e-6);
        assert_quat_eq(Quat::from_euler_zyx(c, b, a), id.rotate_z(c).rotate_y(b).rotate_x(a), 1e-6);
        assert_quat_eq(Quat::from_euler_yxz(b, a, c), id.rotate_y(b).rotate_x(a).rotate_z(c), 1e-6);

        let q = sample();
        assert_quat_eq(q.rotate_xyz(a, b, c), q.mul(Quat::from_euler_xyz(a, b, c)), 1e-6);
        assert_quat_eq(q.rotate_zyx(c, b, a), q.mul(Quat::from_euler_zyx(c, b, a)), 1e-6);
        assert_quat_eq(q.rotate_yxz(b, a, c), q.mul(Quat::from_euler_yxz(b, a, c)), 1e-6);
    }

    #[test]
    fn test_euler_round_trip() {
        let angles = Quat::from_euler_xyz(0.3, -0.4, 0.5).to_euler_xyz();
        assert_vec_eq(angles, Vec3::new(0.3, -0.4, 0.5), 1e-5);

        let q = Quat::from_euler_xyz(-1.2, 0.2, 2.5);
        assert_abs_diff_eq!(q.angle_x(), -1.2, epsilon = 1e-5);
        assert_abs_diff_eq!(q.angle_y(), 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(q.angle_z(), 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_vector() {
        let v = Vec3::new(0.4, -1.0, 0.7);
        let expected = Quat::from_axis_angle(v, v.length());
        assert_quat_eq(Quat::from_rotation_vector(v), expected, 1e-6);

        // Small angles take the Taylor branch
        let tiny = Quat::from_rotation_vector(Vec3::new(1e-3, 0.0, 0.0));
        assert_quat_eq(tiny, Quat::from_rotation_x(1e-3), 1e-7);

        let q = sample();
        assert_quat_eq(q.rotate(v), q.mul(expected), 1e-6);
        assert_quat_eq(q.rotate_local(v), q.premul(expected), 1e-6);
        assert_quat_eq(q.integrate(0.5, v * 2.0), q.premul(expected), 1e-6);
    }

    #[test]
    fn test_inverse() {
        let q = Quat::new(1.0, 2.0, 3.0, 4.0);
        assert_quat_eq(q * q.invert(), Quat::IDENTITY, 1e-6);

        let u = sample();
        assert_quat_eq(u.conjugate(), u.invert(), 1e-6);
        assert_quat_eq(u.div(u), Quat::IDENTITY, 1e-6);

        let zero = Quat::new(0.0, 0.0, 0.0, 0.0).invert();
        assert!(zero.x.is_nan() && zero.w.is_nan());
    }

    #[test]
    fn test_difference_and_distance() {
        let a = Quat::from_rotation_y(0.2);
        let b = Quat::from_rotation_y(0.9);
        assert_quat_eq(a.mul(a.difference(b)), b, 1e-6);
        assert_abs_diff_eq!(a.distance(b), 0.7, epsilon = 1e-5);
        assert_abs_diff_eq!(b.distance(a), 0.7, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_is_folded() {
        assert_abs_diff_eq!(Quat::from_rotation_x(1.0).angle(), 1.0, epsilon = 1e-5);
        // A 5 rad rotation is the same as 2π - 5 the other way
        assert_abs_diff_eq!(Quat::from_rotation_x(5.0).angle(), 2.0 * PI - 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_slerp_endpoints() {
        let q = sample();
        let t = Quat::from_euler_xyz(1.0, 0.5, -2.0);
        assert_quat_eq(q.slerp(t, 0.0), q, 1e-6);
        assert_same_rotation(q.slerp(t, 1.0), t, 1e-6);
        assert_same_rotation(q.slerp(t.negate(), 1.0), t, 1e-6);
    }

    #[test]
    fn test_slerp_takes_shorter_arc() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(2.0);
        assert_quat_eq(a.slerp(b, 0.5), Quat::from_rotation_y(1.0), 1e-6);
        // Same rotation, opposite hemisphere: still halfway along the short arc
        assert_quat_eq(a.slerp(b.negate(), 0.5), Quat::from_rotation_y(1.0), 1e-6);
    }

    #[test]
    fn test_slerp_linear_fallback() {
        let q = sample();
        assert_quat_eq(q.slerp(q, 0.3), q, 1e-6);
    }

    #[test]
    fn test_nlerp_close_to_slerp_for_small_angles() {
        let a = Quat::from_rotation_y(0.3);
        let b = Quat::from_rotation_y(0.3 + 4.0f32.to_radians());
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert_quat_eq(a.nlerp(b, t), a.slerp(b, t), 1e-3);
        }
    }

    #[test]
    fn test_nlerp_iterative_matches_slerp() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 2.5);
        for &alpha in &[0.1, 0.3, 0.5, 0.85] {
            assert_quat_eq(a.nlerp_iterative(b, alpha, 0.9999), a.slerp(b, alpha), 1e-4);
        }
    }

    #[test]
    fn test_nlerp_iterative_coincident_returns_self() {
        let q = Quat::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(q.nlerp_iterative(q, 0.4, 0.9999), q);
        assert_eq!(q.nlerp_iterative(q.negate(), 0.4, 0.9999), q);
    }

    #[test]
    fn test_transform_fast_paths() {
        let q = Quat::new(0.2, -0.5, 0.9, 1.3);
        assert_vec_eq(q.transform_positive_x(), q.transform(Vec3::X), 1e-6);
        assert_vec_eq(q.transform_positive_y(), q.transform(Vec3::Y), 1e-6);
        assert_vec_eq(q.transform_positive_z(), q.transform(Vec3::Z), 1e-6);

        let u = sample();
        let v = Vec3::new(1.5, -2.0, 0.25);
        assert_vec_eq(u.transform_unit(v), u.transform(v), 1e-5);
        assert_vec_eq(u.transform_unit_positive_x(), u.transform(Vec3::X), 1e-5);
        assert_vec_eq(u.transform_unit_positive_y(), u.transform(Vec3::Y), 1e-5);
        assert_vec_eq(u.transform_unit_positive_z(), u.transform(Vec3::Z), 1e-5);
    }

    #[test]
    fn test_transform_variants() {
        let u = sample();
        let v = Vec3::new(1.5, -2.0, 0.25);
        let r = u.transform(v);

        let r4 = u.transform_vec4(v.extend(7.0));
        assert_vec_eq(r4.xyz(), r, 1e-6);
        assert_eq!(r4.w, 7.0);

        let rd = u.transform_f64(v.as_f64()).as_f32();
        assert_vec_eq(rd, r, 1e-5);
    }

    #[test]
    fn test_inverse_axes() {
        let u = sample();
        let inv = u.conjugate();
        assert_vec_eq(u.positive_x(), inv.transform(Vec3::X), 1e-5);
        assert_vec_eq(u.positive_y(), inv.transform(Vec3::Y), 1e-5);
        assert_vec_eq(u.positive_z(), inv.transform(Vec3::Z), 1e-5);
        assert_vec_eq(u.normalized_positive_x(), inv.transform(Vec3::X), 1e-5);
        assert_vec_eq(u.normalized_positive_y(), inv.transform(Vec3::Y), 1e-5);
        assert_vec_eq(u.normalized_positive_z(), inv.transform(Vec3::Z), 1e-5);
    }

    #[test]
    fn test_to_axis_angle() {
        let aa = Quat::from_axis_angle(Vec3::Z, 1.2).to_axis_angle();
        assert_abs_diff_eq!(aa.angle, 1.2, epsilon = 1e-5);
        assert_vec_eq(aa.axis(), Vec3::Z, 1e-5);
        assert_quat_eq(Quat::from(aa), Quat::from_rotation_z(1.2), 1e-6);
    }

    #[test]
    fn test_to_axis_angle_degenerate_axis_is_raw() {
        let aa = Quat::new(0.0002, 0.0, 0.0, 1.0).to_axis_angle();
        assert_eq!(aa.angle, 0.0);
        assert_eq!(aa.axis(), Vec3::new(0.0002, 0.0, 0.0));

        // w > 1 is renormalized first
        let aa = Quat::new(0.0, 0.0, 0.0, 2.0).to_axis_angle();
        assert_eq!(aa.angle, 0.0);
        assert_eq!(aa.axis(), Vec3::ZERO);
    }

    #[test]
    fn test_rotation_to() {
        let from = Vec3::new(1.0, 2.0, 3.0);
        let to = Vec3::new(-2.0, 0.5, 1.0);
        let r = Quat::from_rotation_to(from, to).transform(from);
        assert_abs_diff_eq!(r.length(), from.length(), epsilon = 1e-5);
        assert_abs_diff_eq!(r.cross(to).length(), 0.0, epsilon = 1e-4);
        assert!(r.dot(to) > 0.0);

        let q = sample();
        assert_quat_eq(q.rotate_to(from, to), q.mul(Quat::from_rotation_to(from, to)), 1e-6);
    }

    #[test]
    fn test_rotation_to_antiparallel_fallbacks() {
        let q = Quat::from_rotation_to(Vec3::X, Vec3::NEG_X);
        assert_eq!(q, Quat::new(0.0, 1.0, 0.0, 0.0));
        assert_vec_eq(q.transform(Vec3::X), Vec3::NEG_X, 1e-6);

        // to × +Z vanishes, so the second axis is used
        let q = Quat::from_rotation_to(Vec3::Z, Vec3::NEG_Z);
        assert_eq!(q, Quat::new(0.0, -1.0, 0.0, 0.0));
        assert_vec_eq(q.transform(Vec3::Z), Vec3::NEG_Z, 1e-6);
    }

    #[test]
    fn test_look_along() {
        assert_quat_eq(Quat::from_look_along(Vec3::NEG_Z, Vec3::Y), Quat::IDENTITY, 1e-7);

        let q = Quat::from_look_along(Vec3::new(2.0, 0.0, 0.0), Vec3::Y);
        assert_vec_eq(q.transform(Vec3::X), Vec3::NEG_Z, 1e-6);
        assert_vec_eq(q.transform(Vec3::Y), Vec3::Y, 1e-6);

        let p = sample();
        assert_quat_eq(p.look_along(Vec3::X, Vec3::Y), p.mul(Quat::from_look_along(Vec3::X, Vec3::Y)), 1e-6);
    }

    #[test]
    fn test_look_along_diagonal_tie() {
        // Basis diagonal (0, 0, -1): the x and y branches tie and y is taken
        let q = Quat::from_look_along(Vec3::Z, Vec3::X);
        let h = core::f32::consts::FRAC_1_SQRT_2;
        assert_quat_eq(q, Quat::new(h, h, 0.0, 0.0), 1e-6);
        assert_vec_eq(q.transform(Vec3::Z), Vec3::NEG_Z, 1e-6);
        assert_vec_eq(q.transform(Vec3::X), Vec3::Y, 1e-6);
    }

    #[test]
    fn test_look_along_tie_takes_y_branch() {
        // Basis rows (0,-1,0), (-1,0,0), (0,0,-1): m00 == m11 and the
        // off-diagonals are negative, so the x and y branches disagree in sign
        let q = Quat::from_look_along(Vec3::Z, Vec3::NEG_X);
        let h = core::f32::consts::FRAC_1_SQRT_2;
        assert_eq!(q, Quat::new(-h, h, 0.0, 0.0));
        assert_vec_eq(q.transform(Vec3::Z), Vec3::NEG_Z, 1e-6);
        assert_vec_eq(q.transform(Vec3::NEG_X), Vec3::Y, 1e-6);
    }

    #[test]
    fn test_neg_is_same_rotation_not_inverse() {
        let q = sample();
        let v = Vec3::new(1.0, -2.0, 0.5);
        assert_eq!(-q, Quat::new(-q.x, -q.y, -q.z, -q.w));
        assert_vec_eq((-q).transform(v), q.transform(v), 1e-6);
        assert!((q.conjugate().transform(v) - q.transform(v)).length() > 0.1);
    }

    #[test]
    fn test_matrix_tie_takes_x_branch() {
        // Half turn about (1,-1,0): m00 == m11 == 0 with negative off-diagonals
        let m = Mat3::from_cols(Vec3::NEG_Y, Vec3::NEG_X, Vec3::NEG_Z);
        let h = core::f32::consts::FRAC_1_SQRT_2;
        assert_eq!(Quat::from_normalized_mat3(&m), Quat::new(h, -h, 0.0, 0.0));
        assert_eq!(Quat::from_unnormalized_mat3(&m), Quat::new(h, -h, 0.0, 0.0));
    }

    #[test]
    fn test_look_at() {
        assert_quat_eq(Quat::from_look_at(Vec3::X), Quat::IDENTITY, 1e-7);
        let d = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_eq(Quat::from_look_at(d).transform(Vec3::X), d.normalize(), 1e-5);
    }

    #[test]
    fn test_scale() {
        let s = Quat::from_scale(4.0);
        assert_eq!(s, Quat::new(0.0, 0.0, 0.0, 2.0));
        assert_vec_eq(s.transform(Vec3::new(1.0, -1.0, 0.5)), Vec3::new(4.0, -4.0, 2.0), 1e-6);

        let q = sample().scale(9.0);
        assert_abs_diff_eq!(q.length(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_elementwise() {
        let a = Quat::new(1.0, 2.0, 3.0, 4.0);
        let b = Quat::new(0.5, -1.0, 0.0, 2.0);
        assert_eq!(a.add(b), Quat::new(1.5, 1.0, 3.0, 6.0));
        assert_eq!(a + b, a.add(b));
        assert_eq!(-a, Quat::new(-1.0, -2.0, -3.0, -4.0));
        assert_eq!(a.dot(b), 6.5);
        assert_eq!(a.length_squared(), 30.0);
        assert_abs_diff_eq!(a.normalize().length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_in_place_matches_pure() {
        let a = sample();
        let b = Quat::from_euler_yxz(0.2, 0.4, -0.6);

        let mut q = a;
        q.mul_mut(b);
        assert_eq!(q, a.mul(b));

        let mut q = a;
        q.rotate_x_mut(0.1).rotate_local_y_mut(0.2).slerp_mut(b, 0.5);
        assert_eq!(q, a.rotate_x(0.1).rotate_local_y(0.2).slerp(b, 0.5));

        // Receiver used as its own operand
        let mut q = a;
        let copy = q;
        q.mul_mut(copy);
        assert_eq!(q, a.mul(a));

        let mut q = a;
        q *= b;
        assert_eq!(q, a * b);
    }

    #[test]
    fn test_weighted_interpolation() {
        let a = Quat::from_rotation_z(0.2);
        let b = Quat::from_rotation_z(1.4);
        let c = Quat::from_rotation_x(0.9);

        let two = Quat::slerp_weighted(&[a, b], &[1.0, 1.0]).unwrap();
        assert_quat_eq(two, a.slerp(b, 0.5), 1e-7);

        let three = Quat::nlerp_weighted(&[a, b, c], &[1.0, 1.0, 1.0]).unwrap();
        assert_quat_eq(three, a.nlerp(b, 0.5).nlerp(c, 1.0 / 3.0), 1e-6);

        let iter = Quat::nlerp_iterative_weighted(&[a, b], &[3.0, 1.0], 0.9999).unwrap();
        assert_quat_eq(iter, a.slerp(b, 0.25), 1e-4);

        assert_eq!(Quat::slerp_weighted(&[a], &[2.0]).unwrap(), a);
    }

    #[test]
    fn test_weighted_interpolation_rejects_bad_input() {
        assert_eq!(Quat::slerp_weighted(&[], &[]), Err(SpatialError::EmptySequence));
        assert_eq!(
            Quat::nlerp_weighted(&[Quat::IDENTITY, Quat::IDENTITY], &[1.0]),
            Err(SpatialError::WeightCountMismatch { quaternions: 2, weights: 1 })
        );
    }

    #[test]
    fn test_component_access() {
        let mut q = Quat::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(q.get(3), Ok(4.0));
        assert_eq!(q.get(4), Err(SpatialError::ComponentOutOfRange { index: 4, len: 4 }));
        q.set_component(1, 9.0).unwrap();
        assert_eq!(q.y, 9.0);
        assert!(q.set_component(7, 0.0).is_err());
    }

    #[test]
    fn test_display() {
        let q = Quat::new(1.0, -2.5, 0.0, 1.0);
        assert_eq!(q.to_string(), "(1 -2.5 0 1)");
        assert_eq!(format!("{:.2}", q), "(1.00 -2.50 0.00 1.00)");
        assert_eq!(
            q.to_string_with(&FormatConfig::scientific()),
            "( 1.000E0 -2.500E0  0.000E0  1.000E0)"
        );
    }
}
