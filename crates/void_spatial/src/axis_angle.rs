//! Axis-angle rotation representation

use core::fmt;

use crate::config::FormatConfig;
use crate::quaternion::Quat;
use crate::scalar;
use crate::vector::Vec3;

/// Rotation of `angle` radians about the axis `(x, y, z)`
///
/// The axis is expected to be unit length for [`transform`](Self::transform);
/// call [`normalize`](Self::normalize) when it may not be.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisAngle {
    pub angle: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisAngle {
    /// No rotation about +Z
    pub const IDENTITY: Self = Self::new(0.0, Vec3::Z);

    #[inline]
    pub const fn new(angle: f32, axis: Vec3) -> Self {
        Self { angle, x: axis.x, y: axis.y, z: axis.z }
    }

    #[inline]
    pub fn axis(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Unit-length axis, angle unchanged
    pub fn normalize(self) -> Self {
        Self::new(self.angle, self.axis().normalize())
    }

    /// Rotate `v` about the axis (Rodrigues' rotation formula)
    pub fn transform(&self, v: Vec3) -> Vec3 {
        let (sin, cos) = scalar::sin_cos(self.angle);
        let axis = self.axis();
        let dot = axis.dot(v);
        v * cos + axis.cross(v) * sin + axis * ((1.0 - cos) * dot)
    }

    pub fn to_quat(self) -> Quat {
        Quat::from(self)
    }

    pub fn to_string_with(&self, format: &FormatConfig) -> String {
        format!(
            "({} {} {} <| {})",
            format.format_value(self.x as f64),
            format.format_value(self.y as f64),
            format.format_value(self.z as f64),
            format.format_value(self.angle as f64),
        )
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quat> for AxisAngle {
    fn from(q: Quat) -> Self {
        q.to_axis_angle()
    }
}

impl fmt::Display for AxisAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "({:.*} {:.*} {:.*} <| {:.*})", p, self.x, p, self.y, p, self.z, p, self.angle),
            None => write!(f, "({} {} {} <| {})", self.x, self.y, self.z, self.angle),
        }
    }
}
