//! Scalar helpers shared by the vector, matrix and quaternion code

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Cosine of `angle`, given its already computed sine
///
/// Saves a second trig call. The magnitude comes from `sin² + cos² = 1`; the
/// sign comes from which half-turn `angle + π/2` falls into, so the result
/// agrees with `angle.cos()` for any angle.
#[inline]
pub fn cos_from_sin(sin: f64, angle: f64) -> f64 {
    use core::f64::consts::{FRAC_PI_2, PI, TAU};

    let cos = (1.0 - sin * sin).sqrt();
    let a = angle + FRAC_PI_2;
    let mut b = a - (a / TAU).trunc() * TAU;
    if b < 0.0 {
        b += TAU;
    }
    if b >= PI { -cos } else { cos }
}

/// Single-precision sine and cosine of `angle`, cosine via [`cos_from_sin`]
#[inline]
pub fn sin_cos(angle: f32) -> (f32, f32) {
    let angle = angle as f64;
    let sin = angle.sin();
    (sin as f32, cos_from_sin(sin, angle) as f32)
}

/// `1 / sqrt(x)` evaluated in double precision
#[inline]
pub fn inv_sqrt(x: f32) -> f32 {
    (1.0 / (x as f64).sqrt()) as f32
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}
