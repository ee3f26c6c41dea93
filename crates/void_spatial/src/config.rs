//! Formatting configuration for diagnostic output

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number formatting used by `to_string_with` on the spatial types
///
/// Output always has the shape `"(a b c ...)"`; only the per-component
/// rendering is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatConfig {
    /// Digits after the decimal point
    pub precision: usize,

    /// Render as `mantissa E exponent` instead of fixed point
    pub scientific: bool,

    /// Reserve a leading space for the sign of non-negative values so
    /// columns line up
    pub pad_sign: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            precision: 3,
            scientific: false,
            pad_sign: false,
        }
    }
}

impl FormatConfig {
    /// Three fractional digits in scientific notation, sign-padded
    /// (`" 1.000E0"`, `"-2.500E-1"`)
    pub fn scientific() -> Self {
        Self {
            precision: 3,
            scientific: true,
            pad_sign: true,
        }
    }

    /// Fixed-point output with the given precision
    pub fn fixed(precision: usize) -> Self {
        Self {
            precision,
            ..Default::default()
        }
    }

    /// Set precision
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set scientific notation
    pub fn with_scientific(mut self, scientific: bool) -> Self {
        self.scientific = scientific;
        self
    }

    /// Set sign padding
    pub fn with_pad_sign(mut self, pad_sign: bool) -> Self {
        self.pad_sign = pad_sign;
        self
    }

    /// Render a single value
    pub fn format_value(&self, value: f64) -> String {
        let body = if self.scientific {
            format!("{:.*E}", self.precision, value)
        } else {
            format!("{:.*}", self.precision, value)
        };

        if self.pad_sign && !body.starts_with('-') {
            format!(" {}", body)
        } else {
            body
        }
    }

    /// Render components as `"(a b c)"`
    pub fn format_components(&self, components: &[f64]) -> String {
        let parts: Vec<String> = components.iter().map(|&c| self.format_value(c)).collect();
        format!("({})", parts.join(" "))
    }
}
