//! Primary-color theme overrides.
//!
//! Vendors pass brand colors as hex strings; the stylesheet consumes HSL
//! triples. Conversion failures are an isolated failure domain: the engine
//! logs a warning and continues initialization without the overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CSS custom properties written with override priority (`!important`),
/// so vendor colors are not superseded by default stylesheet rules.
pub const PRIMARY_VAR: &str = "--primary";
pub const PRIMARY_LIGHT_VAR: &str = "--primary-100";
pub const PRIMARY_DARK_VAR: &str = "--primary-300";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Invalid hex color: {0}")]
    InvalidHex(String),
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl fmt::Display for Hsl {
    /// The `H S% L%` triple the stylesheet expects, one decimal each.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {:.1}% {:.1}%", self.h, self.s, self.l)
    }
}

/// A pending CSS custom property write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssVarWrite {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl CssVarWrite {
    fn important(name: &str, value: String) -> Self {
        CssVarWrite {
            name: name.to_string(),
            value,
            important: true,
        }
    }
}

/// Converts a 3- or 6-digit hex color (leading `#` optional) to HSL.
pub fn hex_to_hsl(hex: &str) -> Result<Hsl, ThemeError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let expanded = match digits.len() {
        3 => digits
            .chars()
            .flat_map(|c| [c, c])
            .collect::<String>(),
        6 => digits.to_string(),
        _ => return Err(ThemeError::InvalidHex(hex.to_string())),
    };

    let channel = |range: std::ops::Range<usize>| -> Result<f64, ThemeError> {
        u8::from_str_radix(&expanded[range], 16)
            .map(|v| f64::from(v) / 255.0)
            .map_err(|_| ThemeError::InvalidHex(hex.to_string()))
    };
    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let mut h = 0.0;
    let mut s = 0.0;
    if max != min {
        let d = max - min;
        s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        h /= 6.0;
    }

    Ok(Hsl {
        h: h * 360.0,
        s: s * 100.0,
        l: l * 100.0,
    })
}

/// Normalizes a color value to the bare `H S% L%` form.
///
/// Hex values are converted; anything else passes through with an `hsl(...)`
/// wrapper stripped, so pre-converted values work unchanged.
fn normalize(value: &str) -> Result<String, ThemeError> {
    if value.starts_with('#') {
        return Ok(hex_to_hsl(value)?.to_string());
    }
    let without_prefix = value.strip_prefix("hsl(").unwrap_or(value);
    Ok(without_prefix.strip_suffix(')').unwrap_or(without_prefix).to_string())
}

/// Builds the override writes for a vendor primary color.
///
/// The light and dark variants fall back to the primary when not supplied.
pub fn primary_color_overrides(
    primary: &str,
    light: Option<&str>,
    dark: Option<&str>,
) -> Result<Vec<CssVarWrite>, ThemeError> {
    Ok(vec![
        CssVarWrite::important(PRIMARY_VAR, normalize(primary)?),
        CssVarWrite::important(PRIMARY_LIGHT_VAR, normalize(light.unwrap_or(primary))?),
        CssVarWrite::important(PRIMARY_DARK_VAR, normalize(dark.unwrap_or(primary))?),
    ])
}
