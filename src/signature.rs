//! Color signature module
//!
//! A [`ColorSignature`] is the four-field color descriptor attached to a
//! record: dominant hue, secondary hue, dominant-hue weight and the average
//! saturation around the dominant hue.
//!
//! The four fields travel through records as plain strings, so this module
//! also owns their names and their textual encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field name of the dominant hue
pub const DOMINANT_HUE_KEY: &str = "dominantHue";

/// Field name of the secondary hue
pub const SECONDARY_HUE_KEY: &str = "secondaryHue";

/// Field name of the dominant-hue weight
pub const WEIGHT_KEY: &str = "weight";

/// Field name of the localized average saturation
pub const SATURATION_KEY: &str = "saturation";

/// All signature fields, in output order
pub const SIGNATURE_KEYS: [&str; 4] = [DOMINANT_HUE_KEY, SECONDARY_HUE_KEY, WEIGHT_KEY, SATURATION_KEY];

/// Number of decimals kept for float fields
const DECIMALS: i32 = 4;

/// Signature decoding error types
#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("Missing signature field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, SignatureError>;

/// Compact color descriptor of one image
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSignature {
    /// Hue bucket with the highest chroma-weighted energy (0-359)
    pub dominant_hue: u16,
    /// First well-separated runner-up hue, or the dominant hue itself
    pub secondary_hue: u16,
    /// Fraction of total weight held by the dominant bucket (0.0-1.0)
    pub weight: f64,
    /// Weighted mean saturation near the dominant hue (0.0-1.0)
    pub saturation: f64,
}

impl ColorSignature {
    /// Signature returned when no pixel carries usable chroma
    pub const ZERO: ColorSignature = ColorSignature {
        dominant_hue: 0,
        secondary_hue: 0,
        weight: 0.0,
        saturation: 0.0,
    };

    /// Create a signature, normalizing hues into 0-359 and rounding floats
    pub fn new(dominant_hue: u16, secondary_hue: u16, weight: f64, saturation: f64) -> Self {
        Self {
            dominant_hue: dominant_hue % 360,
            secondary_hue: secondary_hue % 360,
            weight: round_decimals(weight),
            saturation: round_decimals(saturation),
        }
    }

    /// Whether this is the degenerate all-zero signature
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Encode the signature as `(field, value)` pairs in output order
    pub fn to_fields(&self) -> [(&'static str, String); 4] {
        [
            (DOMINANT_HUE_KEY, self.dominant_hue.to_string()),
            (SECONDARY_HUE_KEY, self.secondary_hue.to_string()),
            (WEIGHT_KEY, format_decimal(self.weight)),
            (SATURATION_KEY, format_decimal(self.saturation)),
        ]
    }

    /// Decode a signature from field values looked up through `get`
    ///
    /// Every field must be present, non-empty and within range.
    pub fn from_fields<'a, F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let field = |key: &'static str| -> Result<&'a str> {
            get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or(SignatureError::MissingField(key))
        };

        let dominant_hue = parse_hue(DOMINANT_HUE_KEY, field(DOMINANT_HUE_KEY)?)?;
        let secondary_hue = parse_hue(SECONDARY_HUE_KEY, field(SECONDARY_HUE_KEY)?)?;
        let weight = parse_unit(WEIGHT_KEY, field(WEIGHT_KEY)?)?;
        let saturation = parse_unit(SATURATION_KEY, field(SATURATION_KEY)?)?;

        Ok(Self::new(dominant_hue, secondary_hue, weight, saturation))
    }
}

/// Round to the number of decimals kept in output
#[inline]
pub fn round_decimals(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMALS);
    (value * factor).round() / factor
}

/// Format a float with at most four decimals and no trailing zeros
///
/// `0.5` stays `0.5`, `1.0` becomes `1`, `0.0` becomes `0`.
pub fn format_decimal(value: f64) -> String {
    let text = format!("{:.*}", DECIMALS as usize, value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_hue(field: &'static str, value: &str) -> Result<u16> {
    let invalid = || SignatureError::InvalidValue {
        field,
        value: value.to_string(),
    };
    let parsed: f64 = value.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || !(0.0..360.0).contains(&parsed) {
        return Err(invalid());
    }
    Ok((parsed.round() as u16) % 360)
}

fn parse_unit(field: &'static str, value: &str) -> Result<f64> {
    let invalid = || SignatureError::InvalidValue {
        field,
        value: value.to_string(),
    };
    let parsed: f64 = value.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || !(0.0..=1.0).contains(&parsed) {
        return Err(invalid());
    }
    Ok(parsed)
}
