use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const DEFAULT_COLOR: &str = "FF0000";
pub const DEFAULT_TEMPERATURE: f64 = 67.0;
pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 100.0;

const HEX_COLOR_LEN: usize = 6;

/// A light color as exactly six hexadecimal digits, without a `#` prefix.
///
/// Case is preserved as given; `ff0000` and `FF0000` are both canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexColorError {
    #[error("String must contain exactly 6 character(s)")]
    Length(usize),
    #[error("String must contain only hexadecimal characters")]
    Charset,
}

impl HexColor {
    pub fn parse(raw: &str) -> Result<Self, HexColorError> {
        let len = raw.chars().count();
        if len != HEX_COLOR_LEN {
            return Err(HexColorError::Length(len));
        }
        if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError::Charset);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = HexColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thermostat setpoint, always within `[0, 100]`.
///
/// Out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "f64")]
pub struct Temperature(f64);

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TemperatureError {
    #[error("Number must be finite")]
    NotFinite,
    #[error("Number must be greater than or equal to 0")]
    BelowMinimum(f64),
    #[error("Number must be less than or equal to 100")]
    AboveMaximum(f64),
}

impl Temperature {
    pub fn new(value: f64) -> Result<Self, TemperatureError> {
        if !value.is_finite() {
            return Err(TemperatureError::NotFinite);
        }
        if value < MIN_TEMPERATURE {
            return Err(TemperatureError::BelowMinimum(value));
        }
        if value > MAX_TEMPERATURE {
            return Err(TemperatureError::AboveMaximum(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Temperature {
    type Error = TemperatureError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// Whole degrees go out as JSON integers so `67` stays `67` on the wire.
impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeState {
    pub temp: Temperature,
    pub color: HexColor,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            temp: Temperature(DEFAULT_TEMPERATURE),
            color: HexColor(DEFAULT_COLOR.to_string()),
        }
    }
}
