//! Shared types and enums used across wxramp.
//! Includes `RampKind`, the `Rgb` color triple, pipeline `Stage`s and the
//! `Backend` selector exposed on the command line.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a ramp is meant to be read. Both kinds interpolate identically; the
/// label records whether breakpoints were authored around a center value.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampKind {
    #[default]
    Gradient,
    Diverging,
}

impl std::fmt::Display for RampKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RampKind::Gradient => write!(f, "gradient"),
            RampKind::Diverging => write!(f, "diverging"),
        }
    }
}

/// 8-bit RGB triple.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb` (any case).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Steps of the per-file pipeline, in execution order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Compile,
    Colorize,
    Finish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::Compile => write!(f, "compile"),
            Stage::Colorize => write!(f, "colorize"),
            Stage::Finish => write!(f, "finish"),
        }
    }
}

/// Raster backend used for the color-relief and overview steps.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize)]
pub enum Backend {
    /// In-process through the GDAL library
    #[default]
    Gdal,
    /// Shell out to `gdaldem` and `gdaladdo`
    GdalTools,
}
