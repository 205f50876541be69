//! Capability traits for the raster primitives the pipeline depends on.
//!
//! `ColorRelief` turns a single-band raster into an RGBA raster through a
//! relief table; `OverviewBuilder` adds a downsampled pyramid to a raster in
//! place. Both are object-safe so backends can be swapped at runtime, and
//! tests can substitute recorders that never touch GDAL.
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::core::ramp::ReliefTable;

/// Errors reported by a raster backend.
#[derive(Debug, Error)]
pub enum ReliefError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input raster not found: {0}")]
    MissingInput(PathBuf),
    #[error("Unsupported raster: {0}")]
    Unsupported(String),
    #[error("{tool} is not available: {source}")]
    Unavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },
}

/// One color-relief invocation.
#[derive(Debug, Clone, Copy)]
pub struct ReliefRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub table: &'a ReliefTable,
    /// GTiff creation options, `KEY=VALUE`
    pub creation_options: &'a [String],
    /// Dataset metadata items to embed where the backend can
    pub metadata: &'a [(String, String)],
}

pub trait ColorRelief {
    /// Write a 4-band (R, G, B, A) 8-bit raster at `request.output` with the
    /// input's size and georeferencing.
    fn color_relief(&self, request: &ReliefRequest<'_>) -> Result<(), ReliefError>;
}

/// One in-place overview build.
#[derive(Debug, Clone, Copy)]
pub struct OverviewRequest<'a> {
    pub path: &'a Path,
    /// GDAL resampling name, e.g. `AVERAGE`
    pub resampling: &'a str,
    pub factors: &'a [u32],
    /// `GDAL_NUM_THREADS` for the build, e.g. `ALL_CPUS`
    pub num_threads: &'a str,
}

pub trait OverviewBuilder {
    fn build_overviews(&self, request: &OverviewRequest<'_>) -> Result<(), ReliefError>;
}

/// A backend providing both primitives.
pub trait RasterBackend: ColorRelief + OverviewBuilder {
    fn name(&self) -> &'static str;
}
