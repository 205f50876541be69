use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::params::ColorizeParams;
use crate::core::processing::colorize::OutputRaster;
use crate::error::{Error, Result};
use crate::io::relief::{OverviewBuilder, OverviewRequest};

/// Builds the overview pyramid on a staged raster and publishes it atomically.
pub struct OutputFinisher<'a, O: OverviewBuilder + ?Sized> {
    overviews: &'a O,
    params: &'a ColorizeParams,
}

impl<'a, O: OverviewBuilder + ?Sized> OutputFinisher<'a, O> {
    pub fn new(overviews: &'a O, params: &'a ColorizeParams) -> Self {
        Self { overviews, params }
    }

    /// Readers of `output_path` see either the previous file or the complete
    /// new one, never a partial write.
    pub fn finish(&self, raster: OutputRaster, output_path: &Path) -> Result<PathBuf> {
        if !self.params.overview_factors.is_empty() {
            debug!(
                "Building {} overviews {:?} on {:?}",
                self.params.overview_resampling,
                self.params.overview_factors,
                raster.staging_dir()
            );
            self.overviews
                .build_overviews(&OverviewRequest {
                    path: raster.path(),
                    resampling: &self.params.overview_resampling,
                    factors: &self.params.overview_factors,
                    num_threads: &self.params.num_threads,
                })
                .map_err(Error::Finish)?;
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::rename(raster.path(), output_path)?;

        let size_mb = std::fs::metadata(output_path)
            .map(|m| m.len() as f64 / 1024.0 / 1024.0)
            .unwrap_or(0.0);
        info!(
            "Created colored output: {:?} ({:.2} MB, variable={}, ramp={})",
            output_path,
            size_mb,
            raster.variable(),
            raster.ramp()
        );
        Ok(output_path.to_path_buf())
    }
}
