use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::core::params::ColorizeParams;
use crate::core::ramp::RampTable;
use crate::error::{Error, Result};
use crate::io::relief::{ColorRelief, ReliefError, ReliefRequest};

const STAGED_NAME: &str = "staged.tif";

/// A colorized raster that has been written but not yet published.
///
/// It lives in a private temporary directory next to its final location, so
/// publishing is a same-filesystem rename. Dropping it without finishing
/// removes the staged file.
#[derive(Debug)]
pub struct OutputRaster {
    staging: TempDir,
    path: PathBuf,
    variable: String,
    ramp: String,
}

impl OutputRaster {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn ramp(&self) -> &str {
        &self.ramp
    }

    pub(crate) fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

/// Applies a compiled ramp to a single-band raster through a `ColorRelief` backend.
pub struct Colorizer<'a, R: ColorRelief + ?Sized> {
    relief: &'a R,
    params: &'a ColorizeParams,
}

impl<'a, R: ColorRelief + ?Sized> Colorizer<'a, R> {
    pub fn new(relief: &'a R, params: &'a ColorizeParams) -> Self {
        Self { relief, params }
    }

    /// Colorize `input` into a staged RGBA raster under `staging_root`.
    /// `staging_root` must be on the same filesystem as the final output.
    pub fn colorize(
        &self,
        input: &Path,
        variable: &str,
        ramp: &RampTable,
        staging_root: &Path,
    ) -> Result<OutputRaster> {
        if !input.is_file() {
            return Err(Error::Colorization(ReliefError::MissingInput(
                input.to_path_buf(),
            )));
        }

        let table = ramp.to_external_table();
        debug!(
            "Relief table for ramp '{}' ({}): {} rows",
            ramp.name(),
            ramp.kind(),
            table.rows().len()
        );

        let staging = tempfile::Builder::new()
            .prefix(".wxramp-")
            .tempdir_in(staging_root)?;
        let path = staging.path().join(STAGED_NAME);

        let options = self.params.creation_options();
        let metadata = vec![
            ("WXRAMP_VARIABLE".to_string(), variable.to_string()),
            ("WXRAMP_RAMP".to_string(), ramp.name().to_string()),
            ("WXRAMP_RAMP_KIND".to_string(), ramp.kind().to_string()),
        ];

        info!("Applying color ramp '{}' to {:?}", ramp.name(), input);
        self.relief
            .color_relief(&ReliefRequest {
                input,
                output: &path,
                table: &table,
                creation_options: &options,
                metadata: &metadata,
            })
            .map_err(Error::Colorization)?;

        if !path.is_file() {
            return Err(Error::Colorization(ReliefError::Unsupported(format!(
                "backend reported success but wrote no raster for {}",
                input.display()
            ))));
        }

        Ok(OutputRaster {
            staging,
            path,
            variable: variable.to_string(),
            ramp: ramp.name().to_string(),
        })
    }
}
