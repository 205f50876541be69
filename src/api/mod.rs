//! High-level, ergonomic library API: colorize one raster or a directory of
//! rasters, collecting per-file outcomes into a `BatchReport`. Prefer these
//! entrypoints over the low-level `core` modules when integrating wxramp.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::config::RampConfig;
use crate::core::params::ColorizeParams;
use crate::core::processing::{Colorizer, OutputFinisher};
use crate::core::ramp::RampTable;
use crate::core::resolver::{COLORED_SUFFIX, VariableResolver};
use crate::error::{Error, Result};
use crate::io::relief::RasterBackend;
use crate::types::Stage;

/// Raster extensions picked up when the input is a directory.
pub const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Failure,
}

/// What happened to one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub variable: Option<String>,
    pub output: Option<PathBuf>,
    pub status: FileStatus,
    /// Stage that failed, for failures
    pub stage: Option<Stage>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Aggregate of a batch invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(started_at: DateTime<Utc>, outcomes: Vec<FileOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            started_at,
            finished_at: Utc::now(),
            attempted: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Io(e.into()))
    }

    /// Log the summary: counts, then one line per file.
    pub fn log_summary(&self) {
        let rule = "=".repeat(60);
        info!("{}", rule);
        info!("Processing Summary");
        info!("{}", rule);
        info!("Total files processed: {}", self.attempted);
        info!("Successful: {}", self.succeeded);
        info!("Failed: {}", self.failed);
        for outcome in &self.outcomes {
            match (&outcome.output, &outcome.error) {
                (Some(out), _) if outcome.is_success() => {
                    info!("  ok   {:?} -> {:?}", outcome.input, out)
                }
                (_, err) => warn!(
                    "  FAIL {:?} [{}] {}",
                    outcome.input,
                    outcome.stage.map(|s| s.to_string()).unwrap_or_default(),
                    err.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }
}

/// Output file name for `input`: `{stem}_colored.{ext}`.
pub fn colored_file_name(input: &Path) -> Option<String> {
    let stem = input.file_stem()?.to_string_lossy();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tif".to_string());
    Some(format!("{}{}.{}", stem, COLORED_SUFFIX, ext))
}

fn is_candidate_raster(path: &Path) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| RASTER_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false);
    let already_colored = path
        .file_stem()
        .map(|s| s.to_string_lossy().ends_with(COLORED_SUFFIX))
        .unwrap_or(false);
    path.is_file() && ext_ok && !already_colored
}

/// Files to process: the input itself, or the raster files directly inside
/// it sorted by file name. Previously colored outputs are skipped.
///
/// With a `variable`, a directory listing keeps only `{variable}_*` files; a
/// single file is always taken as is.
pub fn collect_inputs(input: &Path, variable: Option<&str>) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let prefix = variable.map(|v| format!("{}_", v));
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if !is_candidate_raster(&path) {
            continue;
        }
        let selected = match (&prefix, path.file_name()) {
            (None, _) => true,
            (Some(prefix), Some(name)) => name.to_string_lossy().starts_with(prefix.as_str()),
            (Some(_), None) => false,
        };
        if selected {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Default output directory: the input's parent for a file, the input itself for a directory.
pub fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_file() {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        input.to_path_buf()
    }
}

/// Runs resolve -> compile -> colorize -> finish over every input file.
///
/// Holds only shared references; the catalogue is never mutated, so separate
/// runners (or processes) can work on disjoint files concurrently.
pub struct BatchRunner<'a> {
    config: &'a RampConfig,
    backend: &'a dyn RasterBackend,
    params: ColorizeParams,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a RampConfig, backend: &'a dyn RasterBackend) -> Self {
        Self {
            config,
            backend,
            params: ColorizeParams::default(),
        }
    }

    pub fn with_params(mut self, params: ColorizeParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &ColorizeParams {
        &self.params
    }

    /// Process a file or directory. Only problems that prevent the batch from
    /// starting (missing input, unreadable directory, uncreatable output
    /// directory) are returned as errors; per-file failures land in the report.
    pub fn run(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
        explicit_variable: Option<&str>,
    ) -> Result<BatchReport> {
        let started_at = Utc::now();
        if !input.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input path does not exist: {}", input.display()),
            )));
        }
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_dir(input));
        std::fs::create_dir_all(&output_dir)?;

        let files = collect_inputs(input, explicit_variable)?;
        if files.is_empty() {
            if let Some(name) = explicit_variable {
                warn!("No {}_* raster files in {:?}", name, input);
            }
        }
        info!(
            "Found {} raster file(s) to process with backend '{}'",
            files.len(),
            self.backend.name()
        );
        info!("Output directory: {:?}", output_dir);

        let outcomes = files
            .iter()
            .map(|file| self.process_file(file, &output_dir, explicit_variable))
            .collect();
        Ok(BatchReport::from_outcomes(started_at, outcomes))
    }

    /// Run the full pipeline on one file, never failing: errors become a
    /// `Failure` outcome tagged with the stage that raised them.
    pub fn process_file(
        &self,
        input: &Path,
        output_dir: &Path,
        explicit_variable: Option<&str>,
    ) -> FileOutcome {
        let mut variable = None;
        let result = self.pipeline(input, output_dir, explicit_variable, &mut variable);
        match result {
            Ok(output) => {
                info!("Successfully processed: {:?}", input);
                FileOutcome {
                    input: input.to_path_buf(),
                    variable,
                    output: Some(output),
                    status: FileStatus::Success,
                    stage: None,
                    error: None,
                }
            }
            Err((stage, e)) => {
                warn!("Error processing {:?} at {}: {}", input, stage, e);
                FileOutcome {
                    input: input.to_path_buf(),
                    variable,
                    output: None,
                    status: FileStatus::Failure,
                    stage: Some(stage),
                    error: Some(innermost_message(&e)),
                }
            }
        }
    }

    fn pipeline(
        &self,
        input: &Path,
        output_dir: &Path,
        explicit_variable: Option<&str>,
        variable: &mut Option<String>,
    ) -> std::result::Result<PathBuf, (Stage, Error)> {
        let at = |stage: Stage| move |e: Error| (stage, e);

        let name = VariableResolver::new(self.config)
            .resolve(input, explicit_variable)
            .map_err(at(Stage::Resolve))?;
        *variable = Some(name.clone());

        let ramp = self
            .config
            .ramp_for(&name)
            .map(RampTable::compile)
            .map_err(at(Stage::Compile))?;

        let output_name = colored_file_name(input).ok_or_else(|| {
            (
                Stage::Resolve,
                Error::VariableInference {
                    file: input.display().to_string(),
                },
            )
        })?;
        let output_path = output_dir.join(output_name);

        let staged = Colorizer::new(self.backend, &self.params)
            .colorize(input, &name, &ramp, output_dir)
            .map_err(at(Stage::Colorize))?;

        OutputFinisher::new(self.backend, &self.params)
            .finish(staged, &output_path)
            .map_err(at(Stage::Finish))
    }
}

/// The error message plus its source chain, innermost last.
fn innermost_message(e: &Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}
