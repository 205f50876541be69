//! Backend that shells out to the GDAL command-line utilities.
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::io::relief::{
    ColorRelief, OverviewBuilder, OverviewRequest, RasterBackend, ReliefError, ReliefRequest,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `gdaldem color-relief` and `gdaladdo`, optionally bounded by a timeout.
#[derive(Debug, Clone)]
pub struct GdalToolsBackend {
    pub gdaldem: PathBuf,
    pub gdaladdo: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for GdalToolsBackend {
    fn default() -> Self {
        Self {
            gdaldem: PathBuf::from("gdaldem"),
            gdaladdo: PathBuf::from("gdaladdo"),
            timeout: None,
        }
    }
}

impl GdalToolsBackend {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, program: &Path, args: &[OsString]) -> Result<(), ReliefError> {
        let tool = program.display().to_string();
        debug!(
            "Running: {} {}",
            tool,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ReliefError::Unavailable {
                tool: tool.clone(),
                source,
            })?;

        // Drain stderr on a separate thread so a chatty tool cannot block on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => {
                let started = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if started.elapsed() >= timeout {
                        warn!("{} exceeded {:?}, killing it", tool, timeout);
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ReliefError::Timeout { tool, timeout });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(ReliefError::Failed {
                tool,
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl ColorRelief for GdalToolsBackend {
    fn color_relief(&self, request: &ReliefRequest<'_>) -> Result<(), ReliefError> {
        if !request.input.exists() {
            return Err(ReliefError::MissingInput(request.input.to_path_buf()));
        }

        let mut color_file = tempfile::Builder::new()
            .prefix("color_ramp")
            .suffix(".txt")
            .tempfile()?;
        color_file.write_all(request.table.to_color_relief_text().as_bytes())?;
        color_file.flush()?;

        let mut args: Vec<OsString> = vec![
            "color-relief".into(),
            request.input.into(),
            color_file.path().into(),
            request.output.into(),
            "-alpha".into(),
            "-of".into(),
            "GTiff".into(),
        ];
        for opt in request.creation_options {
            args.push("-co".into());
            args.push(opt.into());
        }
        if !request.metadata.is_empty() {
            debug!("gdaldem cannot embed metadata; skipping {} item(s)", request.metadata.len());
        }
        self.run(&self.gdaldem, &args)
    }
}

impl OverviewBuilder for GdalToolsBackend {
    fn build_overviews(&self, request: &OverviewRequest<'_>) -> Result<(), ReliefError> {
        self.run(&self.gdaladdo, &gdaladdo_args(request))
    }
}

fn gdaladdo_args(request: &OverviewRequest<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--config".into(),
        "GDAL_NUM_THREADS".into(),
        request.num_threads.into(),
        "-r".into(),
        request.resampling.to_ascii_lowercase().into(),
        request.path.into(),
    ];
    args.extend(request.factors.iter().map(|f| OsString::from(f.to_string())));
    args
}

impl RasterBackend for GdalToolsBackend {
    fn name(&self) -> &'static str {
        "gdal-tools"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(path: &'a Path, factors: &'a [u32]) -> OverviewRequest<'a> {
        OverviewRequest {
            path,
            resampling: "AVERAGE",
            factors,
            num_threads: "ALL_CPUS",
        }
    }

    #[test]
    fn gdaladdo_gets_thread_count_and_factors() {
        let args = gdaladdo_args(&request(Path::new("/out/staged.tif"), &[2, 4, 8, 16]));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "--config",
                "GDAL_NUM_THREADS",
                "ALL_CPUS",
                "-r",
                "average",
                "/out/staged.tif",
                "2",
                "4",
                "8",
                "16"
            ]
        );
    }

    #[test]
    fn missing_tool_is_unavailable() {
        let backend = GdalToolsBackend {
            gdaladdo: PathBuf::from("/nonexistent/gdaladdo-wxramp"),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.tif");
        let err = backend
            .build_overviews(&request(&path, &[2, 4]))
            .unwrap_err();
        assert!(matches!(err, ReliefError::Unavailable { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let backend = GdalToolsBackend {
            gdaladdo: PathBuf::from("false"),
            ..Default::default()
        };
        let err = backend
            .build_overviews(&request(Path::new("x.tif"), &[2]))
            .unwrap_err();
        assert!(matches!(err, ReliefError::Failed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn slow_tool_times_out() {
        let backend = GdalToolsBackend::default().with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let err = backend
            .run(Path::new("sleep"), &[OsString::from("5")])
            .unwrap_err();
        assert!(matches!(err, ReliefError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
