//! Maps an input raster to the catalogue variable that colors it.
//!
//! Filenames follow `{variable}_{model}.{date}.{cycle}.{forecast}.{ext}`. The
//! variable is the longest `_`-joined prefix of the name, stopping before the
//! first model segment, that names an enabled catalogue variable.
use std::path::Path;

use tracing::debug;

use crate::core::config::RampConfig;
use crate::error::{Error, Result};

pub const COLORED_SUFFIX: &str = "_colored";

pub struct VariableResolver<'a> {
    config: &'a RampConfig,
}

impl<'a> VariableResolver<'a> {
    pub fn new(config: &'a RampConfig) -> Self {
        Self { config }
    }

    /// An explicit name always wins over inference, but must exist.
    pub fn resolve(&self, input: &Path, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit {
            self.config.lookup_variable(name)?;
            return Ok(name.to_string());
        }

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.infer(&file_name) {
            Some(name) => {
                debug!("Inferred variable '{}' from {}", name, file_name);
                Ok(name.to_string())
            }
            None => Err(Error::VariableInference { file: file_name }),
        }
    }

    pub fn infer(&self, file_name: &str) -> Option<&'a str> {
        // Everything after the first '.' is date/cycle/forecast/extension.
        let head = file_name.split('.').next().unwrap_or("");
        let head = head.strip_suffix(COLORED_SUFFIX).unwrap_or(head);
        if head.is_empty() {
            return None;
        }

        let parts: Vec<&str> = head.split('_').collect();
        let limit = parts
            .iter()
            .position(|p| self.config.models().iter().any(|m| m == p))
            .unwrap_or(parts.len());

        (1..=limit).rev().find_map(|n| {
            let candidate = parts[..n].join("_");
            self.config
                .variables()
                .find(|v| v.enabled && v.name == candidate)
                .map(|v| v.name.as_str())
        })
    }
}
