//! Color-ramp and variable catalogue.
//!
//! The catalogue is a YAML document with a `color_ramps` table and a
//! `variables` table (plus an optional `models` list used for filename
//! inference). Loading validates everything up front so a `RampConfig` value
//! is always internally consistent; it is immutable afterwards and shared by
//! reference across a batch.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{RampKind, Rgb};

/// Model identifiers recognised in filenames when the catalogue lists none.
pub const DEFAULT_MODELS: &[&str] = &["hrrr", "gfs"];

const NO_VARIABLES: &str = "no variables defined";

#[derive(Debug, Deserialize)]
struct RawCatalogue {
    #[serde(default)]
    models: Option<Vec<String>>,
    #[serde(default)]
    color_ramps: BTreeMap<String, RawRamp>,
    #[serde(default)]
    variables: BTreeMap<String, RawVariable>,
}

#[derive(Debug, Deserialize)]
struct RawRamp {
    #[serde(rename = "type", default)]
    kind: RampKind,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    colors: Vec<RawStop>,
}

#[derive(Debug, Deserialize)]
struct RawStop {
    value: f64,
    color: String,
}

#[derive(Debug, Deserialize)]
struct RawVariable {
    #[serde(default)]
    color_ramp: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    units_display: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    priority: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

/// One (value, color) knot of a ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub value: f64,
    pub color: Rgb,
}

impl Breakpoint {
    pub fn new(value: f64, color: Rgb) -> Self {
        Self { value, color }
    }
}

/// A named, validated color ramp: at least two breakpoints, strictly
/// increasing and finite in value.
#[derive(Debug, Clone, PartialEq)]
pub struct RampDefinition {
    name: String,
    kind: RampKind,
    description: Option<String>,
    breakpoints: Vec<Breakpoint>,
}

impl RampDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: RampKind,
        breakpoints: Vec<Breakpoint>,
    ) -> Result<Self> {
        let name = name.into();
        let issues = breakpoint_issues(&name, &breakpoints);
        if !issues.is_empty() {
            return Err(Error::Config(issues.join("; ")));
        }
        Ok(Self {
            name,
            kind,
            description: None,
            breakpoints,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RampKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Value domain covered by the breakpoints.
    pub fn domain(&self) -> (f64, f64) {
        let first = self.breakpoints[0].value;
        let last = self.breakpoints[self.breakpoints.len() - 1].value;
        (first, last)
    }
}

fn breakpoint_issues(name: &str, breakpoints: &[Breakpoint]) -> Vec<String> {
    let mut issues = Vec::new();
    if breakpoints.len() < 2 {
        issues.push(format!(
            "ramp '{}' needs at least two breakpoints, found {}",
            name,
            breakpoints.len()
        ));
    }
    for bp in breakpoints {
        if !bp.value.is_finite() {
            issues.push(format!("ramp '{}' has a non-finite breakpoint value", name));
        }
    }
    for pair in breakpoints.windows(2) {
        if !(pair[0].value < pair[1].value) {
            issues.push(format!(
                "ramp '{}' breakpoints must be strictly increasing ({} followed by {})",
                name, pair[0].value, pair[1].value
            ));
        }
    }
    issues
}

/// Binding of a logical variable name to a ramp plus display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    pub name: String,
    pub ramp_name: String,
    pub display_name: Option<String>,
    pub units: Option<String>,
    /// Disabled variables still resolve by explicit name but are never inferred.
    pub enabled: bool,
    pub priority: Option<u32>,
}

/// The loaded, validated catalogue.
#[derive(Debug, Clone)]
pub struct RampConfig {
    ramps: BTreeMap<String, RampDefinition>,
    variables: BTreeMap<String, VariableEntry>,
    models: Vec<String>,
    source: Option<PathBuf>,
}

impl RampConfig {
    /// Load and validate a catalogue file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read catalogue {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        config.source = Some(path.to_path_buf());
        debug!(
            "Loaded {} ramps and {} variables from {:?}",
            config.ramps.len(),
            config.variables.len(),
            path
        );
        Ok(config)
    }

    /// Parse and validate a catalogue held in memory.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawCatalogue = serde_yaml::from_str(text).map_err(Error::config)?;
        Self::from_raw(raw)
    }

    /// Build a catalogue from already-validated parts.
    pub fn from_parts(
        ramps: impl IntoIterator<Item = RampDefinition>,
        variables: impl IntoIterator<Item = VariableEntry>,
    ) -> Result<Self> {
        let ramps: BTreeMap<String, RampDefinition> =
            ramps.into_iter().map(|r| (r.name.clone(), r)).collect();
        let variables: BTreeMap<String, VariableEntry> =
            variables.into_iter().map(|v| (v.name.clone(), v)).collect();

        let mut issues = reference_issues(&ramps, &variables);
        if variables.is_empty() {
            issues.push(NO_VARIABLES.to_string());
        }
        if !issues.is_empty() {
            return Err(Error::Config(issues.join("; ")));
        }

        Ok(Self {
            ramps,
            variables,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            source: None,
        })
    }

    fn from_raw(raw: RawCatalogue) -> Result<Self> {
        let mut issues = Vec::new();

        let declared: BTreeSet<String> = raw.color_ramps.keys().cloned().collect();
        let mut ramps = BTreeMap::new();
        for (name, ramp) in raw.color_ramps {
            let mut breakpoints = Vec::with_capacity(ramp.colors.len());
            let mut colors_ok = true;
            for stop in &ramp.colors {
                match Rgb::from_hex(&stop.color) {
                    Some(color) => breakpoints.push(Breakpoint::new(stop.value, color)),
                    None => {
                        colors_ok = false;
                        issues.push(format!(
                            "ramp '{}' has invalid color '{}' at value {}",
                            name, stop.color, stop.value
                        ));
                    }
                }
            }
            if !colors_ok {
                continue;
            }
            let found = breakpoint_issues(&name, &breakpoints);
            if !found.is_empty() {
                issues.extend(found);
                continue;
            }
            ramps.insert(
                name.clone(),
                RampDefinition {
                    name,
                    kind: ramp.kind,
                    description: ramp.description,
                    breakpoints,
                },
            );
        }

        let mut variables = BTreeMap::new();
        for (name, var) in raw.variables {
            let Some(ramp_name) = var.color_ramp else {
                issues.push(format!("variable '{}' has no color_ramp", name));
                continue;
            };
            variables.insert(
                name.clone(),
                VariableEntry {
                    name,
                    ramp_name,
                    display_name: var.display_name,
                    units: var.units_display,
                    enabled: var.enabled,
                    priority: var.priority,
                },
            );
        }
        if variables.is_empty() && issues.is_empty() {
            issues.push(NO_VARIABLES.to_string());
        }

        let models = match raw.models {
            Some(models) => {
                if models.iter().any(|m| m.trim().is_empty()) {
                    issues.push("model identifiers must not be empty".to_string());
                }
                models
            }
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        // A declared ramp that failed validation has already been reported.
        for var in variables.values() {
            if !declared.contains(&var.ramp_name) {
                issues.push(format!(
                    "variable '{}' references undefined color ramp '{}'",
                    var.name, var.ramp_name
                ));
            }
        }

        if !issues.is_empty() {
            return Err(Error::Config(issues.join("; ")));
        }

        Ok(Self {
            ramps,
            variables,
            models,
            source: None,
        })
    }

    pub fn lookup_variable(&self, name: &str) -> Result<&VariableEntry> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    pub fn lookup_ramp(&self, name: &str) -> Result<&RampDefinition> {
        self.ramps
            .get(name)
            .ok_or_else(|| Error::UnknownRamp(name.to_string()))
    }

    /// Ramp bound to `variable`.
    pub fn ramp_for(&self, variable: &str) -> Result<&RampDefinition> {
        let entry = self.lookup_variable(variable)?;
        self.lookup_ramp(&entry.ramp_name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableEntry> {
        self.variables.values()
    }

    pub fn ramps(&self) -> impl Iterator<Item = &RampDefinition> {
        self.ramps.values()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Human-readable listing of ramps and variables grouped by priority.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Color Ramp Catalogue");
        let _ = writeln!(out, "{}", rule);
        if let Some(src) = &self.source {
            let _ = writeln!(out, "Source: {}", src.display());
        }
        let _ = writeln!(out, "Models: {}", self.models.join(", "));
        let _ = writeln!(out, "Ramps: {}", self.ramps.len());
        for ramp in self.ramps.values() {
            let (lo, hi) = ramp.domain();
            let _ = writeln!(
                out,
                "  - {:25} | {:9} | {} stops | {} .. {}",
                ramp.name,
                ramp.kind.to_string(),
                ramp.breakpoints.len(),
                lo,
                hi
            );
        }

        let enabled = self.variables.values().filter(|v| v.enabled).count();
        let _ = writeln!(
            out,
            "Variables: {} ({} enabled)",
            self.variables.len(),
            enabled
        );
        let mut by_priority: BTreeMap<u32, Vec<&VariableEntry>> = BTreeMap::new();
        for var in self.variables.values() {
            by_priority
                .entry(var.priority.unwrap_or(u32::MAX))
                .or_default()
                .push(var);
        }
        for (priority, vars) in by_priority {
            if priority == u32::MAX {
                let _ = writeln!(out, "Unprioritised:");
            } else {
                let _ = writeln!(out, "Priority {}:", priority);
            }
            for var in vars {
                let _ = writeln!(
                    out,
                    "  {} {:25} | {:30} | ramp={} {}",
                    if var.enabled { "+" } else { "-" },
                    var.name,
                    var.display_name.as_deref().unwrap_or("N/A"),
                    var.ramp_name,
                    var.units.as_deref().unwrap_or("")
                );
            }
        }
        let _ = write!(out, "{}", rule);
        out
    }
}

fn reference_issues(
    ramps: &BTreeMap<String, RampDefinition>,
    variables: &BTreeMap<String, VariableEntry>,
) -> Vec<String> {
    variables
        .values()
        .filter(|v| !ramps.contains_key(&v.ramp_name))
        .map(|v| {
            format!(
                "variable '{}' references undefined color ramp '{}'",
                v.name, v.ramp_name
            )
        })
        .collect()
}
