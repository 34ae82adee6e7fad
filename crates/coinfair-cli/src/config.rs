use coinfair_core::grid::{BiasGrid, STANDARD_LOWER, STANDARD_POINTS, STANDARD_UPPER};
use coinfair_core::prior::{DEFAULT_GAUSSIAN_MEAN, DEFAULT_GAUSSIAN_STD_DEV, Prior};
use coinfair_core::sweep::DEFAULT_MAX_TOSSES;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_RUN_ID: &str = "coinfair";
const DEFAULT_TOSSES: usize = 100;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root configuration loaded from YAML. Every section is optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LabConfig {
    #[serde(default = "default_run_id")]
    pub run_id: String,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub prior: PriorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            run_id: default_run_id(),
            grid: GridConfig::default(),
            prior: PriorConfig::default(),
            simulation: SimulationConfig::default(),
            outputs: OutputsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LabConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: LabConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.grid.build()?;
        self.prior.build()?;
        self.simulation.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
            summary_json: resolve_template(&self.run_id, &self.outputs.summary_json),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

fn default_run_id() -> String {
    DEFAULT_RUN_ID.to_string()
}

/// Support grid for the bias parameter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GridConfig {
    #[serde(default = "default_grid_points")]
    pub points: usize,
    #[serde(default = "default_grid_lower")]
    pub lower: f64,
    #[serde(default = "default_grid_upper")]
    pub upper: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            points: default_grid_points(),
            lower: default_grid_lower(),
            upper: default_grid_upper(),
        }
    }
}

impl GridConfig {
    pub fn build(&self) -> Result<BiasGrid, ValidationError> {
        BiasGrid::linspace(self.lower, self.upper, self.points).map_err(|err| {
            ValidationError::InvalidField {
                field: "grid".to_string(),
                message: err.to_string(),
            }
        })
    }
}

fn default_grid_points() -> usize {
    STANDARD_POINTS
}

fn default_grid_lower() -> f64 {
    STANDARD_LOWER
}

fn default_grid_upper() -> f64 {
    STANDARD_UPPER
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PriorKind {
    #[default]
    Uniform,
    Gaussian,
}

/// Prior selection; `mean`/`std_dev` only apply to the Gaussian kind.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PriorConfig {
    #[serde(default)]
    pub kind: PriorKind,
    #[serde(default = "default_prior_mean")]
    pub mean: f64,
    #[serde(default = "default_prior_std_dev")]
    pub std_dev: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            kind: PriorKind::default(),
            mean: default_prior_mean(),
            std_dev: default_prior_std_dev(),
        }
    }
}

impl PriorConfig {
    pub fn build(&self) -> Result<Prior, ValidationError> {
        self.build_kind(self.kind)
    }

    /// Build a prior of `kind` using this block's Gaussian parameters.
    pub fn build_kind(&self, kind: PriorKind) -> Result<Prior, ValidationError> {
        match kind {
            PriorKind::Uniform => Ok(Prior::Uniform),
            PriorKind::Gaussian => Prior::gaussian(self.mean, self.std_dev).map_err(|err| {
                ValidationError::InvalidField {
                    field: "prior".to_string(),
                    message: err.to_string(),
                }
            }),
        }
    }
}

fn default_prior_mean() -> f64 {
    DEFAULT_GAUSSIAN_MEAN
}

fn default_prior_std_dev() -> f64 {
    DEFAULT_GAUSSIAN_STD_DEV
}

/// Toss simulation block.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_pheads")]
    pub pheads: f64,
    #[serde(default = "default_tosses")]
    pub tosses: usize,
    #[serde(default = "default_max_tosses")]
    pub max_tosses: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pheads: default_pheads(),
            tosses: default_tosses(),
            max_tosses: default_max_tosses(),
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.pheads) {
            return Err(ValidationError::InvalidField {
                field: "simulation.pheads".to_string(),
                message: format!("probability of heads must lie in [0, 1], got {}", self.pheads),
            });
        }

        if self.max_tosses == 0 {
            return Err(ValidationError::InvalidField {
                field: "simulation.max_tosses".to_string(),
                message: "max_tosses must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_pheads() -> f64 {
    0.5
}

fn default_tosses() -> usize {
    DEFAULT_TOSSES
}

fn default_max_tosses() -> usize {
    DEFAULT_MAX_TOSSES
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    #[serde(default = "default_plots_dir")]
    pub plots_dir: String,
    #[serde(default = "default_summary_json")]
    pub summary_json: String,
    #[serde(default = "default_summary_md")]
    pub summary_md: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            plots_dir: default_plots_dir(),
            summary_json: default_summary_json(),
            summary_md: default_summary_md(),
        }
    }
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.plots_dir", &self.plots_dir),
            ("outputs.summary_json", &self.summary_json),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn default_plots_dir() -> String {
    "out/{run_id}/plots".to_string()
}

fn default_summary_json() -> String {
    "out/{run_id}/summary.json".to_string()
}

fn default_summary_md() -> String {
    "out/{run_id}/summary.md".to_string()
}

/// Structured logs are off by default; human-readable logs go to stderr.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "warn".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub plots_dir: PathBuf,
    pub summary_json: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
