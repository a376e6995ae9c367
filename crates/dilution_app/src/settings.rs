use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dilution_engine::ExperimentConfig;
use dilution_logging::dilution_info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Built-in defaults when `path` is `None`, otherwise the RON file at `path`
/// layered over those defaults.
pub fn load(path: Option<&Path>) -> Result<ExperimentConfig, ConfigError> {
    let config = match path {
        None => ExperimentConfig::default(),
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let config = parse(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            dilution_info!("Loaded configuration from {}", path.display());
            config
        }
    };
    validate(&config)?;
    Ok(config)
}

pub fn parse(text: &str) -> Result<ExperimentConfig, ron::error::SpannedError> {
    ron::from_str(text)
}

pub fn render_default() -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(&ExperimentConfig::default(), ron::ser::PrettyConfig::new())
}

fn validate(config: &ExperimentConfig) -> Result<(), ConfigError> {
    if config.model_name.trim().is_empty() {
        return Err(ConfigError::Invalid("model_name is empty".into()));
    }
    if config.results_filename.trim().is_empty() {
        return Err(ConfigError::Invalid("results_filename is empty".into()));
    }
    if config.core_query.is_empty() {
        return Err(ConfigError::Invalid("core_query is empty".into()));
    }
    Ok(())
}
