//! # Configuration Loading
//!
//! Builds the run's `VintageConfig` from three layers, later layers winning:
//! 1. `vintage.toml` (or the file given with `--config`)
//! 2. `VINTAGE_DB_PATH`, `VINTAGE_BACKEND`, `VINTAGE_NAMESPACE`
//! 3. `--database` and `--backend`

use std::path::{Path, PathBuf};
use vintage_core::{BackendKind, VintageConfig, VintageError};

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "vintage.toml";

/// Command line values that override the file and the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub backend: Option<String>,
}

/// Load, layer and validate the configuration for this run.
pub fn load(overrides: &Overrides) -> Result<VintageConfig, VintageError> {
    let mut config = match &overrides.config {
        Some(path) => read_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            read_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => VintageConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;
    apply_overrides(&mut config, overrides)?;
    config.validate()?;

    tracing::debug!(
        backend = %config.storage.backend,
        path = %config.storage.path.display(),
        namespace = %config.reconciler.namespace,
        "configuration loaded"
    );
    Ok(config)
}

fn read_file(path: &Path) -> Result<VintageConfig, VintageError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        VintageError::Io(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    parse(&text)
}

/// Parse a TOML configuration document.
pub fn parse(text: &str) -> Result<VintageConfig, VintageError> {
    toml::from_str(text).map_err(|e| VintageError::Config(e.to_string()))
}

/// Apply environment overrides, reading variables through `var`.
pub fn apply_env(
    config: &mut VintageConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), VintageError> {
    if let Some(path) = var("VINTAGE_DB_PATH") {
        config.storage.path = PathBuf::from(path);
    }
    if let Some(backend) = var("VINTAGE_BACKEND") {
        config.storage.backend = backend.parse::<BackendKind>()?;
    }
    if let Some(namespace) = var("VINTAGE_NAMESPACE") {
        config.reconciler.namespace = namespace;
    }
    Ok(())
}

fn apply_overrides(config: &mut VintageConfig, overrides: &Overrides) -> Result<(), VintageError> {
    if let Some(path) = &overrides.database {
        config.storage.path.clone_from(path);
    }
    if let Some(backend) = &overrides.backend {
        config.storage.backend = backend.parse::<BackendKind>()?;
    }
    Ok(())
}
