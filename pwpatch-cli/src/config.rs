//! Configuration file loading for pwpatch.
//!
//! Discovers and loads `pwpatch.toml` from the working directory, or from an explicit path.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pwpatch_domain::fragments;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "pwpatch.toml";

pub const DEFAULT_BACKUP_SUFFIX: &str = ".pwpatch.bak";

/// Top-level configuration from pwpatch.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PwpatchConfig {
    pub compose: ComposeConfig,
    pub circleci: CircleCiConfig,
    pub backups: BackupsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeConfig {
    /// Service the `playwright` service is placed after.
    pub anchor_service: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircleCiConfig {
    /// Text the label of the step preceding the new step must contain.
    pub anchor_step: Option<String>,

    /// Text the label of the artifact collection step must contain.
    pub artifact_step: Option<String>,
}

/// Backups section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupsConfig {
    /// Whether to copy the original file aside before overwriting it.
    pub enabled: bool,

    /// Suffix for backup files.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// Discover the pwpatch.toml config file in `dir`.
///
/// Returns `None` if no config file is found.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a pwpatch.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<PwpatchConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<PwpatchConfig> {
    let config: PwpatchConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config if one was given, otherwise whatever is discovered in `dir`, otherwise
/// the defaults. An explicit path that doesn't exist is an error.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> anyhow::Result<PwpatchConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(PwpatchConfig::default()),
    }
}

/// Effective settings after combining the config file with CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub anchor_service: String,
    pub anchor_step: String,
    pub artifact_step: String,

    /// `Some(suffix)` when backups are on.
    pub backup_suffix: Option<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PwpatchConfig,
}

impl ConfigMerger {
    pub fn new(config: PwpatchConfig) -> Self {
        Self { config }
    }

    /// Merge with the CLI arguments.
    ///
    /// `cli_anchor` replaces the anchor of whichever patch is running, so it is applied to both
    /// the service and the step anchor; only one of them is ever read. `cli_backup` turns backups
    /// on even when the config file leaves them off.
    pub fn merge_args(self, cli_anchor: Option<&str>, cli_backup: bool) -> MergedConfig {
        let PwpatchConfig {
            compose,
            circleci,
            backups,
        } = self.config;

        let anchor_service = cli_anchor
            .map(str::to_string)
            .or(compose.anchor_service)
            .unwrap_or_else(|| fragments::DEFAULT_SERVICE_ANCHOR.to_string());
        let anchor_step = cli_anchor
            .map(str::to_string)
            .or(circleci.anchor_step)
            .unwrap_or_else(|| fragments::DEFAULT_STEP_ANCHOR.to_string());
        let artifact_step = circleci
            .artifact_step
            .unwrap_or_else(|| fragments::DEFAULT_ARTIFACT_STEP.to_string());

        let backup_suffix = (cli_backup || backups.enabled).then_some(backups.suffix);

        MergedConfig {
            anchor_service,
            anchor_step,
            artifact_step,
            backup_suffix,
        }
    }
}
