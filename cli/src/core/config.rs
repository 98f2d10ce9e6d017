//! # arcwrite Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! Loads the optional defaults file for `arcwrite create`: default format,
//! filter, block size and options string, plus an output directory that
//! relative archive names are resolved against.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (applied by the command handler, not here)
//! 2. Project-specific `.arcwrite.toml` in the current directory or its
//!    ancestors (the search stops at a directory containing `.git`)
//! 3. User-specific `config.toml` in the platform config directory
//!    (`~/.config/arcwrite/config.toml` on Linux)
//! 4. Default values defined in the code
//!
//! When `ARCWRITE_CONFIG` is set, exactly that file is loaded instead of
//! sources 2 and 3.
//!
//! Paths are expanded (`~` to the home directory) and the merged result is
//! validated before use.
//!
//! ## Examples
//!
//! ```toml
//! [create]
//! format = "zip"
//! filter = "none"
//! block_size = 65536
//! options = "zip:encryption=aes256"
//!
//! [output]
//! directory = "~/archives"
//! ```
//!
use crate::common::archive::format::{FilterCode, FormatCode};
use crate::core::error::ArchiveError;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "ARCWRITE_CONFIG";
const PROJECT_CONFIG_FILENAME: &str = ".arcwrite.toml";

/// Top-level configuration, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub create: CreateDefaults,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Defaults for `arcwrite create`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CreateDefaults {
    /// Format name (`tar`, `ustar`, `gnutar`, `pax`, `zip`, `cpio`, `odc`).
    #[serde(default = "default_format")]
    pub format: String,
    /// Filter name (`none`, `gzip`, `bzip2`, `zstd`).
    #[serde(default)]
    pub filter: Option<String>,
    /// Read chunk size, and block size for callback sinks.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Options string applied together with a passphrase.
    #[serde(default)]
    pub options: Option<String>,
}

impl Default for CreateDefaults {
    fn default() -> Self {
        CreateDefaults {
            format: default_format(),
            filter: None,
            block_size: default_block_size(),
            options: None,
        }
    }
}

/// Where archives with relative names are written.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for relative output paths (can use ~). Will be expanded.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Config {
    /// Parsed default format.
    pub fn format(&self) -> Option<FormatCode> {
        FormatCode::from_name(&self.create.format)
    }

    /// Parsed default filter, if one is configured.
    pub fn filter(&self) -> Option<FilterCode> {
        self.create.filter.as_deref().and_then(FilterCode::from_name)
    }

    /// Resolves an output path against `output.directory`. Absolute paths
    /// and `-` (stdout) are returned unchanged.
    pub fn resolve_output(&self, output: &Path) -> PathBuf {
        match &self.output.directory {
            Some(dir) if output.is_relative() && output != Path::new("-") => {
                Path::new(dir).join(output)
            }
            _ => output.to_path_buf(),
        }
    }
}

fn default_format() -> String {
    "tar".to_string()
}

fn default_block_size() -> usize {
    crate::pipeline::DEFAULT_BLOCK_SIZE
}

/// Loads, merges, expands and validates the configuration.
pub fn load_config() -> Result<Config> {
    let mut merged_config = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(explicit) => {
            let path = PathBuf::from(explicit);
            info!("Loading configuration from {}: {}", CONFIG_ENV_VAR, path.display());
            load_config_from_path(&path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "arcwrite", "arcwrite") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.arcwrite.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the built-in default.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let Some(project) = project else {
        return user;
    };
    let defaults = CreateDefaults::default();
    Config {
        create: CreateDefaults {
            format: if project.create.format != defaults.format {
                project.create.format
            } else {
                user.create.format
            },
            filter: project.create.filter.or(user.create.filter),
            block_size: if project.create.block_size != defaults.block_size {
                project.create.block_size
            } else {
                user.create.block_size
            },
            options: project.create.options.or(user.create.options),
        },
        output: OutputConfig {
            directory: project.output.directory.or(user.output.directory),
        },
    }
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dir) = config.output.directory.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded output directory: {}", dir);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    if config.format().is_none() {
        return Err(anyhow!(ArchiveError::Config(format!(
            "Unknown archive format '{}'.",
            config.create.format
        ))));
    }
    if let Some(filter) = &config.create.filter {
        if FilterCode::from_name(filter).is_none() {
            return Err(anyhow!(ArchiveError::Config(format!(
                "Unknown filter '{}'.",
                filter
            ))));
        }
    }
    if config.create.block_size == 0 {
        return Err(anyhow!(ArchiveError::Config(
            "block_size must be greater than zero.".to_string()
        )));
    }
    if let Some(dir) = &config.output.directory {
        let dir = Path::new(dir);
        if dir.exists() && !dir.is_dir() {
            return Err(anyhow!(ArchiveError::Config(format!(
                "Configured output path '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [create]
            format = "zip"
            block_size = 4096
            options = "zip:encryption=aes256"

            [output]
            directory = "~/archives"
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.format(), Some(FormatCode::Zip));
        assert_eq!(config.filter(), None);
        assert_eq!(config.create.block_size, 4096);
        assert_eq!(config.create.options.as_deref(), Some("zip:encryption=aes256"));
        assert_eq!(config.output.directory.as_deref(), Some("~/archives")); // Not yet expanded
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[create]\nlevel = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let user = Config {
            create: CreateDefaults {
                format: "zip".into(),
                filter: Some("gzip".into()),
                ..Default::default()
            },
            output: OutputConfig {
                directory: Some("/user/out".into()),
            },
        };
        let project = Config {
            create: CreateDefaults {
                block_size: 512,
                filter: Some("zstd".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = merge_configs(user, Some(project));
        assert_eq!(merged.create.format, "zip"); // project left the default
        assert_eq!(merged.create.filter.as_deref(), Some("zstd"));
        assert_eq!(merged.create.block_size, 512);
        assert_eq!(merged.output.directory.as_deref(), Some("/user/out"));
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            output: OutputConfig {
                directory: Some("~/out".into()),
            },
            ..Default::default()
        };
        expand_config_paths(&mut config);
        let expanded = config.output.directory.unwrap();
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("out"));
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&Config::default()).is_ok());

        let bad_format = Config {
            create: CreateDefaults {
                format: "rar".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&bad_format).unwrap_err();
        assert!(err.to_string().contains("Unknown archive format"));

        let zero_block = Config {
            create: CreateDefaults {
                block_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&zero_block).is_err());
    }

    #[test]
    fn test_validate_output_dir_is_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "").unwrap();
        let config = Config {
            output: OutputConfig {
                directory: Some(file_path.to_string_lossy().to_string()),
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_find_project_config_stops_at_git() {
        let root = tempdir().unwrap();
        let nested = root.path().join("repo/sub");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(root.path().join("repo/.git")).unwrap();
        // Above the repository root; must not be found.
        fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(find_project_config_path(&nested), None);

        fs::write(root.path().join("repo").join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            find_project_config_path(&nested),
            Some(root.path().join("repo").join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_resolve_output() {
        let config = Config {
            output: OutputConfig {
                directory: Some("/archives".into()),
            },
            ..Default::default()
        };
        assert_eq!(config.resolve_output(Path::new("a.tar")), PathBuf::from("/archives/a.tar"));
        assert_eq!(config.resolve_output(Path::new("/tmp/a.tar")), PathBuf::from("/tmp/a.tar"));
        assert_eq!(config.resolve_output(Path::new("-")), PathBuf::from("-"));
    }
}
