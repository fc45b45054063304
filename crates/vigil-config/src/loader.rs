//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file: an explicit path, or `$VIGIL_HOME/config.toml`,
//!    or `config.toml` in the platform config directory
//! 3. Apply env var fallbacks for fields the file did not set
//! 4. Deserialize merged tree → `Config`
//! 5. Validate

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The validated configuration.
    pub config: Config,
    /// Config files merged, in order.
    pub loaded_files: Vec<PathBuf>,
    /// Number of environment fallbacks applied.
    pub env_applied: usize,
}

/// Load configuration from the process environment.
///
/// `explicit` must exist when given. Without it, the discovered file is
/// optional.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, or if the
/// final configuration fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, &collect_env_vars())
}

/// Load configuration against a given environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    explicit: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut file_fields = HashSet::new();
    let mut loaded_files = Vec::new();

    // 2. Config file.
    let overlay = if let Some(path) = explicit {
        let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        Some((value, path.to_path_buf()))
    } else if let Some(path) = discover(env_vars) {
        try_load_file(&path)?.map(|value| (value, path))
    } else {
        None
    };

    if let Some((value, path)) = overlay {
        deep_merge_tracking(&mut merged, &value, "", &mut file_fields);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path);
    }

    // 3. Env var fallbacks for unset fields.
    let env_applied = apply_env_fallbacks(&mut merged, &mut file_fields, env_vars)?;
    if env_applied > 0 {
        debug!(count = env_applied, "applied environment variable fallbacks");
    }

    // 4. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
        env_applied,
    })
}

/// `$VIGIL_HOME/config.toml`, else the platform config directory.
fn discover<S: ::std::hash::BuildHasher>(env_vars: &HashMap<String, String, S>) -> Option<PathBuf> {
    if let Some(home) = env_vars.get("VIGIL_HOME").filter(|h| !h.is_empty()) {
        return Some(PathBuf::from(home).join("config.toml"));
    }
    directories::ProjectDirs::from("", "", "vigil")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if u64::try_from(content.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Deep-merge `overlay` into `base`, recording every leaf path it sets.
///
/// Tables merge per field; scalars and arrays replace.
fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    fields: &mut HashSet<String>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                let both_tables = overlay_val.is_table()
                    && base_table.get(key).is_some_and(toml::Value::is_table);
                if both_tables {
                    if let Some(base_val) = base_table.get_mut(key) {
                        deep_merge_tracking(base_val, overlay_val, &path, fields);
                    }
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, fields);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            fields.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, path: &str, fields: &mut HashSet<String>) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &format!("{path}.{key}"), fields);
        }
    } else {
        fields.insert(path.to_owned());
    }
}
