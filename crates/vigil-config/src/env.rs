//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set. Mappings are applied in order, so when two variables map
//! to the same field the first one present wins.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VIGIL_ENCRYPTION_KEY",
        field_path: "crypto.encryption_key",
        kind: FieldKind::Text,
    },
    // Name used by earlier deployments.
    EnvMapping {
        var_name: "ENCRYPTION_KEY",
        field_path: "crypto.encryption_key",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_DATA_DIR",
        field_path: "storage.data_dir",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_UPLOAD_MAX_BYTES",
        field_path: "documents.max_upload_bytes",
        kind: FieldKind::Integer,
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply environment fallbacks to fields not in `file_fields`.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    file_fields: &mut HashSet<String>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if file_fields.contains(mapping.field_path) {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }

        let value = match mapping.kind {
            FieldKind::Text => toml::Value::String(raw.trim().to_owned()),
            FieldKind::Integer => {
                let n: i64 = raw.trim().parse().map_err(|_| ConfigError::EnvError {
                    var_name: mapping.var_name.to_owned(),
                    message: format!("expected an integer, got '{raw}'"),
                })?;
                toml::Value::Integer(n)
            },
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        file_fields.insert(mapping.field_path.to_owned());
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Set a dotted `path` in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_prefixed_key_wins_over_legacy() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut fields = HashSet::new();
        let vars = env(&[("VIGIL_ENCRYPTION_KEY", "new"), ("ENCRYPTION_KEY", "old")]);

        let applied = apply_env_fallbacks(&mut merged, &mut fields, &vars).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(
            merged["crypto"]["encryption_key"].as_str(),
            Some("new")
        );
    }

    #[test]
    fn test_file_value_is_not_overridden() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut fields = HashSet::from(["logging.level".to_owned()]);
        let vars = env(&[("VIGIL_LOG_LEVEL", "trace")]);

        apply_env_fallbacks(&mut merged, &mut fields, &vars).unwrap();
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_integer_coercion() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut fields = HashSet::new();

        apply_env_fallbacks(&mut merged, &mut fields, &env(&[("VIGIL_UPLOAD_MAX_BYTES", "1024")]))
            .unwrap();
        assert_eq!(
            merged["documents"]["max_upload_bytes"].as_integer(),
            Some(1024)
        );

        let err = apply_env_fallbacks(
            &mut toml::Value::Table(toml::map::Map::new()),
            &mut HashSet::new(),
            &env(&[("VIGIL_UPLOAD_MAX_BYTES", "lots")]),
        );
        assert!(matches!(err, Err(ConfigError::EnvError { .. })));
    }
}
