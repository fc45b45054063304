//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crypto(config)?;
    validate_ledger(config)?;
    validate_documents(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_crypto(config: &Config) -> ConfigResult<()> {
    match config.crypto.encryption_key.as_deref().map(str::trim) {
        None | Some("") => Err(invalid(
            "crypto.encryption_key",
            "no encryption key configured; set VIGIL_ENCRYPTION_KEY",
        )),
        Some(_) => Ok(()),
    }
}

fn validate_ledger(config: &Config) -> ConfigResult<()> {
    let l = &config.ledger;
    if l.append_timeout_ms == 0 {
        return Err(invalid("ledger.append_timeout_ms", "must be greater than 0"));
    }
    if l.max_list_limit == 0 {
        return Err(invalid("ledger.max_list_limit", "must be greater than 0"));
    }
    if l.default_list_limit == 0 || l.default_list_limit > l.max_list_limit {
        return Err(invalid(
            "ledger.default_list_limit",
            format!("must be between 1 and max_list_limit ({})", l.max_list_limit),
        ));
    }
    Ok(())
}

fn validate_documents(config: &Config) -> ConfigResult<()> {
    let d = &config.documents;
    if d.max_upload_bytes == 0 {
        return Err(invalid("documents.max_upload_bytes", "must be greater than 0"));
    }
    if d.allowed_mime_types.is_empty() {
        return Err(invalid(
            "documents.allowed_mime_types",
            "at least one MIME type must be allowed",
        ));
    }
    for (field, level) in [
        ("documents.default_required_clearance", d.default_required_clearance),
        ("documents.min_download_clearance", d.min_download_clearance),
    ] {
        if !(1..=5).contains(&level) {
            return Err(invalid(field, format!("{level} is out of range; must be 1-5")));
        }
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> Config {
        let mut config = Config::default();
        config.crypto.encryption_key = Some("k".into());
        config
    }

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_with_key_are_valid() {
        validate(&keyed()).unwrap();
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert_eq!(field_of(validate(&Config::default())), "crypto.encryption_key");
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = keyed();
        config.documents.default_required_clearance = 6;
        assert_eq!(
            field_of(validate(&config)),
            "documents.default_required_clearance"
        );

        let mut config = keyed();
        config.documents.min_download_clearance = 0;
        assert_eq!(
            field_of(validate(&config)),
            "documents.min_download_clearance"
        );

        let mut config = keyed();
        config.ledger.default_list_limit = 501;
        assert_eq!(field_of(validate(&config)), "ledger.default_list_limit");

        let mut config = keyed();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
