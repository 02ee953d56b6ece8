//! `inkstream-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema (endpoint selection, typewriter pacing, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with field paths

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use schema::{EndpointConfig, Environment, InkstreamConfig, LoggingConfig, TypewriterSettings};
pub use io::{config_dir, config_file_path, load_config, load_config_value};
pub use env::{
    collect_referenced_vars, contains_env_var_reference, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use defaults::apply_all_defaults;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use inkstream_core::InkError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<InkstreamConfig> {
    let raw = load_config_value(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    prepare(value)
}

/// Same as [`load_and_prepare`] with an explicit variable map.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<InkstreamConfig> {
    let raw = load_config_value(path).await?;
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;
    prepare(value)
}

fn prepare(value: Value) -> Result<InkstreamConfig> {
    let config: InkstreamConfig =
        serde_json::from_value(value).context("Failed to deserialize config after env substitution")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        return Err(InkError::Config(first.to_string()).into());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn prepares_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(
            &path,
            "endpoint:\n  environment: prod\n  prodBaseUrl: \"${INKSTREAM_API_PROD}\"\n",
        )
        .unwrap();

        let cfg = load_and_prepare_with(&path, &vars(&[("INKSTREAM_API_PROD", "https://api.example.com/")]))
            .await
            .unwrap();
        assert_eq!(
            cfg.endpoint.url().unwrap(),
            "https://api.example.com/agent/DeepSeek/chatStream"
        );
        assert_eq!(cfg.typewriter.max_delay_ms, Some(defaults::DEFAULT_MAX_DELAY_MS));
    }

    #[tokio::test]
    async fn environment_can_come_from_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "endpoint:\n  environment: \"${INKSTREAM_ENV}\"\n").unwrap();

        let cfg = load_and_prepare_with(&path, &vars(&[("INKSTREAM_ENV", "dev")]))
            .await
            .unwrap();
        assert_eq!(cfg.endpoint.environment(), Environment::Dev);
        assert_eq!(
            cfg.endpoint.url().unwrap(),
            "http://localhost:8080/agent/DeepSeek/chatStream"
        );
    }

    #[tokio::test]
    async fn validation_error_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "typewriter:\n  budgetMs: 0\n").unwrap();

        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("typewriter.budgetMs"));
        assert!(matches!(err.downcast_ref::<InkError>(), Some(InkError::Config(_))));
    }

    #[tokio::test]
    async fn missing_env_var_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "endpoint:\n  prodBaseUrl: \"${NOPE}\"\n").unwrap();

        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("NOPE"));
    }
}
