//! Config validation with field paths in every message.

use crate::schema::{Environment, InkstreamConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &InkstreamConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_endpoint(config, &mut report);
    validate_typewriter(config, &mut report);
    report
}

fn validate_endpoint(config: &InkstreamConfig, report: &mut ValidationReport) {
    let endpoint = &config.endpoint;

    for (path, url) in [
        ("endpoint.devBaseUrl", endpoint.dev_base_url.as_deref()),
        ("endpoint.prodBaseUrl", endpoint.prod_base_url.as_deref()),
    ] {
        let Some(url) = url else { continue };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error(path, format!("Base URL '{url}' must start with http:// or https://"));
        }
    }

    if endpoint.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
        report.error("endpoint.path", "Endpoint path cannot be empty");
    }

    if endpoint.base_url().is_none() {
        let field = match endpoint.environment() {
            Environment::Dev => "endpoint.devBaseUrl",
            Environment::Prod => "endpoint.prodBaseUrl",
        };
        report.warn(field, "No base URL for the selected environment; requests cannot be sent");
    }
}

fn validate_typewriter(config: &InkstreamConfig, report: &mut ValidationReport) {
    if config.typewriter.max_delay_ms == Some(0) {
        report.error("typewriter.maxDelayMs", "maxDelayMs must be > 0");
    }
    if config.typewriter.budget_ms == Some(0) {
        report.error("typewriter.budgetMs", "budgetMs must be > 0");
    }
}
