//! inkstream configuration schema, typed for serde YAML/JSON.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::{DEFAULT_BUDGET_MS, DEFAULT_ENDPOINT_PATH, DEFAULT_MAX_DELAY_MS};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InkstreamConfig {
    /// Chat endpoint selection
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Typewriter pacing
    #[serde(default)]
    pub typewriter: TypewriterSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Which base URL the client talks to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod_base_url: Option<String>,
    /// Path appended to the base URL (e.g. "agent/DeepSeek/chatStream").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl EndpointConfig {
    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_default()
    }

    /// Base URL of the selected environment, if configured and non-empty.
    pub fn base_url(&self) -> Option<&str> {
        let base = match self.environment() {
            Environment::Dev => self.dev_base_url.as_deref(),
            Environment::Prod => self.prod_base_url.as_deref(),
        };
        base.filter(|b| !b.trim().is_empty())
    }

    /// Full request URL: base URL and path joined by exactly one `/`.
    pub fn url(&self) -> Result<String> {
        let Some(base) = self.base_url() else {
            bail!(
                "no base URL configured for the {:?} environment",
                self.environment()
            );
        };
        let path = self.path.as_deref().unwrap_or(DEFAULT_ENDPOINT_PATH);
        if path.is_empty() {
            return Ok(base.to_string());
        }
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

// ---------------------------------------------------------------------------
// Typewriter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypewriterSettings {
    /// Upper bound on the gap between two characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    /// Time budget spread over the backlog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_ms: Option<u64>,
}

impl TypewriterSettings {
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS))
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms.unwrap_or(DEFAULT_BUDGET_MS))
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling JSON log file; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Filter directive, falling back to the default level.
    pub fn level(&self) -> &str {
        self.level
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }
}
