//! Config defaults: fills unset values in a parsed config.

use crate::schema::{Environment, InkstreamConfig};

/// Path of the chat stream endpoint below the base URL.
pub const DEFAULT_ENDPOINT_PATH: &str = "agent/DeepSeek/chatStream";

/// Base URL used in the dev environment when none is configured.
pub const DEFAULT_DEV_BASE_URL: &str = "http://localhost:8080/";

/// Longest gap between two released characters, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 200;

/// Time budget spread across the backlog, in milliseconds.
pub const DEFAULT_BUDGET_MS: u64 = 2000;

/// Default log level filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: InkstreamConfig) -> InkstreamConfig {
    let config = apply_endpoint_defaults(config);
    let config = apply_typewriter_defaults(config);
    apply_logging_defaults(config)
}

fn apply_endpoint_defaults(mut config: InkstreamConfig) -> InkstreamConfig {
    let endpoint = &mut config.endpoint;
    endpoint.environment.get_or_insert(Environment::Prod);
    endpoint
        .dev_base_url
        .get_or_insert_with(|| DEFAULT_DEV_BASE_URL.to_string());
    endpoint
        .path
        .get_or_insert_with(|| DEFAULT_ENDPOINT_PATH.to_string());
    config
}

fn apply_typewriter_defaults(mut config: InkstreamConfig) -> InkstreamConfig {
    let typewriter = &mut config.typewriter;
    typewriter.max_delay_ms.get_or_insert(DEFAULT_MAX_DELAY_MS);
    typewriter.budget_ms.get_or_insert(DEFAULT_BUDGET_MS);
    config
}

fn apply_logging_defaults(mut config: InkstreamConfig) -> InkstreamConfig {
    config
        .logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
