use crate::config::types::{Config, FetchConfig, RobotsConfig};
use crate::identity::IdentityRegistry;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    let registry = config.registry()?;
    validate_robots_config(&config.robots, &registry)?;
    Ok(())
}

/// Validates fetch and retry limits
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_base_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "backoff-base-ms must be <= 60000, got {}",
            config.backoff_base_ms
        )));
    }

    Ok(())
}

/// Validates the robots probe against the configured identities
fn validate_robots_config(
    config: &RobotsConfig,
    registry: &IdentityRegistry,
) -> Result<(), ConfigError> {
    if registry.get(&config.identity).is_none() {
        return Err(ConfigError::Validation(format!(
            "robots identity '{}' is not a configured identity (known: {})",
            config.identity,
            registry.names().join(", ")
        )));
    }

    for agent in &config.blocked_agents {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "blocked-agents entries cannot be empty".to_string(),
            ));
        }
        if agent.trim() == "*" {
            return Err(ConfigError::Validation(
                "blocked-agents must name an agent; the wildcard group is always checked"
                    .to_string(),
            ));
        }
    }

    Ok(())
}
