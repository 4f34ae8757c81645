use crate::config::types::{Config, CrawlerConfig, OutputConfig, RemoteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on `max-retries`
const MAX_RETRIES: u32 = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_remote_config(&config.remote)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_depth < 1 || config.max_depth > 16 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be between 1 and 16, got {}",
            config.max_depth
        )));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    if config.initial_backoff_ms < 1 {
        return Err(ConfigError::Validation(
            "initial-backoff-ms must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the remote endpoints and start code
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("area-local-url", &config.area_local_url),
        ("area-overseas-url", &config.area_overseas_url),
        ("precinct-url", &config.precinct_url),
        ("record-url", &config.record_url),
    ] {
        validate_base_url(key, value)?;
    }

    if config.start_code.is_empty()
        || !config.start_code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "start-code must be non-empty and alphanumeric, got '{}'",
            config.start_code
        )));
    }

    Ok(())
}

/// A template base must be an absolute http(s) URL ending in `/`
fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    // Plain HTTP is accepted so the crawler can run against a local mock
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            key,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("{} has no host: '{}'", key, value)));
    }

    if !url.path().ends_with('/') || url.query().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must end with '/' and carry no query, got '{}'",
            key, value
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() || config.crawler_version.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "crawler-version must be non-empty without whitespace, got '{}'",
            config.crawler_version
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.mirror_root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "mirror-root cannot be empty".to_string(),
        ));
    }
    Ok(())
}
