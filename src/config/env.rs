//! Environment variable overrides.
//!
//! The gateway keeps the variable names the Azure deployment already uses,
//! so an existing app-settings block works unchanged.

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;

/// Force simulated overload (`true`/`false`).
pub const RETURN_429: &str = "RETURN_429";
/// Backend resource name.
pub const AZURE_OPENAI_SERVICENAME: &str = "AZURE_OPENAI_SERVICENAME";
/// Default API version.
pub const AZURE_OPENAI_APIVERSION: &str = "AZURE_OPENAI_APIVERSION";
/// Base URL override.
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";

/// Apply environment overrides on top of `config`.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(RETURN_429) {
        config.overload.simulate = parse_bool(RETURN_429, &value)?;
    }
    if let Some(value) = get(AZURE_OPENAI_SERVICENAME) {
        config.backend.service_name = Some(value);
    }
    if let Some(value) = get(AZURE_OPENAI_APIVERSION) {
        config.backend.api_version = Some(value);
    }
    if let Some(value) = get(AZURE_OPENAI_ENDPOINT) {
        config.backend.endpoint = Some(value);
    }

    Ok(())
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}
