use std::env;

use crate::config::dto::{AppConfig, CacheTtlConfig};
use crate::core::error::AppError;

pub fn load_config() -> Result<AppConfig, AppError> {
    dotenvy::dotenv().ok();

    let port = env::var("CARBON_BACKEND_PORT")
        .or_else(|_| env::var("PORT"))
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .map_err(|err| AppError::configuration(format!("invalid port: {err}")))?;

    let ee_project = env::var("EE_PROJECT").unwrap_or_else(|_| "earthengine-legacy".to_string());

    let ee_credentials_path =
        env::var("EE_CREDENTIALS").unwrap_or_else(|_| default_credentials_path());

    let disable_proxy = env::var("CARBON_BACKEND_DISABLE_PROXY")
        .ok()
        .or_else(|| env::var("DISABLE_PROXY").ok())
        .map(|value| matches!(value.as_str(), "true" | "1" | "TRUE" | "True"))
        .unwrap_or(false);
    let cache_enabled = parse_bool_env("CACHE_ENABLED", true);

    let cache_ttl = CacheTtlConfig {
        ndvi: parse_u64_env("CACHE_TTL_NDVI", 3600),
        rainfall: parse_u64_env("CACHE_TTL_RAINFALL", 3600),
    };

    Ok(AppConfig {
        port,
        ee_project,
        ee_credentials_path,
        disable_proxy,
        cache_enabled,
        cache_ttl,
    })
}

// Matches where `earthengine authenticate` stores its refresh token.
fn default_credentials_path() -> String {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.config/earthengine/credentials")
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "true" | "1" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u64_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
