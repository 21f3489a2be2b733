use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub ee_project: String,
    pub ee_credentials_path: String,
    pub disable_proxy: bool,
    pub cache_enabled: bool,
    pub cache_ttl: CacheTtlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheTtlConfig {
    pub ndvi: u64,
    pub rainfall: u64,
}
