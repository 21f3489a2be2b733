pub mod dto;
pub mod loader;

pub use dto::{AppConfig, CacheTtlConfig};
pub use loader::load_config;
