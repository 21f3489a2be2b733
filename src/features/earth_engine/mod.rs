pub mod auth;
pub mod client;
pub mod expression;

pub use client::{EarthEngineClient, GeoDataSource};
