pub mod earth_engine;
pub mod metrics;
