//! Runtime adapters for Tidyday (config, environment, logging).

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
