//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the optional TOML file named by `--config`
//! and converts it into a domain [`ServerConfig`](crate::domain::ServerConfig).

pub mod config;

pub use config::{load_config, ConfigError, FileConfig};
