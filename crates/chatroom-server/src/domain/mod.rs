//! Domain layer for chatroom-server.
//!
//! Pure types with no dependencies on I/O, networking, or async runtimes.
//! Populating these from CLI arguments, environment variables, or files is the
//! job of `main.rs` and `infrastructure::storage`.

pub mod config;

pub use config::{ConfigValidationError, ServerConfig};
