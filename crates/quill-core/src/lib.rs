pub mod config;

pub use config::{ConfigError, QuillConfig, ResponseConfig, ServerConfig};
