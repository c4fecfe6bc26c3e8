//! quill.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Errors raised while loading or validating a `quill.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    pub server: Option<ServerConfig>,
    pub response: Option<ResponseConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Content type applied to every fresh response before page code runs.
    pub default_content_type: Option<String>,
    /// Status used when page code redirects. Must be a 3xx code.
    pub redirect_status: Option<u16>,
}

impl QuillConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: QuillConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a quill.toml with every default spelled out.
    pub fn scaffold() -> Self {
        QuillConfig {
            server: Some(ServerConfig {
                bind: Some(DEFAULT_BIND.to_string()),
            }),
            response: Some(ResponseConfig {
                default_content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
                redirect_status: Some(DEFAULT_REDIRECT_STATUS),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        let status = self.redirect_status();
        if !(300..400).contains(&status) {
            return Err(ConfigError::Invalid(format!(
                "redirect_status must be a 3xx code, got {status}"
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self
            .server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND);
        bind.parse()
            .map_err(|e| ConfigError::Invalid(format!("bad bind address {bind:?}: {e}")))
    }

    pub fn default_content_type(&self) -> &str {
        self.response
            .as_ref()
            .and_then(|r| r.default_content_type.as_deref())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn redirect_status(&self) -> u16 {
        self.response
            .as_ref()
            .and_then(|r| r.redirect_status)
            .unwrap_or(DEFAULT_REDIRECT_STATUS)
    }
}
