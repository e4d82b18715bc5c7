use crate::services::model::ModelSize;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Server configuration for the intake service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: IpAddr,

    /// Listening port (default: 5000)
    pub port: u16,

    /// Speech model variant loaded at startup (default: tiny)
    pub model: ModelSize,

    /// Maximum request body size in bytes (default: 100 MB)
    pub max_upload_size: usize,

    /// Canonical multipart field carrying the audio file (default: "file")
    pub upload_field: String,

    /// Parent directory for per-request temp directories (default: system temp dir)
    pub temp_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            model: ModelSize::Tiny,
            max_upload_size: 100 * 1024 * 1024, // 100 MB
            upload_field: "file".to_string(),
            temp_root: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            model: env::var("WHISPER_MODEL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.model),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            upload_field: env::var("UPLOAD_FIELD")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.upload_field),

            temp_root: env::var("UPLOAD_TMP_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .or(default.temp_root),
        }
    }

    /// Create config for local development (loopback only, small uploads)
    pub fn development() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            model: ModelSize::Tiny,
            max_upload_size: 16 * 1024 * 1024,
            upload_field: "file".to_string(),
            temp_root: None,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, ModelSize::Tiny);
        assert_eq!(config.upload_field, "file");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
        assert!(config.temp_root.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = ServerConfig::development();
        assert!(config.host.is_loopback());
        assert_eq!(config.max_upload_size, 16 * 1024 * 1024);
    }
}
