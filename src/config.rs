//! Rowdeck - Server configuration

use std::path::PathBuf;

/// Settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Origin allowed by CORS (the UI)
    pub cors_origin: String,
    /// Directory that holds in-flight upload spools
    pub upload_dir: PathBuf,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            cors_origin: "http://localhost:5173".into(),
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` as a string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
