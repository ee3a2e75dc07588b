// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, ContentConfig, LoggingConfig, PerformanceConfig, ServerConfig, SessionConfig,
};

impl Config {
    /// Load configuration from the default `config.toml` location
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Every key has a hard default, so a missing file yields a fully
    /// usable configuration. The `PORT` environment variable overrides the
    /// configured listen port.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("session.expiration_secs", 30)?
            .set_default("content.root", "website")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", true)?
            .set_default("logging.log_request_body", true)?
            .set_default("logging.access_log_format", "combined")?;

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => builder = builder.set_override("server.port", i64::from(port))?,
                Err(_) => crate::logger::log_warning(&format!(
                    "Ignoring invalid PORT value '{port}'"
                )),
            }
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Session expiration as a duration
    pub const fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session.expiration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = Config::load_from("does-not-exist").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.session.expiration_secs, 30);
        assert_eq!(cfg.content.root, "website");
        assert!(cfg.logging.access_log);
        // Request headers are part of the logged decision path unless
        // explicitly switched off
        assert!(cfg.logging.show_headers);
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_socket_addr_from_defaults() {
        let cfg = Config::load_from("does-not-exist").unwrap();
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.port(), cfg.server.port);
    }
}
