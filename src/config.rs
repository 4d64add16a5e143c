//! Environment-driven configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::types::{DEFAULT_TIMER_SECONDS, MAX_TIMER_SECONDS, MIN_TIMER_SECONDS};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Loopback by default so replication stays on the projector machine
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Bank file name inside `data_dir`
    pub bank_file: String,
    /// Reject banks that fail validation instead of warning
    pub strict_validation: bool,
    pub snapshot_dir: PathBuf,
    pub static_dir: PathBuf,
    pub timer_seconds: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("data"),
            bank_file: "questions.json".to_string(),
            strict_validation: false,
            snapshot_dir: PathBuf::from(".trivia"),
            static_dir: PathBuf::from("static"),
            timer_seconds: DEFAULT_TIMER_SECONDS,
        }
    }
}

/// Trimmed, non-empty value of an environment variable
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Load config from `TRIVIA_*` environment variables.
    /// Blank or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match env_value("TRIVIA_BIND_ADDR") {
            Some(addr) => addr.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid TRIVIA_BIND_ADDR {:?}, using {}",
                    addr,
                    DEFAULT_BIND_ADDR
                );
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let strict_validation = env_value("TRIVIA_STRICT_VALIDATION")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.strict_validation);

        let timer_seconds = env_value("TRIVIA_TIMER_SECONDS")
            .and_then(|s| s.parse::<i64>().ok())
            .map(|s| s.clamp(i64::from(MIN_TIMER_SECONDS), i64::from(MAX_TIMER_SECONDS)) as u32)
            .unwrap_or(defaults.timer_seconds);

        Self {
            bind_addr,
            data_dir: env_value("TRIVIA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bank_file: env_value("TRIVIA_BANK").unwrap_or(defaults.bank_file),
            strict_validation,
            snapshot_dir: env_value("TRIVIA_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_dir),
            static_dir: env_value("TRIVIA_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            timer_seconds,
        }
    }

    pub fn bank_path(&self) -> PathBuf {
        self.data_dir.join(&self.bank_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "TRIVIA_BIND_ADDR",
        "TRIVIA_DATA_DIR",
        "TRIVIA_BANK",
        "TRIVIA_STRICT_VALIDATION",
        "TRIVIA_SNAPSHOT_DIR",
        "TRIVIA_STATIC_DIR",
        "TRIVIA_TIMER_SECONDS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.bank_path(), PathBuf::from("data/questions.json"));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("TRIVIA_BIND_ADDR", "0.0.0.0:9000");
        std::env::set_var("TRIVIA_BANK", " christmas.json ");
        std::env::set_var("TRIVIA_STRICT_VALIDATION", "TRUE");
        std::env::set_var("TRIVIA_TIMER_SECONDS", "2");

        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.bank_file, "christmas.json");
        assert!(config.strict_validation);
        assert_eq!(config.timer_seconds, MIN_TIMER_SECONDS);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_and_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("TRIVIA_DATA_DIR", "   ");
        std::env::set_var("TRIVIA_BIND_ADDR", "not an address");
        std::env::set_var("TRIVIA_TIMER_SECONDS", "soon");

        let config = AppConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr, AppConfig::default().bind_addr);
        assert_eq!(config.timer_seconds, DEFAULT_TIMER_SECONDS);
        clear_env();
    }
}
