//! Server configuration, read from a JSON file such as:
//!
//! ```json
//! { "port": 5555, "num_pixels": 50, "polling_interval": 20 }
//! ```
//!
//! Every key is optional. A missing file means defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::LedError;
use crate::protocol::{FrameGeometry, MAX_PIXELS};
use crate::queue::QueueOrder;

pub const DEFAULT_CONFIG_FILE: &str = "led_emulator.conf";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub num_pixels: usize,
    /// Renderer poll period in milliseconds.
    pub polling_interval: u64,
    /// Idle limit in seconds for command connections; `<= 0` disables it.
    pub connection_timeout: Option<i64>,
    pub queue_order: QueueOrder,
    pub max_connections: Option<usize>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5555,
            num_pixels: 50,
            polling_interval: 20,
            connection_timeout: None,
            queue_order: QueueOrder::Fifo,
            max_connections: None,
            log_level: "debug".into(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("{} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };

        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), LedError> {
        if self.num_pixels == 0 {
            return Err(LedError::Config("num_pixels must be at least 1".into()));
        }

        if self.num_pixels > MAX_PIXELS {
            return Err(LedError::Config(format!(
                "num_pixels {} exceeds the protocol limit of {}",
                self.num_pixels, MAX_PIXELS
            )));
        }

        if self.polling_interval == 0 {
            return Err(LedError::Config("polling_interval must be positive".into()));
        }

        if self.max_connections == Some(0) {
            return Err(LedError::Config("max_connections must be positive".into()));
        }

        Ok(())
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.num_pixels)
    }

    pub fn frame_size(&self) -> usize {
        self.geometry().frame_size()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.connection_timeout
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn dump(&self) {
        log::info!("Active configuration");
        log::info!("host: {}", self.host);
        log::info!("port: {}", self.port);
        log::info!("num_pixels: {}", self.num_pixels);
        log::info!("polling_interval: {}", self.polling_interval);
        log::info!("connection_timeout: {:?}", self.connection_timeout);
        log::info!("queue_order: {:?}", self.queue_order);
        log::info!("max_connections: {:?}", self.max_connections);
        log::info!("log_level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = Config::from_json(r#"{"port": 6000, "num_pixels": 150}"#).unwrap();
        assert_eq!(c.port, 6000);
        assert_eq!(c.num_pixels, 150);
        assert_eq!(c.polling_interval, 20);
        assert_eq!(c.frame_size(), 608);
        assert_eq!(c.queue_order, QueueOrder::Fifo);
    }

    #[test]
    fn reads_queue_order_and_timeout() {
        let c = Config::from_json(r#"{"queue_order": "lifo", "connection_timeout": 30}"#).unwrap();
        assert_eq!(c.queue_order, QueueOrder::Lifo);
        assert_eq!(c.timeout(), Some(Duration::from_secs(30)));

        let c = Config::from_json(r#"{"connection_timeout": -1}"#).unwrap();
        assert_eq!(c.timeout(), None);
    }

    #[test]
    fn rejects_zero_pixels() {
        assert!(Config::from_json(r#"{"num_pixels": 0}"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Config::from_json("{ port: 1 ").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = Config::load(dir.path().join("absent.conf")).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 7777, "polling_interval": 50}}"#).unwrap();

        let c = Config::load(file.path()).unwrap();
        assert_eq!(c.port, 7777);
        assert_eq!(c.poll_interval(), Duration::from_millis(50));
        assert_eq!(c.listen_addr(), "0.0.0.0:7777");
    }
}
