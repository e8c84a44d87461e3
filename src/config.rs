use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::stream::notice::TRAIN_PATH;
use crate::stream::subscriber::EPOCH_END_PATH;
use crate::stream::transport::EventSourceConfig;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Where the dashboard server lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub server_url:  String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig { server_url: "http://127.0.0.1".into(), server_port: 5000 }
    }
}

impl AppConfig {
    /// `server-url` with `server-port` appended unless the url already
    /// names a port.
    pub fn base_url(&self) -> String {
        let url = self.server_url.trim_end_matches('/');
        let host = url.split("://").nth(1).unwrap_or(url);
        if host.contains(':') {
            url.to_owned()
        } else {
            format!("{}:{}", url, self.server_port)
        }
    }
}

/// Push-channel paths and reconnection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StreamConfig {
    pub epoch_path:  String,
    pub train_path:  String,
    pub retry_ms:    u64,
    pub max_retries: Option<u32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            epoch_path:  EPOCH_END_PATH.into(),
            train_path:  TRAIN_PATH.into(),
            retry_ms:    3000,
            max_retries: None,
        }
    }
}

/// Chart output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChartConfig {
    pub output: Option<PathBuf>,
    pub width:  u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig { output: None, width: 760, height: 220 }
    }
}

// ---------------------------------------------------------------------------
// DashConfig
// ---------------------------------------------------------------------------

/// Follower configuration, read from a `config.json` such as:
///
/// ```json
/// {
///   "app":    { "server-url": "http://127.0.0.1", "server-port": 5000 },
///   "stream": { "retry-ms": 3000 },
///   "chart":  { "output": "chart.svg" }
/// }
/// ```
///
/// Every field has a default, so an empty object is a valid file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub app:    AppConfig,
    pub stream: StreamConfig,
    pub chart:  ChartConfig,
}

impl DashConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DashConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: DashConfig = serde_json::from_str(&text)
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, p) in [("epoch-path", &self.stream.epoch_path), ("train-path", &self.stream.train_path)] {
            if !p.starts_with('/') {
                return Err(DashError::Config(format!("{} must start with '/', got '{}'", name, p)));
            }
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(DashError::Config("chart width and height must be positive".into()));
        }
        if !self.app.server_url.starts_with("http://") && !self.app.server_url.starts_with("https://") {
            return Err(DashError::Config(format!("server-url '{}' is not an http url", self.app.server_url)));
        }
        Ok(())
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.stream.retry_ms)
    }

    fn source(&self, path: &str) -> EventSourceConfig {
        let mut cfg = EventSourceConfig::new(self.app.base_url(), path);
        cfg.retry = self.retry();
        cfg.max_retries = self.stream.max_retries;
        cfg
    }

    pub fn epoch_source(&self) -> EventSourceConfig {
        self.source(&self.stream.epoch_path)
    }

    pub fn train_source(&self) -> EventSourceConfig {
        self.source(&self.stream.train_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: DashConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DashConfig::default());
        assert_eq!(cfg.epoch_source().url(), "http://127.0.0.1:5000/subscribe/epoch/end/");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loads_kebab_case_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"app":{{"server-port":8080}},"stream":{{"retry-ms":250,"max-retries":2}}}}"#).unwrap();
        let cfg = DashConfig::load(f.path()).unwrap();
        assert_eq!(cfg.app.base_url(), "http://127.0.0.1:8080");
        let src = cfg.train_source();
        assert_eq!(src.retry, Duration::from_millis(250));
        assert_eq!(src.max_retries, Some(2));
        assert_eq!(src.path, "/subscribe/train/");
    }

    #[test]
    fn explicit_port_in_url_wins() {
        let app = AppConfig { server_url: "http://dash.local:9000/".into(), server_port: 5000 };
        assert_eq!(app.base_url(), "http://dash.local:9000");
    }

    #[test]
    fn relative_stream_path_is_rejected() {
        let mut cfg = DashConfig::default();
        cfg.stream.epoch_path = "subscribe".into();
        assert!(matches!(cfg.validate(), Err(DashError::Config(_))));
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(DashConfig::load("/nonexistent/config.json"), Err(DashError::Config(_))));
    }
}
