//! Config - ゲートとホストの設定
//!
//! どちらも serde で読め、全フィールドに既定値があります。
//!
//! ```toml
//! [gate]
//! endpoint = "http://qa-host:8080/warpunit-insider"
//! request_timeout_ms = 30000
//! include_interface = true
//! max_in_flight = 8
//!
//! [host]
//! bind_addr = "0.0.0.0:8080"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::scheduler::SchedulerConfig;

/// ホストが POST を受ける唯一のパス
pub const INSIDER_PATH: &str = "/warpunit-insider";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/warpunit-insider";

pub fn make_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}{INSIDER_PATH}")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub endpoint: String,
    /// 無ければタイムアウトしない
    pub request_timeout_ms: Option<u64>,
    pub include_interface: bool,
    pub max_in_flight: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: None,
            include_interface: false,
            max_in_flight: SchedulerConfig::default().max_in_flight,
        }
    }
}

impl GateConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_in_flight: self.max_in_flight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub bind_addr: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// 設定ファイル全体（`[gate]` と `[host]`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpgateConfig {
    pub gate: GateConfig,
    pub host: HostConfig,
}

impl WarpgateConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
