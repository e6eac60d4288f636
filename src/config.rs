//! Runtime configuration from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `NEXUS_BIND_ADDR` | `0.0.0.0:8000` | HTTP listen address |
//! | `NEXUS_MODEL_PATH` | `pipeline_final.json` | Pipeline artifact (file or directory) |
//! | `NEXUS_MODEL_SHA256` | unset | Pin the artifact's SHA-256 digest |
//! | `NEXUS_LOG_MODE` | `stdout` | `stdout` or `file` |
//! | `NEXUS_LOG_FILE` | `nexus-renal.log` | Log file when `NEXUS_LOG_MODE=file` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::adapters::pipeline::DEFAULT_ARTIFACT_NAME;
use crate::NexusError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LOG_FILE: &str = "nexus-renal.log";

/// Where formatted log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File(PathBuf),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub model_path: PathBuf,
    pub model_sha256: Option<String>,
    pub log_mode: LogMode,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Validation` if `NEXUS_BIND_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self, NexusError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `Validation` if the bind address is not a socket address.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NexusError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw =
            non_empty("NEXUS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
            NexusError::Validation(format!("NEXUS_BIND_ADDR {bind_raw:?} is invalid: {e}"))
        })?;

        let model_path = non_empty("NEXUS_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_NAME));

        let log_mode = match non_empty("NEXUS_LOG_MODE").as_deref() {
            Some("file") => LogMode::File(
                non_empty("NEXUS_LOG_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            _ => LogMode::Stdout,
        };

        Ok(Self {
            bind_addr,
            model_path,
            model_sha256: non_empty("NEXUS_MODEL_SHA256"),
            log_mode,
        })
    }
}
