//! Client configuration.
//!
//! Loaded from `<project>/.tldr/client.toml` when present. Every field has a
//! default, and a broken file falls back to defaults with a warning so that
//! configuration can never be why a query fails.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Overrides `query_timeout_ms`.
pub const TIMEOUT_ENV: &str = "TLDR_QUERY_TIMEOUT_MS";

const HELPER_NAME: &str = "tldr-send";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deadline for one request/response exchange.
    pub query_timeout_ms: u64,
    /// Deadline for a reachability probe.
    pub probe_timeout_ms: u64,
    pub launch: LaunchConfig,
    /// Helper executable for the blocking form.
    pub helper: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 3000,
            probe_timeout_ms: 200,
            launch: LaunchConfig::default(),
            helper: None,
        }
    }
}

/// How the daemon gets started when nobody is listening.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Package runner for the preferred invocation (`<runner> run tldr ...`).
    pub runner: String,
    /// Project subdirectory the preferred invocation runs from.
    pub subdir: PathBuf,
    /// Program for the fallback direct invocation.
    pub program: String,
    /// How long each start command may run before we stop waiting on it.
    pub startup_timeout_ms: u64,
    /// Total time to wait for the daemon to become reachable.
    pub poll_window_ms: u64,
    /// First poll interval; doubles up to 400ms.
    pub poll_interval_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            runner: "uv".to_string(),
            subdir: PathBuf::from("tldr"),
            program: "tldr".to_string(),
            startup_timeout_ms: 3000,
            poll_window_ms: 2000,
            poll_interval_ms: 50,
        }
    }
}

impl LaunchConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn poll_window(&self) -> Duration {
        Duration::from_millis(self.poll_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl ClientConfig {
    pub fn config_path(project: &Path) -> PathBuf {
        project.join(".tldr").join("client.toml")
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Load the project's config, falling back to defaults, then apply
    /// environment overrides.
    pub fn load(project: &Path) -> Self {
        let path = Self::config_path(project);
        let mut config = match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed client config");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(TIMEOUT_ENV) {
            match value.trim().parse::<u64>() {
                Ok(ms) => self.query_timeout_ms = ms,
                Err(_) => warn!(value = %value, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// The helper to spawn for blocking queries: configured path, else the
    /// `tldr-send` installed next to the running executable, else `PATH`.
    pub fn helper_path(&self) -> PathBuf {
        if let Some(path) = &self.helper {
            return path.clone();
        }
        let sibling = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(HELPER_NAME)))
            .filter(|candidate| candidate.exists());
        match sibling {
            Some(path) => path,
            None => {
                debug!("helper not found next to executable, using PATH");
                PathBuf::from(HELPER_NAME)
            }
        }
    }
}
