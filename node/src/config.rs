// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use eventdb_kernel::{AccessGate, AuthMode, AuthTables};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    /// Append-only log file with an in-memory latest index.
    #[default]
    File,
    /// Single SQLite table.
    Sqlite,
}

/// How `POST /event` acknowledges a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Respond `201` before the append runs; failures are only logged.
    #[default]
    FireAndForget,
    /// Respond after the append commits and report failures to the client.
    Synchronous,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address: `ip:port`, `hostname:port`, or `:port` for every interface.
    pub host: String,
    pub allowed_origins: Vec<String>,
    pub log_file: Option<PathBuf>,
    pub write_mode: WriteMode,
    pub auth_mode: AuthMode,
}

impl ServerConfig {
    /// Address in a form `TcpListener::bind` resolves. A bare `:port` listens on
    /// all interfaces.
    pub fn bind_addr(&self) -> String {
        match self.host.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.host.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:3000".to_string(),
            allowed_origins: Vec::new(),
            log_file: None,
            write_mode: WriteMode::default(),
            auth_mode: AuthMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// TOML file with `[authentication]` and `[authorization]` tables.
    pub auth_file: Option<PathBuf>,
    pub events_file: PathBuf,
    pub storage_backend: StorageBackendKind,
    /// Deadline applied to every store operation.
    pub op_timeout_ms: u64,
    pub server: ServerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            auth_file: None,
            events_file: PathBuf::from("events.log"),
            storage_backend: StorageBackendKind::default(),
            op_timeout_ms: 5_000,
            server: ServerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Loads a config file. Relative `auth_file` and `events_file` paths resolve
    /// against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        let mut cfg = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            if cfg.events_file.is_relative() {
                cfg.events_file = base.join(&cfg.events_file);
            }
            if let Some(auth) = cfg.auth_file.as_mut().filter(|p| p.is_relative()) {
                *auth = base.join(&*auth);
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.op_timeout_ms == 0 {
            return Err(ConfigError::Invalid("op_timeout_ms must be positive".into()));
        }
        match self.server.host.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "server.host must be host:port, got {:?}",
                    self.server.host
                )))
            }
        }
        if self.events_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("events_file must be set".into()));
        }
        Ok(())
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Reads the credential tables. Without an auth file every request is denied.
    pub fn load_gate(&self) -> Result<AccessGate, ConfigError> {
        let tables = match &self.auth_file {
            Some(path) => {
                let text = read(path)?;
                toml::from_str::<AuthTables>(&text).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            None => {
                tracing::warn!("No auth_file configured: every authenticated route will be denied");
                AuthTables::default()
            }
        };
        Ok(AccessGate::new(tables, self.server.auth_mode))
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
