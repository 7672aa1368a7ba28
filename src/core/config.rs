//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DpmError, Result};
use crate::core::paths::expand_home;

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "DPM_CONFIG";

/// Full DPM configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub resources: ResourcesConfig,
    pub prompt: PromptConfig,
    pub log: LogConfig,
    /// Remote hosts keyed by the name used in `/remote/<name>`.
    pub hosts: BTreeMap<String, HostConfig>,
    /// File the configuration was read from, when any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Local storage root for backups, templates and exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResourcesConfig {
    pub data_dir: PathBuf,
}

/// Interactive behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    /// Skip overwrite confirmations.
    pub force: bool,
    /// Command used by `edit`.
    pub editor: String,
    /// Colorize JSON output on terminals.
    pub colorize: bool,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// JSONL activity log; `<data_dir>/activity.jsonl` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_log: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// One `[hosts.<name>]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: BackendConfig,
}

/// Storage backend of a host, selected by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Directory of `<id>.json` files.
    System { path: PathBuf },
    /// Search index holding dashboards as `dashboard` documents.
    Elastic {
        url: String,
        index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    /// SQLite database with a `dashboard` table.
    Sqlite { path: PathBuf },
    /// Grafana-compatible HTTP API.
    Api {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

impl BackendConfig {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Elastic { .. } => "elastic",
            Self::Sqlite { .. } => "sqlite",
            Self::Api { .. } => "api",
        }
    }
}

const fn enabled_by_default() -> bool {
    true
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[DPM-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            data_dir: home_dir().join(".local").join("share").join("dpm"),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            force: false,
            editor: env_var("EDITOR").unwrap_or_else(|| "vi".to_string()),
            colorize: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            activity_log: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Config {
    /// Per-user configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        home_dir().join(".config").join("dpm").join("config.toml")
    }

    /// Load config from an explicit path or the first existing search
    /// location, then apply env overrides.
    ///
    /// Finding no file is not an error unless the path was explicit
    /// (argument or `DPM_CONFIG`); defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, env_var)
    }

    fn load_from<F>(path: Option<&Path>, mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_ENV).map(PathBuf::from));

        let found = match explicit {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(DpmError::MissingConfig { path }),
            None => search_paths().into_iter().find(|candidate| candidate.exists()),
        };

        let mut cfg = match &found {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| DpmError::io(path, source))?;
                toml::from_str::<Self>(&raw)?
            }
            None => Self::default(),
        };

        cfg.source_path = found;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("DPM_DATA_DIR") {
            self.resources.data_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("DPM_FORCE") {
            self.prompt.force = parse_env_bool("DPM_FORCE", &raw)?;
        }
        if let Some(raw) = lookup("DPM_EDITOR") {
            self.prompt.editor = raw;
        }
        if let Some(raw) = lookup("DPM_COLORIZE") {
            self.prompt.colorize = parse_env_bool("DPM_COLORIZE", &raw)?;
        }
        if let Some(raw) = lookup("DPM_ACTIVITY_LOG") {
            self.log.activity_log = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    fn normalize_paths(&mut self) {
        self.resources.data_dir = expand_home(&self.resources.data_dir);
        if let Some(log) = &self.log.activity_log {
            self.log.activity_log = Some(expand_home(log));
        }
        for host in self.hosts.values_mut() {
            match &mut host.backend {
                BackendConfig::System { path } | BackendConfig::Sqlite { path } => {
                    *path = expand_home(path);
                }
                BackendConfig::Elastic { url, .. } | BackendConfig::Api { url, .. } => {
                    while url.ends_with('/') {
                        url.pop();
                    }
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.resources.data_dir.as_os_str().is_empty() {
            return Err(DpmError::InvalidConfig {
                details: "resources.data_dir must not be empty".to_string(),
            });
        }
        if self.prompt.editor.trim().is_empty() {
            return Err(DpmError::InvalidConfig {
                details: "prompt.editor must not be empty".to_string(),
            });
        }
        if self.log.max_size_bytes == 0 {
            return Err(DpmError::InvalidConfig {
                details: "log.max_size_bytes must be > 0".to_string(),
            });
        }

        for (name, host) in &self.hosts {
            if name.is_empty() || name.contains('/') {
                return Err(DpmError::InvalidConfig {
                    details: format!("host name {name:?} must be non-empty and contain no '/'"),
                });
            }
            match &host.backend {
                BackendConfig::System { path } | BackendConfig::Sqlite { path } => {
                    if path.as_os_str().is_empty() {
                        return Err(DpmError::InvalidConfig {
                            details: format!("hosts.{name}.path must not be empty"),
                        });
                    }
                }
                BackendConfig::Elastic {
                    url,
                    index,
                    user,
                    password,
                } => {
                    validate_url(name, url)?;
                    if index.trim().is_empty() {
                        return Err(DpmError::InvalidConfig {
                            details: format!("hosts.{name}.index must not be empty"),
                        });
                    }
                    validate_credentials(name, user.as_ref(), password.as_ref())?;
                }
                BackendConfig::Api {
                    url,
                    token,
                    user,
                    password,
                } => {
                    validate_url(name, url)?;
                    if token.is_some() && user.is_some() {
                        return Err(DpmError::InvalidConfig {
                            details: format!("hosts.{name} sets both token and user"),
                        });
                    }
                    validate_credentials(name, user.as_ref(), password.as_ref())?;
                }
            }
        }
        Ok(())
    }

    /// Names of the enabled hosts, sorted.
    pub fn enabled_hosts(&self) -> Vec<&str> {
        self.hosts
            .iter()
            .filter(|(_, host)| host.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Settings of an enabled host.
    pub fn host(&self, name: &str) -> Result<&HostConfig> {
        match self.hosts.get(name) {
            Some(host) if host.enabled => Ok(host),
            Some(_) => Err(DpmError::HostConfig {
                details: format!("host {name} is disabled"),
            }),
            None => Err(DpmError::HostConfig {
                details: format!("unknown host {name}"),
            }),
        }
    }

    /// Directory backing a local category such as `backups` or `templates/rows`.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        category
            .split('/')
            .fold(self.resources.data_dir.clone(), |dir, part| dir.join(part))
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.log
            .activity_log
            .clone()
            .unwrap_or_else(|| self.resources.data_dir.join("activity.jsonl"))
    }
}

/// Implicit config locations, most specific first.
fn search_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("dpm.toml"),
        Config::default_path(),
        PathBuf::from("/etc/dpm/config.toml"),
    ]
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(DpmError::InvalidConfig {
            details: format!("hosts.{name}.url must be http(s), got {url:?}"),
        })
    }
}

fn validate_credentials(name: &str, user: Option<&String>, password: Option<&String>) -> Result<()> {
    if user.is_some() != password.is_some() {
        return Err(DpmError::InvalidConfig {
            details: format!("hosts.{name}: user and password must be set together"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => other.parse::<bool>().map_err(|error| DpmError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        }),
    }
}
