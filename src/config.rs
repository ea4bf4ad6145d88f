//! Settings, secrets and credential resolution.
//!
//! Settings come from a TOML file (explicit path, `./planner.toml`, or the
//! per-user config directory) with a couple of environment overrides.
//! Secrets live in a separate TOML table of `NAME = "value"` pairs and are
//! only consulted when the environment does not provide the value.

use crate::params::{AssignmentPolicy, DEFAULT_HORIZON_DAYS, DEFAULT_HOURS_PER_DAY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const CALENDAR_TOKEN: &str = "GOOGLE_CALENDAR_TOKEN";
pub const HTTP_ADDR_ENV: &str = "PLANNER_HTTP_ADDR";
pub const DB_PATH_ENV: &str = "PLANNER_DB";

const LOCAL_CONFIG_FILE: &str = "planner.toml";
const LOCAL_SECRETS_FILE: &str = "secrets.toml";
const APP_DIR: &str = "study-planner";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),
}

/// A secret value. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

impl SecretStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let table: HashMap<String, toml::Value> = toml::from_str(contents)?;
        let values = table
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }

    /// Loads secrets from `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let contents = read(path)?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Look `name` up in `env` first, then in `secrets`. Blank values count as absent.
pub fn resolve_credential<F>(name: &str, env: F, secrets: &SecretStore) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |value: String| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Credential::new(trimmed))
    };
    env(name)
        .and_then(non_blank)
        .or_else(|| secrets.get(name).map(str::to_string).and_then(non_blank))
}

pub fn resolve_credential_from_env(name: &str, secrets: &SecretStore) -> Option<Credential> {
    resolve_credential(name, |key| std::env::var(key).ok(), secrets)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Fixed pause between successive generation calls.
    pub pacing_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_output_tokens: Some(1024),
            timeout_secs: 60,
            pacing_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub enabled: bool,
    pub calendar_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar_id: "primary".to_string(),
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tasks.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub addr: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    pub horizon_days: u32,
    pub hours_per_day: f64,
    pub policy: AssignmentPolicy,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            policy: AssignmentPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub calendar: CalendarSettings,
    pub store: StoreSettings,
    pub http: HttpSettings,
    pub schedule: ScheduleDefaults,
    pub secrets_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load settings from `explicit` if given, otherwise from the first
    /// existing default location, otherwise defaults. Environment overrides
    /// are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_candidates().into_iter().find(|p| p.exists()),
        };

        let mut settings = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading settings");
                let contents = read(&path)?;
                Self::from_toml_str(&contents)
                    .map_err(|source| ConfigError::Parse { path, source })?
            }
            None => Self::default(),
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = env(HTTP_ADDR_ENV).filter(|v| !v.trim().is_empty()) {
            self.http.addr = addr;
        }
        if let Some(db) = env(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.store.path = PathBuf::from(db);
        }
    }

    /// Where secrets are read from: the configured path, `./secrets.toml`,
    /// or the per-user config directory.
    pub fn secrets_location(&self) -> Option<PathBuf> {
        if let Some(path) = &self.secrets_path {
            return Some(path.clone());
        }
        let local = PathBuf::from(LOCAL_SECRETS_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(LOCAL_SECRETS_FILE))
    }

    pub fn load_secrets(&self) -> Result<SecretStore, ConfigError> {
        match self.secrets_location() {
            Some(path) => SecretStore::load(&path),
            None => Ok(SecretStore::empty()),
        }
    }
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR).join("config.toml"));
    }
    candidates
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
