//! `~/.mutabakat/config.toml`, overlaid by `.env` and the process environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAILBOX: &str = "INBOX";

/// State directory: `$MUTABAKAT_HOME`, else `$HOME/.mutabakat`.
fn home_from<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("MUTABAKAT_HOME").filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = lookup("HOME").context("neither MUTABAKAT_HOME nor HOME is set")?;
    Ok(Path::new(&home).join(".mutabakat"))
}

fn mutabakat_home() -> Result<PathBuf> {
    home_from(|key| std::env::var(key).ok())
}

fn config_path() -> Result<PathBuf> {
    Ok(mutabakat_home()?.join("config.toml"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required for mail commands")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSection,
    #[serde(default)]
    pub email: EmailSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    pub log_level: String,
    /// IANA zone used for "today" in aging reports
    pub timezone: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            timezone: mutabakat_core::time::DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub mailbox: String,
    pub batch_size: usize,
    pub concurrency_limit: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub failure_log: Option<PathBuf>,
}

impl Default for EmailSection {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            pass: None,
            mailbox: DEFAULT_MAILBOX.to_string(),
            batch_size: 50,
            concurrency_limit: 3,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 2000,
            failure_log: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

impl Config {
    /// Apply `KEY=value` overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Some(v) = lookup("MUTABAKAT_TZ") {
            self.general.timezone = v;
        }

        let email = &mut self.email;
        if let Some(v) = lookup("EMAIL_HOST") {
            email.host = Some(v);
        }
        if let Some(v) = lookup("EMAIL_PORT") {
            email.port = Some(parse_var("EMAIL_PORT", v)?);
        }
        if let Some(v) = lookup("EMAIL_USER") {
            email.user = Some(v);
        }
        if let Some(v) = lookup("EMAIL_PASS") {
            email.pass = Some(v);
        }
        if let Some(v) = lookup("EMAIL_MAILBOX") {
            email.mailbox = v;
        }
        if let Some(v) = lookup("EMAIL_BATCH_SIZE") {
            email.batch_size = parse_var("EMAIL_BATCH_SIZE", v)?;
        }
        if let Some(v) = lookup("EMAIL_CONCURRENCY_LIMIT") {
            email.concurrency_limit = parse_var("EMAIL_CONCURRENCY_LIMIT", v)?;
        }
        if let Some(v) = lookup("EMAIL_TIMEOUT") {
            email.timeout_secs = parse_var("EMAIL_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("EMAIL_MAX_RETRIES") {
            email.max_retries = parse_var("EMAIL_MAX_RETRIES", v)?;
        }
        if let Some(v) = lookup("EMAIL_RETRY_DELAY") {
            email.retry_delay_ms = parse_var("EMAIL_RETRY_DELAY", v)?;
        }
        if let Some(v) = lookup("EMAIL_FAILURE_LOG") {
            email.failure_log = Some(PathBuf::from(v));
        }
        Ok(())
    }
}

/// Validated mail settings. Building one fails if any connection value is
/// missing.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub mailbox: String,
    pub batch_size: usize,
    pub concurrency_limit: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(key))
}

impl EmailSettings {
    pub fn from_section(section: &EmailSection) -> Result<Self, ConfigError> {
        let host = required(&section.host, "EMAIL_HOST")?;
        let port = section.port.ok_or(ConfigError::Missing("EMAIL_PORT"))?;
        let user = required(&section.user, "EMAIL_USER")?;
        let pass = required(&section.pass, "EMAIL_PASS")?;

        if section.batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "EMAIL_BATCH_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            user,
            pass,
            mailbox: section.mailbox.clone(),
            batch_size: section.batch_size,
            concurrency_limit: section.concurrency_limit.max(1),
            timeout: Duration::from_secs(section.timeout_secs),
            max_retries: section.max_retries,
            retry_delay: Duration::from_millis(section.retry_delay_ms),
        })
    }
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Config file (if present), then `.env`, then the environment.
pub fn load_config() -> Result<Config> {
    let mut cfg = match config_path() {
        Ok(p) if p.exists() => read_config_file(&p)?,
        _ => Config::default(),
    };
    let _ = dotenvy::dotenv();
    cfg.apply_env(|key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Failure log location: configured path or `~/.mutabakat/email_failures.jsonl`.
pub fn failure_log_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.email.failure_log {
        Some(p) => Ok(p.clone()),
        None => Ok(mutabakat_home()?.join("email_failures.jsonl")),
    }
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let dir = mutabakat_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let p = dir.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
