use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_habitloop_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Values applied to `habitloop add` when flags are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// IANA zone for new habits and for local `--at` times.
    pub timezone: String,
    pub grace_per_week: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Filter used when RUST_LOG is unset (e.g. "warn", "habitloop_core=debug").
    pub level: String,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            grace_per_week: 1,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_habitloop_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
