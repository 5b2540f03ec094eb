use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Data directory: `$HABITLOOP_HOME`, else `~/.habitloop`.
pub fn habitloop_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("HABITLOOP_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set (or set HABITLOOP_HOME)")?;
    Ok(PathBuf::from(home).join(".habitloop"))
}

pub fn ensure_habitloop_home() -> Result<PathBuf> {
    let dir = habitloop_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
