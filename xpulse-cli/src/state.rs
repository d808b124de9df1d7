use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$XPULSE_HOME`, or `~/.xpulse`.
pub fn xpulse_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("XPULSE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".xpulse"))
}

pub fn ensure_xpulse_home() -> Result<PathBuf> {
    let dir = xpulse_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_tasks_path() -> Result<PathBuf> {
    Ok(ensure_xpulse_home()?.join("tasks.csv"))
}
