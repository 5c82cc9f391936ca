use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// State directory: `$TAPIX_HOME`, else `~/.tapix`
pub fn tapix_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TAPIX_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tapix"))
}

pub fn ensure_tapix_home() -> Result<PathBuf> {
    let dir = tapix_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
