//! Where `bboard export` writes when no `--output` is given.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::APP_DIR;

/// Candidate export directories, most preferred first: `~/.batchboard/exports`,
/// the platform data dir, then `./.batchboard/exports`.
fn candidates() -> Vec<PathBuf> {
    let mut found = Vec::with_capacity(3);
    if let Some(home) = home::home_dir() {
        found.push(home.join(APP_DIR).join("exports"));
    }
    // XDG data dir on Linux, Application Support on macOS, AppData\Local on Windows
    if let Some(data) = dirs::data_local_dir() {
        found.push(data.join("batchboard").join("exports"));
    }
    found.push(PathBuf::from(APP_DIR).join("exports"));
    found
}

/// Resolve the export directory. An explicit override must be writable;
/// otherwise the first writable candidate wins.
pub fn get_export_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        ensure_writable(dir)?;
        return Ok(dir.to_path_buf());
    }

    for dir in candidates() {
        match ensure_writable(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) => tracing::warn!("skipping export dir: {e:#}"),
        }
    }

    anyhow::bail!("No writable export directory found. Pass --output to choose a file")
}

/// Create `dir` if needed and probe it with a throwaway file.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let probe = dir.join(".bboard_probe");
    fs::write(&probe, b"")
        .with_context(|| format!("Directory {} is not writable", dir.display()))?;
    let _ = fs::remove_file(&probe);

    Ok(())
}
