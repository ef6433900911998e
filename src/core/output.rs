use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use crate::models::BankRates;

/// Overwrite `path` with the collected rates as indented JSON.
pub fn write_rates(path: &Path, banks: &[BankRates]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(banks).context("encoding rates")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Save a fetched page as `<dir>/<id>.html` for offline inspection.
pub fn save_debug_html(dir: &Path, id: &str, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.html", id));
    fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
