//! Config commands

use anyhow::{bail, Result};
use serde_json::json;

use crate::config::{mask_key, FileConfig, Settings};
use crate::ui;

/// Print the effective configuration and where each value came from.
pub fn show(settings: &Settings, json: bool) -> Result<()> {
    if json {
        return ui::json(&json!({
            "path": settings.path.display().to_string(),
            "apiKey": settings.api_key.as_ref().map(|(key, _)| mask_key(key)),
            "baseUrl": settings.base_url.0,
        }));
    }

    ui::header("SubX configuration");
    ui::key_value("Config file", &settings.path.display().to_string());
    match &settings.api_key {
        Some((key, source)) => ui::key_value("API key", &format!("{} ({})", mask_key(key), source)),
        None => ui::key_value("API key", "not set"),
    }
    let (base_url, source) = &settings.base_url;
    ui::key_value("Base URL", &format!("{} ({})", base_url, source));
    Ok(())
}

/// Write a config file from flags, prompting for the API key when absent.
pub fn init(
    settings: &Settings,
    api_key: Option<String>,
    base_url: Option<String>,
    force: bool,
) -> Result<()> {
    let path = &settings.path;
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    let api_key = match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None => ui::input("SubX API key")?,
    };
    if api_key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    let config = FileConfig {
        api_key: Some(api_key),
        base_url,
    };
    config.save(path)?;

    ui::success(&format!("Configuration written to {}", path.display()));
    Ok(())
}
