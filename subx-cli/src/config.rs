//! Layered CLI configuration.
//!
//! Values resolve in order: command-line flag or environment variable (clap
//! merges the two), then the TOML config file, then built-in defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use subx_lib::{ClientConfig, DEFAULT_BASE_URL};

/// Contents of `config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl FileConfig {
    /// Load from `path`. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}

/// Default config file location (`<config dir>/subx/config.toml`).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subx")
        .join("config.toml")
}

/// Where a resolved value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Flag,
    File,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Flag => write!(f, "flag/env"),
            Source::File => write!(f, "config file"),
            Source::Default => write!(f, "default"),
        }
    }
}

/// Effective settings after layering.
#[derive(Clone, Debug)]
pub struct Settings {
    pub path: PathBuf,
    pub api_key: Option<(String, Source)>,
    pub base_url: (String, Source),
}

impl Settings {
    /// Merge `flag_*` values (already merged with env by clap) over `file`.
    pub fn resolve(
        path: PathBuf,
        file: &FileConfig,
        flag_api_key: Option<String>,
        flag_base_url: Option<String>,
    ) -> Self {
        let api_key = pick(flag_api_key, file.api_key.clone());
        let base_url = pick(flag_base_url, file.base_url.clone())
            .unwrap_or_else(|| (DEFAULT_BASE_URL.to_string(), Source::Default));

        Self {
            path,
            api_key,
            base_url,
        }
    }

    /// Client configuration, failing when no API key was supplied anywhere.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let (api_key, _) = self.api_key.as_ref().ok_or_else(|| {
            anyhow!(
                "No API key configured. Pass --api-key, set SUBX_API_KEY, or run `subx config init`."
            )
        })?;
        Ok(ClientConfig::new(api_key.clone()).with_base_url(self.base_url.0.clone()))
    }
}

fn pick(flag: Option<String>, file: Option<String>) -> Option<(String, Source)> {
    let non_empty = |v: &String| !v.trim().is_empty();
    flag.filter(non_empty)
        .map(|v| (v, Source::Flag))
        .or_else(|| file.filter(non_empty).map(|v| (v, Source::File)))
}

/// Mask an API key for display, keeping a short prefix and suffix.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", prefix, suffix)
}
