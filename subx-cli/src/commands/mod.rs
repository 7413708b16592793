//! Command implementations

pub mod config;
pub mod entitlement;
pub mod event;
pub mod offerings;
pub mod paywalls;
pub mod receipt;
pub mod subscriber;

use anyhow::{anyhow, Context as _, Result};
use serde_json::Value;
use std::future::Future;

use subx_lib::{Offering, SubxClient};

use crate::config::Settings;
use crate::ui;

/// Shared state for commands that talk to the API.
pub struct Context {
    pub client: SubxClient,
    pub json: bool,
}

impl Context {
    pub fn new(settings: &Settings, json: bool) -> Result<Self> {
        let client = SubxClient::new(settings.client_config()?).context("Invalid client configuration")?;
        Ok(Self { client, json })
    }
}

/// Await `fut` behind a spinner.
pub async fn with_spinner<T, F>(message: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = ui::spinner(message);
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

/// Parse a `key=value` argument.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Interpret an event property value: JSON when it parses, a string otherwise.
pub fn property_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub(crate) fn render_offering(offering: &Offering) {
    let marker = if offering.is_current { " (current)" } else { "" };
    ui::header(&format!("{}{}", offering.display_name, marker));
    ui::key_value("ID", &offering.id);
    ui::key_value("Lookup key", &offering.lookup_key);
    for package in &offering.packages {
        ui::key_value("Package", &format!("{} [{}]", package.display_name, package.lookup_key));
        for product in &package.products {
            ui::item(&format!(
                "{} ({}, {:?})",
                product.display_name, product.store_product_id, product.product_type
            ));
        }
    }
}

pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} cannot be empty", name));
    }
    Ok(())
}
