//! Paywalls command

use anyhow::{Context as _, Result};
use subx_lib::SubxApi;

use super::{require_non_empty, with_spinner, Context};
use crate::ui;

/// Show the paywalls attached to an offering.
pub async fn run(ctx: &Context, offering_id: &str) -> Result<()> {
    require_non_empty("Offering ID", offering_id)?;

    let response = with_spinner(
        "Fetching paywalls...",
        ctx.client.get_offering_paywalls(offering_id),
    )
    .await
    .with_context(|| format!("Failed to fetch paywalls for offering {}", offering_id))?;

    if ctx.json {
        return ui::json(&response);
    }

    if response.paywalls.is_empty() {
        ui::warning(&format!("No paywalls for offering {}", offering_id));
        return Ok(());
    }

    for paywall in &response.paywalls {
        ui::header(&paywall.name);
        ui::key_value("ID", &paywall.id);
        ui::key_value("Active", if paywall.is_active { "yes" } else { "no" });
        ui::key_value("Config keys", &paywall.config.len().to_string());
    }
    Ok(())
}
