//! Offerings command

use anyhow::{Context as _, Result};
use subx_lib::SubxApi;

use super::{render_offering, with_spinner, Context};
use crate::ui;

/// List the offerings catalog, optionally as seen by one subscriber.
pub async fn run(ctx: &Context, user: Option<&str>) -> Result<()> {
    tracing::debug!("Fetching offerings for {:?}", user);

    let offerings = match user {
        Some(app_user_id) => {
            with_spinner(
                "Fetching subscriber offerings...",
                ctx.client.get_subscriber_offerings(app_user_id),
            )
            .await
        }
        None => with_spinner("Fetching offerings...", ctx.client.get_offerings()).await,
    }
    .context("Failed to fetch offerings")?;

    if ctx.json {
        return ui::json(&offerings);
    }

    if offerings.all_offerings.is_empty() {
        ui::warning("No offerings configured");
        return Ok(());
    }

    match &offerings.current_offering {
        Some(current) => ui::info(&format!("Current offering: {}", current.lookup_key)),
        None => ui::info("No current offering set"),
    }
    for offering in &offerings.all_offerings {
        render_offering(offering);
    }
    ui::separator();
    ui::success(&format!("{} offering(s)", offerings.all_offerings.len()));
    Ok(())
}
