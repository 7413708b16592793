//! Subscriber commands

use anyhow::{Context as _, Result};
use std::collections::HashMap;
use subx_lib::{SubscriberResponse, SubxApi};

use super::{require_non_empty, with_spinner, Context};
use crate::ui;

/// Show a subscriber.
pub async fn get(ctx: &Context, app_user_id: &str) -> Result<()> {
    require_non_empty("User ID", app_user_id)?;

    let subscriber = with_spinner("Fetching subscriber...", ctx.client.get_subscriber(app_user_id))
        .await
        .with_context(|| format!("Failed to fetch subscriber {}", app_user_id))?;

    render(ctx, &subscriber)
}

/// Create or update a subscriber, optionally setting attributes.
pub async fn upsert(ctx: &Context, app_user_id: &str, attrs: Vec<(String, String)>) -> Result<()> {
    require_non_empty("User ID", app_user_id)?;

    let attributes: HashMap<String, String> = attrs.into_iter().collect();
    let attributes = (!attributes.is_empty()).then_some(&attributes);

    let subscriber = with_spinner(
        "Saving subscriber...",
        ctx.client.upsert_subscriber(app_user_id, attributes),
    )
    .await
    .with_context(|| format!("Failed to upsert subscriber {}", app_user_id))?;

    if !ctx.json {
        ui::success(&format!("Subscriber {} saved", subscriber.app_user_id));
    }
    render(ctx, &subscriber)
}

fn render(ctx: &Context, subscriber: &SubscriberResponse) -> Result<()> {
    if ctx.json {
        return ui::json(subscriber);
    }

    ui::header(&format!("Subscriber {}", subscriber.app_user_id));
    ui::key_value("First seen", &subscriber.first_seen_at);
    ui::key_value("Last seen", &subscriber.last_seen_at);

    ui::header("Entitlements");
    if subscriber.entitlements.is_empty() {
        ui::item("none");
    }
    for entitlement in &subscriber.entitlements {
        ui::item(&format!("{} ({})", entitlement.lookup_key, entitlement.display_name));
    }

    ui::header("Subscriptions");
    if subscriber.subscriptions.is_empty() {
        ui::item("none");
    }
    for subscription in &subscriber.subscriptions {
        let expires = subscription.expires_at.as_deref().unwrap_or("never");
        ui::item(&format!(
            "{} on {}: {} (expires {}{})",
            subscription.product_id,
            subscription.store,
            subscription.status,
            expires,
            if subscription.is_trial { ", trial" } else { "" }
        ));
    }

    if !subscriber.attributes.is_empty() {
        ui::header("Attributes");
        let mut attributes: Vec<_> = subscriber.attributes.iter().collect();
        attributes.sort();
        for (key, value) in attributes {
            ui::key_value(key, value);
        }
    }
    Ok(())
}
