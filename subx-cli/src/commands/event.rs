//! Event command

use anyhow::{Context as _, Result};
use serde_json::Map;
use subx_lib::{SubxApi, TrackEventData};

use super::{property_value, require_non_empty, with_spinner, Context};
use crate::ui;

/// Record an analytics event.
pub async fn track(
    ctx: &Context,
    event_name: &str,
    user: Option<String>,
    props: Vec<(String, String)>,
) -> Result<()> {
    require_non_empty("Event name", event_name)?;

    let mut event = TrackEventData::new(event_name);
    if let Some(app_user_id) = user {
        event = event.with_app_user_id(app_user_id);
    }
    if !props.is_empty() {
        let properties: Map<_, _> = props
            .into_iter()
            .map(|(key, raw)| (key, property_value(&raw)))
            .collect();
        event = event.with_properties(properties);
    }

    with_spinner("Sending event...", ctx.client.track_event(&event))
        .await
        .with_context(|| format!("Failed to track event {}", event_name))?;

    if ctx.json {
        return ui::json(&event);
    }
    ui::success(&format!("Event {} recorded", event_name));
    Ok(())
}
