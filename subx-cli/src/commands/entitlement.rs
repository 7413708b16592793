//! Entitlement commands

use anyhow::{bail, Context as _, Result};
use subx_lib::SubxApi;

use super::{require_non_empty, with_spinner, Context};
use crate::ui;

/// Grant an entitlement to a subscriber.
pub async fn grant(
    ctx: &Context,
    app_user_id: &str,
    entitlement_id: &str,
    expires_at: Option<&str>,
) -> Result<()> {
    require_non_empty("User ID", app_user_id)?;
    require_non_empty("Entitlement ID", entitlement_id)?;

    let response = with_spinner(
        "Granting entitlement...",
        ctx.client
            .grant_entitlement(app_user_id, entitlement_id, expires_at),
    )
    .await
    .with_context(|| format!("Failed to grant {} to {}", entitlement_id, app_user_id))?;

    if ctx.json {
        return ui::json(&response);
    }
    ui::success(&response.message);
    Ok(())
}

/// Revoke an entitlement, asking for confirmation unless `yes` is set.
pub async fn revoke(ctx: &Context, app_user_id: &str, entitlement_id: &str, yes: bool) -> Result<()> {
    require_non_empty("User ID", app_user_id)?;
    require_non_empty("Entitlement ID", entitlement_id)?;

    if !yes {
        let prompt = format!("Revoke {} from {}?", entitlement_id, app_user_id);
        if !ui::confirm(&prompt, false)? {
            bail!("Revocation cancelled");
        }
    }

    let response = with_spinner(
        "Revoking entitlement...",
        ctx.client.revoke_entitlement(app_user_id, entitlement_id),
    )
    .await
    .with_context(|| format!("Failed to revoke {} from {}", entitlement_id, app_user_id))?;

    if ctx.json {
        return ui::json(&response);
    }
    ui::success(&response.message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context_for;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_grant_with_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/subscribers/u1/entitlements"))
            .and(body_json(json!({
                "entitlementId": "pro",
                "expiresAt": "2030-01-01T00:00:00.000Z"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Entitlement granted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server, false);
        grant(&ctx, "u1", "pro", Some("2030-01-01T00:00:00.000Z"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_with_yes_skips_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/subscribers/u1/entitlements/pro"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Entitlement revoked"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server, true);
        revoke(&ctx, "u1", "pro", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/subscribers/u1/entitlements/pro"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Entitlement not found"})),
            )
            .mount(&server)
            .await;

        let ctx = context_for(&server, true);
        let err = revoke(&ctx, "u1", "pro", true).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to revoke pro from u1");
        let source = err.downcast_ref::<subx_lib::SubxError>().unwrap();
        assert!(source.is_not_found());
    }
}
