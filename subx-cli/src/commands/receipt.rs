//! Receipt command

use anyhow::{Context as _, Result};
use subx_lib::{ReceiptData, StoreName, SubxApi};

use super::{require_non_empty, with_spinner, Context};
use crate::ui;

/// Arguments for `subx receipt submit`.
#[derive(Debug, Clone)]
pub struct SubmitArgs {
    pub user: String,
    pub store: StoreName,
    pub product_id: String,
    pub receipt: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Submit a store receipt for validation.
pub async fn submit(ctx: &Context, args: SubmitArgs) -> Result<()> {
    require_non_empty("User ID", &args.user)?;
    require_non_empty("Product ID", &args.product_id)?;

    let receipt = ReceiptData {
        store: args.store,
        receipt_data: args.receipt,
        product_id: args.product_id,
        price: args.price,
        currency: args.currency,
    };

    let response = with_spinner(
        "Validating receipt...",
        ctx.client.submit_receipt(&args.user, &receipt),
    )
    .await
    .with_context(|| format!("Failed to submit receipt for {}", receipt.product_id))?;

    if ctx.json {
        return ui::json(&response);
    }

    if response.success {
        ui::success(&format!("Receipt for {} accepted", receipt.product_id));
    } else {
        ui::warning(&format!("Receipt for {} was not accepted", receipt.product_id));
    }
    if let Some(subscription) = &response.subscription {
        ui::key_value("Subscription", &subscription.id);
        ui::key_value("Status", &subscription.status);
        if let Some(expires_at) = &subscription.expires_at {
            ui::key_value("Expires", expires_at);
        }
    }
    Ok(())
}

/// clap value parser for `--store`.
pub fn parse_store(s: &str) -> Result<StoreName, String> {
    s.parse::<StoreName>().map_err(|e| e.message())
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

    #[test]
    fn test_parse_store() {
        assert_eq!(parse_store("app_store").unwrap(), StoreName::AppStore);
        assert_eq!(parse_store("play_store").unwrap(), StoreName::PlayStore);
        assert!(parse_store("amazon").is_err());
    }

    #[tokio::test]
    async fn test_submit_sends_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/subscribers/u1/receipts"))
            .and(body_json(json!({
                "store": "play_store",
                "receiptData": "token_1",
                "productId": "monthly",
                "price": 4.99,
                "currency": "EUR"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server, true);
        submit(
            &ctx,
            SubmitArgs {
                user: "u1".to_string(),
                store: StoreName::PlayStore,
                product_id: "monthly".to_string(),
                receipt: "token_1".to_string(),
                price: Some(4.99),
                currency: Some("EUR".to_string()),
            },
        )
        .await
        .unwrap();
    }
}
