//! Integration tests for the HTTP client against a mock server.
//!
//! ```bash
//! cargo test -p subx-lib --test client_integration
//! ```

use std::collections::HashMap;

use serde_json::json;
use subx_lib::{
    ClientConfig, ReceiptData, StoreName, SubxApi, SubxClient, SubxErrorCode, TrackEventData,
};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

fn client_for(server: &MockServer) -> SubxClient {
    SubxClient::new(ClientConfig::new("test_key").with_base_url(server.uri())).unwrap()
}

fn subscriber_body(app_user_id: &str) -> serde_json::Value {
    json!({
        "appUserId": app_user_id,
        "firstSeenAt": "2024-01-01T00:00:00.000Z",
        "lastSeenAt": "2024-01-02T00:00:00.000Z",
        "subscriptions": [{
            "id": "sub_1",
            "productId": "monthly",
            "store": "app_store",
            "status": "active",
            "startedAt": "2024-01-01T00:00:00.000Z",
            "expiresAt": null,
            "isTrial": false,
            "autoRenewEnabled": true
        }],
        "entitlements": [{"id": "ent_1", "lookupKey": "pro", "displayName": "Pro"}],
        "attributes": {"plan": "monthly"}
    })
}

// ============================================================================
// Request shape
// ============================================================================

#[tokio::test]
async fn test_every_request_sends_api_key_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offerings"))
        .and(header("X-Api-Key", "test_key"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentOffering": null,
            "allOfferings": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let offerings = client_for(&server).get_offerings().await.unwrap();
    assert!(offerings.current_offering.is_none());
    assert!(offerings.all_offerings.is_empty());
}

#[tokio::test]
async fn test_get_offerings_parses_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offerings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentOffering": null,
            "allOfferings": [{
                "id": "off_1",
                "lookupKey": "default",
                "displayName": "Default",
                "isCurrent": true,
                "packages": [{
                    "id": "pkg_1",
                    "lookupKey": "monthly",
                    "displayName": "Monthly",
                    "products": [{
                        "id": "prod_1",
                        "storeProductId": "sku1",
                        "type": "subscription",
                        "displayName": "Monthly Pro"
                    }]
                }]
            }]
        })))
        .mount(&server)
        .await;

    let offerings = client_for(&server).get_offerings().await.unwrap();
    let offering = &offerings.all_offerings[0];
    assert!(offering.is_current);
    assert_eq!(offering.packages[0].products[0].store_product_id, "sku1");
}

#[tokio::test]
async fn test_app_user_id_is_percent_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/subscribers/user%40example.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(subscriber_body("user@example.com")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let subscriber = client_for(&server)
        .get_subscriber("user@example.com")
        .await
        .unwrap();
    assert_eq!(subscriber.app_user_id, "user@example.com");
    assert_eq!(subscriber.entitlements[0].lookup_key, "pro");
    assert_eq!(subscriber.attributes.get("plan").map(String::as_str), Some("monthly"));
}

#[tokio::test]
async fn test_upsert_without_attributes_sends_no_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1"))
        .and(|req: &Request| req.body.is_empty())
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriber_body("u1")))
        .expect(1)
        .mount(&server)
        .await;

    let res = client_for(&server).upsert_subscriber("u1", None).await.unwrap();
    assert_eq!(res.app_user_id, "u1");
}

#[tokio::test]
async fn test_upsert_with_attributes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1"))
        .and(body_json(json!({"attributes": {"email": "a@b.c"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriber_body("u1")))
        .expect(1)
        .mount(&server)
        .await;

    let mut attributes = HashMap::new();
    attributes.insert("email".to_string(), "a@b.c".to_string());
    client_for(&server)
        .upsert_subscriber("u1", Some(&attributes))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_submit_receipt_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1/receipts"))
        .and(body_json(json!({
            "store": "app_store",
            "receiptData": "R",
            "productId": "p1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = ReceiptData {
        store: StoreName::AppStore,
        receipt_data: "R".into(),
        product_id: "p1".into(),
        price: None,
        currency: None,
    };
    let res = client_for(&server).submit_receipt("u1", &receipt).await.unwrap();
    assert!(res.success);
    assert!(res.subscription.is_none());
}

#[tokio::test]
async fn test_grant_and_revoke_entitlement() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1/entitlements"))
        .and(body_json(json!({"entitlementId": "pro", "expiresAt": "2030-01-01T00:00:00Z"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "granted"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/subscribers/u1/entitlements/pro"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let granted = client
        .grant_entitlement("u1", "pro", Some("2030-01-01T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(granted.message, "granted");

    let revoked = client.revoke_entitlement("u1", "pro").await.unwrap();
    assert_eq!(revoked.message, "revoked");
}

#[tokio::test]
async fn test_paywalls_and_subscriber_offerings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offerings/off_1/paywalls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paywalls": [{
                "id": "pw_1",
                "name": "Default",
                "config": {"theme": "dark"},
                "isActive": true
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/subscribers/u1/offerings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentOffering": null,
            "allOfferings": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let paywalls = client.get_offering_paywalls("off_1").await.unwrap();
    assert_eq!(paywalls.paywalls[0].config["theme"], "dark");

    client.get_subscriber_offerings("u1").await.unwrap();
}

// ============================================================================
// Response handling
// ============================================================================

#[tokio::test]
async fn test_no_content_is_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .and(body_json(json!({"appUserId": "u1", "eventName": "paywall_viewed"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let event = TrackEventData::new("paywall_viewed").with_app_user_id("u1");
    client_for(&server).track_event(&event).await.unwrap();
}

#[tokio::test]
async fn test_no_content_for_typed_result_is_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/subscribers/u1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = client_for(&server).get_subscriber("u1").await.unwrap_err();
    assert_eq!(err.code(), SubxErrorCode::Serialization);
}

#[tokio::test]
async fn test_error_uses_body_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/subscribers/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Subscriber not found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).get_subscriber("ghost").await.unwrap_err();
    assert_eq!(err.code(), SubxErrorCode::Api);
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.message(), "Subscriber not found");
}

#[tokio::test]
async fn test_error_falls_back_to_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offerings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_offerings().await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.message(), "Service Unavailable");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offerings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_offerings().await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused() {
    let client =
        SubxClient::new(ClientConfig::new("test_key").with_base_url("http://127.0.0.1:1")).unwrap();

    let err = client.get_offerings().await.unwrap_err();
    assert!(matches!(
        err.code(),
        SubxErrorCode::ConnectionFailed | SubxErrorCode::Transport
    ));
    assert_eq!(err.status_code(), None);
}
