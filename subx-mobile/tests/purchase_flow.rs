//! End-to-end purchase flow against a mock SubX backend.
//!
//! The native store is a scripted [`NativeIap`] implementation, the way a host
//! bridge would provide one.
//!
//! ```bash
//! cargo test -p subx-mobile --test purchase_flow
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use subx_mobile::store::{PurchaseErrorListener, PurchaseUpdatedListener};
use subx_mobile::{
    ListenerSubscription, NativeIap, NativeProduct, NativeStoreError, NoopAppStateSource,
    Platform, Purchase, StoreService, SubxMobile, SubxMobileConfig, SubxMobileError,
};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Default)]
struct ScriptedStore {
    products: Vec<NativeProduct>,
    finished: Mutex<Vec<String>>,
}

impl ScriptedStore {
    fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeIap for ScriptedStore {
    async fn init_connection(&self) -> Result<(), NativeStoreError> {
        Ok(())
    }

    async fn end_connection(&self) -> Result<(), NativeStoreError> {
        Ok(())
    }

    async fn fetch_products(&self, skus: &[String]) -> Result<Vec<NativeProduct>, NativeStoreError> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.product_id.as_ref().map_or(false, |id| skus.contains(id)))
            .cloned()
            .collect())
    }

    async fn request_purchase(&self, sku: &str) -> Result<Vec<Purchase>, NativeStoreError> {
        Ok(vec![Purchase::new(sku)
            .with_transaction_id("1000000001")
            .with_transaction_receipt("R")])
    }

    async fn get_available_purchases(&self) -> Result<Vec<Purchase>, NativeStoreError> {
        Ok(Vec::new())
    }

    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        _is_consumable: bool,
    ) -> Result<(), NativeStoreError> {
        self.finished
            .lock()
            .unwrap()
            .push(purchase.label().to_string());
        Ok(())
    }

    fn purchase_updated_listener(&self, _listener: PurchaseUpdatedListener) -> ListenerSubscription {
        ListenerSubscription::noop()
    }

    fn purchase_error_listener(&self, _listener: PurchaseErrorListener) -> ListenerSubscription {
        ListenerSubscription::noop()
    }
}

fn subscriber_body(entitlements: serde_json::Value) -> serde_json::Value {
    json!({
        "appUserId": "u1",
        "firstSeenAt": "2024-01-01T00:00:00.000Z",
        "lastSeenAt": "2024-01-01T00:00:00.000Z",
        "subscriptions": [],
        "entitlements": entitlements,
        "attributes": {}
    })
}

async fn configured(server: &MockServer, store: Arc<ScriptedStore>) -> SubxMobile {
    let subx = SubxMobile::new(
        StoreService::new(store),
        Arc::new(NoopAppStateSource),
        Platform::Ios,
    );
    subx.configure(
        SubxMobileConfig::new("pk_test")
            .with_base_url(server.uri())
            .with_entitlement_ids(["pro"]),
    )
    .await
    .unwrap();
    subx
}

async fn mount_identify(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1"))
        .and(header("X-Api-Key", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriber_body(json!([]))))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_identify_then_purchase() {
    let server = MockServer::start().await;
    mount_identify(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1/receipts"))
        .and(body_json(json!({
            "store": "app_store",
            "receiptData": "R",
            "productId": "monthly"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/subscribers/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriber_body(json!([
            {"id": "ent_1", "lookupKey": "pro", "displayName": "Pro"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(ScriptedStore::default());
    let subx = configured(&server, store.clone()).await;

    let info = subx.identify("u1").await.unwrap();
    assert_eq!(info.app_user_id, "u1");
    assert!(info.active_entitlement_ids.is_empty());

    let outcome = subx.purchase("monthly").await.unwrap();
    assert!(outcome.success);
    let info = outcome.customer_info.unwrap();
    assert!(info.is_entitled("pro"));
    assert!(info.qualifies_as_pro(&subx.entitlement_ids()));
    assert_eq!(store.finished(), vec!["1000000001"]);
}

#[tokio::test]
async fn test_rejected_receipt_leaves_transaction_open() {
    let server = MockServer::start().await;
    mount_identify(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/subscribers/u1/receipts"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid receipt"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(ScriptedStore::default());
    let subx = configured(&server, store.clone()).await;
    subx.identify("u1").await.unwrap();

    let err = subx.purchase("monthly").await.unwrap_err();
    match err {
        SubxMobileError::Client(e) => {
            assert_eq!(e.status_code(), Some(422));
            assert_eq!(e.message(), "Invalid receipt");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(store.finished().is_empty());
    assert!(subx.customer_info().unwrap().active_entitlement_ids.is_empty());
}

#[tokio::test]
async fn test_offerings_carry_store_prices() {
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
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(ScriptedStore {
        products: vec![NativeProduct {
            product_id: Some("sku1".to_string()),
            title: Some("Monthly Pro".to_string()),
            price: Some(json!("1.99")),
            currency: Some("USD".to_string()),
            localized_price: Some("$1.99".to_string()),
            ..NativeProduct::default()
        }],
        ..ScriptedStore::default()
    });
    let subx = configured(&server, store).await;

    let offerings = subx.get_offerings().await.unwrap();
    let current = offerings.current_offering.unwrap();
    assert_eq!(current.offering.lookup_key, "default");

    let store_products = &current.packages_with_products[0].store_products;
    assert_eq!(store_products.len(), 1);
    assert_eq!(store_products[0].product_id, "sku1");
    assert_eq!(store_products[0].localized_price, "$1.99");
    assert_eq!(store_products[0].price, "1.99");
}
