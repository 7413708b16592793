//! Test fixtures for API payloads.

use std::collections::HashMap;

use crate::types::{
    Entitlement, Offering, Package, Product, ProductType, SubscriberResponse, Subscription,
};

const FIXTURE_TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

/// Subscriber with no subscriptions, entitlements or attributes.
pub fn subscriber(app_user_id: &str) -> SubscriberResponse {
    SubscriberResponse {
        app_user_id: app_user_id.to_string(),
        first_seen_at: FIXTURE_TIMESTAMP.to_string(),
        last_seen_at: FIXTURE_TIMESTAMP.to_string(),
        subscriptions: Vec::new(),
        entitlements: Vec::new(),
        attributes: HashMap::new(),
    }
}

/// Entitlement whose id and display name are derived from the lookup key.
pub fn entitlement(lookup_key: &str) -> Entitlement {
    Entitlement {
        id: format!("ent_{}", lookup_key),
        lookup_key: lookup_key.to_string(),
        display_name: lookup_key.to_uppercase(),
    }
}

/// Subscription to `product_id` with the given server status.
pub fn subscription(product_id: &str, status: &str) -> Subscription {
    Subscription {
        id: format!("sub_{}", product_id),
        product_id: product_id.to_string(),
        store: "app_store".to_string(),
        status: status.to_string(),
        started_at: FIXTURE_TIMESTAMP.to_string(),
        expires_at: None,
        is_trial: false,
        auto_renew_enabled: true,
        product: None,
    }
}

/// Subscription product linked to `store_product_id`.
pub fn product(store_product_id: &str) -> Product {
    Product {
        id: format!("prod_{}", store_product_id),
        store_product_id: store_product_id.to_string(),
        product_type: ProductType::Subscription,
        display_name: store_product_id.to_string(),
    }
}

pub fn package(lookup_key: &str, products: Vec<Product>) -> Package {
    Package {
        id: format!("pkg_{}", lookup_key),
        lookup_key: lookup_key.to_string(),
        display_name: lookup_key.to_string(),
        products,
    }
}

pub fn offering(lookup_key: &str, is_current: bool, packages: Vec<Package>) -> Offering {
    Offering {
        id: format!("off_{}", lookup_key),
        lookup_key: lookup_key.to_string(),
        display_name: lookup_key.to_string(),
        is_current,
        packages,
    }
}
