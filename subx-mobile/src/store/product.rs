//! Store product normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::native::NativeProduct;

/// Currency reported when the store omits one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Store product metadata with platform field variations resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProduct {
    pub product_id: String,
    pub title: String,
    pub description: String,
    /// Raw price as a string, `"0"` when unknown.
    pub price: String,
    pub currency: String,
    /// Display price including the currency symbol.
    pub localized_price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_period: Option<String>,
}

impl StoreProduct {
    /// Resolve field-name differences between platforms and fill defaults.
    pub fn from_native(native: NativeProduct) -> Self {
        let price = native.price.as_ref().and_then(price_string);
        let localized_price = non_empty(native.localized_price)
            .or_else(|| non_empty(native.display_price))
            .or_else(|| price.clone().and_then(|p| non_empty(Some(p))))
            .unwrap_or_else(|| "0".to_string());

        Self {
            product_id: non_empty(native.product_id)
                .or_else(|| non_empty(native.id))
                .unwrap_or_default(),
            title: native.title.unwrap_or_default(),
            description: native.description.unwrap_or_default(),
            price: price.unwrap_or_else(|| "0".to_string()),
            currency: non_empty(native.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            localized_price,
            subscription_period: native.subscription_period,
        }
    }
}

impl From<NativeProduct> for StoreProduct {
    fn from(native: NativeProduct) -> Self {
        Self::from_native(native)
    }
}

fn price_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ios_shape() {
        let native: NativeProduct = serde_json::from_value(json!({
            "productId": "monthly",
            "title": "Monthly",
            "description": "Monthly Pro",
            "price": "4.99",
            "currency": "EUR",
            "localizedPrice": "4,99 €"
        }))
        .unwrap();

        let product = StoreProduct::from_native(native);
        assert_eq!(product.product_id, "monthly");
        assert_eq!(product.price, "4.99");
        assert_eq!(product.currency, "EUR");
        assert_eq!(product.localized_price, "4,99 €");
    }

    #[test]
    fn test_android_shape() {
        let native: NativeProduct = serde_json::from_value(json!({
            "id": "yearly",
            "price": 39.99,
            "displayPrice": "$39.99"
        }))
        .unwrap();

        let product = StoreProduct::from_native(native);
        assert_eq!(product.product_id, "yearly");
        assert_eq!(product.price, "39.99");
        assert_eq!(product.localized_price, "$39.99");
        assert_eq!(product.currency, DEFAULT_CURRENCY);
        assert_eq!(product.title, "");
    }

    #[test]
    fn test_defaults_when_everything_missing() {
        let product = StoreProduct::from_native(NativeProduct::default());
        assert_eq!(product.product_id, "");
        assert_eq!(product.price, "0");
        assert_eq!(product.localized_price, "0");
        assert!(product.subscription_period.is_none());
    }

    #[test]
    fn test_localized_price_falls_back_to_price() {
        let native = NativeProduct {
            product_id: Some("p".into()),
            price: Some(json!("1.99")),
            ..NativeProduct::default()
        };
        assert_eq!(StoreProduct::from_native(native).localized_price, "1.99");
    }
}
