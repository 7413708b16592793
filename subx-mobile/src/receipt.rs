//! Mapping of native purchase records to receipt submissions.

use subx_lib::ReceiptData;

use crate::platform::Platform;
use crate::store::Purchase;

/// Build the receipt submission for `purchase`.
///
/// iOS reads the transaction receipt first and falls back to the purchase
/// token; Android reads them in the opposite order. When neither is present
/// the payload is empty and the server decides.
pub fn map_purchase_to_receipt(purchase: &Purchase, platform: Platform) -> ReceiptData {
    let receipt = present(&purchase.transaction_receipt);
    let token = present(&purchase.purchase_token);

    let payload = match platform {
        Platform::Ios => receipt.or(token),
        Platform::Android => token.or(receipt),
    };

    ReceiptData {
        store: platform.store_name(),
        receipt_data: payload.unwrap_or_default().to_string(),
        product_id: purchase.product_id.clone(),
        price: None,
        currency: None,
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use subx_lib::StoreName;

    #[test]
    fn test_ios_uses_transaction_receipt() {
        let purchase = Purchase::new("p1").with_transaction_receipt("R");
        let receipt = map_purchase_to_receipt(&purchase, Platform::Ios);

        assert_eq!(receipt.store, StoreName::AppStore);
        assert_eq!(receipt.receipt_data, "R");
        assert_eq!(receipt.product_id, "p1");
        assert!(receipt.price.is_none());
    }

    #[test]
    fn test_android_uses_purchase_token() {
        let purchase = Purchase::new("p1").with_purchase_token("T");
        let receipt = map_purchase_to_receipt(&purchase, Platform::Android);

        assert_eq!(receipt.store, StoreName::PlayStore);
        assert_eq!(receipt.receipt_data, "T");
        assert_eq!(receipt.product_id, "p1");
    }

    #[test]
    fn test_platform_decides_precedence() {
        let purchase = Purchase::new("p1")
            .with_transaction_receipt("R")
            .with_purchase_token("T");

        assert_eq!(map_purchase_to_receipt(&purchase, Platform::Ios).receipt_data, "R");
        assert_eq!(map_purchase_to_receipt(&purchase, Platform::Android).receipt_data, "T");
    }

    #[test]
    fn test_fallbacks() {
        let token_only = Purchase::new("p1").with_purchase_token("T");
        assert_eq!(map_purchase_to_receipt(&token_only, Platform::Ios).receipt_data, "T");

        let receipt_only = Purchase::new("p1").with_transaction_receipt("R");
        assert_eq!(
            map_purchase_to_receipt(&receipt_only, Platform::Android).receipt_data,
            "R"
        );

        let empty_receipt = Purchase::new("p1")
            .with_transaction_receipt("")
            .with_purchase_token("T");
        assert_eq!(map_purchase_to_receipt(&empty_receipt, Platform::Ios).receipt_data, "T");
    }

    #[test]
    fn test_missing_payload_is_empty() {
        let receipt = map_purchase_to_receipt(&Purchase::new("p1"), Platform::Ios);
        assert_eq!(receipt.receipt_data, "");
    }

    #[test]
    fn test_wire_shape() {
        let purchase = Purchase::new("p1").with_transaction_receipt("R");
        let json = serde_json::to_value(map_purchase_to_receipt(&purchase, Platform::Ios)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"store": "app_store", "receiptData": "R", "productId": "p1"})
        );
    }
}
