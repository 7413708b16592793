//! Customer info snapshots.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use subx_lib::{Entitlement, SubscriberResponse, Subscription};

/// Immutable view of a subscriber, replaced wholesale on every refresh.
///
/// `active_entitlement_ids` is derived from `entitlements` and always holds
/// exactly their lookup keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub app_user_id: String,
    pub subscriptions: Vec<Subscription>,
    pub entitlements: Vec<Entitlement>,
    pub attributes: HashMap<String, String>,
    pub active_entitlement_ids: BTreeSet<String>,
}

impl CustomerInfo {
    pub fn is_entitled(&self, lookup_key: &str) -> bool {
        self.active_entitlement_ids.contains(lookup_key)
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    /// Whether the customer counts as "pro".
    ///
    /// With a non-empty `entitlement_ids` list, any one of those lookup keys
    /// qualifies. Otherwise any active subscription does.
    pub fn qualifies_as_pro(&self, entitlement_ids: &[String]) -> bool {
        if entitlement_ids.is_empty() {
            self.has_active_subscription()
        } else {
            entitlement_ids.iter().any(|id| self.is_entitled(id))
        }
    }
}

impl From<SubscriberResponse> for CustomerInfo {
    fn from(subscriber: SubscriberResponse) -> Self {
        let active_entitlement_ids = subscriber
            .entitlements
            .iter()
            .map(|e| e.lookup_key.clone())
            .collect();

        Self {
            app_user_id: subscriber.app_user_id,
            subscriptions: subscriber.subscriptions,
            entitlements: subscriber.entitlements,
            attributes: subscriber.attributes,
            active_entitlement_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subx_lib::test_utils::{entitlement, subscriber, subscription};

    #[test]
    fn test_no_entitlements() {
        let info = CustomerInfo::from(subscriber("u1"));
        assert_eq!(info.app_user_id, "u1");
        assert!(info.active_entitlement_ids.is_empty());
        assert!(!info.qualifies_as_pro(&[]));
    }

    #[test]
    fn test_active_ids_follow_lookup_keys() {
        let mut response = subscriber("u1");
        response.entitlements = vec![entitlement("pro"), entitlement("team"), entitlement("pro")];

        let info = CustomerInfo::from(response);
        assert_eq!(
            info.active_entitlement_ids.iter().collect::<Vec<_>>(),
            vec!["pro", "team"]
        );
        assert!(info.is_entitled("team"));
        assert!(!info.is_entitled("ent_team"));
    }

    #[test]
    fn test_pro_with_configured_entitlements() {
        let mut response = subscriber("u1");
        response.entitlements = vec![entitlement("team")];
        response.subscriptions = vec![subscription("monthly", "active")];
        let info = CustomerInfo::from(response);

        assert!(!info.qualifies_as_pro(&["pro".to_string()]));
        assert!(info.qualifies_as_pro(&["pro".to_string(), "team".to_string()]));
    }

    #[test]
    fn test_pro_falls_back_to_active_subscription() {
        let mut response = subscriber("u1");
        response.subscriptions = vec![subscription("monthly", "expired")];
        assert!(!CustomerInfo::from(response.clone()).qualifies_as_pro(&[]));

        response.subscriptions.push(subscription("yearly", "active"));
        assert!(CustomerInfo::from(response).qualifies_as_pro(&[]));
    }
}
