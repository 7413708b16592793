//! Catalog offerings joined with store product metadata.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use subx_lib::{Offering, Package};

use crate::store::StoreProduct;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageWithStoreProducts {
    #[serde(flatten)]
    pub package: Package,
    /// Store metadata for the package's products that the store knows about.
    pub store_products: Vec<StoreProduct>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingWithStoreProducts {
    #[serde(flatten)]
    pub offering: Offering,
    pub packages_with_products: Vec<PackageWithStoreProducts>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingsWithStoreProducts {
    pub current_offering: Option<OfferingWithStoreProducts>,
    pub all_offerings: Vec<OfferingWithStoreProducts>,
}

impl OfferingsWithStoreProducts {
    pub fn find(&self, lookup_key: &str) -> Option<&OfferingWithStoreProducts> {
        self.all_offerings
            .iter()
            .find(|o| o.offering.lookup_key == lookup_key)
    }
}

/// Unique store product ids referenced by `offerings`, in catalog order.
pub fn store_product_ids(offerings: &[Offering]) -> Vec<String> {
    let mut seen = HashSet::new();
    offerings
        .iter()
        .flat_map(|o| &o.packages)
        .flat_map(|p| &p.products)
        .filter(|p| seen.insert(p.store_product_id.as_str()))
        .map(|p| p.store_product_id.clone())
        .collect()
}

/// Attach store metadata to every package.
///
/// The current offering is the first one flagged current, else the first one.
pub fn merge_offerings(
    offerings: Vec<Offering>,
    store_products: &[StoreProduct],
) -> OfferingsWithStoreProducts {
    let by_id: HashMap<&str, &StoreProduct> = store_products
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();

    let all_offerings: Vec<OfferingWithStoreProducts> = offerings
        .into_iter()
        .map(|offering| {
            let packages_with_products = offering
                .packages
                .iter()
                .map(|package| PackageWithStoreProducts {
                    store_products: package
                        .products
                        .iter()
                        .filter_map(|p| by_id.get(p.store_product_id.as_str()))
                        .map(|p| (*p).clone())
                        .collect(),
                    package: package.clone(),
                })
                .collect();
            OfferingWithStoreProducts {
                offering,
                packages_with_products,
            }
        })
        .collect();

    let current_offering = all_offerings
        .iter()
        .find(|o| o.offering.is_current)
        .or_else(|| all_offerings.first())
        .cloned();

    OfferingsWithStoreProducts {
        current_offering,
        all_offerings,
    }
}
