//! Product and pricing data returned by the backend
//!
//! This module contains the typed results decoded from the backend's JSON
//! responses, and the client that fetches them.

pub mod products;

pub use products::{BackendClient, BackendError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best price guarantee terms for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPriceGuaranteeInfo {
    /// Product the guarantee applies to
    pub product_id: u64,
    /// Whether the product is covered by the guarantee
    #[serde(default)]
    pub is_eligible: bool,
    /// Price the retailer commits to match, if any
    #[serde(default)]
    pub guaranteed_price: Option<f64>,
    /// Competitor the guaranteed price was taken from
    #[serde(default)]
    pub competitor_name: Option<String>,
    /// End of the guarantee window
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Outcome of validating a deal against a product's pricing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealValidationInfo {
    /// Product the deal was validated for
    pub product_id: u64,
    /// Stock keeping unit of the product
    pub sku: String,
    /// Current selling price
    pub current_price: f64,
    /// Lowest price the deal may go down to
    #[serde(default)]
    pub minimum_price: Option<f64>,
    /// Whether the deal passes validation
    #[serde(default)]
    pub is_valid: bool,
    /// Reasons the deal was rejected, empty when valid
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// A competitor offering a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
}

/// A product together with the competitor offering the lowest price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductWithMinimumPriceCompetitor {
    pub id: u64,
    pub sku: String,
    pub name: String,
    pub price: f64,
    /// Cheapest competitor, absent when nobody else sells the product
    #[serde(default)]
    pub minimum_price_competitor: Option<Competitor>,
}

/// A product subcategory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: u64,
    pub name: String,
}

/// A SKU with the subcategory it is filed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSkuWithSubcat {
    pub sku: String,
    #[serde(default)]
    pub subcategory: Option<Subcategory>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_best_price_guarantee_optional_fields_default() {
        let info: BestPriceGuaranteeInfo =
            serde_json::from_value(json!({ "product_id": 7 })).expect("Should decode");

        assert_eq!(info.product_id, 7);
        assert!(!info.is_eligible);
        assert!(info.guaranteed_price.is_none());
        assert!(info.competitor_name.is_none());
        assert!(info.valid_until.is_none());
    }

    #[test]
    fn test_best_price_guarantee_parses_timestamp() {
        let info: BestPriceGuaranteeInfo = serde_json::from_value(json!({
            "product_id": 7,
            "is_eligible": true,
            "guaranteed_price": 199.5,
            "competitor_name": "ShopCo",
            "valid_until": "2026-12-31T23:59:59Z"
        }))
        .expect("Should decode");

        assert!(info.is_eligible);
        assert_eq!(info.guaranteed_price, Some(199.5));
        let valid_until = info.valid_until.expect("valid_until should be set");
        assert_eq!(valid_until.to_rfc3339(), "2026-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_deal_validation_ignores_unknown_fields() {
        let info: DealValidationInfo = serde_json::from_value(json!({
            "product_id": 3,
            "sku": "SKU-3",
            "current_price": 10.0,
            "is_valid": false,
            "reasons": ["below minimum price"],
            "internal_score": 0.42
        }))
        .expect("Should decode");

        assert_eq!(info.sku, "SKU-3");
        assert!(!info.is_valid);
        assert_eq!(info.reasons, vec!["below minimum price".to_string()]);
        assert!(info.minimum_price.is_none());
    }

    #[test]
    fn test_deal_validation_requires_sku() {
        let result: Result<DealValidationInfo, _> =
            serde_json::from_value(json!({ "product_id": 3, "current_price": 1.0 }));

        assert!(result.is_err());
    }

    #[test]
    fn test_product_with_competitor_nested_decode() {
        let product: ProductWithMinimumPriceCompetitor = serde_json::from_value(json!({
            "id": 11,
            "sku": "ABC123",
            "name": "Kettle",
            "price": 49.0,
            "minimum_price_competitor": { "name": "ShopCo", "price": 45.0 }
        }))
        .expect("Should decode");

        let competitor = product.minimum_price_competitor.expect("competitor should be set");
        assert_eq!(competitor.name, "ShopCo");
        assert!((competitor.price - 45.0).abs() < 0.001);
        assert!(competitor.url.is_none());
    }

    #[test]
    fn test_sku_with_subcat_list_decode() {
        let items: Vec<ProductSkuWithSubcat> = serde_json::from_value(json!([
            { "sku": "A1", "subcategory": { "id": 5, "name": "Kettles" } },
            { "sku": "B2", "subcategory": null }
        ]))
        .expect("Should decode");

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].subcategory,
            Some(Subcategory { id: 5, name: "Kettles".to_string() })
        );
        assert!(items[1].subcategory.is_none());
    }
}
