//! Site Settings Model (singleton)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Homepage hero banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroBanner {
    pub image: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub link: Option<String>,
}

/// Storefront-wide settings, stored as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub store_name: String,
    pub logo: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub currency: String,
    /// Flat shipping fee charged per order
    pub shipping_fee: f64,
    /// Orders whose discounted subtotal reaches this amount ship free
    pub free_shipping_threshold: Option<f64>,
    /// Percent, applied at the POS
    pub tax_rate: f64,
    pub social_links: BTreeMap<String, String>,
    pub hero_banners: Vec<HeroBanner>,
    pub footer_text: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            store_name: "Shop".to_string(),
            logo: None,
            contact_email: None,
            contact_phone: None,
            address: None,
            currency: "USD".to_string(),
            shipping_fee: 0.0,
            free_shipping_threshold: None,
            tax_rate: 0.0,
            social_links: BTreeMap::new(),
            hero_banners: Vec::new(),
            footer_text: None,
        }
    }
}

impl SiteSettings {
    /// Shipping fee for an order whose subtotal after discount is `amount`
    pub fn shipping_fee_for(&self, amount: f64) -> f64 {
        match self.free_shipping_threshold {
            Some(threshold) if amount >= threshold => 0.0,
            _ => self.shipping_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let s: SiteSettings = serde_json::from_str(r#"{"store_name":"Acme"}"#).unwrap();
        assert_eq!(s.store_name, "Acme");
        assert_eq!(s.currency, "USD");
        assert!(s.hero_banners.is_empty());
    }

    #[test]
    fn test_free_shipping_threshold() {
        let s = SiteSettings {
            shipping_fee: 5.0,
            free_shipping_threshold: Some(100.0),
            ..Default::default()
        };
        assert_eq!(s.shipping_fee_for(99.99), 5.0);
        assert_eq!(s.shipping_fee_for(100.0), 0.0);

        let s = SiteSettings {
            shipping_fee: 5.0,
            ..Default::default()
        };
        assert_eq!(s.shipping_fee_for(10_000.0), 5.0);
    }
}
