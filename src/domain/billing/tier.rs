//! Pricing tier definitions.
//!
//! The catalog is built once at startup (Stripe price ids come from the
//! environment) and shared read-only with every handler.

use serde::Serialize;

/// Identifier of the free tier.
pub const FREE_TIER_ID: &str = "free";

/// Identifier of the basic paid tier.
pub const BASIC_TIER_ID: &str = "basic";

/// Identifier of the pro paid tier.
pub const PRO_TIER_ID: &str = "pro";

/// A named pricing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: String,
    pub name: String,
    /// Monthly price in the smallest currency unit (cents).
    pub price_cents: u32,
    /// Credits granted each time a billing period is paid.
    pub credits_per_period: i64,
    /// Stripe price id; `None` for tiers that cannot be purchased.
    #[serde(skip)]
    pub stripe_price_id: Option<String>,
}

impl Tier {
    /// Returns true if this tier has a price attached.
    pub fn is_paid(&self) -> bool {
        self.price_cents > 0
    }

    /// Returns true when the tier can go through Stripe checkout.
    pub fn is_purchasable(&self) -> bool {
        self.is_paid() && self.stripe_price_id.is_some()
    }
}

/// Immutable table of all tiers.
#[derive(Debug, Clone, Default)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Creates a catalog from an explicit list of tiers.
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// The standard Ziq plans: free, basic and pro.
    pub fn standard(basic_price_id: Option<String>, pro_price_id: Option<String>) -> Self {
        Self::new(vec![
            Tier {
                id: FREE_TIER_ID.to_string(),
                name: "Free".to_string(),
                price_cents: 0,
                credits_per_period: 0,
                stripe_price_id: None,
            },
            Tier {
                id: BASIC_TIER_ID.to_string(),
                name: "Basic".to_string(),
                price_cents: 999,
                credits_per_period: 300,
                stripe_price_id: basic_price_id,
            },
            Tier {
                id: PRO_TIER_ID.to_string(),
                name: "Pro".to_string(),
                price_cents: 1999,
                credits_per_period: 1000,
                stripe_price_id: pro_price_id,
            },
        ])
    }

    /// Looks up a tier by id.
    pub fn find(&self, tier_id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == tier_id)
    }

    /// Looks up the tier sold under a Stripe price id.
    pub fn find_by_price_id(&self, price_id: &str) -> Option<&Tier> {
        self.tiers
            .iter()
            .find(|t| t.stripe_price_id.as_deref() == Some(price_id))
    }

    /// All tiers in display order.
    pub fn all(&self) -> &[Tier] {
        &self.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TierCatalog {
        TierCatalog::standard(Some("price_basic".to_string()), Some("price_pro".to_string()))
    }

    #[test]
    fn standard_catalog_has_three_tiers() {
        let binding = catalog();
        let ids: Vec<&str> = binding.all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["free", "basic", "pro"]);
    }

    #[test]
    fn free_tier_is_not_purchasable() {
        let catalog = catalog();
        let free = catalog.find(FREE_TIER_ID).unwrap();
        assert!(!free.is_paid());
        assert!(!free.is_purchasable());
    }

    #[test]
    fn paid_tier_without_price_is_not_purchasable() {
        let catalog = TierCatalog::standard(None, Some("price_pro".to_string()));
        assert!(!catalog.find(BASIC_TIER_ID).unwrap().is_purchasable());
        assert!(catalog.find(PRO_TIER_ID).unwrap().is_purchasable());
    }

    #[test]
    fn find_by_price_id_maps_back_to_tier() {
        let catalog = catalog();
        assert_eq!(catalog.find_by_price_id("price_pro").unwrap().id, PRO_TIER_ID);
        assert!(catalog.find_by_price_id("price_other").is_none());
    }

    #[test]
    fn unknown_tier_is_none() {
        assert!(catalog().find("enterprise").is_none());
    }

    #[test]
    fn tier_serializes_without_price_id() {
        let catalog = catalog();
        let json = serde_json::to_value(catalog.find(PRO_TIER_ID).unwrap()).unwrap();
        assert_eq!(json["creditsPerPeriod"], 1000);
        assert!(json.get("stripePriceId").is_none());
    }
}
