// 👤 Membership Record - Dealership club member
//
// The admin form offers either a free-text membership type or a fixed
// subscription duration. When a duration is chosen, the subscription
// price is derived from the process-wide pricing table.

use crate::currency::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SUBSCRIPTION PRICING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipDuration {
    Monthly,
    Quarterly,
    Yearly,
}

impl MembershipDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipDuration::Monthly => "monthly",
            MembershipDuration::Quarterly => "quarterly",
            MembershipDuration::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "monthly" => Some(MembershipDuration::Monthly),
            "quarterly" => Some(MembershipDuration::Quarterly),
            "yearly" => Some(MembershipDuration::Yearly),
            _ => None,
        }
    }
}

/// Duration → subscription price mapping. Process-wide constant, not
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct PricingTable {
    pub monthly: Amount,
    pub quarterly: Amount,
    pub yearly: Amount,
}

impl PricingTable {
    pub const fn price_for(&self, duration: MembershipDuration) -> Amount {
        match duration {
            MembershipDuration::Monthly => self.monthly,
            MembershipDuration::Quarterly => self.quarterly,
            MembershipDuration::Yearly => self.yearly,
        }
    }
}

/// Current subscription pricing (quarterly and yearly carry a discount
/// over stacking monthly terms)
pub const SUBSCRIPTION_PRICING: PricingTable = PricingTable {
    monthly: 5_000,
    quarterly: 13_500,
    yearly: 48_000,
};

// ============================================================================
// MEMBERSHIP RECORD
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Stable identity (UUID) - never changes
    pub id: String,

    pub name: String,
    pub email: String,
    pub phone: String,

    /// Free-text membership label; empty when a duration is set
    pub membership_type: String,

    /// Fixed subscription duration, if the member is on one
    pub membership_duration: Option<MembershipDuration>,

    /// Derived from the duration via the pricing table; None without one
    pub subscription_price: Option<Amount>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub fn new(
        name: &str,
        email: &str,
        phone: &str,
        membership_type: &str,
        membership_duration: Option<MembershipDuration>,
    ) -> Self {
        let now = Utc::now();

        MembershipRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            membership_type: membership_type.to_string(),
            membership_duration,
            subscription_price: membership_duration
                .map(|d| SUBSCRIPTION_PRICING.price_for(d)),
            created_at: now,
            updated_at: now,
        }
    }

    /// Switch the member onto (or off) a fixed duration. Choosing a
    /// duration clears the free-text type and re-derives the price.
    pub fn set_duration(&mut self, duration: Option<MembershipDuration>) {
        self.membership_duration = duration;
        self.subscription_price = duration.map(|d| SUBSCRIPTION_PRICING.price_for(d));
        if duration.is_some() {
            self.membership_type.clear();
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_table() {
        assert_eq!(
            SUBSCRIPTION_PRICING.price_for(MembershipDuration::Monthly),
            5_000
        );
        assert_eq!(
            SUBSCRIPTION_PRICING.price_for(MembershipDuration::Quarterly),
            13_500
        );
        assert_eq!(
            SUBSCRIPTION_PRICING.price_for(MembershipDuration::Yearly),
            48_000
        );
    }

    #[test]
    fn test_new_member_with_duration_gets_priced() {
        let member = MembershipRecord::new(
            "Amine",
            "amine@example.com",
            "0550 12 34 56",
            "",
            Some(MembershipDuration::Yearly),
        );
        assert_eq!(member.subscription_price, Some(48_000));
    }

    #[test]
    fn test_free_text_member_has_no_price() {
        let member = MembershipRecord::new("Amine", "amine@example.com", "", "VIP", None);
        assert_eq!(member.subscription_price, None);
        assert_eq!(member.membership_type, "VIP");
    }

    #[test]
    fn test_choosing_duration_clears_type() {
        let mut member = MembershipRecord::new("Amine", "amine@example.com", "", "VIP", None);

        member.set_duration(Some(MembershipDuration::Quarterly));
        assert_eq!(member.subscription_price, Some(13_500));
        assert!(member.membership_type.is_empty());

        member.set_duration(None);
        assert_eq!(member.subscription_price, None);
    }

    #[test]
    fn test_duration_round_trips() {
        for d in [
            MembershipDuration::Monthly,
            MembershipDuration::Quarterly,
            MembershipDuration::Yearly,
        ] {
            assert_eq!(MembershipDuration::parse(d.as_str()), Some(d));
        }
        assert_eq!(MembershipDuration::parse("weekly"), None);
    }
}
