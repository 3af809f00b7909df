// 🚗 Vehicle Entity - Catalog listing
//
// Identity: UUID (never changes)
// Values: make, model, price, monthly payment, etc. (admin-editable)
//
// The monthly payment is derived from the price by default. An admin may
// override it; the override wins until the next price edit, which always
// recomputes the payment and clears the override.

use crate::currency::Amount;
use crate::financing::default_monthly_payment;
use crate::schema::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSMISSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
    Cvt,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Automatic => "automatic",
            Transmission::Manual => "manual",
            Transmission::Cvt => "cvt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "automatic" => Some(Transmission::Automatic),
            "manual" => Some(Transmission::Manual),
            "cvt" => Some(Transmission::Cvt),
            _ => None,
        }
    }
}

// ============================================================================
// FUEL TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasoline => "gasoline",
            FuelType::Diesel => "diesel",
            FuelType::Hybrid => "hybrid",
            FuelType::Electric => "electric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "gasoline" => Some(FuelType::Gasoline),
            "diesel" => Some(FuelType::Diesel),
            "hybrid" => Some(FuelType::Hybrid),
            "electric" => Some(FuelType::Electric),
            _ => None,
        }
    }
}

// ============================================================================
// VEHICLE ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identity (UUID) - never changes
    pub id: String,

    pub make: String,
    pub model: String,
    pub year: i32,

    /// List price in currency minor units; always > 0 for a valid listing
    pub price: Amount,

    /// Monthly installment shown on the listing card. Derived from the
    /// price unless an admin overrode it explicitly.
    pub monthly_payment: Amount,

    /// True while an explicit payment override is in effect
    pub payment_overridden: bool,

    pub image_url: String,

    /// Odometer reading; None for listings that omit it
    pub mileage: Option<i64>,

    pub transmission: Transmission,
    pub fuel_type: FuelType,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Create a new listing with the monthly payment derived from the
    /// default financing terms. Fails if the price cannot be financed
    /// (non-positive).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        make: &str,
        model: &str,
        year: i32,
        price: Amount,
        image_url: &str,
        mileage: Option<i64>,
        transmission: Transmission,
        fuel_type: FuelType,
    ) -> Result<Self, ValidationError> {
        let monthly_payment = default_monthly_payment(price)?;
        let now = Utc::now();

        Ok(Vehicle {
            id: uuid::Uuid::new_v4().to_string(),
            make: make.to_string(),
            model: model.to_string(),
            year,
            price,
            monthly_payment,
            payment_overridden: false,
            image_url: image_url.to_string(),
            mileage,
            transmission,
            fuel_type,
            created_at: now,
            updated_at: now,
        })
    }

    /// Change the list price. Always recomputes the monthly payment and
    /// clears any explicit override.
    pub fn set_price(&mut self, price: Amount) -> Result<(), ValidationError> {
        self.monthly_payment = default_monthly_payment(price)?;
        self.price = price;
        self.payment_overridden = false;
        self.touch();
        Ok(())
    }

    /// Explicitly override the monthly payment. The override wins until
    /// the next price edit.
    pub fn override_monthly_payment(&mut self, monthly_payment: Amount) {
        self.monthly_payment = monthly_payment;
        self.payment_overridden = true;
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

    fn corolla() -> Vehicle {
        Vehicle::new(
            "Toyota",
            "Corolla",
            2024,
            3_200_000,
            "https://example.com/corolla.jpg",
            Some(0),
            Transmission::Automatic,
            FuelType::Gasoline,
        )
        .unwrap()
    }

    #[test]
    fn test_new_listing_derives_payment() {
        let vehicle = corolla();
        assert_eq!(
            vehicle.monthly_payment,
            default_monthly_payment(3_200_000).unwrap()
        );
        assert!(!vehicle.payment_overridden);
        assert!(!vehicle.id.is_empty());
    }

    #[test]
    fn test_price_edit_recomputes_payment() {
        let mut vehicle = corolla();
        let before = vehicle.monthly_payment;

        vehicle.set_price(4_000_000).unwrap();

        assert_eq!(
            vehicle.monthly_payment,
            default_monthly_payment(4_000_000).unwrap()
        );
        // A 25% higher price means a proportionally higher installment
        assert!(vehicle.monthly_payment > before);
    }

    #[test]
    fn test_override_wins_until_next_price_edit() {
        let mut vehicle = corolla();

        vehicle.override_monthly_payment(50_000);
        assert_eq!(vehicle.monthly_payment, 50_000);
        assert!(vehicle.payment_overridden);

        // Price edit takes precedence again
        vehicle.set_price(4_000_000).unwrap();
        assert!(!vehicle.payment_overridden);
        assert_eq!(
            vehicle.monthly_payment,
            default_monthly_payment(4_000_000).unwrap()
        );
    }

    #[test]
    fn test_invalid_price_edit_leaves_listing_intact() {
        let mut vehicle = corolla();
        let before = vehicle.clone();

        assert!(vehicle.set_price(0).is_err());

        assert_eq!(vehicle.price, before.price);
        assert_eq!(vehicle.monthly_payment, before.monthly_payment);
    }

    #[test]
    fn test_enum_round_trips() {
        for t in [Transmission::Automatic, Transmission::Manual, Transmission::Cvt] {
            assert_eq!(Transmission::parse(t.as_str()), Some(t));
        }
        for f in [
            FuelType::Gasoline,
            FuelType::Diesel,
            FuelType::Hybrid,
            FuelType::Electric,
        ] {
            assert_eq!(FuelType::parse(f.as_str()), Some(f));
        }
        assert_eq!(Transmission::parse("rocket"), None);
        assert_eq!(FuelType::parse("coal"), None);
    }
}
