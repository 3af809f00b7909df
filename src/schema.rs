// 📐 Shape Layer - Record validation
// Validates records before they are handed to the persistence gateway.
// A record that fails validation never reaches storage; the errors are
// surfaced inline next to the offending fields.

use crate::entities::{MembershipRecord, ProviderLink, Vehicle};
use chrono::{Datelike, Utc};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(context: &str, field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// FIELD RULES
// ============================================================================

/// Earliest model year accepted into the catalog
pub const MIN_MODEL_YEAR: i32 = 1900;

/// Latest model year accepted: next year's models are already sold
pub fn max_model_year() -> i32 {
    Utc::now().year() + 1
}

/// Provider links may only redirect over HTTP(S)
pub fn has_supported_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// ============================================================================
// ENTITY VALIDATORS
// ============================================================================

/// Validate a vehicle listing before it reaches the gateway
pub fn validate_vehicle(vehicle: &Vehicle) -> ValidationResult {
    let mut errors = Vec::new();
    let context = "Vehicle";

    if vehicle.make.trim().is_empty() {
        errors.push(ValidationError::new(context, "make", "Required field is empty"));
    }

    if vehicle.model.trim().is_empty() {
        errors.push(ValidationError::new(context, "model", "Required field is empty"));
    }

    if vehicle.image_url.trim().is_empty() {
        errors.push(ValidationError::new(context, "image_url", "Required field is empty"));
    }

    let max_year = max_model_year();
    if vehicle.year < MIN_MODEL_YEAR || vehicle.year > max_year {
        errors.push(ValidationError::new(
            context,
            "year",
            &format!("Year must be between {} and {}", MIN_MODEL_YEAR, max_year),
        ));
    }

    if vehicle.price <= 0 {
        errors.push(ValidationError::new(
            context,
            "price",
            "Price must be greater than zero",
        ));
    }

    if let Some(mileage) = vehicle.mileage {
        if mileage < 0 {
            errors.push(ValidationError::new(
                context,
                "mileage",
                "Mileage cannot be negative",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a membership record.
///
/// Membership type (free text) and membership duration are mutually
/// exclusive in the admin form, but storage accepts either; we only
/// require that at least one of them is present.
pub fn validate_member(member: &MembershipRecord) -> ValidationResult {
    let mut errors = Vec::new();
    let context = "MembershipRecord";

    if member.name.trim().is_empty() {
        errors.push(ValidationError::new(context, "name", "Required field is empty"));
    }

    if member.email.trim().is_empty() {
        errors.push(ValidationError::new(context, "email", "Required field is empty"));
    } else if !member.email.contains('@') {
        errors.push(ValidationError::new(context, "email", "Not a valid email address"));
    }

    if member.membership_duration.is_none() && member.membership_type.trim().is_empty() {
        errors.push(ValidationError::new(
            context,
            "membership_type",
            "Either a membership type or a duration is required",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an outbound provider link
pub fn validate_provider_link(link: &ProviderLink) -> ValidationResult {
    let mut errors = Vec::new();
    let context = "ProviderLink";

    if link.name.trim().is_empty() {
        errors.push(ValidationError::new(context, "name", "Required field is empty"));
    }

    if !has_supported_scheme(&link.url) {
        errors.push(ValidationError::new(
            context,
            "url",
            "URL must start with http:// or https://",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FuelType, MembershipDuration, Transmission};

    fn sample_vehicle() -> Vehicle {
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
    fn test_valid_vehicle_passes() {
        assert!(validate_vehicle(&sample_vehicle()).is_ok());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut vehicle = sample_vehicle();
        vehicle.price = 0;
        let errors = validate_vehicle(&vehicle).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "price"));

        vehicle.price = -500;
        let errors = validate_vehicle(&vehicle).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "price"));
    }

    #[test]
    fn test_year_out_of_range_rejected() {
        let mut vehicle = sample_vehicle();

        vehicle.year = 1899;
        let errors = validate_vehicle(&vehicle).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "year"));

        vehicle.year = max_model_year() + 1;
        let errors = validate_vehicle(&vehicle).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "year"));

        // Next year's models are fine
        vehicle.year = max_model_year();
        assert!(validate_vehicle(&vehicle).is_ok());
    }

    #[test]
    fn test_negative_mileage_rejected() {
        let mut vehicle = sample_vehicle();
        vehicle.mileage = Some(-1);
        let errors = validate_vehicle(&vehicle).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "mileage"));
    }

    #[test]
    fn test_member_requires_type_or_duration() {
        let mut member =
            MembershipRecord::new("Amine", "amine@example.com", "0550 12 34 56", "", None);
        let errors = validate_member(&member).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "membership_type"));

        member.set_duration(Some(MembershipDuration::Monthly));
        assert!(validate_member(&member).is_ok());
    }

    #[test]
    fn test_member_email_shape() {
        let member = MembershipRecord::new("Amine", "not-an-email", "", "VIP", None);
        let errors = validate_member(&member).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "email"));
    }

    #[test]
    fn test_provider_link_scheme() {
        let good = ProviderLink::new("BaridiMob", "https://example.com");
        assert!(validate_provider_link(&good).is_ok());

        let plain = ProviderLink::new("BaridiMob", "http://example.com");
        assert!(validate_provider_link(&plain).is_ok());

        let bad = ProviderLink::new("BaridiMob", "ftp://example.com");
        let errors = validate_provider_link(&bad).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "url"));

        let empty = ProviderLink::new("BaridiMob", "");
        assert!(validate_provider_link(&empty).is_err());
    }
}
