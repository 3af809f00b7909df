// Showroom - Dealership Storefront Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod currency;
pub mod db;
pub mod entities;
pub mod feed;
pub mod financing;
pub mod schema;
pub mod session;

// Re-export commonly used types
pub use currency::{format_amount, round_half_up, Amount, CURRENCY_SUFFIX};
pub use db::{
    setup_database, SortDirection, StorageError, Store, MEMBERSHIP_RECORDS, PROVIDER_LINKS,
    VEHICLES,
};
pub use entities::{
    FuelType, MembershipDuration, MembershipRecord, PricingTable, ProviderLink, Transmission,
    Vehicle, SUBSCRIPTION_PRICING,
};
pub use feed::{ChangeFeed, FeedTransport, LocalTransport, Subscription, SubscriptionError};
pub use financing::{
    compute_monthly_payment, default_monthly_payment, FinancingOptions, DEFAULT_ANNUAL_RATE,
    DEFAULT_TERM_MONTHS, DOWN_PAYMENT_RATE, TERM_OPTIONS,
};
pub use schema::{
    validate_member, validate_provider_link, validate_vehicle, ValidationError, ValidationResult,
};
pub use session::{AdminSession, AuthError, CredentialVerifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
