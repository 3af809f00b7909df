// Persisted entity models
// Each entity carries a stable UUID identity plus created/updated timestamps;
// the gateway's copy is the single source of truth.

pub mod member;
pub mod provider_link;
pub mod vehicle;

pub use member::{MembershipDuration, MembershipRecord, PricingTable, SUBSCRIPTION_PRICING};
pub use provider_link::ProviderLink;
pub use vehicle::{FuelType, Transmission, Vehicle};
