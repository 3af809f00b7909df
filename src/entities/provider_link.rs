// 🔗 Provider Link - Outbound payment/telecom redirect target
//
// Admin-editable (name, URL); the checkout dialog reads these to offer
// payment providers. URLs must be HTTP(S) - enforced by schema validation
// before the record reaches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLink {
    /// Stable identity (UUID) - never changes
    pub id: String,

    /// Display name shown on the checkout button
    pub name: String,

    /// Redirect target; must start with http:// or https://
    pub url: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderLink {
    pub fn new(name: &str, url: &str) -> Self {
        let now = Utc::now();

        ProviderLink {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            url: url.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
