//! Donations imported from the fundraising provider.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A donation with its tax receipt number, unique per
/// (establishment, payment id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub helloasso_payment_id: i64,
    /// Major currency units (euros)
    pub amount: Decimal,
    pub donated_at: DateTime<Utc>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_address: Option<String>,
    pub donor_city: Option<String>,
    pub donor_postal_code: Option<String>,
    pub donor_country: Option<String>,
    pub payment_means: Option<String>,
    pub receipt_number: String,
    pub receipt_generated: bool,
    pub receipt_generated_at: Option<DateTime<Utc>>,
    pub source: String,
    pub raw_payload: serde_json::Value,
}

/// Convert provider minor units (cents) to major units.
pub fn amount_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
