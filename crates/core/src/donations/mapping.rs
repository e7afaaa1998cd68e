//! Payment payload mapping
//!
//! [`PaymentRecord::from_payload`] reads a provider payment object into a
//! typed record; [`PaymentRecord::into_donation`] completes it with the
//! receipt number once the payment is known to be new.

use bergerie_domain::constants::DONATION_SOURCE_HELLOASSO;
use bergerie_domain::utils::parse_timestamp;
use bergerie_domain::{amount_from_cents, Donation};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("payment payload is malformed: {0}")]
    Malformed(String),
    #[error("payment {id} has an unparseable date: {value}")]
    InvalidDate { id: i64, value: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayment {
    id: i64,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    payment_means: Option<String>,
    #[serde(default)]
    payer: Option<RawPayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPayer {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
}

/// A payment read from the provider, not yet numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub payment_id: i64,
    pub amount_cents: i64,
    pub paid_at: Option<DateTime<Utc>>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_address: Option<String>,
    pub donor_city: Option<String>,
    pub donor_postal_code: Option<String>,
    pub donor_country: Option<String>,
    pub payment_means: Option<String>,
    pub raw_payload: Value,
}

impl PaymentRecord {
    /// Parse a payment object. Only the id is mandatory; a present but
    /// unreadable date is rejected.
    pub fn from_payload(payload: &Value) -> Result<Self, MappingError> {
        let raw: RawPayment = serde_json::from_value(payload.clone())
            .map_err(|e| MappingError::Malformed(e.to_string()))?;

        let paid_at = match raw.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(value) => Some(parse_timestamp(value).ok_or_else(|| MappingError::InvalidDate {
                id: raw.id,
                value: value.to_string(),
            })?),
            None => None,
        };

        let payer = raw.payer.unwrap_or_default();
        let donor_name = join_name(payer.first_name.as_deref(), payer.last_name.as_deref());

        Ok(Self {
            payment_id: raw.id,
            amount_cents: raw.amount,
            paid_at,
            donor_name,
            donor_email: clean(payer.email),
            donor_address: clean(payer.address),
            donor_city: clean(payer.city),
            donor_postal_code: clean(payer.zip_code),
            donor_country: clean(payer.country),
            payment_means: clean(raw.payment_means),
            raw_payload: payload.clone(),
        })
    }

    /// Build the stored donation. The receipt is marked generated at `now`;
    /// a payment without a date is dated `now`.
    pub fn into_donation(
        self,
        establishment_id: Uuid,
        receipt_number: String,
        now: DateTime<Utc>,
    ) -> Donation {
        Donation {
            id: Uuid::now_v7(),
            establishment_id,
            helloasso_payment_id: self.payment_id,
            amount: amount_from_cents(self.amount_cents),
            donated_at: self.paid_at.unwrap_or(now),
            donor_name: self.donor_name,
            donor_email: self.donor_email,
            donor_address: self.donor_address,
            donor_city: self.donor_city,
            donor_postal_code: self.donor_postal_code,
            donor_country: self.donor_country,
            payment_means: self.payment_means,
            receipt_number,
            receipt_generated: true,
            receipt_generated_at: Some(now),
            source: DONATION_SOURCE_HELLOASSO.to_string(),
            raw_payload: self.raw_payload,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> =
        [first, last].into_iter().flatten().map(str::trim).filter(|p| !p.is_empty()).collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}
