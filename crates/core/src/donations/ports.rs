//! Port interfaces for the fundraising provider and donation storage

use std::collections::HashSet;

use async_trait::async_trait;
use bergerie_domain::{Donation, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pagination::Page;

/// Payment listing filter for one organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQuery {
    pub organization_slug: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub page_size: u32,
    /// Payment state filter (`Authorized`)
    pub state: String,
}

/// Organisation metadata used to validate a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub name: String,
    pub slug: String,
}

/// Trait for the fundraising provider API
#[async_trait]
pub trait DonationProvider: Send + Sync {
    /// One page of payments as raw JSON
    async fn fetch_payments_page(
        &self,
        access_token: &str,
        query: &PaymentQuery,
        continuation_token: Option<&str>,
    ) -> Result<Page<serde_json::Value>>;

    /// Organisation metadata for `slug`
    async fn organization(&self, access_token: &str, slug: &str) -> Result<OrganizationInfo>;
}

/// Trait for donation persistence
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Payment ids already imported for an establishment
    async fn existing_payment_ids(&self, establishment_id: Uuid) -> Result<HashSet<i64>>;

    /// Store one donation; fails on a duplicate payment id
    async fn insert(&self, donation: &Donation) -> Result<()>;

    /// Donations for an establishment, newest first
    async fn list(&self, establishment_id: Uuid) -> Result<Vec<Donation>>;
}

/// Trait for the tax receipt numbering sequence
///
/// Numbers are unique and increase per establishment. A number drawn for a
/// donation that is then not stored is lost (gaps are tolerated).
#[async_trait]
pub trait ReceiptNumberSequence: Send + Sync {
    async fn next_receipt_number(
        &self,
        establishment_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<String>;
}
