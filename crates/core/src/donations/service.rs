//! Donation-import engine
//!
//! One run per establishment pulls the authorized payments of the last
//! lookback window, skips those already stored, numbers a receipt for each
//! new one and inserts it. A payment that cannot be mapped or stored is
//! logged and counted; it never aborts the run.

use std::sync::Arc;

use async_trait::async_trait;
use bergerie_common::{Clock, Pacer};
use bergerie_domain::constants::HELLOASSO_PAYMENT_STATE;
use bergerie_domain::{
    BergerieError, Connection, Donation, DonationImportSummary, HelloAssoConfig, Provider, Result,
};
use chrono::Duration;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::mapping::PaymentRecord;
use super::ports::{DonationProvider, DonationRepository, PaymentQuery, ReceiptNumberSequence};
use crate::auth::TokenManager;
use crate::connections::ports::ConnectionRepository;
use crate::connections::tracker::{SyncTracker, Tracked};
use crate::pagination::{collect_all_pages, Page, PageSource};

/// Paging and window settings for a donation import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationImportSettings {
    pub page_size: u32,
    /// How far back payments are requested
    pub lookback: Duration,
    /// Payment state requested from the provider
    pub state: String,
}

impl Default for DonationImportSettings {
    fn default() -> Self {
        Self::from(&HelloAssoConfig::default())
    }
}

impl From<&HelloAssoConfig> for DonationImportSettings {
    fn from(config: &HelloAssoConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            lookback: Duration::days(config.lookback_days),
            state: HELLOASSO_PAYMENT_STATE.to_string(),
        }
    }
}

/// Imports HelloAsso payments as donations with receipt numbers.
pub struct DonationImportService {
    provider: Arc<dyn DonationProvider>,
    donations: Arc<dyn DonationRepository>,
    receipts: Arc<dyn ReceiptNumberSequence>,
    token_manager: Arc<TokenManager>,
    connections: Arc<dyn ConnectionRepository>,
    clock: Arc<dyn Clock>,
    pacer: Arc<dyn Pacer>,
    tracker: SyncTracker,
    settings: DonationImportSettings,
}

impl DonationImportService {
    /// Construct a service with the default settings.
    pub fn new(
        provider: Arc<dyn DonationProvider>,
        donations: Arc<dyn DonationRepository>,
        receipts: Arc<dyn ReceiptNumberSequence>,
        token_manager: Arc<TokenManager>,
        connections: Arc<dyn ConnectionRepository>,
        clock: Arc<dyn Clock>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        let tracker = SyncTracker::new(connections.clone(), clock.clone());
        Self {
            provider,
            donations,
            receipts,
            token_manager,
            connections,
            clock,
            pacer,
            tracker,
            settings: DonationImportSettings::default(),
        }
    }

    /// Replace the paging and window settings.
    pub fn with_settings(mut self, settings: DonationImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Import new donations for one establishment.
    ///
    /// # Errors
    /// - `NotFound` when the establishment has no active connection
    /// - Token, listing and repository read errors, recorded on the
    ///   connection before being returned
    #[instrument(skip(self))]
    pub async fn import_donations(&self, establishment_id: Uuid) -> Result<DonationImportSummary> {
        let connection = self
            .connections
            .find(establishment_id, Provider::HelloAsso)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| {
                BergerieError::NotFound("no active helloasso connection".to_string())
            })?;

        let summary = self.tracker.track(connection.id, self.run(connection.clone())).await?;
        info!(
            fetched = summary.fetched,
            imported = summary.imported,
            skipped_existing = summary.skipped_existing,
            failed = summary.failed,
            "donation import finished"
        );
        Ok(summary)
    }

    async fn run(&self, mut connection: Connection) -> Result<Tracked<DonationImportSummary>> {
        let slug = connection
            .organization_slug
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                BergerieError::Config("helloasso connection has no organization slug".to_string())
            })?;

        let access_token = self.token_manager.get_valid_access_token(&mut connection).await?;

        let now = self.clock.now();
        let query = PaymentQuery {
            organization_slug: slug,
            from: now - self.settings.lookback,
            to: now,
            page_size: self.settings.page_size,
            state: self.settings.state.clone(),
        };
        let source = PaymentPages { provider: self.provider.as_ref(), access_token, query };
        let payments = collect_all_pages(&source, self.pacer.as_ref()).await?;

        let mut known = self.donations.existing_payment_ids(connection.establishment_id).await?;
        let mut summary = DonationImportSummary { fetched: payments.len(), ..Default::default() };

        for payload in &payments {
            let record = match PaymentRecord::from_payload(payload) {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable payment");
                    summary.failed += 1;
                    continue;
                }
            };

            // `insert` marks the id as seen so a payment repeated across
            // pages is only stored once.
            if !known.insert(record.payment_id) {
                summary.skipped_existing += 1;
                continue;
            }

            match self.import_one(connection.establishment_id, record).await {
                Ok(()) => summary.imported += 1,
                Err(err) => {
                    warn!(error = %err, "failed to import payment");
                    summary.failed += 1;
                }
            }
        }

        Ok(Tracked::without_cursor(summary))
    }

    async fn import_one(&self, establishment_id: Uuid, record: PaymentRecord) -> Result<()> {
        let now = self.clock.now();
        let payment_id = record.payment_id;
        let receipt_number = self.receipts.next_receipt_number(establishment_id, now).await?;
        let donation = record.into_donation(establishment_id, receipt_number, now);
        self.donations.insert(&donation).await?;
        debug!(payment_id, receipt = %donation.receipt_number, "donation imported");
        Ok(())
    }

    /// Stored donations, newest first.
    pub async fn list_donations(&self, establishment_id: Uuid) -> Result<Vec<Donation>> {
        self.donations.list(establishment_id).await
    }
}

/// Adapts the provider listing to the generic pagination walk.
struct PaymentPages<'a> {
    provider: &'a dyn DonationProvider,
    access_token: String,
    query: PaymentQuery,
}

#[async_trait]
impl PageSource<Value> for PaymentPages<'_> {
    async fn fetch_page(&self, continuation_token: Option<&str>) -> Result<Page<Value>> {
        self.provider.fetch_payments_page(&self.access_token, &self.query, continuation_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let settings = DonationImportSettings::default();
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.lookback, Duration::days(3 * 365));
        assert_eq!(settings.state, "Authorized");
    }
}
