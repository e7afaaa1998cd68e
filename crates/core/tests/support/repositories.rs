//! In-memory implementations of the core storage ports

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use bergerie_common::TokenSet;
use bergerie_core::{
    CallRecordRepository, ConnectionRepository, DonationRepository, ReceiptNumberSequence,
    SyncOutcome,
};
use bergerie_domain::{
    BergerieError, CallRecord, Connection, Donation, Provider, Result as DomainResult, SyncState,
};
use chrono::{DateTime, Datelike, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// Connections keyed by (establishment, provider), with every sync
/// checkpoint recorded in order.
#[derive(Default, Clone)]
pub struct InMemoryConnectionRepository {
    rows: Arc<Mutex<Vec<Connection>>>,
    outcomes: Arc<Mutex<Vec<SyncOutcome>>>,
}

impl InMemoryConnectionRepository {
    pub fn with_connection(connection: Connection) -> Self {
        let repo = Self::default();
        repo.rows.lock().push(connection);
        repo
    }

    pub fn get(&self, establishment_id: Uuid, provider: Provider) -> Option<Connection> {
        self.rows
            .lock()
            .iter()
            .find(|c| c.establishment_id == establishment_id && c.provider == provider)
            .cloned()
    }

    pub fn outcomes(&self) -> Vec<SyncOutcome> {
        self.outcomes.lock().clone()
    }

    fn with_row<F: FnOnce(&mut Connection)>(&self, connection_id: Uuid, f: F) -> DomainResult<()> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| BergerieError::NotFound(format!("connection {connection_id}")))?;
        f(row);
        Ok(())
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn find(
        &self,
        establishment_id: Uuid,
        provider: Provider,
    ) -> DomainResult<Option<Connection>> {
        Ok(self.get(establishment_id, provider))
    }

    async fn list_active(&self, provider: Provider) -> DomainResult<Vec<Connection>> {
        let rows = self.rows.lock();
        Ok(rows.iter().filter(|c| c.provider == provider && c.is_active).cloned().collect())
    }

    async fn save(&self, connection: &Connection) -> DomainResult<()> {
        let mut rows = self.rows.lock();
        rows.retain(|c| {
            !(c.establishment_id == connection.establishment_id
                && c.provider == connection.provider)
        });
        rows.push(connection.clone());
        Ok(())
    }

    async fn update_tokens(
        &self,
        connection_id: Uuid,
        tokens: &TokenSet,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.with_row(connection_id, |row| {
            row.access_token = Some(tokens.access_token.clone());
            row.refresh_token = tokens.refresh_token.clone();
            row.token_expires_at = Some(tokens.expires_at);
            row.updated_at = at;
        })
    }

    async fn update_sync_state(
        &self,
        connection_id: Uuid,
        outcome: &SyncOutcome,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.outcomes.lock().push(outcome.clone());
        self.with_row(connection_id, |row| {
            match outcome {
                SyncOutcome::Started => row.sync_status = SyncState::Syncing,
                SyncOutcome::Succeeded { cursor } => {
                    row.sync_status = SyncState::Idle;
                    row.sync_error = None;
                    row.last_sync_at = Some(at);
                    if let Some(cursor) = cursor {
                        row.sync_cursor = Some(cursor.clone());
                    }
                }
                SyncOutcome::Failed { message } => {
                    row.sync_status = SyncState::Error;
                    row.sync_error = Some(message.clone());
                }
            }
            row.updated_at = at;
        })
    }

    async fn delete(&self, establishment_id: Uuid, provider: Provider) -> DomainResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|c| !(c.establishment_id == establishment_id && c.provider == provider));
        Ok(rows.len() != before)
    }
}

/// Call log keyed by (establishment, provider call id).
#[derive(Default, Clone)]
pub struct InMemoryCallRepository {
    rows: Arc<Mutex<HashMap<(Uuid, String), CallRecord>>>,
    fail_upserts: bool,
}

impl InMemoryCallRepository {
    pub fn failing() -> Self {
        Self { fail_upserts: true, ..Self::default() }
    }

    pub fn get(&self, establishment_id: Uuid, call_id: &str) -> Option<CallRecord> {
        self.rows.lock().get(&(establishment_id, call_id.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }
}

#[async_trait]
impl CallRecordRepository for InMemoryCallRepository {
    async fn upsert_batch(&self, records: &[CallRecord]) -> DomainResult<usize> {
        if self.fail_upserts {
            return Err(BergerieError::Database("disk I/O error".to_string()));
        }
        let mut rows = self.rows.lock();
        for record in records {
            let key = (record.establishment_id, record.provider_call_id.clone());
            let handled_at = rows.get(&key).and_then(|existing| existing.callback_handled_at);
            let mut stored = record.clone();
            stored.callback_handled_at = handled_at;
            rows.insert(key, stored);
        }
        Ok(records.len())
    }

    async fn pending_callbacks(&self, establishment_id: Uuid) -> DomainResult<Vec<CallRecord>> {
        let mut pending: Vec<CallRecord> = self
            .rows
            .lock()
            .values()
            .filter(|r| {
                r.establishment_id == establishment_id
                    && r.callback_needed
                    && r.callback_handled_at.is_none()
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(pending)
    }

    async fn mark_callback_handled(
        &self,
        establishment_id: Uuid,
        provider_call_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut rows = self.rows.lock();
        match rows.get_mut(&(establishment_id, provider_call_id.to_string())) {
            Some(row) => {
                row.callback_handled_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, establishment_id: Uuid) -> DomainResult<usize> {
        Ok(self.rows.lock().keys().filter(|(est, _)| *est == establishment_id).count())
    }
}

/// Donations with a uniqueness check on (establishment, payment id).
#[derive(Default, Clone)]
pub struct InMemoryDonationRepository {
    rows: Arc<Mutex<Vec<Donation>>>,
    rejected_payment_ids: Arc<HashSet<i64>>,
}

impl InMemoryDonationRepository {
    /// Inserts of these payment ids fail with a database error.
    pub fn rejecting(payment_ids: impl IntoIterator<Item = i64>) -> Self {
        let rejected = payment_ids.into_iter().collect();
        Self { rejected_payment_ids: Arc::new(rejected), ..Self::default() }
    }

    pub fn seed(&self, donation: Donation) {
        self.rows.lock().push(donation);
    }

    pub fn all(&self) -> Vec<Donation> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn existing_payment_ids(&self, establishment_id: Uuid) -> DomainResult<HashSet<i64>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|d| d.establishment_id == establishment_id)
            .map(|d| d.helloasso_payment_id)
            .collect())
    }

    async fn insert(&self, donation: &Donation) -> DomainResult<()> {
        if self.rejected_payment_ids.contains(&donation.helloasso_payment_id) {
            return Err(BergerieError::Database("constraint failed".to_string()));
        }
        let mut rows = self.rows.lock();
        if rows.iter().any(|d| {
            d.establishment_id == donation.establishment_id
                && d.helloasso_payment_id == donation.helloasso_payment_id
        }) {
            return Err(BergerieError::Database("UNIQUE constraint failed".to_string()));
        }
        rows.push(donation.clone());
        Ok(())
    }

    async fn list(&self, establishment_id: Uuid) -> DomainResult<Vec<Donation>> {
        let mut donations: Vec<Donation> = self
            .rows
            .lock()
            .iter()
            .filter(|d| d.establishment_id == establishment_id)
            .cloned()
            .collect();
        donations.sort_by(|a, b| b.donated_at.cmp(&a.donated_at));
        Ok(donations)
    }
}

/// Per-establishment counter formatted as `{year}-{seq:05}`.
#[derive(Default, Clone)]
pub struct CountingReceiptSequence {
    counters: Arc<Mutex<HashMap<Uuid, u64>>>,
}

#[async_trait]
impl ReceiptNumberSequence for CountingReceiptSequence {
    async fn next_receipt_number(
        &self,
        establishment_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> DomainResult<String> {
        let mut counters = self.counters.lock();
        let next = counters.entry(establishment_id).or_insert(0);
        *next += 1;
        Ok(format!("{}-{:05}", issued_at.year(), next))
    }
}
