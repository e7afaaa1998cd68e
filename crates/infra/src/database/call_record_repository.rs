//! SQLite implementation of the CallRecordRepository port.

use async_trait::async_trait;
use bergerie_core::CallRecordRepository;
use bergerie_domain::{BergerieError, CallRecord, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio::task::{self, JoinError};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::columns::parsed;
use super::manager::{checkout, map_join_error, DbPool};
use crate::errors::InfraError;

/// Upsert keyed by (establishment, provider call id). `callback_handled_at`
/// is absent from the update list so a resync never clears it.
const UPSERT_SQL: &str = "INSERT INTO call_records (
        establishment_id, provider_call_id, direction, status, from_number, to_number,
        contact_number, start_time, end_time, duration_seconds, wait_seconds, recording_url,
        voicemail_url, agent_name, callback_needed, callback_handled_at, raw_payload, synced_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
     ON CONFLICT(establishment_id, provider_call_id) DO UPDATE SET
        direction = excluded.direction,
        status = excluded.status,
        from_number = excluded.from_number,
        to_number = excluded.to_number,
        contact_number = excluded.contact_number,
        start_time = excluded.start_time,
        end_time = excluded.end_time,
        duration_seconds = excluded.duration_seconds,
        wait_seconds = excluded.wait_seconds,
        recording_url = excluded.recording_url,
        voicemail_url = excluded.voicemail_url,
        agent_name = excluded.agent_name,
        callback_needed = excluded.callback_needed,
        raw_payload = excluded.raw_payload,
        synced_at = excluded.synced_at";

/// SQLite implementation of CallRecordRepository
pub struct SqliteCallRecordRepository {
    pool: DbPool,
}

impl SqliteCallRecordRepository {
    /// Construct a repository backed by the shared SQLite pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallRecordRepository for SqliteCallRecordRepository {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_batch(&self, records: &[CallRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let pool = self.pool.clone();
        let records = records.to_vec();
        let synced_at = Utc::now();

        let written = task::spawn_blocking(move || -> Result<usize> {
            let mut conn = checkout(&pool)?;
            let tx = conn.transaction().map_err(InfraError::from)?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare_cached(UPSERT_SQL).map_err(InfraError::from)?;
                for record in &records {
                    written += stmt
                        .execute(params![
                            record.establishment_id.to_string(),
                            record.provider_call_id,
                            record.direction.as_str(),
                            record.status.as_str(),
                            record.from_number,
                            record.to_number,
                            record.contact_number,
                            record.start_time,
                            record.end_time,
                            record.duration_seconds,
                            record.wait_seconds,
                            record.recording_url,
                            record.voicemail_url,
                            record.agent_name,
                            record.callback_needed,
                            record.callback_handled_at,
                            record.raw_payload,
                            synced_at,
                        ])
                        .map_err(InfraError::from)?;
                }
            }
            tx.commit().map_err(InfraError::from)?;
            Ok(written)
        })
        .await
        .map_err(join_error)??;

        debug!(written, "call records upserted");
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn pending_callbacks(&self, establishment_id: Uuid) -> Result<Vec<CallRecord>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<Vec<CallRecord>> {
            let conn = checkout(&pool)?;
            let mut stmt = conn
                .prepare(
                    "SELECT establishment_id, provider_call_id, direction, status, from_number,
                            to_number, contact_number, start_time, end_time, duration_seconds,
                            wait_seconds, recording_url, voicemail_url, agent_name,
                            callback_needed, callback_handled_at, raw_payload
                     FROM call_records
                     WHERE establishment_id = ?1
                       AND callback_needed = 1
                       AND callback_handled_at IS NULL
                     ORDER BY start_time DESC",
                )
                .map_err(InfraError::from)?;
            let rows = stmt
                .query_map(params![establishment_id.to_string()], map_call_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self))]
    async fn mark_callback_handled(
        &self,
        establishment_id: Uuid,
        provider_call_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let pool = self.pool.clone();
        let provider_call_id = provider_call_id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = checkout(&pool)?;
            let changed = conn
                .execute(
                    "UPDATE call_records SET callback_handled_at = ?1
                     WHERE establishment_id = ?2 AND provider_call_id = ?3",
                    params![at, establishment_id.to_string(), provider_call_id],
                )
                .map_err(InfraError::from)?;
            Ok(changed > 0)
        })
        .await
        .map_err(join_error)?
    }

    async fn count(&self, establishment_id: Uuid) -> Result<usize> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<usize> {
            let conn = checkout(&pool)?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM call_records WHERE establishment_id = ?1",
                    params![establishment_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(InfraError::from)?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(err: JoinError) -> BergerieError {
    map_join_error("call record repository", err)
}

fn map_call_row(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    Ok(CallRecord {
        establishment_id: parsed(row, 0)?,
        provider_call_id: row.get(1)?,
        direction: parsed(row, 2)?,
        status: parsed(row, 3)?,
        from_number: row.get(4)?,
        to_number: row.get(5)?,
        contact_number: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        duration_seconds: row.get(9)?,
        wait_seconds: row.get(10)?,
        recording_url: row.get(11)?,
        voicemail_url: row.get(12)?,
        agent_name: row.get(13)?,
        callback_needed: row.get(14)?,
        callback_handled_at: row.get(15)?,
        raw_payload: row.get(16)?,
    })
}
