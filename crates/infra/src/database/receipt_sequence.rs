//! Per-establishment tax receipt numbering backed by a counter row.

use async_trait::async_trait;
use bergerie_core::ReceiptNumberSequence;
use bergerie_domain::Result;
use chrono::{DateTime, Datelike, Utc};
use rusqlite::params;
use tokio::task;
use tracing::instrument;
use uuid::Uuid;

use super::manager::{checkout, map_join_error, DbPool};
use crate::errors::InfraError;

/// Receipt numbers of the form `{year}-{sequence:05}`.
///
/// The counter is incremented and read in a single statement, so two imports
/// running at once never draw the same number.
pub struct SqliteReceiptSequence {
    pool: DbPool,
}

impl SqliteReceiptSequence {
    /// Construct a sequence backed by the shared SQLite pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptNumberSequence for SqliteReceiptSequence {
    #[instrument(skip(self))]
    async fn next_receipt_number(
        &self,
        establishment_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let pool = self.pool.clone();

        let next = task::spawn_blocking(move || -> Result<i64> {
            let conn = checkout(&pool)?;
            let next = conn
                .query_row(
                    "INSERT INTO receipt_sequences (establishment_id, last_value) VALUES (?1, 1)
                     ON CONFLICT(establishment_id) DO UPDATE SET last_value = last_value + 1
                     RETURNING last_value",
                    params![establishment_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(InfraError::from)?;
            Ok(next)
        })
        .await
        .map_err(|err| map_join_error("receipt sequence", err))??;

        Ok(format_receipt_number(issued_at.year(), next))
    }
}

fn format_receipt_number(year: i32, sequence: i64) -> String {
    format!("{year}-{sequence:05}")
}
