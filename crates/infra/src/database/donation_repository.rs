//! SQLite implementation of the DonationRepository port.
//!
//! Amounts are stored as decimal text so no precision is lost on the way
//! through SQLite.

use std::collections::HashSet;

use async_trait::async_trait;
use bergerie_core::DonationRepository;
use bergerie_domain::{BergerieError, Donation, Result};
use rusqlite::{params, Row};
use tokio::task::{self, JoinError};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::columns::parsed;
use super::manager::{checkout, map_join_error, DbPool};
use crate::errors::InfraError;

/// SQLite implementation of DonationRepository
pub struct SqliteDonationRepository {
    pool: DbPool,
}

impl SqliteDonationRepository {
    /// Construct a repository backed by the shared SQLite pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationRepository for SqliteDonationRepository {
    #[instrument(skip(self))]
    async fn existing_payment_ids(&self, establishment_id: Uuid) -> Result<HashSet<i64>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<HashSet<i64>> {
            let conn = checkout(&pool)?;
            let mut stmt = conn
                .prepare("SELECT helloasso_payment_id FROM donations WHERE establishment_id = ?1")
                .map_err(InfraError::from)?;
            let ids = stmt
                .query_map(params![establishment_id.to_string()], |row| row.get::<_, i64>(0))
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<HashSet<_>>>()
                .map_err(InfraError::from)?;
            Ok(ids)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self, donation), fields(payment_id = donation.helloasso_payment_id))]
    async fn insert(&self, donation: &Donation) -> Result<()> {
        let pool = self.pool.clone();
        let donation = donation.clone();
        let receipt = donation.receipt_number.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = checkout(&pool)?;
            conn.execute(
                "INSERT INTO donations (
                    id, establishment_id, helloasso_payment_id, amount, donated_at, donor_name,
                    donor_email, donor_address, donor_city, donor_postal_code, donor_country,
                    payment_means, receipt_number, receipt_generated, receipt_generated_at,
                    source, raw_payload
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                           ?16, ?17)",
                params![
                    donation.id.to_string(),
                    donation.establishment_id.to_string(),
                    donation.helloasso_payment_id,
                    donation.amount.to_string(),
                    donation.donated_at,
                    donation.donor_name,
                    donation.donor_email,
                    donation.donor_address,
                    donation.donor_city,
                    donation.donor_postal_code,
                    donation.donor_country,
                    donation.payment_means,
                    donation.receipt_number,
                    donation.receipt_generated,
                    donation.receipt_generated_at,
                    donation.source,
                    donation.raw_payload,
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(join_error)??;

        debug!(%receipt, "donation stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, establishment_id: Uuid) -> Result<Vec<Donation>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<Vec<Donation>> {
            let conn = checkout(&pool)?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, establishment_id, helloasso_payment_id, amount, donated_at,
                            donor_name, donor_email, donor_address, donor_city,
                            donor_postal_code, donor_country, payment_means, receipt_number,
                            receipt_generated, receipt_generated_at, source, raw_payload
                     FROM donations
                     WHERE establishment_id = ?1
                     ORDER BY donated_at DESC, helloasso_payment_id DESC",
                )
                .map_err(InfraError::from)?;
            let rows = stmt
                .query_map(params![establishment_id.to_string()], map_donation_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(err: JoinError) -> BergerieError {
    map_join_error("donation repository", err)
}

fn map_donation_row(row: &Row<'_>) -> rusqlite::Result<Donation> {
    Ok(Donation {
        id: parsed(row, 0)?,
        establishment_id: parsed(row, 1)?,
        helloasso_payment_id: row.get(2)?,
        amount: parsed(row, 3)?,
        donated_at: row.get(4)?,
        donor_name: row.get(5)?,
        donor_email: row.get(6)?,
        donor_address: row.get(7)?,
        donor_city: row.get(8)?,
        donor_postal_code: row.get(9)?,
        donor_country: row.get(10)?,
        payment_means: row.get(11)?,
        receipt_number: row.get(12)?,
        receipt_generated: row.get(13)?,
        receipt_generated_at: row.get(14)?,
        source: row.get(15)?,
        raw_payload: row.get(16)?,
    })
}
