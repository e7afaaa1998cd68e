//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bergerie_domain::{amount_from_cents, CallDirection, CallRecord, CallStatus, Donation};
use bergerie_infra::database::DbManager;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

/// Inbound call; missed calls are flagged for a call back.
pub fn call_record(
    establishment_id: Uuid,
    provider_call_id: &str,
    start_time: DateTime<Utc>,
    status: CallStatus,
) -> CallRecord {
    let direction = CallDirection::In;
    CallRecord {
        establishment_id,
        provider_call_id: provider_call_id.to_string(),
        direction,
        status,
        from_number: Some("+33612345678".to_string()),
        to_number: Some("+33327786256".to_string()),
        contact_number: Some("+33612345678".to_string()),
        start_time,
        end_time: None,
        duration_seconds: 0,
        wait_seconds: 12,
        recording_url: None,
        voicemail_url: None,
        agent_name: None,
        callback_needed: CallRecord::derive_callback_needed(direction, status),
        callback_handled_at: None,
        raw_payload: json!({ "call_id": provider_call_id }),
    }
}

pub fn donation(establishment_id: Uuid, payment_id: i64, receipt_number: &str) -> Donation {
    Donation {
        id: Uuid::now_v7(),
        establishment_id,
        helloasso_payment_id: payment_id,
        amount: amount_from_cents(2550),
        donated_at: at(1, 10, 0) + chrono::Duration::minutes(payment_id),
        donor_name: Some("Jeanne Martin".to_string()),
        donor_email: Some("jeanne@example.org".to_string()),
        donor_address: None,
        donor_city: Some("Lille".to_string()),
        donor_postal_code: Some("59000".to_string()),
        donor_country: Some("FRA".to_string()),
        payment_means: Some("Card".to_string()),
        receipt_number: receipt_number.to_string(),
        receipt_generated: true,
        receipt_generated_at: Some(at(15, 12, 0)),
        source: "helloasso".to_string(),
        raw_payload: json!({ "id": payment_id, "amount": 2550 }),
    }
}
