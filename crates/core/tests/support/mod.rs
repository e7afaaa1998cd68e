//! Shared test helpers for `bergerie-core` integration tests.
//!
//! In-memory repositories and scripted providers so engine tests can focus
//! on behaviour instead of storage and HTTP.

#![allow(dead_code)]

pub mod providers;
pub mod repositories;

use bergerie_domain::{Connection, Provider};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

pub use providers::{ScriptedCallProvider, ScriptedDonationProvider, StaticOAuthClient};
pub use repositories::{
    CountingReceiptSequence, InMemoryCallRepository, InMemoryConnectionRepository,
    InMemoryDonationRepository,
};

/// Fixed "now" used across engine tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn ringover_connection(establishment_id: Uuid, line: Option<&str>) -> Connection {
    let mut connection = Connection::new(establishment_id, Provider::Ringover, now());
    connection.api_key = Some("rk_test_key".to_string());
    connection.line_number = line.map(str::to_string);
    connection
}

pub fn helloasso_connection(establishment_id: Uuid) -> Connection {
    let mut connection = Connection::new(establishment_id, Provider::HelloAsso, now());
    connection.client_id = Some("client-id".to_string());
    connection.client_secret = Some("client-secret".to_string());
    connection.organization_slug = Some("refuge-des-collines".to_string());
    connection
}
