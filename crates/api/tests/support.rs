//! Shared harness: an application context on a temporary database, with
//! both provider APIs served by mock servers.

#![allow(dead_code)]

use bergerie_api::AppContext;
use bergerie_domain::{Config, DatabaseConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::MockServer;

pub struct TestApp {
    pub ctx: AppContext,
    pub ringover: MockServer,
    pub helloasso: MockServer,
    pub establishment_id: String,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temporary test directory");
        let ringover = MockServer::start().await;
        let helloasso = MockServer::start().await;

        let mut config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("bergerie.db").to_string_lossy().to_string(),
                pool_size: 4,
            },
            ..Config::default()
        };
        config.ringover.base_url = ringover.uri();
        config.helloasso.base_url = helloasso.uri();
        config.sync.page_delay_ms = 0;
        config.sync.probe_delay_ms = 0;

        let ctx = AppContext::new_with_config(config).await.expect("context should initialise");

        Self {
            ctx,
            ringover,
            helloasso,
            establishment_id: Uuid::now_v7().to_string(),
            _temp_dir: temp_dir,
        }
    }
}

pub fn ringover_call(id: i64, start: &str, answered: bool) -> Value {
    json!({
        "cdr_id": id,
        "direction": "in",
        "is_answered": answered,
        "last_state": if answered { "ANSWERED" } else { "" },
        "start_time": start,
        "from_number": "33612345678",
        "to_number": "33327786256",
        "incall_duration": if answered { 95 } else { 0 },
        "queue_duration": 4
    })
}

pub fn helloasso_payment(id: i64, amount_cents: i64, date: &str) -> Value {
    json!({
        "id": id,
        "amount": amount_cents,
        "date": date,
        "state": "Authorized",
        "paymentMeans": "Card",
        "payer": {
            "firstName": "Jeanne",
            "lastName": "Martin",
            "email": "jeanne@example.org",
            "city": "Lille",
            "zipCode": "59000"
        }
    })
}
