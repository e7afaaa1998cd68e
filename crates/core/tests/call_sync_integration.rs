//! Integration tests for the call-sync engine against in-memory ports.

mod support;

use std::sync::Arc;

use bergerie_common::testing::{MockClock, RecordingPacer};
use bergerie_core::{AuthScheme, CallSyncService, CallSyncSettings, CallbackService, SyncOutcome};
use bergerie_domain::{BergerieError, CallStatus, Provider, SyncState};
use chrono::Duration;
use serde_json::{json, Value};
use support::{
    now, ringover_connection, InMemoryCallRepository, InMemoryConnectionRepository,
    ScriptedCallProvider,
};
use uuid::Uuid;

const LINE: &str = "03 27 78 62 56";

fn answered_call(id: i64, start: &str) -> Value {
    json!({
        "cdr_id": id,
        "direction": "in",
        "is_answered": true,
        "last_state": "ANSWERED",
        "start_time": start,
        "from_number": "33612345678",
        "to_number": "33327786256",
        "incall_duration": 95,
        "queue_duration": 4
    })
}

struct Harness {
    establishment_id: Uuid,
    connections: InMemoryConnectionRepository,
    calls: InMemoryCallRepository,
    page_pacer: RecordingPacer,
    probe_pacer: RecordingPacer,
    clock: MockClock,
}

impl Harness {
    fn new(line: Option<&str>) -> Self {
        Self::with_calls(line, InMemoryCallRepository::default())
    }

    fn with_calls(line: Option<&str>, calls: InMemoryCallRepository) -> Self {
        let establishment_id = Uuid::now_v7();
        Self {
            establishment_id,
            connections: InMemoryConnectionRepository::with_connection(ringover_connection(
                establishment_id,
                line,
            )),
            calls,
            page_pacer: RecordingPacer::new(),
            probe_pacer: RecordingPacer::new(),
            clock: MockClock::new(now()),
        }
    }

    fn service(&self, provider: &ScriptedCallProvider) -> CallSyncService {
        CallSyncService::new(
            Arc::new(provider.clone()),
            Arc::new(self.connections.clone()),
            Arc::new(self.calls.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.page_pacer.clone()),
            Arc::new(self.probe_pacer.clone()),
        )
    }
}

/// Validates that a second run over the same window does not duplicate rows.
///
/// Assertions:
/// - Both runs report the same number of synced records
/// - The store still holds one row per provider call id
/// - The connection ends `idle` with the latest start time as cursor
#[tokio::test]
async fn resync_is_idempotent_and_advances_cursor() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw).with_calls(vec![
        answered_call(1, "2024-03-10T08:00:00Z"),
        answered_call(2, "2024-03-12T09:30:00Z"),
        answered_call(3, "2024-03-11T10:00:00Z"),
    ]);
    let service = harness.service(&provider);

    let first = service.sync_calls(harness.establishment_id).await.unwrap();
    let second = service.sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(first.synced, 3);
    assert_eq!(second.synced, 3);
    assert_eq!(harness.calls.len(), 3);

    let connection = harness.connections.get(harness.establishment_id, Provider::Ringover).unwrap();
    assert_eq!(connection.sync_status, SyncState::Idle);
    assert_eq!(connection.sync_cursor.as_deref(), Some("2024-03-12T09:30:00Z"));
    assert_eq!(connection.last_sync_at, Some(now()));
    assert_eq!(first.cursor.as_deref(), Some("2024-03-12T09:30:00Z"));
}

#[tokio::test]
async fn first_run_opens_lookback_window_then_starts_from_cursor() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![answered_call(1, "2024-03-14T16:45:00Z")]);
    let service = harness.service(&provider);

    service.sync_calls(harness.establishment_id).await.unwrap();
    service.sync_calls(harness.establishment_id).await.unwrap();

    let queries = provider.queries();
    assert_eq!(queries[0].start, now() - Duration::days(15));
    assert_eq!(queries[0].end, now());
    assert_eq!(queries[1].start.to_rfc3339(), "2024-03-14T16:45:00+00:00");
}

#[tokio::test]
async fn cursor_overlap_reopens_window_before_cursor() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![answered_call(1, "2024-03-14T16:45:00Z")]);
    let settings = CallSyncSettings { cursor_overlap: Duration::minutes(10), ..Default::default() };
    let service = harness.service(&provider).with_settings(settings);

    service.sync_calls(harness.establishment_id).await.unwrap();
    service.sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(provider.queries()[1].start.to_rfc3339(), "2024-03-14T16:35:00+00:00");
}

#[tokio::test]
async fn only_calls_on_the_reception_line_are_kept() {
    let harness = Harness::new(Some(LINE));
    let other_line = json!({
        "cdr_id": 99,
        "direction": "in",
        "is_answered": true,
        "start_time": "2024-03-12T09:00:00Z",
        "from_number": "33612345678",
        "to_number": "33198765432"
    });
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![answered_call(1, "2024-03-12T08:00:00Z"), other_line]);

    let summary = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.synced, 1);
    assert_eq!(summary.filtered_out, 1);
    assert!(harness.calls.get(harness.establishment_id, "1").is_some());
    assert!(harness.calls.get(harness.establishment_id, "99").is_none());
}

/// Validates the authorization probe fallback.
///
/// Assertions:
/// - The raw key is tried first, then the bearer form
/// - One paced wait separates the two attempts
/// - The run succeeds with the accepted scheme
#[tokio::test]
async fn probe_falls_back_to_bearer_scheme() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Bearer)
        .with_calls(vec![answered_call(1, "2024-03-12T08:00:00Z")]);

    let summary = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(provider.probes(), vec![AuthScheme::Raw, AuthScheme::Bearer]);
    assert_eq!(harness.probe_pacer.calls(), vec![1]);
    assert_eq!(summary.synced, 1);
}

#[tokio::test]
async fn rejected_key_is_recorded_on_the_connection() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::rejecting();

    let err = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.is_auth_failure());
    assert!(provider.queries().is_empty());

    let connection = harness.connections.get(harness.establishment_id, Provider::Ringover).unwrap();
    assert_eq!(connection.sync_status, SyncState::Error);
    assert!(connection.sync_error.unwrap().contains("401"));
    assert_eq!(harness.connections.outcomes().len(), 2);
    assert_eq!(harness.connections.outcomes()[0], SyncOutcome::Started);
}

#[tokio::test]
async fn storage_failure_marks_connection_in_error() {
    let harness = Harness::with_calls(None, InMemoryCallRepository::failing());
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![answered_call(1, "2024-03-12T08:00:00Z")]);

    let err = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap_err();

    assert!(matches!(err, BergerieError::Database(_)));
    let connection = harness.connections.get(harness.establishment_id, Provider::Ringover).unwrap();
    assert_eq!(connection.sync_status, SyncState::Error);
    assert_eq!(connection.sync_cursor, None);
}

#[tokio::test]
async fn pages_by_offset_until_a_short_page() {
    let harness = Harness::new(None);
    let calls = (1..=5).map(|id| answered_call(id, "2024-03-12T08:00:00Z")).collect();
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw).with_calls(calls);
    let settings = CallSyncSettings { page_size: 2, ..Default::default() };

    let summary = harness
        .service(&provider)
        .with_settings(settings)
        .sync_calls(harness.establishment_id)
        .await
        .unwrap();

    let offsets: Vec<u32> = provider.queries().iter().map(|q| q.offset).collect();
    assert_eq!(offsets, vec![0, 2, 4]);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.synced, 5);
    assert!(!summary.capped);
    assert_eq!(harness.page_pacer.calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn stops_at_the_per_run_cap() {
    let harness = Harness::new(None);
    let calls = (1..=10).map(|id| answered_call(id, "2024-03-12T08:00:00Z")).collect();
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw).with_calls(calls);
    let settings = CallSyncSettings { page_size: 2, max_records_per_run: 4, ..Default::default() };

    let summary = harness
        .service(&provider)
        .with_settings(settings)
        .sync_calls(harness.establishment_id)
        .await
        .unwrap();

    assert!(summary.capped);
    assert_eq!(summary.scanned, 4);
    assert_eq!(summary.pages, 2);
    assert_eq!(harness.calls.len(), 4);
}

#[tokio::test]
async fn voicemail_url_is_resolved_from_call_detail() {
    let harness = Harness::new(None);
    let voicemail = json!({
        "cdr_id": 42,
        "direction": "in",
        "is_answered": false,
        "last_state": "VOICEMAIL",
        "start_time": "2024-03-12T08:00:00Z",
        "from_number": "33612345678"
    });
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![voicemail])
        .with_detail("42", json!({ "voicemail": { "url": "https://cdn.example/vm/42.mp3" } }));

    harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap();

    let stored = harness.calls.get(harness.establishment_id, "42").unwrap();
    assert_eq!(provider.detail_requests(), vec!["42".to_string()]);
    assert_eq!(stored.status, CallStatus::Voicemail);
    assert_eq!(stored.voicemail_url.as_deref(), Some("https://cdn.example/vm/42.mp3"));
    assert!(stored.callback_needed);
}

#[tokio::test]
async fn failed_detail_lookup_keeps_the_record() {
    let harness = Harness::new(None);
    let voicemail = json!({
        "cdr_id": 43,
        "is_voicemail": 1,
        "start_time": "2024-03-12T08:00:00Z"
    });
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw)
        .with_calls(vec![voicemail])
        .with_failing_details();

    let summary = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(summary.synced, 1);
    let stored = harness.calls.get(harness.establishment_id, "43").unwrap();
    assert_eq!(stored.voicemail_url, None);
}

#[tokio::test]
async fn payloads_without_start_time_are_skipped() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw).with_calls(vec![
        json!({ "cdr_id": 7, "direction": "in" }),
        answered_call(8, "2024-03-12T08:00:00Z"),
    ]);

    let summary = harness.service(&provider).sync_calls(harness.establishment_id).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.synced, 1);
}

#[tokio::test]
async fn missing_connection_is_not_found_and_untracked() {
    let harness = Harness::new(None);
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw);

    let err = harness.service(&provider).sync_calls(Uuid::now_v7()).await.unwrap_err();

    assert!(matches!(err, BergerieError::NotFound(_)));
    assert!(harness.connections.outcomes().is_empty());
}

/// Validates the callback follow-up flow across re-syncs.
///
/// Assertions:
/// - Missed inbound calls are listed as pending
/// - Marking one handled removes it from the list
/// - A later sync of the same call keeps the handled timestamp
#[tokio::test]
async fn handled_callbacks_survive_resync() {
    let harness = Harness::new(None);
    let missed = json!({
        "cdr_id": 500,
        "direction": "in",
        "is_answered": false,
        "start_time": "2024-03-12T08:00:00Z",
        "from_number": "33612345678"
    });
    let provider = ScriptedCallProvider::accepting(AuthScheme::Raw).with_calls(vec![missed]);
    let sync = harness.service(&provider);
    let callbacks =
        CallbackService::new(Arc::new(harness.calls.clone()), Arc::new(harness.clock.clone()));

    sync.sync_calls(harness.establishment_id).await.unwrap();
    let pending = callbacks.pending_callbacks(harness.establishment_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, CallStatus::Missed);

    callbacks.mark_callback_handled(harness.establishment_id, "500").await.unwrap();
    sync.sync_calls(harness.establishment_id).await.unwrap();

    assert!(callbacks.pending_callbacks(harness.establishment_id).await.unwrap().is_empty());
    let stored = harness.calls.get(harness.establishment_id, "500").unwrap();
    assert_eq!(stored.callback_handled_at, Some(now()));
}

#[tokio::test]
async fn marking_unknown_call_is_not_found() {
    let harness = Harness::new(None);
    let callbacks =
        CallbackService::new(Arc::new(harness.calls.clone()), Arc::new(harness.clock.clone()));

    let err = callbacks.mark_callback_handled(harness.establishment_id, "nope").await.unwrap_err();
    assert!(matches!(err, BergerieError::NotFound(_)));

    let err = callbacks.mark_callback_handled(harness.establishment_id, "  ").await.unwrap_err();
    assert!(matches!(err, BergerieError::InvalidInput(_)));
}
