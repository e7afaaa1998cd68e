//! Call-sync engine
//!
//! One run per establishment:
//! 1. Resolve the active connection and open the window
//!    `[cursor or now - lookback, now]`
//! 2. Probe the authorization scheme
//! 3. Page through the call list by offset, filter to the reception line,
//!    normalise, resolve missing media, upsert each page
//! 4. Persist the new cursor (latest `start_time` seen, never moving back)

use std::sync::Arc;

use bergerie_common::{pause, Clock, Pacer};
use bergerie_domain::utils::{numbers_match, parse_timestamp};
use bergerie_domain::{
    BergerieError, CallRecord, CallSyncSummary, Connection, Provider, Result, RingoverConfig,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::normalize::{extract_media_urls, normalize_call, NormalizedCall};
use super::ports::{CallAuth, CallProvider, CallQuery, CallRecordRepository};
use super::probe::probe_auth_scheme;
use crate::connections::ports::ConnectionRepository;
use crate::connections::tracker::{SyncTracker, Tracked};

/// Paging limits and window settings for a call sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSyncSettings {
    /// Calls requested per page
    pub page_size: u32,
    /// Stop paging once this many calls were read in one run
    pub max_records_per_run: u32,
    /// Window start for a connection that has never synced
    pub lookback: Duration,
    /// Subtracted from the stored cursor when opening the next window
    pub cursor_overlap: Duration,
}

impl Default for CallSyncSettings {
    fn default() -> Self {
        Self::from(&RingoverConfig::default())
    }
}

impl From<&RingoverConfig> for CallSyncSettings {
    fn from(config: &RingoverConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            max_records_per_run: config.max_records_per_run,
            lookback: Duration::days(config.lookback_days),
            cursor_overlap: Duration::seconds(config.cursor_overlap_secs.max(0)),
        }
    }
}

/// Pulls Ringover calls into the call log, one establishment at a time.
pub struct CallSyncService {
    provider: Arc<dyn CallProvider>,
    connections: Arc<dyn ConnectionRepository>,
    calls: Arc<dyn CallRecordRepository>,
    clock: Arc<dyn Clock>,
    page_pacer: Arc<dyn Pacer>,
    probe_pacer: Arc<dyn Pacer>,
    tracker: SyncTracker,
    settings: CallSyncSettings,
}

impl CallSyncService {
    /// Construct a service with the default settings.
    pub fn new(
        provider: Arc<dyn CallProvider>,
        connections: Arc<dyn ConnectionRepository>,
        calls: Arc<dyn CallRecordRepository>,
        clock: Arc<dyn Clock>,
        page_pacer: Arc<dyn Pacer>,
        probe_pacer: Arc<dyn Pacer>,
    ) -> Self {
        let tracker = SyncTracker::new(connections.clone(), clock.clone());
        Self {
            provider,
            connections,
            calls,
            clock,
            page_pacer,
            probe_pacer,
            tracker,
            settings: CallSyncSettings::default(),
        }
    }

    /// Replace the paging and window settings.
    pub fn with_settings(mut self, settings: CallSyncSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Synchronise calls for one establishment.
    ///
    /// # Errors
    /// - `NotFound` when the establishment has no active connection (the
    ///   connection is not touched)
    /// - Probe, fetch and storage errors, after they are recorded on the
    ///   connection as `sync_status = error`
    #[instrument(skip(self))]
    pub async fn sync_calls(&self, establishment_id: Uuid) -> Result<CallSyncSummary> {
        let connection = self
            .connections
            .find(establishment_id, Provider::Ringover)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| {
                BergerieError::NotFound("no active ringover connection".to_string())
            })?;

        let summary = self.tracker.track(connection.id, self.run(&connection)).await?;
        info!(
            synced = summary.synced,
            scanned = summary.scanned,
            pages = summary.pages,
            capped = summary.capped,
            "call sync finished"
        );
        Ok(summary)
    }

    async fn run(&self, connection: &Connection) -> Result<Tracked<CallSyncSummary>> {
        let api_key = connection
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BergerieError::Auth("ringover connection has no api key".to_string()))?;

        let now = self.clock.now();
        let previous_cursor = connection.sync_cursor.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(cursor = raw, "ignoring unparseable sync cursor");
            }
            parsed
        });
        let start = previous_cursor
            .map_or_else(|| now - self.settings.lookback, |c| c - self.settings.cursor_overlap);

        let auth = probe_auth_scheme(self.provider.as_ref(), api_key, self.probe_pacer.as_ref())
            .await?;

        let mut summary = CallSyncSummary::default();
        let mut latest_seen: Option<DateTime<Utc>> = None;
        let mut offset: u32 = 0;

        loop {
            // The probe already issued a request, so every page is paced.
            pause(self.page_pacer.as_ref(), summary.pages + 1).await;

            let query = CallQuery { start, end: now, limit: self.settings.page_size, offset };
            let page = self.provider.list_calls(&auth, &query).await?;
            summary.pages += 1;
            let page_len = page.len();
            summary.scanned += page_len;
            debug!(offset, page_len, "fetched call page");

            let records = self
                .prepare_page(connection, &auth, &page, &mut summary)
                .await;

            for record in &records {
                latest_seen = latest_seen.max(Some(record.start_time));
            }
            if !records.is_empty() {
                summary.synced += self.calls.upsert_batch(&records).await?;
            }

            if page_len < self.settings.page_size as usize {
                break;
            }
            if summary.scanned >= self.settings.max_records_per_run as usize {
                warn!(scanned = summary.scanned, "per-run scan cap reached");
                summary.capped = true;
                break;
            }
            offset += self.settings.page_size;
        }

        let cursor = previous_cursor
            .max(latest_seen)
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true));
        summary.cursor = cursor.clone().or_else(|| connection.sync_cursor.clone());

        Ok(Tracked::new(summary, cursor))
    }

    /// Normalise one page, apply the line filter and resolve missing media.
    async fn prepare_page(
        &self,
        connection: &Connection,
        auth: &CallAuth,
        page: &[serde_json::Value],
        summary: &mut CallSyncSummary,
    ) -> Vec<CallRecord> {
        let line = connection.line_number.as_deref().filter(|l| !l.trim().is_empty());
        let mut records = Vec::with_capacity(page.len());

        for payload in page {
            let NormalizedCall { mut record, needs_media_lookup } =
                match normalize_call(connection.establishment_id, payload) {
                    Ok(normalized) => normalized,
                    Err(err) => {
                        warn!(error = %err, "skipping call payload");
                        summary.skipped += 1;
                        continue;
                    }
                };

            if let Some(line) = line {
                if !on_line(&record, line) {
                    summary.filtered_out += 1;
                    continue;
                }
            }

            if needs_media_lookup {
                self.resolve_media(auth, &mut record).await;
            }
            records.push(record);
        }

        records
    }

    /// Fill missing recording or voicemail URLs from the call detail.
    async fn resolve_media(&self, auth: &CallAuth, record: &mut CallRecord) {
        pause(self.page_pacer.as_ref(), 1).await;

        match self.provider.get_call(auth, &record.provider_call_id).await {
            Ok(Some(detail)) => {
                let urls = extract_media_urls(&detail);
                if record.recording_url.is_none() {
                    record.recording_url = urls.recording_url;
                }
                if record.voicemail_url.is_none() {
                    record.voicemail_url = urls.voicemail_url;
                }
            }
            Ok(None) => {
                debug!(call_id = %record.provider_call_id, "call detail not found");
            }
            Err(err) => {
                warn!(
                    call_id = %record.provider_call_id,
                    error = %err,
                    "call detail lookup failed, keeping record without media"
                );
            }
        }
    }
}

fn on_line(record: &CallRecord, line: &str) -> bool {
    [&record.from_number, &record.to_number]
        .into_iter()
        .flatten()
        .any(|number| numbers_match(number, line))
}
