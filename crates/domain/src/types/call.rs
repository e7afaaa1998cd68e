//! Call log entries synced from the telephony provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    In,
    Out,
}

impl_domain_status_conversions!(CallDirection {
    In => "in",
    Out => "out",
});

/// Classified outcome of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    Answered,
    Missed,
    Voicemail,
    Out,
    Unknown,
}

impl_domain_status_conversions!(CallStatus {
    Answered => "ANSWERED",
    Missed => "MISSED",
    Voicemail => "VOICEMAIL",
    Out => "OUT",
    Unknown => "UNKNOWN",
});

impl CallStatus {
    /// Outcomes that leave a caller waiting for a call back.
    pub const fn needs_callback(self) -> bool {
        matches!(self, Self::Missed | Self::Voicemail)
    }
}

/// Normalised call record, unique per (establishment, provider call id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub establishment_id: Uuid,
    pub provider_call_id: String,
    pub direction: CallDirection,
    pub status: CallStatus,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    /// The external party: caller for inbound, callee for outbound
    pub contact_number: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub wait_seconds: i64,
    pub recording_url: Option<String>,
    pub voicemail_url: Option<String>,
    pub agent_name: Option<String>,
    pub callback_needed: bool,
    /// Set by staff once the caller has been called back; preserved by
    /// re-syncs
    pub callback_handled_at: Option<DateTime<Utc>>,
    pub raw_payload: serde_json::Value,
}

impl CallRecord {
    /// `callback_needed` rule: inbound calls that were missed or went to
    /// voicemail.
    pub const fn derive_callback_needed(direction: CallDirection, status: CallStatus) -> bool {
        matches!(direction, CallDirection::In) && status.needs_callback()
    }
}
