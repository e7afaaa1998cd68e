//! Call payload normalisation
//!
//! The provider's call objects vary by account age and API version: ids may
//! be numbers or strings, flags may be booleans or `0`/`1`, and media may be
//! a URL string or an object. [`normalize_call`] is the single place that
//! reads those payloads and produces a typed [`CallRecord`].
//!
//! Missing numbers become `0` and missing URLs become `None`. Only a payload
//! without an id or a usable start time is rejected.

use bergerie_domain::utils::parse_timestamp;
use bergerie_domain::{CallDirection, CallRecord, CallStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// States that mean nobody picked up.
const MISSED_STATES: [&str; 5] = ["MISSED", "ABANDONED", "NO_ANSWER", "NOANSWER", "UNANSWERED"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("call payload is not an object")]
    NotAnObject,
    #[error("call payload has no id")]
    MissingId,
    #[error("call {0} has no start time")]
    MissingStartTime(String),
    #[error("call {id} has an unparseable start time: {value}")]
    InvalidStartTime { id: String, value: String },
}

/// Recording or voicemail reference as it appears in a payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    /// Plain URL string
    Url(String),
    /// Object carrying the URL under one of several keys
    Object(MediaObject),
    /// Anything else (`true`, `1`, arrays)
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaObject {
    pub url: Option<String>,
    pub link: Option<String>,
    pub record_url: Option<String>,
}

impl MediaRef {
    /// First non-empty URL, trying `url`, `link`, then `record_url`.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => non_empty(url),
            Self::Object(obj) => [&obj.url, &obj.link, &obj.record_url]
                .into_iter()
                .find_map(|candidate| candidate.as_deref().and_then(non_empty)),
            Self::Other(_) => None,
        }
    }

    /// Media exists but the payload does not carry its URL.
    pub fn is_unresolved(&self) -> bool {
        if self.url().is_some() {
            return false;
        }
        match self {
            Self::Url(_) => false,
            Self::Object(_) => true,
            Self::Other(Value::Bool(flag)) => *flag,
            Self::Other(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
            Self::Other(_) => false,
        }
    }
}

/// Loosely typed scalar: accepts whatever JSON type the provider sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Scalar {
    fn text(&self) -> Option<String> {
        match self {
            Self::Text(s) => non_empty(s).map(str::to_string),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) if f.fract() == 0.0 => Some(format!("{f:.0}")),
            _ => None,
        }
    }

    /// Non-negative whole seconds; anything unusable is `0`.
    fn seconds(&self) -> i64 {
        match self {
            Self::Int(n) => (*n).max(0),
            Self::Float(f) if f.is_finite() => (f.round() as i64).max(0),
            Self::Text(s) => {
                let s = s.trim();
                let whole = s.parse::<i64>().ok();
                let rounded = || {
                    s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64)
                };
                whole.or_else(rounded).unwrap_or(0).max(0)
            }
            _ => 0,
        }
    }

    fn flag(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Int(secs) => DateTime::from_timestamp(*secs, 0),
            Self::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCall {
    cdr_id: Option<Scalar>,
    call_id: Option<Scalar>,
    id: Option<Scalar>,
    direction: Option<Scalar>,
    is_answered: Option<Scalar>,
    is_voicemail: Option<Scalar>,
    last_state: Option<Scalar>,
    /// Older accounts report a single status string
    status: Option<Scalar>,
    start_time: Option<Scalar>,
    end_time: Option<Scalar>,
    incall_duration: Option<Scalar>,
    duration: Option<Scalar>,
    total_duration: Option<Scalar>,
    queue_duration: Option<Scalar>,
    wait_time: Option<Scalar>,
    from_number: Option<Scalar>,
    to_number: Option<Scalar>,
    contact_number: Option<Scalar>,
    agent_name: Option<Scalar>,
    user: Option<Value>,
    #[serde(flatten)]
    media: RawMedia,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMedia {
    record: Option<MediaRef>,
    recording: Option<MediaRef>,
    voicemail: Option<MediaRef>,
}

impl RawMedia {
    fn recording(&self) -> Option<&MediaRef> {
        self.record.as_ref().or(self.recording.as_ref())
    }
}

/// Recording and voicemail URLs found in a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrls {
    pub recording_url: Option<String>,
    pub voicemail_url: Option<String>,
}

/// Normalised record plus whether its media must be looked up separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub record: CallRecord,
    /// Voicemail without a URL, or media flagged but not linked
    pub needs_media_lookup: bool,
}

/// Turn one provider call payload into a [`CallRecord`].
pub fn normalize_call(
    establishment_id: Uuid,
    payload: &Value,
) -> Result<NormalizedCall, NormalizeError> {
    if !payload.is_object() {
        return Err(NormalizeError::NotAnObject);
    }
    let raw: RawCall =
        serde_json::from_value(payload.clone()).map_err(|_| NormalizeError::NotAnObject)?;

    let provider_call_id = [&raw.cdr_id, &raw.call_id, &raw.id]
        .into_iter()
        .find_map(|candidate| candidate.as_ref().and_then(Scalar::text))
        .ok_or(NormalizeError::MissingId)?;

    let start_raw = raw
        .start_time
        .as_ref()
        .ok_or_else(|| NormalizeError::MissingStartTime(provider_call_id.clone()))?;
    let start_time = start_raw.timestamp().ok_or_else(|| NormalizeError::InvalidStartTime {
        id: provider_call_id.clone(),
        value: start_raw.text().unwrap_or_default(),
    })?;

    let direction = parse_direction(raw.direction.as_ref());
    let status = classify(direction, &raw);

    let from_number = text_of(raw.from_number.as_ref());
    let to_number = text_of(raw.to_number.as_ref());
    let contact_number = text_of(raw.contact_number.as_ref()).or_else(|| match direction {
        CallDirection::In => from_number.clone(),
        CallDirection::Out => to_number.clone(),
    });

    let duration_seconds =
        first_present(&[&raw.incall_duration, &raw.duration, &raw.total_duration])
            .map_or(0, Scalar::seconds);
    let wait_seconds =
        first_present(&[&raw.queue_duration, &raw.wait_time]).map_or(0, Scalar::seconds);

    let urls = media_urls_of(&raw.media);
    let recording_unresolved = raw.media.recording().is_some_and(MediaRef::is_unresolved);
    let voicemail_unresolved = raw.media.voicemail.as_ref().is_some_and(MediaRef::is_unresolved);
    let needs_media_lookup = (status == CallStatus::Voicemail && urls.voicemail_url.is_none())
        || (recording_unresolved && urls.recording_url.is_none())
        || (voicemail_unresolved && urls.voicemail_url.is_none());

    let record = CallRecord {
        establishment_id,
        provider_call_id,
        direction,
        status,
        from_number,
        to_number,
        contact_number,
        start_time,
        end_time: raw.end_time.as_ref().and_then(Scalar::timestamp),
        duration_seconds,
        wait_seconds,
        recording_url: urls.recording_url,
        voicemail_url: urls.voicemail_url,
        agent_name: agent_name(&raw),
        callback_needed: CallRecord::derive_callback_needed(direction, status),
        callback_handled_at: None,
        raw_payload: payload.clone(),
    };

    Ok(NormalizedCall { record, needs_media_lookup })
}

/// Recording and voicemail URLs from a call payload (list or detail shape).
pub fn extract_media_urls(payload: &Value) -> MediaUrls {
    serde_json::from_value::<RawMedia>(payload.clone())
        .map(|media| media_urls_of(&media))
        .unwrap_or_default()
}

/// Status precedence: voicemail flag, missed or unanswered inbound, answered,
/// outbound, legacy status field, unknown.
fn classify(direction: CallDirection, raw: &RawCall) -> CallStatus {
    let state = text_of(raw.last_state.as_ref()).unwrap_or_default().to_ascii_uppercase();
    let answered = raw.is_answered.as_ref().and_then(Scalar::flag);
    let voicemail_flag = raw.is_voicemail.as_ref().and_then(Scalar::flag);

    if state.contains("VOICEMAIL") || voicemail_flag == Some(true) {
        return CallStatus::Voicemail;
    }
    if MISSED_STATES.contains(&state.as_str())
        || (direction == CallDirection::In && answered == Some(false))
    {
        return CallStatus::Missed;
    }
    if answered == Some(true) || state == "ANSWERED" {
        return CallStatus::Answered;
    }
    if direction == CallDirection::Out {
        return CallStatus::Out;
    }
    text_of(raw.status.as_ref())
        .and_then(|legacy| legacy_status(&legacy))
        .unwrap_or(CallStatus::Unknown)
}

fn legacy_status(value: &str) -> Option<CallStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "answered" | "completed" => Some(CallStatus::Answered),
        "missed" | "abandoned" | "no_answer" | "no-answer" => Some(CallStatus::Missed),
        "voicemail" => Some(CallStatus::Voicemail),
        "out" | "outgoing" | "outbound" => Some(CallStatus::Out),
        _ => None,
    }
}

/// Inbound unless the payload says otherwise.
fn parse_direction(value: Option<&Scalar>) -> CallDirection {
    match text_of(value).map(|d| d.to_ascii_lowercase()).as_deref() {
        Some("out" | "outbound" | "outgoing") => CallDirection::Out,
        _ => CallDirection::In,
    }
}

fn agent_name(raw: &RawCall) -> Option<String> {
    if let Some(name) = text_of(raw.agent_name.as_ref()) {
        return Some(name);
    }
    let user = raw.user.as_ref()?.as_object()?;
    let field = |key: &str| user.get(key).and_then(Value::as_str).and_then(non_empty);
    if let Some(name) = field("concat_name") {
        return Some(name.to_string());
    }
    let parts: Vec<&str> = [field("firstname"), field("lastname")].into_iter().flatten().collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn media_urls_of(media: &RawMedia) -> MediaUrls {
    MediaUrls {
        recording_url: media.recording().and_then(MediaRef::url).map(str::to_string),
        voicemail_url: media.voicemail.as_ref().and_then(MediaRef::url).map(str::to_string),
    }
}

fn first_present<'a>(candidates: &[&'a Option<Scalar>]) -> Option<&'a Scalar> {
    candidates.iter().find_map(|candidate| Option::as_ref(*candidate))
}

fn text_of(value: Option<&Scalar>) -> Option<String> {
    value.and_then(Scalar::text)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn normalize(payload: Value) -> NormalizedCall {
        normalize_call(Uuid::nil(), &payload).unwrap()
    }

    #[test]
    fn voicemail_state_wins_over_answered_flag() {
        let call = normalize(json!({
            "cdr_id": 1,
            "direction": "in",
            "is_answered": true,
            "last_state": "VOICEMAIL_ANSWERED",
            "start_time": "2024-05-02T09:00:00Z"
        }));

        assert_eq!(call.record.status, CallStatus::Voicemail);
        assert!(call.record.callback_needed);
    }

    #[test]
    fn unanswered_inbound_with_empty_state_is_missed() {
        let call = normalize(json!({
            "cdr_id": 2,
            "direction": "in",
            "is_answered": false,
            "last_state": "",
            "start_time": "2024-05-02T09:00:00Z"
        }));

        assert_eq!(call.record.status, CallStatus::Missed);
        assert!(call.record.callback_needed);
    }

    #[test]
    fn precedence_down_to_legacy_and_unknown() {
        let answered = normalize(json!({
            "cdr_id": 3, "direction": "in", "is_answered": 1,
            "start_time": "2024-05-02 09:00:00"
        }));
        assert_eq!(answered.record.status, CallStatus::Answered);
        assert!(!answered.record.callback_needed);

        let outbound = normalize(json!({
            "cdr_id": 4, "direction": "out", "is_answered": false,
            "start_time": "2024-05-02T09:00:00Z"
        }));
        assert_eq!(outbound.record.status, CallStatus::Out);
        assert!(!outbound.record.callback_needed);

        let legacy = normalize(json!({
            "cdr_id": 5, "status": "abandoned", "start_time": "2024-05-02T09:00:00Z"
        }));
        assert_eq!(legacy.record.status, CallStatus::Missed);

        let unknown = normalize(json!({ "cdr_id": 6, "start_time": "2024-05-02T09:00:00Z" }));
        assert_eq!(unknown.record.status, CallStatus::Unknown);
        assert!(!unknown.record.callback_needed);
    }

    #[test]
    fn explicit_missed_state_applies_to_outbound_without_callback() {
        let call = normalize(json!({
            "cdr_id": 7, "direction": "out", "last_state": "MISSED",
            "start_time": "2024-05-02T09:00:00Z"
        }));
        assert_eq!(call.record.status, CallStatus::Missed);
        assert!(!call.record.callback_needed);
    }

    #[test]
    fn durations_are_coerced_to_non_negative_integers() {
        let call = normalize(json!({
            "call_id": "abc",
            "start_time": "2024-05-02T09:00:00+02:00",
            "incall_duration": "42.6",
            "queue_duration": -3
        }));

        assert_eq!(call.record.provider_call_id, "abc");
        assert_eq!(call.record.duration_seconds, 43);
        assert_eq!(call.record.wait_seconds, 0);
        assert_eq!(
            call.record.start_time,
            Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let call = normalize(json!({ "cdr_id": 8, "start_time": "2024-05-02T09:00:00Z" }));
        assert_eq!(call.record.duration_seconds, 0);
        assert_eq!(call.record.wait_seconds, 0);
        assert!(call.record.recording_url.is_none());
    }

    #[test]
    fn media_url_shapes() {
        let as_string: MediaRef = serde_json::from_value(json!("https://cdn/r.mp3")).unwrap();
        assert_eq!(as_string.url(), Some("https://cdn/r.mp3"));

        let with_link: MediaRef =
            serde_json::from_value(json!({ "link": "https://cdn/l.mp3" })).unwrap();
        assert_eq!(with_link.url(), Some("https://cdn/l.mp3"));

        let ordered: MediaRef = serde_json::from_value(json!({
            "record_url": "https://cdn/c.mp3", "url": "https://cdn/a.mp3"
        }))
        .unwrap();
        assert_eq!(ordered.url(), Some("https://cdn/a.mp3"));

        let empty_url: MediaRef =
            serde_json::from_value(json!({ "url": "", "record_url": "https://cdn/c.mp3" }))
                .unwrap();
        assert_eq!(empty_url.url(), Some("https://cdn/c.mp3"));

        let flag: MediaRef = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(flag.url(), None);
        assert!(flag.is_unresolved());

        let blank: MediaRef = serde_json::from_value(json!("  ")).unwrap();
        assert_eq!(blank.url(), None);
        assert!(!blank.is_unresolved());
    }

    #[test]
    fn voicemail_without_url_requests_lookup() {
        let call = normalize(json!({
            "cdr_id": 9, "direction": "in", "last_state": "VOICEMAIL",
            "start_time": "2024-05-02T09:00:00Z"
        }));
        assert!(call.needs_media_lookup);

        let linked = normalize(json!({
            "cdr_id": 10, "direction": "in", "last_state": "VOICEMAIL",
            "voicemail": { "url": "https://cdn/vm.mp3" },
            "start_time": "2024-05-02T09:00:00Z"
        }));
        assert!(!linked.needs_media_lookup);
        assert_eq!(linked.record.voicemail_url.as_deref(), Some("https://cdn/vm.mp3"));
    }

    #[test]
    fn contact_number_follows_direction() {
        let inbound = normalize(json!({
            "cdr_id": 11, "direction": "in", "start_time": "2024-05-02T09:00:00Z",
            "from_number": 33612345678_i64, "to_number": "+33327786256"
        }));
        assert_eq!(inbound.record.contact_number.as_deref(), Some("33612345678"));

        let outbound = normalize(json!({
            "cdr_id": 12, "direction": "out", "start_time": "2024-05-02T09:00:00Z",
            "from_number": "+33327786256", "to_number": "0612345678"
        }));
        assert_eq!(outbound.record.contact_number.as_deref(), Some("0612345678"));
    }

    #[test]
    fn agent_name_from_user_object() {
        let call = normalize(json!({
            "cdr_id": 13, "start_time": "2024-05-02T09:00:00Z",
            "user": { "firstname": "Camille", "lastname": "Durand" }
        }));
        assert_eq!(call.record.agent_name.as_deref(), Some("Camille Durand"));
    }

    #[test]
    fn rejects_payloads_without_id_or_start_time() {
        assert_eq!(
            normalize_call(Uuid::nil(), &json!({ "start_time": "2024-05-02T09:00:00Z" })),
            Err(NormalizeError::MissingId)
        );
        assert_eq!(
            normalize_call(Uuid::nil(), &json!({ "cdr_id": 1 })),
            Err(NormalizeError::MissingStartTime("1".into()))
        );
        assert!(matches!(
            normalize_call(Uuid::nil(), &json!({ "cdr_id": 1, "start_time": "yesterday" })),
            Err(NormalizeError::InvalidStartTime { .. })
        ));
        assert_eq!(normalize_call(Uuid::nil(), &json!([1, 2])), Err(NormalizeError::NotAnObject));
    }

    #[test]
    fn detail_payload_media_extraction() {
        let urls = extract_media_urls(&json!({
            "record": { "record_url": "https://cdn/rec.mp3" },
            "voicemail": "https://cdn/vm.mp3"
        }));
        assert_eq!(urls.recording_url.as_deref(), Some("https://cdn/rec.mp3"));
        assert_eq!(urls.voicemail_url.as_deref(), Some("https://cdn/vm.mp3"));
    }
}
