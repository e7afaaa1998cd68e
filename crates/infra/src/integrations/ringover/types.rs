//! Ringover response envelopes
//!
//! Call objects are kept as raw JSON; `bergerie-core` normalises them.

use serde::Deserialize;
use serde_json::Value;

/// `GET /calls` and, on some accounts, `GET /calls/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct CallListResponse {
    #[serde(default)]
    pub call_list: Option<Vec<Value>>,
}

/// Detail payload: either wrapped in `call_list` or the bare call object.
pub fn unwrap_call_detail(body: Value) -> Option<Value> {
    let Value::Object(mut fields) = body else {
        return None;
    };
    match fields.remove("call_list") {
        Some(Value::Array(calls)) => calls.into_iter().next(),
        Some(Value::Null) | None => Some(Value::Object(fields)),
        Some(_) => None,
    }
}
