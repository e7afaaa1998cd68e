//! HelloAsso response envelopes

use bergerie_core::OrganizationInfo;
use serde::Deserialize;
use serde_json::Value;

/// `GET /v5/organizations/{slug}/payments`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentsResponse {
    pub data: Vec<Value>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub continuation_token: Option<String>,
    pub page_size: Option<u32>,
    pub total_count: Option<u64>,
}

/// `GET /v5/organizations/{slug}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub name: String,
    #[serde(default)]
    pub organization_slug: Option<String>,
}

impl OrganizationResponse {
    /// Falls back to the requested slug when the response omits it.
    pub fn into_info(self, requested_slug: &str) -> OrganizationInfo {
        OrganizationInfo {
            name: self.name,
            slug: self.organization_slug.unwrap_or_else(|| requested_slug.to_string()),
        }
    }
}
