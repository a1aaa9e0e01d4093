//! HTTP DTOs for account endpoints: session check, credits, history and search.

use serde::{Deserialize, Serialize};

use crate::domain::account::Search;
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to record a search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSearchRequest {
    pub query: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `GET /api/checkauth`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddCreditsResponse {
    pub success: bool,
    pub credits: i64,
}

/// One history entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub id: String,
    pub query: String,
    pub group_id: Option<String>,
    pub created_at: Timestamp,
}

impl From<Search> for SearchResponse {
    fn from(search: Search) -> Self {
        Self {
            id: search.id.to_string(),
            query: search.query,
            group_id: search.group_id,
            created_at: search.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub searches: Vec<SearchResponse>,
}

/// Response of `POST /api/search`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSearchResponse {
    pub search: SearchResponse,
    /// Balance after the charge.
    pub credits: i64,
}
