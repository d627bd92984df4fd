//! API models for request and response payloads

use chrono::{DateTime, NaiveDate, Utc};
use records::{
    models::AccountType,
    query::{OperationFilter, PageRequest},
};
use serde::{Deserialize, Serialize};

/// Query string of `GET /operations`: filter criteria plus pagination
#[derive(Debug, Default, Deserialize)]
pub struct OperationListQuery {
    pub date: Option<NaiveDate>,
    pub operation_type: Option<String>,
    pub account_type: Option<AccountType>,
    pub surgeon_name: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl OperationListQuery {
    pub fn into_parts(self) -> (OperationFilter, PageRequest) {
        let filter = OperationFilter {
            date: self.date,
            operation_type: self.operation_type,
            account_type: self.account_type,
            surgeon_name: self.surgeon_name,
        };
        let page = PageRequest {
            page: self.page,
            limit: self.limit,
        };
        (filter, page)
    }
}

/// Query string of `GET /operations/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Query string of `GET /stats/monthly`; missing parts default to the current month
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyStatsQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Query string of `POST /images`
#[derive(Debug, Default, Deserialize)]
pub struct ImageUploadQuery {
    pub name: Option<String>,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token to send as `Authorization: Bearer <token>`
    pub token: String,
    #[serde(flatten)]
    pub session: SessionResponse,
}

/// Response for session operations
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub role: String,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
