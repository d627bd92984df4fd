//! Filtering, free-text search and pagination over operation records

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{AccountType, OperationRecord};

/// Independent criteria combined with AND; `None` (or blank text) means no constraint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationFilter {
    pub date: Option<NaiveDate>,
    pub operation_type: Option<String>,
    pub account_type: Option<AccountType>,
    /// Case-insensitive substring of the surgeon name
    pub surgeon_name: Option<String>,
}

impl OperationFilter {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && non_blank(&self.operation_type).is_none()
            && self.account_type.is_none()
            && non_blank(&self.surgeon_name).is_none()
    }

    pub fn matches(&self, record: &OperationRecord) -> bool {
        if self.date.is_some_and(|date| record.date != date) {
            return false;
        }
        if non_blank(&self.operation_type).is_some_and(|t| record.operation_type != t) {
            return false;
        }
        if self
            .account_type
            .is_some_and(|account| record.account_type != account)
        {
            return false;
        }
        if let Some(surgeon) = non_blank(&self.surgeon_name) {
            if !contains_ignore_case(&record.surgeon_name, surgeon) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records matching every criterion of `criteria`, in store order
pub fn filter(records: &[OperationRecord], criteria: &OperationFilter) -> Vec<OperationRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Case-insensitive substring search across operation type, surgeon,
/// anesthesiologist, notes and account type
///
/// An empty query returns every record.
pub fn search(records: &[OperationRecord], query: &str) -> Vec<OperationRecord> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            [
                record.operation_type.as_str(),
                record.surgeon_name.as_str(),
                record.anesthesiologist_name.as_str(),
                record.notes_or_empty(),
                record.account_type.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

/// Records dated within `year`/`month` (1-indexed)
pub fn in_month(records: &[OperationRecord], year: i32, month: u32) -> Vec<OperationRecord> {
    records
        .iter()
        .filter(|record| record.date.year() == year && record.date.month() == month)
        .cloned()
        .collect()
}

/// Page size used when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size accepted
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page (1-based) and page size
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
}

/// Cut `items` down to the requested page
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let page = request.page.unwrap_or(1).max(1);
    let limit = request
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let offset = (page as usize - 1).saturating_mul(limit as usize);

    let items = items
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect();

    Page {
        items,
        page,
        limit,
        total,
    }
}
