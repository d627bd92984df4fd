//! Operation record model and related functionality

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};

/// Billing category of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Insurance,
    Contract,
    Private,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [
        AccountType::Insurance,
        AccountType::Contract,
        AccountType::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Insurance => "insurance",
            AccountType::Contract => "contract",
            AccountType::Private => "private",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = RecordError;

    /// Accepts the English names and the Arabic labels used by the entry form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insurance" | "تأمين" => Ok(AccountType::Insurance),
            "contract" | "تعاقد" => Ok(AccountType::Contract),
            "private" | "خاصة" => Ok(AccountType::Private),
            other => Err(RecordError::Validation(format!(
                "Unknown account type '{other}'"
            ))),
        }
    }
}

/// One logged surgical case entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: Uuid,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
    pub operation_type: String,
    pub account_type: AccountType,
    pub surgeon_name: String,
    pub anesthesiologist_name: String,
    pub theater_no: String,
    #[serde(default, deserialize_with = "lenient_case_count")]
    pub case_count: u32,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl OperationRecord {
    pub fn notes_or_empty(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

/// Operation creation payload, as submitted by the entry form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOperation {
    pub time: Option<String>,
    pub operation_type: Option<String>,
    pub account_type: Option<String>,
    pub surgeon_name: Option<String>,
    pub anesthesiologist_name: Option<String>,
    pub theater_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_case_count")]
    pub case_count: u32,
    pub notes: Option<String>,
}

impl NewOperation {
    /// Validate the payload and stamp it with an id and the add-time clock reading
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> RecordResult<OperationRecord> {
        Ok(OperationRecord {
            id,
            time: parse_time(&required("time", self.time)?)?,
            operation_type: required("operation_type", self.operation_type)?,
            account_type: required("account_type", self.account_type)?.parse()?,
            surgeon_name: required("surgeon_name", self.surgeon_name)?,
            anesthesiologist_name: required("anesthesiologist_name", self.anesthesiologist_name)?,
            theater_no: required("theater_no", self.theater_no)?,
            case_count: self.case_count,
            notes: optional(self.notes),
            date: now.date_naive(),
            created_at: now,
        })
    }
}

/// Operation update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationPatch {
    pub time: Option<String>,
    pub operation_type: Option<String>,
    pub account_type: Option<String>,
    pub surgeon_name: Option<String>,
    pub anesthesiologist_name: Option<String>,
    pub theater_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_case_count")]
    pub case_count: Option<u32>,
    pub notes: Option<String>,
}

impl OperationPatch {
    /// Merge the present fields into `record`
    ///
    /// On error `record` may be partially updated, so callers apply the
    /// patch to a copy.
    pub fn apply_to(self, record: &mut OperationRecord) -> RecordResult<()> {
        if let Some(time) = self.time {
            record.time = parse_time(&required("time", Some(time))?)?;
        }
        if let Some(operation_type) = self.operation_type {
            record.operation_type = required("operation_type", Some(operation_type))?;
        }
        if let Some(account_type) = self.account_type {
            record.account_type = account_type.parse()?;
        }
        if let Some(surgeon_name) = self.surgeon_name {
            record.surgeon_name = required("surgeon_name", Some(surgeon_name))?;
        }
        if let Some(name) = self.anesthesiologist_name {
            record.anesthesiologist_name = required("anesthesiologist_name", Some(name))?;
        }
        if let Some(theater_no) = self.theater_no {
            record.theater_no = required("theater_no", Some(theater_no))?;
        }
        if let Some(case_count) = self.case_count {
            record.case_count = case_count;
        }
        if let Some(notes) = self.notes {
            record.notes = optional(Some(notes));
        }
        Ok(())
    }
}

fn required(field: &str, value: Option<String>) -> RecordResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RecordError::missing(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_time(raw: &str) -> RecordResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| RecordError::Validation(format!("Invalid time '{raw}', expected HH:MM")))
}

/// Parse a case count the way the entry form does: leading digits win,
/// anything else (or a negative number) counts as zero
pub fn parse_case_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];

    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map_or(u32::MAX, clamp_count)
}

fn clamp_count(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn case_count_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(clamp_count)
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u32))
            .unwrap_or(0),
        Value::String(s) => parse_case_count(s),
        _ => 0,
    }
}

fn lenient_case_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, case_count_from_value))
}

fn lenient_optional_case_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(case_count_from_value))
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(D::Error::custom)
    }
}
