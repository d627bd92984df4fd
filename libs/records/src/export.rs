//! CSV export of record collections

use chrono::NaiveDate;
use serde::{Serialize, ser::Error as _};
use serde_json::{Map, Value};

/// UTF-8 byte-order mark so spreadsheet tools pick the right encoding
pub const BOM: char = '\u{feff}';

/// MIME type of the export
pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

/// Render `rows` as CSV
///
/// The header comes from the keys of the first row; every field is written
/// JSON-encoded, with empty, null, zero and false values written as `""`.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, serde_json::Error> {
    let objects = rows
        .iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde_json::Error::custom("CSV rows must serialize to objects")),
        })
        .collect::<Result<Vec<Map<String, Value>>, _>>()?;

    let mut csv = String::new();
    csv.push(BOM);

    let Some(first) = objects.first() else {
        return Ok(csv);
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(objects.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for object in &objects {
        let fields = headers
            .iter()
            .map(|header| csv_field(object.get(header.as_str())))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(fields.join(","));
    }

    csv.push_str(&lines.join("\n"));
    Ok(csv)
}

fn csv_field(value: Option<&Value>) -> Result<String, serde_json::Error> {
    let blank = match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };

    match value {
        Some(value) if !blank => serde_json::to_string(value),
        _ => Ok("\"\"".to_string()),
    }
}

/// Download name for an export produced on `date`
pub fn export_filename(date: NaiveDate) -> String {
    format!("operations_{}.csv", date.format("%Y-%m-%d"))
}
