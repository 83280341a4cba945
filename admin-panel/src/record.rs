//! Generic record model.
//!
//! A record is whatever object the backend returns for a row. Nothing about its
//! shape is known ahead of time, so columns and form fields are derived from the
//! keys present at runtime.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// One row of a resource, key order as returned by the server.
pub type Record = Map<String, Value>;

/// Top-level route names that are never offered as tables.
pub const EXCLUDED_ROUTES: &[&str] = &["auth", "app"];

/// Fields shown as columns but never offered in the add/edit form.
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_on", "modified_on", "created_by", "modified_by"];

const TIMESTAMP_SUFFIXES: &[&str] = &["_on", "_date"];
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Which names are hidden where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub excluded: Vec<String>,
    pub system_fields: Vec<String>,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            excluded: EXCLUDED_ROUTES.iter().map(|s| s.to_string()).collect(),
            system_fields: SYSTEM_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FieldRules {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e == name)
    }

    pub fn is_system_field(&self, name: &str) -> bool {
        self.system_fields.iter().any(|f| f == name)
    }

    /// Row with the excluded names stripped.
    pub fn visible_fields(&self, row: &Record) -> Record {
        row.iter()
            .filter(|(k, _)| !self.is_excluded(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Column headers, taken from the first row. No rows means no columns.
    pub fn columns(&self, rows: &[Record]) -> Vec<String> {
        rows.first()
            .map(|row| {
                row.keys()
                    .filter(|k| !self.is_excluded(k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Editable subset of `keys`.
    pub fn form_fields<'a, I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        keys.into_iter()
            .filter(|k| !self.is_excluded(k) && !self.is_system_field(k))
            .cloned()
            .collect()
    }
}

pub fn is_timestamp_key(key: &str) -> bool {
    TIMESTAMP_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// Cell text in the local time zone.
pub fn render_cell(key: &str, value: &Value) -> String {
    render_cell_in(key, value, &Local)
}

/// Cell text: timestamps formatted in `tz`, everything else as JSON text.
pub fn render_cell_in<Tz>(key: &str, value: &Value, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if is_timestamp_key(key) {
        if let Some(ts) = parse_timestamp(value) {
            return ts.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string();
        }
    }
    value.to_string()
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Form label: the key with its first character upper-cased.
pub fn field_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Text shown in a form input for `value`.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The row's `id` as a URL path segment.
pub fn record_id(row: &Record) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
