use chrono::{DateTime, Utc};
use serde_json::Value;

pub fn datetime_to_string(datetime: DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn datetime_to_string_opt(datetime: Option<DateTime<Utc>>) -> Option<String> {
    datetime.map(datetime_to_string)
}

/// Unwraps values like `RESEND_FROM="PSI <psi@psi.org>"` that some hosts
/// pass through with the quotes still attached. Blank values become `None`.
pub fn strip_quotes(val: Option<String>) -> Option<String> {
    let v = val?.trim().to_string();
    let quoted = v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')));
    let v = if quoted {
        v[1..v.len() - 1].trim().to_string()
    } else {
        v
    };
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

pub fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Boolean coercion for loosely typed form flags.
pub fn to_bool(val: Option<&Value>) -> bool {
    match val {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => is_truthy(s),
        Some(Value::Number(n)) => is_truthy(&n.to_string()),
        _ => false,
    }
}

/// Trims an optional text field, mapping blank input to `None`.
pub fn clean_text(val: Option<&str>) -> Option<String> {
    val.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Cuts `val` to at most `max` characters without splitting a code point.
pub fn truncate_chars(val: &str, max: usize) -> &str {
    match val.char_indices().nth(max) {
        Some((idx, _)) => &val[..idx],
        None => val,
    }
}
