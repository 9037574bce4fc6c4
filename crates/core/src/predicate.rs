//! Metadata predicate evaluator (C5).
//!
//! A predicate is a JSON object mapping dotted key-paths to conditions,
//! conjoined with AND. A condition is either a bare value (equality) or an
//! object of `$operator → expected` pairs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::RegexBuilder;
use serde_json::Value;

use crate::models::Metadata;

/// Evaluate `predicate` against `metadata`. Every keyed condition must hold
/// (AND). A predicate that isn't a JSON object is treated as vacuously
/// true — callers are expected to only pass object predicates.
pub fn evaluate(metadata: &Metadata, predicate: &Value) -> bool {
    let Some(entries) = predicate.as_object() else {
        return true;
    };

    entries
        .iter()
        .all(|(path, condition)| eval_condition(resolve(metadata, path), condition))
}

fn resolve<'a>(metadata: &'a Metadata, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = metadata.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn eval_condition(actual: Option<&Value>, condition: &Value) -> bool {
    match condition.as_object() {
        Some(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
            ops.iter().all(|(op, expected)| eval_operator(actual, op, expected))
        }
        _ => actual.map(|a| a == condition).unwrap_or(false),
    }
}

fn eval_operator(actual: Option<&Value>, op: &str, expected: &Value) -> bool {
    match op {
        "$eq" => actual.map(|a| a == expected).unwrap_or(false),
        "$ne" => actual.map(|a| a != expected).unwrap_or(true),
        "$gt" => compare(actual, expected).map(|o| o.is_gt()).unwrap_or(false),
        "$gte" => compare(actual, expected).map(|o| o.is_ge()).unwrap_or(false),
        "$lt" => compare(actual, expected).map(|o| o.is_lt()).unwrap_or(false),
        "$lte" => compare(actual, expected).map(|o| o.is_le()).unwrap_or(false),
        "$in" => expected
            .as_array()
            .map(|arr| actual.map(|a| arr.contains(a)).unwrap_or(false))
            .unwrap_or(false),
        "$nin" => expected
            .as_array()
            .map(|arr| actual.map(|a| !arr.contains(a)).unwrap_or(true))
            .unwrap_or(true),
        "$contains" => match (actual.and_then(Value::as_str), expected.as_str()) {
            (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
            _ => false,
        },
        "$regex" => match (actual.and_then(Value::as_str), expected.as_str()) {
            (Some(a), Some(pattern)) => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(a))
                .unwrap_or(false),
            _ => false,
        },
        "$exists" => {
            let exists = actual.is_some();
            expected.as_bool().map(|expected| exists == expected).unwrap_or(exists)
        }
        "$date_after" => date_compare(actual, expected).map(|o| o.is_gt()).unwrap_or(false),
        "$date_before" => date_compare(actual, expected).map(|o| o.is_lt()).unwrap_or(false),
        "$date_range" => eval_date_range(actual, expected),
        _ => true,
    }
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    let actual = actual?;
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn eval_date_range(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual.and_then(Value::as_str).and_then(parse_date) else {
        return false;
    };
    let Some(range) = expected.as_object() else {
        return false;
    };
    let start = range.get("start").and_then(Value::as_str).and_then(parse_date);
    let end = range.get("end").and_then(Value::as_str).and_then(parse_date);
    match (start, end) {
        (Some(start), Some(end)) => actual >= start && actual <= end,
        _ => false,
    }
}

fn date_compare(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    let actual = parse_date(actual?.as_str()?)?;
    let expected = parse_date(expected.as_str()?)?;
    Some(actual.cmp(&expected))
}

/// Parse a timestamp string, trying ISO-8601/RFC-3339 first and then a
/// small fallback list. Returns `None` if none match.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S"];
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
                Utc,
            ));
        }
    }

    None
}
