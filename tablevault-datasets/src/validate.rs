//! Write-time validation of column inputs.
//!
//! Violations are collected across all columns and rows before a write is
//! rejected, so the caller sees every problem at once.

use crate::error::Violation;
use crate::types::{ColumnInput, ColumnType};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// ISO date (`2024-01-31`) or date-time (`2024-01-31T10:30:00Z`), with
/// optional seconds, fractional seconds, and numeric offsets.
const ISO_DATE_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$";

fn iso_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(ISO_DATE_PATTERN).expect("hard-coded pattern compiles")
    })
}

/// A string is a valid date value when it matches the ISO shape and names
/// a real calendar date (rejects e.g. `1999-02-30`).
fn is_valid_date(s: &str) -> bool {
    if !iso_pattern().is_match(s) {
        return false;
    }
    NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").is_ok()
}

fn check_value(column_type: ColumnType, value: &Value) -> Option<String> {
    match column_type {
        ColumnType::String => None,
        ColumnType::Number => match value {
            Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => None,
            _ => Some("expected a finite number".to_string()),
        },
        ColumnType::Date => match value {
            Value::String(s) if is_valid_date(s) => None,
            Value::String(_) => Some("expected an ISO date or date-time".to_string()),
            _ => Some("expected an ISO date string".to_string()),
        },
    }
}

/// Check every value of every column against its declared type.
pub fn validate_types(columns: &[ColumnInput]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for column in columns {
        for (row, value) in column.data.iter().enumerate() {
            if let Some(reason) = check_value(column.column_type, value) {
                violations.push(Violation {
                    column: column.name.clone(),
                    row: Some(row),
                    value: Some(value.clone()),
                    reason,
                });
            }
        }
    }
    violations
}

/// Reject duplicate column names (one violation per duplicated name).
pub fn validate_unique_names(columns: &[ColumnInput]) -> Vec<Violation> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut violations = Vec::new();
    for column in columns {
        let count = seen.entry(column.name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            violations.push(Violation {
                column: column.name.clone(),
                row: None,
                value: None,
                reason: "duplicate column name".to_string(),
            });
        }
    }
    violations
}

/// Reject duplicate ordinal positions (one violation per duplicated index).
pub fn validate_unique_indices(columns: &[ColumnInput]) -> Vec<Violation> {
    let mut seen: HashMap<i32, usize> = HashMap::new();
    let mut violations = Vec::new();
    for column in columns {
        let count = seen.entry(column.index).or_insert(0);
        *count += 1;
        if *count == 2 {
            violations.push(Violation {
                column: column.name.clone(),
                row: None,
                value: None,
                reason: format!("duplicate column index {}", column.index),
            });
        }
    }
    violations
}

/// All columns must carry the same number of values; the first column's
/// length defines the dataset's row count.
pub fn validate_row_counts(columns: &[ColumnInput]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(first) = columns.first() else {
        return violations;
    };
    let expected = first.data.len();
    for column in &columns[1..] {
        if column.data.len() != expected {
            violations.push(Violation {
                column: column.name.clone(),
                row: None,
                value: None,
                reason: format!(
                    "expected {expected} values (length of column {:?}), got {}",
                    first.name,
                    column.data.len()
                ),
            });
        }
    }
    violations
}
