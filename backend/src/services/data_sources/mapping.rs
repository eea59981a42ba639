//! Column-matching heuristics.
//!
//! `derive_canonical_fields` decides which dataset values end up in the
//! signed certificate fields, so its precedence rules (synonym match first,
//! positional fallback second, first match per category wins) are part of
//! the signed-data contract and must not be "improved".

use common::model::mapping::PlaceholderMatch;
use std::collections::HashMap;

/// Column-name synonyms recognized for each canonical category, compared
/// case-insensitively against trimmed column names.
const NAME_COLUMNS: [&str; 4] = ["name", "student", "recipient", "full_name"];
const COURSE_COLUMNS: [&str; 4] = ["course", "subject", "program", "course_name"];
const DATE_COLUMNS: [&str; 4] = ["date", "issue_date", "completion_date", "cert_date"];

/// The recipient, course and issue date picked out of one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalValues {
    pub recipient: String,
    pub course: String,
    pub issue_date: String,
}

/// Pairs each placeholder key with a dataset column by case-insensitive,
/// whitespace-trimmed exact match. A placeholder matches at most one column
/// (first match wins); keys with no match are reported separately.
///
/// Informational only: generation proceeds even with unmatched placeholders.
pub fn compute_mapping(
    columns: &[String],
    placeholder_keys: &[String],
) -> (Vec<PlaceholderMatch>, Vec<String>) {
    let mut col_map: HashMap<String, &String> = HashMap::new();
    for col in columns {
        col_map.entry(col.trim().to_lowercase()).or_insert(col);
    }

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for key in placeholder_keys {
        match col_map.get(&key.trim().to_lowercase()) {
            Some(column) => matched.push(PlaceholderMatch {
                placeholder: key.clone(),
                column: (*column).clone(),
            }),
            None => unmatched.push(key.clone()),
        }
    }
    (matched, unmatched)
}

/// Extracts the canonical certificate fields from one row.
///
/// Two tiers, checked in this exact order:
/// 1. synonym match: the first column whose lowercased, trimmed name appears
///    in the category's synonym list supplies the value;
/// 2. positional fallback: 1st column -> recipient, 2nd -> course,
///    3rd -> date.
///
/// A still-absent date falls back to the current local date.
pub fn derive_canonical_fields(row: &[String], columns: &[String]) -> CanonicalValues {
    let mut recipient: Option<String> = None;
    let mut course: Option<String> = None;
    let mut issue_date: Option<String> = None;

    for (idx, column) in columns.iter().enumerate() {
        let cl = column.trim().to_lowercase();
        let value = || row.get(idx).cloned().unwrap_or_default();
        if recipient.is_none() && NAME_COLUMNS.contains(&cl.as_str()) {
            recipient = Some(value());
        } else if course.is_none() && COURSE_COLUMNS.contains(&cl.as_str()) {
            course = Some(value());
        } else if issue_date.is_none() && DATE_COLUMNS.contains(&cl.as_str()) {
            issue_date = Some(value());
        }
    }

    let positional = |idx: usize| row.get(idx).cloned();
    let recipient = recipient
        .or_else(|| positional(0))
        .unwrap_or_else(|| "Unknown".to_string());
    let course = course
        .or_else(|| positional(1))
        .unwrap_or_else(|| "Unknown".to_string());
    let mut issue_date = issue_date.or_else(|| positional(2)).unwrap_or_default();
    if issue_date.is_empty() {
        issue_date = chrono::Local::now().format("%Y-%m-%d").to_string();
    }

    CanonicalValues {
        recipient,
        course,
        issue_date,
    }
}

/// Builds a filesystem- and archive-safe display name for one row's
/// certificate from the row's first-column value.
///
/// Empty or missing-marker values fall back to `certificate_<row+1>`; any
/// character outside alphanumerics, space, hyphen and underscore becomes an
/// underscore; an all-underscore-stripped-to-empty result falls back again.
pub fn safe_file_name(value: &str, row_index: usize) -> String {
    let fallback = || format!("certificate_{}", row_index + 1);
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return fallback();
    }
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mapping_is_case_insensitive_over_column_casing() {
        let keys = cols(&["name", "course"]);
        let (upper, un_upper) = compute_mapping(&cols(&["Name", "Course"]), &keys);
        let (lower, un_lower) = compute_mapping(&cols(&["name", "course"]), &keys);
        let matched_keys = |m: &[PlaceholderMatch]| {
            m.iter().map(|p| p.placeholder.clone()).collect::<Vec<_>>()
        };
        assert_eq!(matched_keys(&upper), matched_keys(&lower));
        assert_eq!(un_upper, un_lower);
        assert!(un_upper.is_empty());
    }

    #[test]
    fn unmatched_placeholders_are_reported_not_fatal() {
        let (matched, unmatched) =
            compute_mapping(&cols(&["Name"]), &cols(&["name", "grade"]));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].column, "Name");
        assert_eq!(unmatched, vec!["grade"]);
    }

    #[test]
    fn first_column_wins_on_duplicate_names() {
        let (matched, _) =
            compute_mapping(&cols(&["Name", "NAME"]), &cols(&["name"]));
        assert_eq!(matched[0].column, "Name");
    }

    #[test]
    fn synonym_match_takes_priority_over_position() {
        let columns = cols(&["ID", "Recipient", "Course"]);
        let row = cols(&["42", "Jane Doe", "Rust"]);
        let fields = derive_canonical_fields(&row, &columns);
        assert_eq!(fields.recipient, "Jane Doe");
        assert_eq!(fields.course, "Rust");
    }

    #[test]
    fn positional_fallback_fills_unrecognized_categories() {
        // "Student Name" is not a recognized synonym; recipient falls back to
        // the first column while "Program" and "Date" match their synonyms.
        let columns = cols(&["Student Name", "Program", "Date"]);
        let row = cols(&["Jane Doe", "Rust", "2026-08-01"]);
        let fields = derive_canonical_fields(&row, &columns);
        assert_eq!(fields.recipient, "Jane Doe");
        assert_eq!(fields.course, "Rust");
        assert_eq!(fields.issue_date, "2026-08-01");
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let columns = cols(&["Name", "Course"]);
        let row = cols(&["Jane", "Rust"]);
        let fields = derive_canonical_fields(&row, &columns);
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(fields.issue_date, today);
    }

    #[test]
    fn safe_file_name_replaces_and_falls_back() {
        assert_eq!(safe_file_name("John/Doe", 0), "John_Doe");
        assert_eq!(safe_file_name("", 3), "certificate_4");
        assert_eq!(safe_file_name("nan", 0), "certificate_1");
        assert_eq!(safe_file_name("  Mary-Jane_2 ", 0), "Mary-Jane_2");
    }
}
