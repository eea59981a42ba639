use crate::error::GenerateError;
use std::path::Path;

/// A loaded tabular dataset: named columns plus normalized string rows.
/// Every row is padded or truncated to the column count.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Pairs column names with one row's values for display or rendering.
    pub fn row_values(&self, row: &[String]) -> std::collections::HashMap<String, String> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

/// Picks the delimiter with the most occurrences in the header line.
pub fn detect_delimiter(header_line: &str) -> char {
    [',', ';', '\t', '|']
        .iter()
        .max_by_key(|&&d| header_line.matches(d).count())
        .copied()
        .unwrap_or(',')
}

/// Strips surrounding quotes and non-breaking spaces, then trims.
pub(crate) fn normalize_cell(cell: &str) -> String {
    let s = cell.trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .map(|s| s.to_string())
        .unwrap_or_else(|| s.to_string());
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// Loads a CSV dataset from `path`.
///
/// Fails with [`GenerateError::SourceRead`] on an unsupported extension or an
/// unreadable/unparsable file. The delimiter is auto-detected from the header
/// line; headers are trimmed and cells normalized.
pub fn load(path: &Path) -> Result<Dataset, GenerateError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if extension != "csv" {
        return Err(GenerateError::SourceRead(format!(
            "unsupported data format: .{extension}"
        )));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| GenerateError::SourceRead(format!("could not read dataset: {e}")))?;
    let header_line = contents.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| GenerateError::SourceRead(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| GenerateError::SourceRead(e.to_string()))?;
        let mut row: Vec<String> = record.iter().map(normalize_cell).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(Dataset { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn detects_the_dominant_delimiter() {
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("name"), ',');
    }

    #[test]
    fn loads_semicolon_csv_with_padding() {
        let (_dir, path) = write_temp(
            "data.csv",
            "Name; Course; Date\nJane;Rust;2026-01-01\nBob;Go\n",
        );
        let dataset = load(&path).unwrap();
        assert_eq!(dataset.columns, vec!["Name", "Course", "Date"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[0], vec!["Jane", "Rust", "2026-01-01"]);
        // Short row padded with empties.
        assert_eq!(dataset.rows[1], vec!["Bob", "Go", ""]);
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let (_dir, path) = write_temp("data.xlsx", "not really a spreadsheet");
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported data format"));
    }

    #[test]
    fn normalizes_quotes_and_nbsp() {
        assert_eq!(normalize_cell("  \"Jane Doe\" "), "Jane Doe");
        assert_eq!(normalize_cell("'x'"), "x");
        assert_eq!(normalize_cell("a\u{00A0}b"), "a b");
    }
}
