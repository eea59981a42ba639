use crate::error::GenerateError;
use regex::Regex;
use std::path::Path;

/// Regex matching `{{ key }}` tokens. Shared with the renderer so extraction
/// and substitution always agree on what a placeholder is.
pub(crate) const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([^{}]+?)\s*\}\}";

/// Extracts the set of `{{placeholder}}` keys from a template file, keeping
/// first-appearance order and dropping duplicates.
///
/// An empty result is a valid, meaningful outcome: the template simply has
/// no placeholders.
pub fn extract_placeholders(path: &Path) -> Result<Vec<String>, GenerateError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GenerateError::SourceRead(format!("could not read template: {e}")))?;
    let re = Regex::new(PLACEHOLDER_PATTERN)
        .map_err(|e| GenerateError::Internal(format!("placeholder regex: {e}")))?;

    let mut keys: Vec<String> = Vec::new();
    for caps in re.captures_iter(&text) {
        let key = caps[1].trim().to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn template_with(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn extracts_unique_keys_in_order() {
        let (_dir, path) = template_with(
            "Awarded to {{ name }} for {{course}}.\nSigned on {{ name }}, {{date}}.",
        );
        let keys = extract_placeholders(&path).unwrap();
        assert_eq!(keys, vec!["name", "course", "date"]);
    }

    #[test]
    fn no_placeholders_is_an_empty_set_not_an_error() {
        let (_dir, path) = template_with("A plain certificate with no tokens.");
        assert!(extract_placeholders(&path).unwrap().is_empty());
    }
}
