use crate::model::mapping::PlaceholderMatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response of the session analysis endpoint: a pre-flight preview of how a
/// template and a dataset will combine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub placeholders: Vec<String>,
    pub columns: Vec<String>,
    pub matched: Vec<PlaceholderMatch>,
    /// Placeholders with no matching dataset column. Generation still
    /// proceeds; these stay unresolved in the rendered output.
    pub unmatched: Vec<String>,
    /// Total row count of the dataset.
    pub total: usize,
    /// Up to five normalized rows for display.
    pub preview: Vec<HashMap<String, String>>,
    pub has_signature: bool,
}
