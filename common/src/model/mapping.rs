use serde::{Deserialize, Serialize};

/// One placeholder key paired with the dataset column it resolved to.
///
/// Produced by the pre-flight mapping preview; informational only, it never
/// gates generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderMatch {
    pub placeholder: String,
    pub column: String,
}
