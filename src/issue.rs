use serde::{Deserialize, Serialize};

/// Marker stored in `index` when a replacement could not be located.
pub const UNRESOLVED_INDEX: i64 = -1;

/// One detected grammar or expression problem.
///
/// An empty (or whitespace-only) `error` means the suggestion is inserted
/// rather than substituted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub error: String,
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl Issue {
    #[must_use]
    pub fn replacement(
        error: impl Into<String>,
        suggestion: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            suggestion: suggestion.into(),
            explanation: explanation.into(),
            index: None,
        }
    }

    #[must_use]
    pub fn insertion(suggestion: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::replacement(String::new(), suggestion, explanation)
    }

    #[must_use]
    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.error.trim().is_empty()
    }

    /// Token offset, only when it is a usable (non-negative) position.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self.index {
            Some(i) if i >= 0 => usize::try_from(i).ok(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.position().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::Issue;

    #[test]
    fn missing_index_and_explanation_deserialize() {
        let issue: Issue =
            serde_json::from_str(r#"{"error":"go","suggestion":"go to"}"#).expect("parse issue");
        assert_eq!(issue.index, None);
        assert_eq!(issue.explanation, "");
        assert!(!issue.is_insertion());
    }

    #[test]
    fn absent_index_is_not_serialized() {
        let json = serde_json::to_string(&Issue::insertion("the", "")).expect("serialize");
        assert!(!json.contains("index"));
        let json = serde_json::to_string(&Issue::insertion("the", "").with_index(3))
            .expect("serialize");
        assert!(json.contains(r#""index":3"#));
    }

    #[test]
    fn blank_error_is_an_insertion() {
        assert!(Issue::replacement(" \t", "apples", "").is_insertion());
        assert!(!Issue::replacement(" a ", "b", "").is_insertion());
    }

    #[test]
    fn negative_index_is_not_a_position() {
        let issue = Issue::replacement("a", "b", "").with_index(-1);
        assert_eq!(issue.position(), None);
        assert!(!issue.is_indexed());
        assert_eq!(issue.clone().with_index(0).position(), Some(0));
    }
}
