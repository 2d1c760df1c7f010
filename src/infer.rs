use serde::Serialize;

use crate::issue::Issue;
use crate::tokenize::tokenize;

/// Minimal differing span between a wrong answer and the correct one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    pub error: String,
    pub suggestion: String,
    /// Token offset of the span in the wrong answer.
    pub index: usize,
}

impl DiffSpan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.suggestion.is_empty()
    }

    #[must_use]
    pub fn into_issue(self, explanation: impl Into<String>) -> Issue {
        let index = i64::try_from(self.index).unwrap_or(i64::MAX);
        Issue::replacement(self.error, self.suggestion, explanation).with_index(index)
    }
}

/// Trims common leading then trailing tokens of `wrong` and `correct`.
#[must_use]
pub fn infer_issue(wrong: &str, correct: &str) -> DiffSpan {
    let w = tokenize(wrong);
    let c = tokenize(correct);

    let prefix = w.iter().zip(&c).take_while(|(a, b)| a == b).count();
    let suffix = w[prefix..]
        .iter()
        .rev()
        .zip(c[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    DiffSpan {
        error: w[prefix..w.len() - suffix].join(" "),
        suggestion: c[prefix..c.len() - suffix].join(" "),
        index: prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::infer_issue;

    #[test]
    fn finds_middle_span() {
        let span = infer_issue("She don't like it", "She doesn't like it");
        assert_eq!(span.error, "don't");
        assert_eq!(span.suggestion, "doesn't");
        assert_eq!(span.index, 1);
    }

    #[test]
    fn pure_insertion_has_empty_error() {
        let span = infer_issue("I go school", "I go to school");
        assert_eq!(span.error, "");
        assert_eq!(span.suggestion, "to");
        assert_eq!(span.index, 2);
    }

    #[test]
    fn prefix_and_suffix_never_overlap() {
        let span = infer_issue("a a", "a a a");
        assert_eq!(span.error, "");
        assert_eq!(span.suggestion, "a");
        assert_eq!(span.index, 2);
    }

    #[test]
    fn identical_answers_give_empty_span() {
        let span = infer_issue("same  words", "same words");
        assert!(span.is_empty());
    }

    #[test]
    fn converts_into_indexed_issue() {
        let issue = infer_issue("He go home", "He went home").into_issue("past tense");
        assert_eq!(issue.error, "go");
        assert_eq!(issue.suggestion, "went");
        assert_eq!(issue.index, Some(1));
        assert_eq!(issue.explanation, "past tense");
    }
}
