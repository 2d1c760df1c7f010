use regex::{Regex, RegexBuilder};

use crate::issue::{Issue, UNRESOLVED_INDEX};
use crate::tokenize::{find_token_sequence, tokenize};

/// Returns a copy of `issues` where every issue carries a token index.
///
/// Replacements that cannot be located get [`UNRESOLVED_INDEX`]. Insertions
/// without a locatable point go to the end of the sentence.
#[must_use]
pub fn ensure_indexed_issues(sentence: &str, issues: &[Issue], corrected: Option<&str>) -> Vec<Issue> {
    let src_tokens = tokenize(sentence);
    let corrected_tokens = corrected.map(tokenize);
    issues
        .iter()
        .map(|issue| {
            if issue.is_indexed() {
                return issue.clone();
            }
            let index = if issue.is_insertion() {
                let at = corrected_tokens
                    .as_deref()
                    .and_then(|cor| insertion_point(&src_tokens, cor, &tokenize(&issue.suggestion)))
                    .unwrap_or(src_tokens.len());
                to_index(at)
            } else {
                replacement_index(sentence, &src_tokens, &issue.error)
                    .map(to_index)
                    .unwrap_or(UNRESOLVED_INDEX)
            };
            issue.clone().with_index(index)
        })
        .collect()
}

fn to_index(pos: usize) -> i64 {
    i64::try_from(pos).unwrap_or(i64::MAX)
}

/// Exact token match first, then a case-insensitive word-boundary search.
pub fn replacement_index(sentence: &str, src_tokens: &[String], error: &str) -> Option<usize> {
    let err_tokens = tokenize(error);
    if err_tokens.is_empty() {
        return None;
    }
    find_token_sequence(src_tokens, &err_tokens).or_else(|| regex_token_index(sentence, error))
}

fn word_boundary_regex(error: &str) -> Option<Regex> {
    let pattern = format!(r"\b{}\b", regex::escape(error.trim()));
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

/// Index of the token containing the first case-insensitive whole-word match.
pub fn regex_token_index(sentence: &str, error: &str) -> Option<usize> {
    let re = word_boundary_regex(error)?;
    let m = re.find(sentence)?;
    Some(token_index_at(sentence, m.start()))
}

/// Converts a byte offset into the index of the token it falls in.
#[must_use]
pub fn token_index_at(sentence: &str, byte_offset: usize) -> usize {
    let prefix = sentence.get(..byte_offset).unwrap_or(sentence);
    let words_before = prefix.split_whitespace().count();
    let inside_token = prefix.chars().next_back().is_some_and(|c| !c.is_whitespace());
    if inside_token {
        words_before.saturating_sub(1)
    } else {
        words_before
    }
}

/// Greedy two-pointer scan for where `suggestion` was inserted in `corrected`.
///
/// No backtracking: a suggestion that also occurs earlier in the corrected
/// sentence can be placed at the earlier spot.
#[must_use]
pub fn insertion_point(src: &[String], corrected: &[String], suggestion: &[String]) -> Option<usize> {
    if suggestion.is_empty() {
        return None;
    }
    let (mut i, mut j) = (0usize, 0usize);
    while j < corrected.len() {
        if i < src.len() && src[i] == corrected[j] {
            i += 1;
            j += 1;
            continue;
        }
        if corrected[j..].starts_with(suggestion) {
            return Some(i);
        }
        j += 1;
    }
    None
}
