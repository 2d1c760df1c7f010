use regex::{NoExpand, RegexBuilder};

use crate::issue::Issue;
use crate::resolve::ensure_indexed_issues;
use crate::tokenize::{join_tokens, tokenize};

/// Gold token sequence for a quiz built from `sentence` and its issues.
///
/// Replacements that cannot be indexed are applied to the raw sentence with a
/// case-insensitive substring replace instead. When that changes the sentence,
/// its tokenization wins for the whole call and the spliced tokens are dropped.
#[must_use]
pub fn build_correct_tokens(sentence: &str, issues: &[Issue]) -> Vec<String> {
    let resolved = ensure_indexed_issues(sentence, issues, None);

    let unindexed: Vec<&Issue> = resolved
        .iter()
        .filter(|i| !i.is_insertion() && !i.is_indexed())
        .collect();
    if !unindexed.is_empty() {
        let fallback = unindexed
            .iter()
            .fold(sentence.to_string(), |acc, issue| replace_first_ci(&acc, issue));
        if fallback != sentence {
            return tokenize(&fallback);
        }
    }

    splice_sorted(sentence, &resolved)
}

/// Splices already-indexed issues into the sentence tokens.
///
/// Issues without a non-negative index are skipped.
#[must_use]
pub fn apply_issues(sentence: &str, issues: &[Issue]) -> Vec<String> {
    splice_sorted(sentence, issues)
}

/// Resolves, applies and joins; the literal corrected sentence.
#[must_use]
pub fn corrected_sentence(sentence: &str, issues: &[Issue]) -> String {
    let resolved = ensure_indexed_issues(sentence, issues, None);
    join_tokens(&apply_issues(sentence, &resolved))
}

/// A gold token and the input issue that produced it, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplicedToken {
    pub text: String,
    pub issue: Option<usize>,
}

/// Splices indexed issues in ascending index order, tagging inserted tokens
/// with the position of their issue in `issues`.
///
/// An issue whose index falls inside a span an earlier replacement already
/// consumed is skipped.
#[must_use]
pub fn splice_with_origin(sentence: &str, issues: &[Issue]) -> Vec<SplicedToken> {
    let mut tokens: Vec<SplicedToken> = tokenize(sentence)
        .into_iter()
        .map(|text| SplicedToken { text, issue: None })
        .collect();

    let mut ordered: Vec<(usize, usize, &Issue)> = issues
        .iter()
        .enumerate()
        .filter_map(|(n, i)| i.position().map(|p| (p, n, i)))
        .collect();
    ordered.sort_by_key(|(p, _, _)| *p);

    // Net length change of earlier splices, so later indices still refer to
    // positions in the original tokenization.
    let mut shift: isize = 0;
    // Original tokens before this offset were already consumed by a replacement.
    let mut covered_until = 0usize;
    for (pos, n, issue) in ordered {
        if pos < covered_until {
            continue;
        }
        let at = pos.saturating_add_signed(shift).min(tokens.len());
        let remove = if issue.is_insertion() {
            0
        } else {
            tokenize(&issue.error).len().min(tokens.len() - at)
        };
        covered_until = pos + remove;
        let insert: Vec<SplicedToken> = tokenize(&issue.suggestion)
            .into_iter()
            .map(|text| SplicedToken { text, issue: Some(n) })
            .collect();
        shift += insert.len() as isize - remove as isize;
        tokens.splice(at..at + remove, insert);
    }
    tokens
}

fn splice_sorted(sentence: &str, issues: &[Issue]) -> Vec<String> {
    splice_with_origin(sentence, issues)
        .into_iter()
        .map(|t| t.text)
        .collect()
}

fn replace_first_ci(text: &str, issue: &Issue) -> String {
    let needle = issue.error.trim();
    if needle.is_empty() {
        return text.to_string();
    }
    let pattern = regex::escape(needle);
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re
            .replacen(text, 1, NoExpand(issue.suggestion.as_str()))
            .into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_issues, build_correct_tokens, corrected_sentence, splice_with_origin};
    use crate::issue::Issue;
    use crate::resolve::ensure_indexed_issues;
    use crate::tokenize::tokenize;

    #[test]
    fn no_issues_is_identity() {
        let s = "  The quick  brown fox. ";
        assert_eq!(build_correct_tokens(s, &[]), tokenize(s));
        assert_eq!(apply_issues(s, &[]), tokenize(s));
    }

    #[test]
    fn replacement_grows_sentence() {
        let out = build_correct_tokens("I go school", &[Issue::replacement("go", "go to", "")]);
        assert_eq!(out, vec!["I", "go", "to", "school"]);
    }

    #[test]
    fn insertion_appends_at_end() {
        let out = build_correct_tokens("I like", &[Issue::insertion("apples", "")]);
        assert_eq!(out, vec!["I", "like", "apples"]);
    }

    #[test]
    fn later_indices_follow_earlier_splices() {
        let issues = vec![
            Issue::replacement("childs", "children", "").with_index(4),
            Issue::replacement("has", "have", "").with_index(1),
            Issue::insertion("the", "").with_index(2),
            Issue::replacement("a lot", "many", "").with_index(2),
        ];
        let out = build_correct_tokens("He has a lot childs", &issues);
        assert_eq!(out, vec!["He", "have", "the", "many", "children"]);
    }

    #[test]
    fn unindexed_replacement_uses_substring_fallback() {
        // "goed" sits inside "forgoed", so no whole-word match exists.
        let issues = vec![
            Issue::replacement("goed", "went", ""),
            Issue::insertion("!", ""),
        ];
        let out = build_correct_tokens("He forgoed it", &issues);
        assert_eq!(out, vec!["He", "forwent", "it"]);
    }

    #[test]
    fn unchanged_fallback_keeps_spliced_tokens() {
        let issues = vec![
            Issue::replacement("missing", "x", ""),
            Issue::replacement("like", "love", ""),
        ];
        let out = build_correct_tokens("I like tea", &issues);
        assert_eq!(out, vec!["I", "love", "tea"]);
    }

    #[test]
    fn apply_skips_unresolved() {
        let issues = vec![
            Issue::replacement("x", "y", "").with_index(-1),
            Issue::replacement("tea", "coffee", "").with_index(2),
        ];
        assert_eq!(apply_issues("I like tea", &issues), vec!["I", "like", "coffee"]);
    }

    #[test]
    fn out_of_range_index_clamps_to_end() {
        let issues = vec![Issue::insertion("please", "").with_index(9)];
        assert_eq!(apply_issues("sit down", &issues), vec!["sit", "down", "please"]);
    }

    #[test]
    fn resolve_then_apply_round_trip() {
        let s = "She go to school";
        let issues = vec![Issue::replacement("go", "goes", "")];
        let resolved = ensure_indexed_issues(s, &issues, None);
        assert_eq!(apply_issues(s, &resolved).join(" "), "She goes to school");
        assert_eq!(corrected_sentence(s, &issues), "She goes to school");
    }

    #[test]
    fn spliced_tokens_remember_their_issue() {
        let issues = vec![
            Issue::insertion("to", "").with_index(2),
            Issue::replacement("I", "We", "").with_index(0),
        ];
        let origin: Vec<Option<usize>> = splice_with_origin("I go school", &issues)
            .into_iter()
            .map(|t| t.issue)
            .collect();
        assert_eq!(origin, vec![Some(1), None, Some(0), None]);
    }

    #[test]
    fn blank_error_inserts_instead_of_gluing() {
        let out = build_correct_tokens("I like", &[Issue::replacement(" ", "apples", "")]);
        assert_eq!(out, vec!["I", "like", "apples"]);
    }

    #[test]
    fn overlapping_issue_is_skipped() {
        let issues = vec![
            Issue::replacement("a b c", "x", "").with_index(0),
            Issue::replacement("b", "y", "").with_index(1),
            Issue::insertion("z", "").with_index(2),
        ];
        assert_eq!(apply_issues("a b c d", &issues), vec!["x", "d"]);

        let adjacent = vec![
            Issue::replacement("a b", "x", "").with_index(0),
            Issue::replacement("c", "y", "").with_index(2),
        ];
        assert_eq!(apply_issues("a b c d", &adjacent), vec!["x", "y", "d"]);
    }
}
