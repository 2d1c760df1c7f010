use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::correct::{build_correct_tokens, splice_with_origin, SplicedToken};
use crate::issue::Issue;
use crate::resolve::ensure_indexed_issues;
use crate::tokenize::tokenize;

static EDGE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{P}+|\p{P}+$").expect("edge punct regex"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    Fixed { text: String },
    Blank { answer: String, issue: Option<usize> },
}

impl Slot {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Slot::Blank { .. })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Slot::Fixed { text } => text,
            Slot::Blank { answer, .. } => answer,
        }
    }
}

/// How learner tokens are compared against gold tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct CheckOptions {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub ignore_punctuation: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            ignore_punctuation: true,
        }
    }
}

impl CheckOptions {
    fn normalize(&self, token: &str) -> String {
        let t = if self.ignore_punctuation {
            EDGE_PUNCT_RE.replace_all(token, "")
        } else {
            token.into()
        };
        if self.case_sensitive {
            t.into_owned()
        } else {
            t.to_lowercase()
        }
    }

    #[must_use]
    pub fn tokens_match(&self, expected: &str, given: &str) -> bool {
        self.normalize(expected) == self.normalize(given)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub expected: Option<String>,
    pub given: Option<String>,
    pub correct: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub verdicts: Vec<Verdict>,
}

impl QuizOutcome {
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.correct).count()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.verdicts.iter().all(|v| v.correct)
    }

    #[must_use]
    pub fn mistakes(&self) -> Vec<&Verdict> {
        self.verdicts.iter().filter(|v| !v.correct).collect()
    }
}

/// Position-by-position comparison; missing or extra tokens count as wrong.
#[must_use]
pub fn check_arrangement(answer: &[String], gold: &[String], options: CheckOptions) -> QuizOutcome {
    let n = answer.len().max(gold.len());
    let verdicts = (0..n)
        .map(|i| {
            let expected = gold.get(i);
            let given = answer.get(i);
            let correct = match (expected, given) {
                (Some(e), Some(g)) => options.tokens_match(e, g),
                _ => false,
            };
            Verdict {
                expected: expected.cloned(),
                given: given.cloned(),
                correct,
            }
        })
        .collect();
    QuizOutcome { verdicts }
}

/// A fill-in quiz laid out over the gold tokens of one sentence.
#[derive(Clone, Debug, Serialize)]
pub struct QuizSheet {
    pub sentence: String,
    pub issues: Vec<Issue>,
    pub slots: Vec<Slot>,
}

impl QuizSheet {
    /// Gold tokens from `build_correct_tokens`, substring fallback included.
    #[must_use]
    pub fn fill(sentence: &str, issues: &[Issue]) -> Self {
        let resolved = ensure_indexed_issues(sentence, issues, None);
        let gold = build_correct_tokens(sentence, issues);
        let spliced = splice_with_origin(sentence, &resolved);
        Self::layout(sentence, resolved, gold, spliced)
    }

    /// Gold tokens from splicing resolved issues only, matching `apply_issues`.
    #[must_use]
    pub fn fill_spliced(sentence: &str, issues: &[Issue]) -> Self {
        let resolved = ensure_indexed_issues(sentence, issues, None);
        let spliced = splice_with_origin(sentence, &resolved);
        let gold = spliced.iter().map(|t| t.text.clone()).collect();
        Self::layout(sentence, resolved, gold, spliced)
    }

    fn layout(
        sentence: &str,
        resolved: Vec<Issue>,
        gold: Vec<String>,
        spliced: Vec<SplicedToken>,
    ) -> Self {
        let lines_up = spliced.len() == gold.len()
            && spliced.iter().zip(&gold).all(|(s, g)| &s.text == g);
        let slots = if lines_up {
            spliced
                .into_iter()
                .map(|t| match t.issue {
                    Some(n) => Slot::Blank {
                        answer: t.text,
                        issue: Some(n),
                    },
                    None => Slot::Fixed { text: t.text },
                })
                .collect()
        } else {
            // Substring fallback rewrote the sentence; blank whatever moved.
            let src = tokenize(sentence);
            gold.into_iter()
                .enumerate()
                .map(|(i, text)| {
                    if src.get(i) == Some(&text) {
                        Slot::Fixed { text }
                    } else {
                        Slot::Blank {
                            answer: text,
                            issue: None,
                        }
                    }
                })
                .collect()
        };

        Self {
            sentence: sentence.to_string(),
            issues: resolved,
            slots,
        }
    }

    #[must_use]
    pub fn gold(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.text().to_string()).collect()
    }

    #[must_use]
    pub fn blanks(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|s| s.is_blank())
            .map(Slot::text)
            .collect()
    }

    /// Blank answers in a stable order unrelated to sentence position, for
    /// the drag tiles of a move quiz.
    #[must_use]
    pub fn tiles(&self) -> Vec<&str> {
        let mut tiles = self.blanks();
        tiles.sort_by_key(|t| t.to_lowercase());
        tiles
    }

    #[must_use]
    pub fn prompt(&self, mask: &str) -> String {
        self.slots
            .iter()
            .map(|s| match s {
                Slot::Fixed { text } => text.as_str(),
                Slot::Blank { .. } => mask,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn check_fill(&self, answers: &[String], options: CheckOptions) -> QuizOutcome {
        let expected: Vec<String> = self.blanks().into_iter().map(str::to_string).collect();
        check_arrangement(answers, &expected, options)
    }

    #[must_use]
    pub fn check_move(&self, arrangement: &[String], options: CheckOptions) -> QuizOutcome {
        check_arrangement(arrangement, &self.gold(), options)
    }
}
