use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::correct::{apply_issues, build_correct_tokens};
use crate::issue::Issue;
use crate::quiz::QuizSheet;
use crate::resolve::ensure_indexed_issues;
use crate::tokenize::join_tokens;

/// One chat message as returned by the grammar-check API.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub sentence: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub corrected: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageBatch {
    Many(Vec<Message>),
    One(Message),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportOptions {
    /// Splice resolved issues only; skip the substring fallback.
    pub apply_only: bool,
    pub with_quiz: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizView {
    pub prompt: String,
    pub blanks: Vec<String>,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageReport {
    pub sentence: String,
    pub issues: Vec<Issue>,
    pub gold: Vec<String>,
    pub corrected: String,
    pub unresolved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizView>,
}

pub const BLANK_MASK: &str = "___";

/// Reads a single message object or an array of messages.
pub fn read_messages(path: &Path) -> anyhow::Result<Vec<Message>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read input: {}", path.display()))?;
    parse_messages(&text).with_context(|| format!("parse input json: {}", path.display()))
}

pub fn parse_messages(text: &str) -> anyhow::Result<Vec<Message>> {
    let batch: MessageBatch = serde_json::from_str(text)?;
    Ok(match batch {
        MessageBatch::Many(v) => v,
        MessageBatch::One(m) => vec![m],
    })
}

#[must_use]
pub fn build_report(msg: &Message, options: ReportOptions) -> MessageReport {
    let issues = ensure_indexed_issues(&msg.sentence, &msg.issues, msg.corrected.as_deref());
    let gold = if options.apply_only {
        apply_issues(&msg.sentence, &issues)
    } else {
        build_correct_tokens(&msg.sentence, &issues)
    };
    let unresolved = issues.iter().filter(|i| !i.is_indexed()).count();
    let quiz = options.with_quiz.then(|| {
        let sheet = if options.apply_only {
            QuizSheet::fill_spliced(&msg.sentence, &issues)
        } else {
            QuizSheet::fill(&msg.sentence, &issues)
        };
        QuizView {
            prompt: sheet.prompt(BLANK_MASK),
            blanks: sheet.blanks().into_iter().map(str::to_string).collect(),
            tiles: sheet.tiles().into_iter().map(str::to_string).collect(),
        }
    });
    MessageReport {
        sentence: msg.sentence.clone(),
        corrected: join_tokens(&gold),
        issues,
        gold,
        unresolved,
        quiz,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_report, parse_messages, ReportOptions};

    #[test]
    fn accepts_single_message_or_array() {
        let one = parse_messages(r#"{"sentence":"I like","issues":[]}"#).expect("parse one");
        assert_eq!(one.len(), 1);
        let many = parse_messages(r#"[{"sentence":"a"},{"sentence":"b","corrected":"b c"}]"#)
            .expect("parse many");
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].corrected.as_deref(), Some("b c"));
        assert!(parse_messages(r#"{"issues":[]}"#).is_err());
    }

    #[test]
    fn report_uses_corrected_for_insertions() {
        let msgs = parse_messages(
            r#"{"sentence":"I go school","corrected":"I go to school",
                "issues":[{"error":"","suggestion":"to","explanation":"preposition"}]}"#,
        )
        .expect("parse");
        let report = build_report(
            &msgs[0],
            ReportOptions {
                apply_only: false,
                with_quiz: true,
            },
        );
        assert_eq!(report.issues[0].index, Some(2));
        assert_eq!(report.corrected, "I go to school");
        assert_eq!(report.unresolved, 0);
        let quiz = report.quiz.expect("quiz view");
        assert_eq!(quiz.prompt, "I go ___ school");
        assert_eq!(quiz.blanks, vec!["to"]);
    }

    #[test]
    fn apply_only_ignores_unresolved_replacements() {
        let msgs = parse_messages(
            r#"{"sentence":"He forgoed it","issues":[{"error":"goed","suggestion":"went"}]}"#,
        )
        .expect("parse");
        let spliced = build_report(&msgs[0], ReportOptions { apply_only: true, with_quiz: false });
        assert_eq!(spliced.corrected, "He forgoed it");
        assert_eq!(spliced.unresolved, 1);
        assert!(spliced.quiz.is_none());

        let fallback = build_report(&msgs[0], ReportOptions::default());
        assert_eq!(fallback.corrected, "He forwent it");
    }

    #[test]
    fn quiz_follows_the_same_gold_as_the_report() {
        let msgs = parse_messages(
            r#"{"sentence":"He forgoed it","issues":[{"error":"goed","suggestion":"went"}]}"#,
        )
        .expect("parse");
        for apply_only in [false, true] {
            let report = build_report(&msgs[0], ReportOptions { apply_only, with_quiz: true });
            let quiz = report.quiz.expect("quiz view");
            let filled = quiz.prompt.replacen("___", quiz.blanks.first().map_or("", String::as_str), 1);
            assert_eq!(filled, report.corrected);
        }
    }
}
