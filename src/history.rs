use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::correct::build_correct_tokens;
use crate::infer::infer_issue;
use crate::issue::Issue;
use crate::tokenize::join_tokens;

pub const HISTORY_SCHEMA: &str = "grammar-history/1";
pub const DEFAULT_MAX_ENTRIES: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Grammar,
    Expression,
}

impl HistoryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Grammar => "grammar",
            HistoryKind::Expression => "expression",
        }
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grammar" => Ok(HistoryKind::Grammar),
            "expression" => Ok(HistoryKind::Expression),
            other => Err(format!("unknown history kind: {other} (expected grammar or expression)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: String,
    pub kind: HistoryKind,
    pub error: String,
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub sentence: String,
    #[serde(default)]
    pub corrected: String,
    pub count: u64,
    pub last_seen: u64,
}

#[derive(Clone, Debug)]
pub enum RecordEvent {
    Added { key: String },
    Repeated { key: String, count: u64 },
}

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    schema: String,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

/// Aggregated mistakes, keyed by what was wrong and what fixed it.
#[derive(Clone, Debug, Default)]
pub struct GrammarHistory {
    entries: Vec<HistoryEntry>,
}

#[must_use]
pub fn entry_key(kind: HistoryKind, error: &str, suggestion: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(error.trim().to_lowercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(suggestion.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl GrammarHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read history: {}", path.display()))?;
        let file: HistoryFile = serde_json::from_str(&text)
            .with_context(|| format!("parse history json: {}", path.display()))?;
        if file.schema != HISTORY_SCHEMA {
            return Err(anyhow!(
                "unsupported history schema: {} (expected {HISTORY_SCHEMA})",
                file.schema
            ));
        }
        Ok(Self {
            entries: file.entries,
        })
    }

    /// Writes pretty JSON, keeping at most `max_entries` most recent entries.
    pub fn save(&mut self, path: &Path, max_entries: usize) -> anyhow::Result<()> {
        self.prune(max_entries);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create history dir: {}", parent.display()))?;
        }
        let file = HistoryFile {
            schema: HISTORY_SCHEMA.to_string(),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file).context("serialize history")?;
        std::fs::write(path, json).with_context(|| format!("write history: {}", path.display()))?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn record(&mut self, kind: HistoryKind, sentence: &str, issue: &Issue, now: u64) -> RecordEvent {
        let key = entry_key(kind, &issue.error, &issue.suggestion);
        if let Some(existing) = self.entries.iter_mut().find(|e| e.key == key) {
            existing.count = existing.count.saturating_add(1);
            existing.last_seen = existing.last_seen.max(now);
            if !issue.explanation.trim().is_empty() {
                existing.explanation = issue.explanation.trim().to_string();
            }
            return RecordEvent::Repeated {
                key,
                count: existing.count,
            };
        }
        self.entries.push(HistoryEntry {
            key: key.clone(),
            kind,
            error: issue.error.trim().to_string(),
            suggestion: issue.suggestion.trim().to_string(),
            explanation: issue.explanation.trim().to_string(),
            sentence: sentence.to_string(),
            corrected: join_tokens(&build_correct_tokens(sentence, std::slice::from_ref(issue))),
            count: 1,
            last_seen: now,
        });
        RecordEvent::Added { key }
    }

    /// Logs a wrong multiple-choice pick. Identical answers record nothing.
    pub fn record_wrong_choice(
        &mut self,
        kind: HistoryKind,
        wrong: &str,
        correct: &str,
        explanation: &str,
        now: u64,
    ) -> Option<RecordEvent> {
        let span = infer_issue(wrong, correct);
        if span.is_empty() {
            return None;
        }
        let issue = span.into_issue(explanation);
        Some(self.record(kind, wrong, &issue, now))
    }

    /// Most frequent entries first; ties go to the most recent.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<&HistoryEntry> {
        let mut items: Vec<&HistoryEntry> = self.entries.iter().collect();
        items.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_seen.cmp(&a.last_seen))
        });
        items.truncate(n);
        items
    }

    fn prune(&mut self, max_entries: usize) {
        if self.entries.len() <= max_entries {
            return;
        }
        self.entries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        self.entries.truncate(max_entries);
    }
}
