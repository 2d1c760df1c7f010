use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::history::DEFAULT_MAX_ENTRIES;
use crate::quiz::CheckOptions;

pub const CONFIG_FILENAME: &str = "grammar-align.toml";
pub const CONFIG_ENV: &str = "GRAMMAR_ALIGN_CONFIG";
pub const DEFAULT_HISTORY_FILENAME: &str = "grammar_history.json";
pub const DEFAULT_LOG_MAX_CHARS: usize = 160;

const DEFAULT_CONFIG_TOML: &str = r#"# grammar-align configuration

[history]
# Relative paths are resolved against this file's directory.
# path = "grammar_history.json"
# max_entries = 500

[quiz]
# case_sensitive = false
# ignore_punctuation = true

[log]
# verbose = true
# max_chars = 160
"#;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub quiz: QuizSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct HistorySection {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub max_entries: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizSection {
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub ignore_punctuation: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LogSection {
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

/// Config with defaults applied; relative paths are joined to the config dir.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub source: Option<PathBuf>,
    pub history_path: PathBuf,
    pub history_max_entries: usize,
    pub check: CheckOptions,
    pub verbose: bool,
    pub log_max_chars: usize,
}

impl AppConfig {
    pub fn resolve(&self, source: Option<&Path>) -> ResolvedConfig {
        let base_dir = source
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let history_path = match self.history.path.as_ref() {
            Some(p) if p.is_relative() => base_dir.join(p),
            Some(p) => p.clone(),
            None => base_dir.join(DEFAULT_HISTORY_FILENAME),
        };
        let defaults = CheckOptions::default();
        ResolvedConfig {
            source: source.map(Path::to_path_buf),
            history_path,
            history_max_entries: self.history.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
            check: CheckOptions {
                case_sensitive: self.quiz.case_sensitive.unwrap_or(defaults.case_sensitive),
                ignore_punctuation: self
                    .quiz
                    .ignore_punctuation
                    .unwrap_or(defaults.ignore_punctuation),
            },
            verbose: self.log.verbose.unwrap_or(true),
            log_max_chars: self.log.max_chars.unwrap_or(DEFAULT_LOG_MAX_CHARS),
        }
    }
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        if p.is_file() {
            return Some(p);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, CONFIG_FILENAME, 4) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

/// Explicit path must exist; otherwise search, falling back to defaults.
pub fn load_resolved(explicit: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    if let Some(p) = explicit {
        if !p.is_file() {
            return Err(anyhow!("config not found: {}", p.display()));
        }
        return Ok(load_config(p)?.resolve(Some(p)));
    }
    match find_default_config() {
        Some(p) => Ok(load_config(&p)?.resolve(Some(&p))),
        None => Ok(AppConfig::default().resolve(None)),
    }
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);
    if cfg_path.exists() && !force {
        return Err(anyhow!(
            "config already exists: {} (use --force to overwrite)",
            cfg_path.display()
        ));
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}
