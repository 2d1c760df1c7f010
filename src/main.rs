use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use grammar_align::config::{init_default_config, load_resolved};
use grammar_align::history::{unix_now, GrammarHistory, HistoryKind, RecordEvent};
use grammar_align::infer::infer_issue;
use grammar_align::log::ConsoleLog;
use grammar_align::report::{build_report, read_messages, MessageReport, ReportOptions};

#[derive(Parser, Debug)]
#[command(name = "grammar-align")]
#[command(about = "Locate grammar issues in a sentence and build quiz answers", long_about = None)]
struct Args {
    /// Write a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory for --init-config (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config with --init-config
    #[arg(long)]
    force: bool,

    /// Config file path (default: $GRAMMAR_ALIGN_CONFIG or grammar-align.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input JSON: one message `{sentence, issues, corrected?}` or an array of them
    #[arg(value_name = "JSON")]
    input: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "JSON")]
    output: Option<PathBuf>,

    /// Splice resolved issues only (no substring fallback)
    #[arg(long)]
    apply_only: bool,

    /// Include fill-in quiz prompt, blanks and tiles in the report
    #[arg(long)]
    quiz: bool,

    /// Record every message's issues in the history file
    #[arg(long)]
    record_history: bool,

    /// History kind for recorded entries: grammar or expression
    #[arg(long, value_name = "KIND", default_value = "grammar")]
    kind: HistoryKind,

    /// Wrong multiple-choice answer to infer an issue from
    #[arg(long, value_name = "TEXT", requires = "infer_correct")]
    infer_wrong: Option<String>,

    /// Correct answer paired with --infer-wrong
    #[arg(long, value_name = "TEXT", requires = "infer_wrong")]
    infer_correct: Option<String>,

    /// Explanation stored with an inferred issue when recording history
    #[arg(long, value_name = "TEXT", default_value = "")]
    explanation: String,

    /// Print the N most frequent history entries, then exit
    #[arg(long, value_name = "N")]
    history_top: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let cfg = load_resolved(args.config.as_deref()).context("load config")?;
    let log = ConsoleLog::new(cfg.verbose && !args.quiet, cfg.log_max_chars);
    if let Some(src) = cfg.source.as_ref() {
        log.info(format!("config: {}", src.display()));
    }

    if let Some(n) = args.history_top {
        let history = GrammarHistory::load(&cfg.history_path)?;
        log.info(format!(
            "history: {} entries, {} mistakes ({})",
            history.len(),
            history.total_count(),
            cfg.history_path.display()
        ));
        let top = history.top(n);
        let json = serde_json::to_string_pretty(&top).context("serialize history")?;
        println!("{json}");
        return Ok(());
    }

    if let (Some(wrong), Some(correct)) = (args.infer_wrong.as_ref(), args.infer_correct.as_ref()) {
        let span = infer_issue(wrong, correct);
        if args.record_history {
            let mut history = GrammarHistory::load(&cfg.history_path)?;
            match history.record_wrong_choice(args.kind, wrong, correct, &args.explanation, unix_now()) {
                Some(ev) => log_record(&log, &ev, &span.error, &span.suggestion),
                None => log.info("answers are identical; nothing recorded"),
            }
            history.save(&cfg.history_path, cfg.history_max_entries)?;
        }
        let json = serde_json::to_string_pretty(&span).context("serialize span")?;
        println!("{json}");
        return Ok(());
    }

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            eprintln!(
                "\n\nUSAGE:\n  grammar-align <messages.json>\n  grammar-align --infer-wrong \"I has\" --infer-correct \"I have\"\n"
            );
            return Ok(());
        }
    };

    let messages = read_messages(&input)?;
    log.info(format!("{} message(s) from {}", messages.len(), input.display()));

    let options = ReportOptions {
        apply_only: args.apply_only,
        with_quiz: args.quiz,
    };
    let mut history = if args.record_history {
        Some(GrammarHistory::load(&cfg.history_path)?)
    } else {
        None
    };

    let total = messages.len();
    let mut reports: Vec<MessageReport> = Vec::with_capacity(total);
    for (n, msg) in messages.iter().enumerate() {
        let report = build_report(msg, options);
        if report.unresolved > 0 {
            log.warn(format!(
                "{} issue(s) could not be located in: {}",
                report.unresolved,
                log.clip(&msg.sentence)
            ));
        }
        if let Some(h) = history.as_mut() {
            let now = unix_now();
            for issue in &report.issues {
                let ev = h.record(args.kind, &msg.sentence, issue, now);
                log_record(&log, &ev, &issue.error, &issue.suggestion);
            }
        }
        reports.push(report);
        log.progress("messages", n + 1, total);
    }

    if let Some(mut h) = history {
        h.save(&cfg.history_path, cfg.history_max_entries)?;
        log.info(format!(
            "history saved: {} entries ({})",
            h.len(),
            cfg.history_path.display()
        ));
    }

    let json = serde_json::to_string_pretty(&reports).context("serialize report")?;
    match args.output {
        Some(out) => {
            std::fs::write(&out, json).with_context(|| format!("write report: {}", out.display()))?;
            log.info(format!("wrote report: {}", out.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn log_record(log: &ConsoleLog, ev: &RecordEvent, error: &str, suggestion: &str) {
    match ev {
        RecordEvent::Added { .. } => log.info(format!("history +: {error:?} => {suggestion:?}")),
        RecordEvent::Repeated { count, .. } => {
            log.info(format!("history x{count}: {error:?} => {suggestion:?}"))
        }
    }
}
