use std::io::{self, Write};
use std::time::Instant;

/// Timestamped stderr lines, relative to when the log was created.
pub struct ConsoleLog {
    enabled: bool,
    max_chars: usize,
    t0: Instant,
}

impl ConsoleLog {
    pub fn new(enabled: bool, max_chars: usize) -> Self {
        Self {
            enabled,
            max_chars,
            t0: Instant::now(),
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.enabled {
            self.write("", msg.as_ref());
        }
    }

    /// Printed even when the log is disabled.
    pub fn warn(&self, msg: impl AsRef<str>) {
        self.write("WARN ", msg.as_ref());
    }

    pub fn progress(&self, label: &str, current: usize, total: usize) {
        if !self.enabled {
            return;
        }
        let total = total.max(1);
        let current = current.min(total);
        let pct = (current as f64 / total as f64) * 100.0;
        self.write("", &format!("{label} {current}/{total} ({pct:5.1}%)"));
    }

    /// Shortens sentences quoted in log lines.
    #[must_use]
    pub fn clip<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        clip_chars(text, self.max_chars)
    }

    fn write(&self, level: &str, msg: &str) {
        let ts = fmt_elapsed(self.t0.elapsed().as_secs_f64());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{ts}] {level}{msg}");
    }
}

fn clip_chars(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]).into(),
        None => text.into(),
    }
}

fn fmt_elapsed(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
