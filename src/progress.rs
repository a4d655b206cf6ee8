//! Progress reporting for a collection run.
//!
//! Reports what is being parsed, which documents were skipped, and when
//! ranking starts and finishes. Progress is emitted on **stderr** so stdout
//! carries only the final result line.

use std::io::Write;
use std::path::PathBuf;

/// A single progress event.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// Extracting document `n` of `total`.
    Parsing {
        document: String,
        n: u64,
        total: u64,
    },
    /// Document listed in the request but not usable.
    Skipped { document: String, reason: String },
    /// Scoring and selection started.
    Ranking {
        taxonomy: String,
        passages: u64,
        categories: u64,
    },
    Done { output: PathBuf },
}

/// Reports run progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "parsing  3 / 7  South of France - Cuisine.pdf".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Parsing { document, n, total } => format!(
                "parsing  {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                document
            ),
            ProgressEvent::Skipped { document, reason } => {
                format!("skipped  {}  ({})\n", document, reason)
            }
            ProgressEvent::Ranking {
                taxonomy,
                passages,
                categories,
            } => format!(
                "ranking  {} passages into {} categories ({})\n",
                format_number(*passages),
                categories,
                taxonomy
            ),
            ProgressEvent::Done { output } => format!("done  {}\n", output.display()),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn event_json(event: &ProgressEvent) -> serde_json::Value {
    match event {
        ProgressEvent::Parsing { document, n, total } => serde_json::json!({
            "event": "progress",
            "phase": "parsing",
            "document": document,
            "n": n,
            "total": total
        }),
        ProgressEvent::Skipped { document, reason } => serde_json::json!({
            "event": "skipped",
            "document": document,
            "reason": reason
        }),
        ProgressEvent::Ranking {
            taxonomy,
            passages,
            categories,
        } => serde_json::json!({
            "event": "progress",
            "phase": "ranking",
            "taxonomy": taxonomy,
            "passages": passages,
            "categories": categories
        }),
        ProgressEvent::Done { output } => serde_json::json!({
            "event": "done",
            "output": output.display().to_string()
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
