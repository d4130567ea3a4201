//! Build progress reporting.
//!
//! Reports observable progress during `landreg build` so users can see which
//! extract is being decoded and how far the store write has got on large
//! registry files. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

use crate::models::SourceTag;

/// A single progress event for a build.
#[derive(Clone, Debug)]
pub enum BuildProgressEvent {
    /// Decoding one of the two extracts.
    Loading { source: SourceTag },
    /// Deriving titles, owners and links from `records` raw rows.
    Normalizing { records: u64 },
    /// Writing a relation: `n` rows out of `total` inserted.
    Writing {
        relation: &'static str,
        n: u64,
        total: u64,
    },
}

/// Reports build progress. Implementations write to stderr (human or JSON).
pub trait BuildProgressReporter: Send + Sync {
    fn report(&self, event: BuildProgressEvent);
}

/// Human-friendly progress on stderr: "build  writing owners  1,234 / 5,000 rows".
pub struct StderrProgress;

impl BuildProgressReporter for StderrProgress {
    fn report(&self, event: BuildProgressEvent) {
        let line = match &event {
            BuildProgressEvent::Loading { source } => {
                format!(
                    "build  loading {} extract ({})...\n",
                    source,
                    source.dataset_code()
                )
            }
            BuildProgressEvent::Normalizing { records } => {
                format!("build  normalizing {} records\n", format_number(*records))
            }
            BuildProgressEvent::Writing { relation, n, total } => format!(
                "build  writing {}  {} / {} rows\n",
                relation,
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BuildProgressReporter for JsonProgress {
    fn report(&self, event: BuildProgressEvent) {
        let obj = match &event {
            BuildProgressEvent::Loading { source } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "source": source.as_str()
            }),
            BuildProgressEvent::Normalizing { records } => serde_json::json!({
                "event": "progress",
                "phase": "normalizing",
                "records": records
            }),
            BuildProgressEvent::Writing { relation, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "writing",
                "relation": relation,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BuildProgressReporter for NoProgress {
    fn report(&self, _event: BuildProgressEvent) {}
}

/// Thousands-separated integer, e.g. `1,234,567`.
pub fn format_number(n: u64) -> String {
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

impl std::str::FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}'. Use off, human, or json.",
                other
            )),
        }
    }
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

    pub fn reporter(&self) -> Box<dyn BuildProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
