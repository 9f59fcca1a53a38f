//! Sync progress reporting for the CLI.
//!
//! Progress goes to **stderr** so stdout stays parseable for scripts. The
//! event type and reporter trait live in the core crate; this module only
//! renders them.

use std::io::Write;

use bible_sync_core::progress::{NoProgress, SyncProgressEvent, SyncProgressReporter};

/// Human-friendly progress: "sync rvr  GEN  1,533 / 31,102 chapters (4%)".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = render_human(&event);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

fn render_human(event: &SyncProgressEvent) -> String {
    match event {
        SyncProgressEvent::Cataloging { version } => {
            format!("sync {}  reading catalog...\n", version)
        }
        SyncProgressEvent::Progress {
            version,
            book,
            done,
            total,
            percent,
        } => format!(
            "sync {}  {}  {} / {} chapters ({}%)\n",
            version,
            book.as_deref().unwrap_or("-"),
            format_number(*done),
            format_number(*total),
            percent
        ),
    }
}

/// Machine-readable progress: one JSON object per line.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        if let Ok(line) = serde_json::to_string(&render_json(&event)) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

fn render_json(event: &SyncProgressEvent) -> serde_json::Value {
    match event {
        SyncProgressEvent::Cataloging { version } => serde_json::json!({
            "event": "progress",
            "version": version,
            "phase": "cataloging"
        }),
        SyncProgressEvent::Progress {
            version,
            book,
            done,
            total,
            percent,
        } => serde_json::json!({
            "event": "progress",
            "version": version,
            "phase": "downloading",
            "book": book,
            "done": done,
            "total": total,
            "percent": percent
        }),
    }
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for `bsync sync`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
