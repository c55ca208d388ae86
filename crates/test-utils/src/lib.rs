pub mod builders;
pub mod jobs;

use std::sync::{Mutex, Once};

use jobgraph::Logger;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Severity of a line captured by [`RecordingLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Error,
    Warn,
    Info,
}

/// A [`Logger`] that keeps every line so tests can assert on it.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(LogKind, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines_of(LogKind::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines_of(LogKind::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.lines_of(LogKind::Info)
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    fn lines_of(&self, kind: LogKind) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn push(&self, kind: LogKind, message: &str) {
        self.lines.lock().unwrap().push((kind, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.push(LogKind::Error, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        self.push(LogKind::Warn, message);
    }

    fn info(&self, message: &str) {
        self.push(LogKind::Info, message);
    }
}
