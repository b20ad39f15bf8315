//! Per-run log files.
//!
//! Each benchmark task gets its own logger writing to
//! `<logs_dir>/<provider>_<model>.log`. The handle is passed explicitly into
//! the workflow invocation; there is no process-wide logger registry. Logging
//! failures must never fail a run, so writes fall back to a `tracing` warning.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;

/// Log file handle for one (provider, model) run.
pub struct RunLogger {
    name: String,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl RunLogger {
    /// Open (truncating) the log file for a provider/model pair.
    ///
    /// If the file cannot be created the logger degrades to tracing-only.
    pub fn create(logs_dir: &Path, provider: &str, model: &str) -> Self {
        let name = format!("{provider}.{model}");
        let file_name = format!("{provider}_{}.log", sanitize_model_name(model));
        let path = logs_dir.join(file_name);

        let writer = match File::create(&path) {
            Ok(file) => Some(Mutex::new(BufWriter::new(file))),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to create run log file");
                None
            }
        };

        Self { name, writer }
    }

    /// Logger that discards everything. Used in tests.
    pub fn sink() -> Self {
        Self {
            name: "sink".to_string(),
            writer: None,
        }
    }

    pub fn info(&self, message: &str) {
        self.write_line("INFO", message);
    }

    pub fn warn(&self, message: &str) {
        self.write_line("WARN", message);
    }

    pub fn error(&self, message: &str) {
        self.write_line("ERROR", message);
    }

    fn write_line(&self, level: &str, message: &str) {
        let Some(writer) = &self.writer else {
            return;
        };
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("{timestamp} - {} - {level} - {message}\n", self.name);

        let mut guard = match writer.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = guard.write_all(line.as_bytes()).and_then(|_| guard.flush()) {
            tracing::warn!(logger = %self.name, error = %e, "run log write failed");
        }
    }
}

/// Model IDs contain `/` and `:`; both are invalid in file names.
fn sanitize_model_name(model: &str) -> String {
    model.replace(['/', ':'], "_")
}
