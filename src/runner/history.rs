//! Completed-run index built from previously persisted snapshots.

use std::collections::HashSet;
use std::path::Path;

use crate::runner::identity::RunIdentity;

/// Prefix/suffix of persisted snapshot file names.
pub const SNAPSHOT_PREFIX: &str = "benchmark_results_";
pub const SNAPSHOT_SUFFIX: &str = ".json";

/// Canonical keys of every successfully-completed run found on disk.
///
/// Built once at startup and read-only afterwards. A run completed in the
/// current session is tracked by the session tracker, never merged back here.
#[derive(Debug, Default)]
pub struct CompletedRunIndex {
    keys: HashSet<String>,
}

impl CompletedRunIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan a results directory for prior snapshots.
    ///
    /// Best-effort by policy: malformed or unreadable files are skipped with
    /// a warning, because re-running a job is cheaper than refusing to start.
    /// An absent directory yields an empty index.
    pub fn scan(results_dir: &Path) -> Self {
        let mut keys = HashSet::new();

        let entries = match std::fs::read_dir(results_dir) {
            Ok(entries) => entries,
            Err(_) => return Self { keys },
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(SNAPSHOT_PREFIX) || !name.ends_with(SNAPSHOT_SUFFIX) {
                continue;
            }

            match std::fs::read_to_string(&path) {
                Ok(raw) => {
                    let before = keys.len();
                    if collect_successes(&raw, &mut keys).is_none() {
                        tracing::warn!(path = %path.display(), "skipping malformed snapshot");
                    } else {
                        tracing::debug!(
                            path = %path.display(),
                            added = keys.len() - before,
                            "indexed prior snapshot"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
                }
            }
        }

        Self { keys }
    }

    pub fn contains(&self, identity: &RunIdentity) -> bool {
        self.keys.contains(&identity.canonical_key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Canonical keys in the index, for tests and diagnostics.
    pub fn keys(&self) -> &HashSet<String> {
        &self.keys
    }
}

/// Pull success identities out of one snapshot body.
///
/// Returns `None` when the body is not a JSON object with a `results` array.
/// Individual entries missing fields are skipped; a partially-written
/// snapshot still contributes what it can.
fn collect_successes(raw: &str, keys: &mut HashSet<String>) -> Option<()> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let results = value.get("results")?.as_array()?;

    for entry in results {
        if entry.get("status").and_then(|s| s.as_str()) != Some("success") {
            continue;
        }
        let (Some(prompt), Some(provider), Some(model)) = (
            entry.get("prompt").and_then(|v| v.as_str()),
            entry.get("provider").and_then(|v| v.as_str()),
            entry.get("model").and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        keys.insert(RunIdentity::new(prompt, provider, model).canonical_key());
    }
    Some(())
}

// =============================================================================
// TESTS
// =============================================================================
