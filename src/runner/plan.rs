//! Task planning: skip-vs-run decisions for one prompt batch.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PromptConfig, ProviderConfig};

use super::dispatch::SessionTracker;
use super::history::CompletedRunIndex;
use super::identity::RunIdentity;

pub const SKIP_SESSION: &str = "Already run in this session";
pub const SKIP_PRIOR: &str = "Already completed in a previous run";

/// Resolved parameters a worker needs to execute one run.
///
/// Built once during planning and consumed by exactly one worker; the
/// provider client itself is only constructed inside that worker.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub prompt_config: Arc<PromptConfig>,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub default_headers: Vec<(String, String)>,
    pub supports_system_prompt: bool,
}

/// What to do with one (prompt, provider, model) combination.
#[derive(Debug, Clone)]
pub enum TaskKind {
    Skip { reason: String },
    Run(RunPlan),
}

/// One planned unit of work. Immutable after planning.
#[derive(Debug, Clone)]
pub struct Task {
    pub identity: RunIdentity,
    pub kind: TaskKind,
}

impl Task {
    pub fn is_skip(&self) -> bool {
        matches!(self.kind, TaskKind::Skip { .. })
    }
}

/// Plan the tasks for one prompt across every provider and model.
///
/// Ordering follows configuration file order (providers, then their model
/// lists); it only affects console presentation. With `rerun_existing` set,
/// both dedup sets are ignored and every combination runs fresh.
#[allow(clippy::too_many_arguments)]
pub fn plan_prompt_batch(
    prompt_name: &str,
    prompt_config: &Arc<PromptConfig>,
    providers: &[(String, ProviderConfig)],
    api_keys: &[(String, String)],
    rerun_existing: bool,
    completed: &CompletedRunIndex,
    tracker: &SessionTracker,
) -> Vec<Task> {
    let mut tasks = Vec::new();

    for (provider_name, provider) in providers {
        let api_key = api_keys
            .iter()
            .find(|(n, _)| n == provider_name)
            .map(|(_, k)| k.as_str())
            .unwrap_or_default();

        for model in &provider.models {
            let identity = RunIdentity::new(prompt_name, provider_name, model);

            let kind = if !rerun_existing && tracker.contains(&identity) {
                TaskKind::Skip {
                    reason: SKIP_SESSION.to_string(),
                }
            } else if !rerun_existing && completed.contains(&identity) {
                TaskKind::Skip {
                    reason: SKIP_PRIOR.to_string(),
                }
            } else {
                TaskKind::Run(RunPlan {
                    prompt_config: prompt_config.clone(),
                    base_url: provider.base_url.clone(),
                    api_key: api_key.to_string(),
                    timeout: provider.timeout_duration(),
                    default_headers: provider.header_pairs(),
                    supports_system_prompt: provider.supports_system_prompt,
                })
            };

            tasks.push(Task { identity, kind });
        }
    }

    tasks
}

// =============================================================================
// TESTS
// =============================================================================
