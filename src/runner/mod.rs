//! Benchmark runner: planning, concurrent dispatch, aggregation, persistence.

pub mod dispatch;
pub mod history;
pub mod identity;
pub mod plan;
pub mod results;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use thiserror::Error;

use crate::config::{BenchConfig, ConfigError};
use crate::gateway::OpenAiCompatClient;
use crate::logging::RunLogger;
use crate::pipeline::{run_workflow, WorkflowContext, WorkflowOutput};

pub use dispatch::{dispatch_batch, SessionTracker, TaskWorker};
pub use history::CompletedRunIndex;
pub use identity::RunIdentity;
pub use plan::{plan_prompt_batch, RunPlan, Task, TaskKind, SKIP_PRIOR, SKIP_SESSION};
pub use results::{RunOutcome, RunRecord, Snapshot, Summary, WORKFLOW_DESCRIPTION};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Cannot write the final snapshot. Fatal by policy: the artifact is the
    /// whole point of the run.
    #[error("failed to write snapshot {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one `run()` invocation, for callers and tests.
#[derive(Debug)]
pub struct RunReport {
    pub snapshot_path: PathBuf,
    pub summary: Summary,
}

// =============================================================================
// Production worker
// =============================================================================

/// Worker that builds a provider client per task and drives the workflow.
pub struct GatewayWorker {
    logs_dir: PathBuf,
}

impl GatewayWorker {
    pub fn new(logs_dir: PathBuf) -> Self {
        Self { logs_dir }
    }
}

#[async_trait]
impl TaskWorker for GatewayWorker {
    async fn execute(&self, identity: &RunIdentity, plan: &RunPlan) -> Result<WorkflowOutput, String> {
        let logger = RunLogger::create(&self.logs_dir, &identity.provider, &identity.model);
        logger.info(&format!(
            "Initializing client for {}/{}",
            identity.provider, identity.model
        ));

        let client = OpenAiCompatClient::new(
            &identity.provider,
            &plan.base_url,
            &plan.api_key,
            plan.timeout,
            &plan.default_headers,
        )
        .map_err(|e| e.to_string())?;

        let ctx = WorkflowContext {
            prompt_name: &identity.prompt,
            model: &identity.model,
            supports_system_prompt: plan.supports_system_prompt,
            prompt_config: &plan.prompt_config,
        };

        run_workflow(&client, &logger, &ctx, &plan.prompt_config.test_prompt)
            .await
            .map_err(|e| {
                logger.error(&format!("Workflow error: {e}"));
                e.to_string()
            })
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Orchestrates benchmark execution across providers.
///
/// The session tracker and accumulated results live for the lifetime of the
/// runner, so a second `run()` on the same instance skips work already
/// dispatched; the completed-run index is rebuilt per invocation from disk.
pub struct BenchmarkRunner {
    config: BenchConfig,
    rerun_existing: bool,
    tracker: SessionTracker,
    records: Vec<RunRecord>,
}

impl BenchmarkRunner {
    pub fn new(config: BenchConfig, rerun_existing: bool) -> Self {
        Self {
            config,
            rerun_existing,
            tracker: SessionTracker::new(),
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// All records accumulated in this session so far.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Run the benchmark across every prompt, provider, and model.
    pub async fn run(&mut self) -> Result<RunReport, RunnerError> {
        let worker = Arc::new(GatewayWorker::new(self.config.logs_dir().to_path_buf()));
        self.run_with_worker(worker).await
    }

    /// Run with a caller-supplied worker. Seam for tests.
    pub async fn run_with_worker<W: TaskWorker + 'static>(
        &mut self,
        worker: Arc<W>,
    ) -> Result<RunReport, RunnerError> {
        // Missing API keys abort before any task runs.
        let mut api_keys = Vec::new();
        for (name, provider) in self.config.providers() {
            let key = self.config.api_key(&provider.api_key_env)?;
            api_keys.push((name.clone(), key));
        }

        let completed = if self.rerun_existing {
            CompletedRunIndex::empty()
        } else {
            CompletedRunIndex::scan(self.config.results_dir())
        };

        println!("{}", "=".repeat(70));
        println!("LLM BENCHMARK: {WORKFLOW_DESCRIPTION}");
        println!("{}", "=".repeat(70));
        println!(
            "\nAvailable prompt files: {}",
            self.config.available_prompts().join(", ")
        );
        if !completed.is_empty() {
            println!("Previously completed runs on disk: {}", completed.len());
        }

        let prompt_names: Vec<String> = self.config.available_prompts().to_vec();
        for prompt_name in prompt_names {
            let Some(prompt_config) = self.config.prompt(&prompt_name)? else {
                tracing::warn!(prompt = %prompt_name, "prompt file disappeared, skipping");
                continue;
            };

            println!("\n{}", "=".repeat(70));
            println!("PROMPT: {prompt_name}");
            println!("{}", "=".repeat(70));
            println!("\nSystem Prompt: {}", prompt_config.system_prompt);
            println!("\nTest Problem: {}", prompt_config.test_prompt);
            println!("\nWorkflow: {WORKFLOW_DESCRIPTION}");

            let tasks = plan_prompt_batch(
                &prompt_name,
                &prompt_config,
                self.config.providers(),
                &api_keys,
                self.rerun_existing,
                &completed,
                &self.tracker,
            );

            let batch = dispatch_batch(
                worker.clone(),
                tasks,
                &self.tracker,
                self.rerun_existing,
                self.config.max_workers(),
            )
            .await;

            for record in &batch {
                print_record_line(record);
            }
            self.records.extend(batch);
        }

        let snapshot_path = self.save_snapshot()?;
        let summary = Summary::compute(&self.records);
        self.print_summary(&summary);

        Ok(RunReport {
            snapshot_path,
            summary,
        })
    }

    /// Write the timestamped snapshot. Happens exactly once per invocation,
    /// after all batches; a write failure is fatal.
    fn save_snapshot(&self) -> Result<PathBuf, RunnerError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = self
            .config
            .results_dir()
            .join(format!("benchmark_results_{timestamp}.json"));

        let snapshot = Snapshot::build(timestamp, self.records.clone());
        let body = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, body).map_err(|source| RunnerError::Persist {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn print_summary(&self, summary: &Summary) {
        println!("\n{}", "=".repeat(70));
        println!("BENCHMARK SUMMARY");
        println!("{}", "=".repeat(70));
        println!("Total Prompts Tested: {}", summary.total_prompts);
        println!("Total Models Tested: {}", summary.total_models);
        println!("Successful: {}", summary.successful);
        if summary.skipped > 0 {
            println!("Skipped: {}", summary.skipped);
        }
        println!("Failed: {}", summary.failed);
        println!("Verified Correct: {}", summary.verified_correct);
        println!("Success Rate: {}", summary.success_rate);
        println!("Accuracy Rate: {}", summary.accuracy_rate);
        println!("\nResults saved to: {}", self.config.results_dir().display());
        println!("Logs saved to: {}", self.config.logs_dir().display());
        println!("{}", "=".repeat(70));
    }
}

fn print_record_line(record: &RunRecord) {
    let tag = format!("{}/{}", record.provider, record.model);
    match &record.outcome {
        RunOutcome::Success { response } => {
            println!("  ✓ {tag}: {}", response.analysis.problem_type);
            println!("    Answer: {}", truncate(&response.solution.answer, 80));
            println!("    Verified: {}", response.verification.is_correct);
        }
        RunOutcome::Skipped { reason } => {
            println!("  → {tag}: Skipped: {reason}");
        }
        RunOutcome::Error { error } => {
            println!("  ✗ {tag}: Error: {error}");
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max).collect();
        t.push_str("...");
        t
    }
}
