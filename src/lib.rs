#![forbid(unsafe_code)]

//! # triad-bench
//!
//! A benchmarking harness that drives a fixed three-stage reasoning pipeline
//! (analyze, solve, verify) against multiple LLM providers and models.
//!
//! Prompt files parametrize the system prompt, the test problem, and the
//! per-stage templates. The runner deduplicates work across the current
//! session and previously persisted result snapshots, fans the remaining
//! (prompt, provider, model) combinations out over a bounded worker pool, and
//! writes one timestamped JSON snapshot with per-run results and summary
//! statistics at the end.

pub mod config;
pub mod gateway;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod runner;

pub use config::{BenchConfig, ConfigError, PromptConfig, ProviderConfig};
pub use gateway::{ChatGateway, ChatRequest, ChatResponse, OpenAiCompatClient, ProviderError};
pub use pipeline::{run_workflow, StageKind, WorkflowContext, WorkflowError, WorkflowOutput};
pub use runner::{
    dispatch_batch, plan_prompt_batch, BenchmarkRunner, CompletedRunIndex, GatewayWorker,
    RunIdentity, RunOutcome, RunRecord, RunnerError, SessionTracker, Snapshot, Summary, Task,
    TaskKind, TaskWorker,
};
