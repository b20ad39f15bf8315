//! Concurrent dispatch of one prompt batch over a bounded worker pool.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::pipeline::WorkflowOutput;

use super::identity::RunIdentity;
use super::plan::{RunPlan, Task, TaskKind, SKIP_SESSION};
use super::results::{RunOutcome, RunRecord};

// =============================================================================
// Session tracker
// =============================================================================

/// Canonical keys of runs already dispatched in this session.
///
/// Marked before submission: at-most-one-submission, not
/// at-most-one-completion. Entries are never removed.
#[derive(Debug, Default)]
pub struct SessionTracker {
    keys: Mutex<HashSet<String>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &RunIdentity) -> bool {
        self.keys
            .lock()
            .expect("session tracker poisoned")
            .contains(&identity.canonical_key())
    }

    /// Mark an identity as dispatched. Returns false if it was already marked.
    pub fn mark(&self, identity: &RunIdentity) -> bool {
        self.keys
            .lock()
            .expect("session tracker poisoned")
            .insert(identity.canonical_key())
    }

    pub fn len(&self) -> usize {
        self.keys.lock().expect("session tracker poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Worker seam
// =============================================================================

/// Executes one runnable task. The production implementation constructs the
/// provider client and drives the three-stage workflow; tests substitute
/// stubs. Implementations report per-task faults as `Err(message)`.
#[async_trait]
pub trait TaskWorker: Send + Sync {
    async fn execute(&self, identity: &RunIdentity, plan: &RunPlan) -> Result<WorkflowOutput, String>;
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Execute one prompt batch.
///
/// Skipped tasks produce records synchronously in input order. Runnable tasks
/// are marked in the session tracker before submission, then fanned out over
/// a pool bounded by `max_workers` (or the batch size when unset). Results
/// are collected in completion order; no ordering between concurrent
/// completions is guaranteed. A panicking worker is converted to an error
/// record so one failing task cannot take down its batch.
///
/// With `rerun_existing` set the tracker is still marked but never consulted:
/// an already-marked identity runs again instead of skipping.
pub async fn dispatch_batch<W: TaskWorker + 'static>(
    worker: Arc<W>,
    tasks: Vec<Task>,
    tracker: &SessionTracker,
    rerun_existing: bool,
    max_workers: Option<usize>,
) -> Vec<RunRecord> {
    let mut records = Vec::with_capacity(tasks.len());
    let mut runnable: Vec<(RunIdentity, RunPlan)> = Vec::new();

    for task in tasks {
        match task.kind {
            TaskKind::Skip { reason } => {
                records.push(RunRecord::new(task.identity, RunOutcome::Skipped { reason }));
            }
            TaskKind::Run(plan) => {
                // Mark before submission. A false return means another
                // planning pass already submitted this identity.
                if tracker.mark(&task.identity) || rerun_existing {
                    runnable.push((task.identity, plan));
                } else {
                    records.push(RunRecord::new(
                        task.identity,
                        RunOutcome::Skipped {
                            reason: SKIP_SESSION.to_string(),
                        },
                    ));
                }
            }
        }
    }

    if runnable.is_empty() {
        return records;
    }

    let pool = max_workers
        .unwrap_or(runnable.len())
        .clamp(1, runnable.len());

    let completed = stream::iter(runnable.into_iter().map(|(identity, plan)| {
        let worker = worker.clone();
        async move {
            // Spawned so a panic surfaces as a JoinError instead of
            // unwinding through the batch.
            let task_identity = identity.clone();
            let handle =
                tokio::spawn(async move { worker.execute(&task_identity, &plan).await });

            let outcome = match handle.await {
                Ok(Ok(response)) => RunOutcome::Success { response },
                Ok(Err(message)) => RunOutcome::Error { error: message },
                Err(join_error) => RunOutcome::Error {
                    error: format!("worker fault: {join_error}"),
                },
            };
            RunRecord::new(identity, outcome)
        }
    }))
    .buffer_unordered(pool)
    .collect::<Vec<_>>()
    .await;

    records.extend(completed);
    records
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptConfig;
    use crate::pipeline::{ProblemAnalysis, Solution, Verification};
    use std::collections::HashSet as StdHashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn dummy_output() -> WorkflowOutput {
        WorkflowOutput {
            analysis: ProblemAnalysis {
                problem_type: "general".into(),
                key_constraints: vec![],
                approach: "direct".into(),
            },
            solution: Solution {
                answer: "ok".into(),
                reasoning_steps: vec![],
                confidence: "high".into(),
            },
            verification: Verification {
                is_correct: true,
                issues_found: vec![],
                final_answer: "ok".into(),
            },
        }
    }

    fn run_task(model: &str) -> Task {
        Task {
            identity: RunIdentity::new("p", "prov", model),
            kind: TaskKind::Run(RunPlan {
                prompt_config: Arc::new(PromptConfig::default()),
                base_url: "http://unused.example".into(),
                api_key: "k".into(),
                timeout: Duration::from_secs(1),
                default_headers: vec![],
                supports_system_prompt: true,
            }),
        }
    }

    /// Worker tracking call counts and peak concurrency.
    struct CountingWorker {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingWorker {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskWorker for CountingWorker {
        async fn execute(
            &self,
            _identity: &RunIdentity,
            _plan: &RunPlan,
        ) -> Result<WorkflowOutput, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(dummy_output())
        }
    }

    #[tokio::test]
    async fn five_tasks_pool_of_two_complete_exactly_once() {
        let worker = Arc::new(CountingWorker::new());
        let tasks: Vec<Task> = (0..5).map(|i| run_task(&format!("m{i}"))).collect();
        let tracker = SessionTracker::new();

        let records = dispatch_batch(worker.clone(), tasks, &tracker, false, Some(2)).await;

        assert_eq!(records.len(), 5);
        assert_eq!(worker.calls.load(Ordering::SeqCst), 5);
        assert!(worker.peak.load(Ordering::SeqCst) <= 2);

        let identities: StdHashSet<String> = records
            .iter()
            .map(|r| r.identity().canonical_key())
            .collect();
        assert_eq!(identities.len(), 5, "no identity may appear twice");
        assert!(records.iter().all(|r| r.is_success()));
        assert_eq!(tracker.len(), 5);
    }

    struct FailingWorker;

    #[async_trait]
    impl TaskWorker for FailingWorker {
        async fn execute(
            &self,
            identity: &RunIdentity,
            _plan: &RunPlan,
        ) -> Result<WorkflowOutput, String> {
            match identity.model.as_str() {
                "errs" => Err("provider exploded".into()),
                "panics" => panic!("unhandled fault"),
                _ => Ok(dummy_output()),
            }
        }
    }

    #[tokio::test]
    async fn faulting_workers_become_error_records() {
        let tasks = vec![run_task("ok1"), run_task("errs"), run_task("panics"), run_task("ok2")];
        let tracker = SessionTracker::new();

        let records = dispatch_batch(Arc::new(FailingWorker), tasks, &tracker, false, None).await;

        // batch size before == after: nothing dropped, nothing propagated
        assert_eq!(records.len(), 4);
        assert_eq!(records.iter().filter(|r| r.is_success()).count(), 2);

        let errors: Vec<&RunRecord> = records
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 2);
        let err_for = |model: &str| {
            errors
                .iter()
                .find(|r| r.model == model)
                .map(|r| match &r.outcome {
                    RunOutcome::Error { error } => error.clone(),
                    _ => unreachable!(),
                })
                .unwrap()
        };
        assert_eq!(err_for("errs"), "provider exploded");
        assert!(err_for("panics").starts_with("worker fault:"));
    }

    #[tokio::test]
    async fn skips_emitted_synchronously_in_input_order() {
        let tasks = vec![
            Task {
                identity: RunIdentity::new("p", "prov", "s1"),
                kind: TaskKind::Skip { reason: "first".into() },
            },
            run_task("r1"),
            Task {
                identity: RunIdentity::new("p", "prov", "s2"),
                kind: TaskKind::Skip { reason: "second".into() },
            },
        ];
        let tracker = SessionTracker::new();
        let records =
            dispatch_batch(Arc::new(CountingWorker::new()), tasks, &tracker, false, None).await;

        assert_eq!(records[0].model, "s1");
        assert_eq!(records[1].model, "s2");
        assert!(records[0].is_skipped() && records[1].is_skipped());
        // skipped tasks are never marked in the tracker
        assert!(!tracker.contains(&RunIdentity::new("p", "prov", "s1")));
        assert!(tracker.contains(&RunIdentity::new("p", "prov", "r1")));
    }

    #[tokio::test]
    async fn already_marked_identity_is_not_resubmitted() {
        let tracker = SessionTracker::new();
        tracker.mark(&RunIdentity::new("p", "prov", "m0"));

        let worker = Arc::new(CountingWorker::new());
        let records =
            dispatch_batch(worker.clone(), vec![run_task("m0")], &tracker, false, None).await;

        assert_eq!(worker.calls.load(Ordering::SeqCst), 0);
        assert_eq!(records.len(), 1);
        match &records[0].outcome {
            RunOutcome::Skipped { reason } => assert_eq!(reason, SKIP_SESSION),
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rerun_override_resubmits_marked_identity() {
        let tracker = SessionTracker::new();
        tracker.mark(&RunIdentity::new("p", "prov", "m0"));

        let worker = Arc::new(CountingWorker::new());
        let records =
            dispatch_batch(worker.clone(), vec![run_task("m0")], &tracker, true, None).await;

        assert_eq!(worker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_success());
    }
}
