//! Run results, summary statistics, and the persisted snapshot format.

use serde::{Deserialize, Serialize};

use crate::pipeline::WorkflowOutput;

use super::identity::RunIdentity;

/// Fixed workflow description recorded in every snapshot.
pub const WORKFLOW_DESCRIPTION: &str = "analyze -> solve -> verify";

// =============================================================================
// Records
// =============================================================================

/// Outcome of one run, tagged by status on disk.
///
/// Exactly the fields for the given status are serialized: `response` for
/// success, `reason` for skipped, `error` for error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Success { response: WorkflowOutput },
    Skipped { reason: String },
    Error { error: String },
}

impl RunOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RunOutcome::Success { .. } => "success",
            RunOutcome::Skipped { .. } => "skipped",
            RunOutcome::Error { .. } => "error",
        }
    }
}

/// One entry in the snapshot's `results` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub prompt: String,
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunRecord {
    pub fn new(identity: RunIdentity, outcome: RunOutcome) -> Self {
        Self {
            prompt: identity.prompt,
            provider: identity.provider,
            model: identity.model,
            outcome,
        }
    }

    pub fn identity(&self) -> RunIdentity {
        RunIdentity::new(&self.prompt, &self.provider, &self.model)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, RunOutcome::Skipped { .. })
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Aggregate statistics over the final result collection.
///
/// Invariant: `successful + skipped + failed == total_models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Distinct prompts with at least one non-skipped result.
    pub total_prompts: usize,
    /// Total result count (one per provider/model task).
    pub total_models: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Successful runs whose verification reported `is_correct`.
    pub verified_correct: usize,
    /// `successful / (total - skipped)`, formatted like "85.0%".
    pub success_rate: String,
    /// `verified_correct / successful`, formatted like "85.0%".
    pub accuracy_rate: String,
}

impl Summary {
    pub fn compute(records: &[RunRecord]) -> Self {
        let total = records.len();
        let successful = records.iter().filter(|r| r.is_success()).count();
        let skipped = records.iter().filter(|r| r.is_skipped()).count();
        let failed = total - successful - skipped;

        let verified_correct = records
            .iter()
            .filter(|r| match &r.outcome {
                RunOutcome::Success { response } => response.verification.is_correct,
                _ => false,
            })
            .count();

        let mut attempted_prompts: Vec<&str> = Vec::new();
        for r in records.iter().filter(|r| !r.is_skipped()) {
            if !attempted_prompts.contains(&r.prompt.as_str()) {
                attempted_prompts.push(&r.prompt);
            }
        }

        let attempted = total - skipped;
        let success_rate = if attempted > 0 {
            format!("{:.1}%", successful as f64 / attempted as f64 * 100.0)
        } else {
            "0%".to_string()
        };
        let accuracy_rate = if successful > 0 {
            format!("{:.1}%", verified_correct as f64 / successful as f64 * 100.0)
        } else {
            "0%".to_string()
        };

        Self {
            total_prompts: attempted_prompts.len(),
            total_models: total,
            successful,
            skipped,
            failed,
            verified_correct,
            success_rate,
            accuracy_rate,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The persisted artifact for one benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    /// Distinct prompt names with at least one successful result, in first
    /// appearance order.
    pub prompts_used: Vec<String>,
    pub workflow: String,
    pub results: Vec<RunRecord>,
    pub summary: Summary,
}

impl Snapshot {
    pub fn build(timestamp: String, results: Vec<RunRecord>) -> Self {
        let summary = Summary::compute(&results);

        let mut prompts_used: Vec<String> = Vec::new();
        for r in results.iter().filter(|r| r.is_success()) {
            if !prompts_used.contains(&r.prompt) {
                prompts_used.push(r.prompt.clone());
            }
        }

        Self {
            timestamp,
            prompts_used,
            workflow: WORKFLOW_DESCRIPTION.to_string(),
            results,
            summary,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ProblemAnalysis, Solution, Verification};

    pub(crate) fn success_record(prompt: &str, provider: &str, model: &str, correct: bool) -> RunRecord {
        RunRecord::new(
            RunIdentity::new(prompt, provider, model),
            RunOutcome::Success {
                response: WorkflowOutput {
                    analysis: ProblemAnalysis {
                        problem_type: "general".into(),
                        key_constraints: vec![],
                        approach: "direct".into(),
                    },
                    solution: Solution {
                        answer: "42".into(),
                        reasoning_steps: vec![],
                        confidence: "high".into(),
                    },
                    verification: Verification {
                        is_correct: correct,
                        issues_found: vec![],
                        final_answer: "42".into(),
                    },
                },
            },
        )
    }

    fn skip_record(prompt: &str) -> RunRecord {
        RunRecord::new(
            RunIdentity::new(prompt, "p", "m"),
            RunOutcome::Skipped {
                reason: "Already run in this session".into(),
            },
        )
    }

    fn error_record(prompt: &str) -> RunRecord {
        RunRecord::new(
            RunIdentity::new(prompt, "p", "m2"),
            RunOutcome::Error {
                error: "boom".into(),
            },
        )
    }

    #[test]
    fn summary_invariant_holds() {
        let records = vec![
            success_record("a", "p", "m", true),
            success_record("a", "q", "m", false),
            skip_record("a"),
            error_record("b"),
        ];
        let s = Summary::compute(&records);
        assert_eq!(s.total_models, 4);
        assert_eq!(s.successful + s.skipped + s.failed, s.total_models);
        assert_eq!(s.successful, 2);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.verified_correct, 1);
        // prompts with a non-skipped result: "a" and "b"
        assert_eq!(s.total_prompts, 2);
        assert_eq!(s.success_rate, "66.7%");
        assert_eq!(s.accuracy_rate, "50.0%");
    }

    #[test]
    fn empty_and_all_skipped_rates() {
        let s = Summary::compute(&[]);
        assert_eq!(s.success_rate, "0%");
        assert_eq!(s.accuracy_rate, "0%");

        let s = Summary::compute(&[skip_record("a"), skip_record("b")]);
        assert_eq!(s.success_rate, "0%");
        assert_eq!(s.accuracy_rate, "0%");
        assert_eq!(s.total_prompts, 0);
    }

    #[test]
    fn status_fields_are_exclusive() {
        let success = serde_json::to_value(success_record("a", "p", "m", true)).unwrap();
        assert_eq!(success["status"], "success");
        assert!(success.get("response").is_some());
        assert!(success.get("reason").is_none());
        assert!(success.get("error").is_none());

        let skipped = serde_json::to_value(skip_record("a")).unwrap();
        assert_eq!(skipped["status"], "skipped");
        assert!(skipped.get("reason").is_some());
        assert!(skipped.get("response").is_none());
        assert!(skipped.get("error").is_none());

        let error = serde_json::to_value(error_record("a")).unwrap();
        assert_eq!(error["status"], "error");
        assert!(error.get("error").is_some());
        assert!(error.get("response").is_none());
        assert!(error.get("reason").is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = success_record("a", "p", "m", true);
        let json = serde_json::to_string(&record).unwrap();
        let back: RunRecord = serde_json::from_str(&json).unwrap();
        assert!(back.is_success());
        assert_eq!(back.identity(), record.identity());
    }

    #[test]
    fn snapshot_prompts_used_lists_successes_only() {
        let snapshot = Snapshot::build(
            "20260830_120000".into(),
            vec![
                success_record("alpha", "p", "m", true),
                error_record("beta"),
                success_record("alpha", "q", "m", true),
                skip_record("gamma"),
            ],
        );
        assert_eq!(snapshot.prompts_used, ["alpha".to_string()]);
        assert_eq!(snapshot.workflow, WORKFLOW_DESCRIPTION);
        assert_eq!(snapshot.summary.total_models, 4);
    }
}
