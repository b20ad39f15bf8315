//! Three-stage reasoning workflow: analyze -> solve -> verify.
//!
//! Each stage asks the model for structured (JSON-mode) output first and
//! falls back to a free-text request with heuristic reclassification when the
//! provider or model cannot produce it. The fallback is a best-effort degrade
//! path, not a correctness guarantee.
//!
//! Stages are a fixed dispatch table keyed by [`StageKind`]; each stage is a
//! function from the current [`StageState`] to a [`StageDelta`], folded
//! left-to-right. Once an error lands in the state, downstream stages pass it
//! through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PromptConfig;
use crate::gateway::{ChatGateway, ChatRequest, Message, ProviderError};
use crate::logging::RunLogger;

// =============================================================================
// Stage outputs
// =============================================================================

/// Analysis of the problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemAnalysis {
    /// Type of problem (e.g. mathematical, logical, creative).
    pub problem_type: String,
    /// Key constraints or requirements.
    pub key_constraints: Vec<String>,
    /// Suggested approach to solve the problem.
    pub approach: String,
}

/// Solution to the problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Solution {
    /// The final answer or solution.
    pub answer: String,
    /// Step-by-step reasoning that led to the answer.
    pub reasoning_steps: Vec<String>,
    /// Confidence level: high, medium, or low.
    pub confidence: String,
}

/// Verification of the solution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verification {
    /// Whether the solution appears correct.
    pub is_correct: bool,
    /// Any issues or concerns identified.
    pub issues_found: Vec<String>,
    /// The verified final answer.
    pub final_answer: String,
}

// =============================================================================
// Stage kinds & state
// =============================================================================

/// The fixed stages of the workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Analyze,
    Solve,
    Verify,
}

/// Execution order of the pipeline.
pub const STAGE_ORDER: [StageKind; 3] = [StageKind::Analyze, StageKind::Solve, StageKind::Verify];

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Analyze => "analyze",
            StageKind::Solve => "solve",
            StageKind::Verify => "verify",
        }
    }
}

/// Explicit state record threaded through the stages.
#[derive(Debug, Clone, Default)]
pub struct StageState {
    pub problem: String,
    pub analysis: Option<ProblemAnalysis>,
    pub solution: Option<Solution>,
    pub verification: Option<Verification>,
    pub error: Option<String>,
}

/// Result of one stage execution, folded into the state.
#[derive(Debug, Clone)]
pub enum StageDelta {
    Analysis(ProblemAnalysis),
    Solution(Solution),
    Verification(Verification),
    Error(String),
}

impl StageState {
    pub fn new(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, delta: StageDelta) {
        match delta {
            StageDelta::Analysis(a) => self.analysis = Some(a),
            StageDelta::Solution(s) => self.solution = Some(s),
            StageDelta::Verification(v) => self.verification = Some(v),
            StageDelta::Error(e) => self.error = Some(e),
        }
    }
}

// =============================================================================
// Workflow invoker
// =============================================================================

/// All three stage outputs from a clean run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub analysis: ProblemAnalysis,
    pub solution: Solution,
    pub verification: Verification,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A stage recorded an error in the state.
    #[error("{0}")]
    Stage(String),
    /// The workflow finished without an error but a stage output is missing.
    #[error("workflow completed without {0} output")]
    MissingOutput(&'static str),
}

/// Resolved per-task workflow parameters.
pub struct WorkflowContext<'a> {
    pub prompt_name: &'a str,
    pub model: &'a str,
    /// From the provider config; gates system-role messages entirely.
    pub supports_system_prompt: bool,
    pub prompt_config: &'a PromptConfig,
}

/// Drive the three-stage pipeline to completion against one provider/model.
///
/// Provider faults inside a stage are converted to a state error; the
/// remaining stages pass it through, and it surfaces as `Err` here.
pub async fn run_workflow(
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    problem: &str,
) -> Result<WorkflowOutput, WorkflowError> {
    logger.info(&format!(
        "Starting workflow with prompt: {}, problem: {problem}",
        ctx.prompt_name
    ));

    let mut state = StageState::new(problem);
    for stage in STAGE_ORDER {
        if state.error.is_some() {
            continue;
        }
        let delta = run_stage(stage, gateway, logger, ctx, &state).await;
        state.apply(delta);
    }
    logger.info("Workflow completed");

    if let Some(error) = state.error {
        return Err(WorkflowError::Stage(error));
    }

    Ok(WorkflowOutput {
        analysis: state
            .analysis
            .ok_or(WorkflowError::MissingOutput("analysis"))?,
        solution: state
            .solution
            .ok_or(WorkflowError::MissingOutput("solution"))?,
        verification: state
            .verification
            .ok_or(WorkflowError::MissingOutput("verification"))?,
    })
}

/// Keyed stage dispatch.
async fn run_stage(
    stage: StageKind,
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    state: &StageState,
) -> StageDelta {
    match stage {
        StageKind::Analyze => analyze_stage(gateway, logger, ctx, state).await,
        StageKind::Solve => solve_stage(gateway, logger, ctx, state).await,
        StageKind::Verify => verify_stage(gateway, logger, ctx, state).await,
    }
}

// =============================================================================
// Stages
// =============================================================================

async fn analyze_stage(
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    state: &StageState,
) -> StageDelta {
    logger.info(&format!(
        "Stage 1: Analyzing problem (prompt: {})",
        ctx.prompt_name
    ));

    let template = ctx.prompt_config.stage_prompt(StageKind::Analyze);
    let prompt = if template.is_empty() {
        format!(
            "Analyze this problem carefully:\n\n{}\n\nIdentify:\n\
             1. What type of problem this is\n\
             2. Key constraints or requirements\n\
             3. The best approach to solve it",
            state.problem
        )
    } else {
        template.replace("{problem}", &state.problem)
    };

    let schema_hint = "Respond with a JSON object: \
        {\"problem_type\": string, \"key_constraints\": [string], \"approach\": string}";

    match structured_call::<ProblemAnalysis>(
        gateway,
        logger,
        ctx,
        StageKind::Analyze,
        &prompt,
        schema_hint,
    )
    .await
    {
        Ok(analysis) => {
            logger.info(&format!(
                "Analysis complete (structured): {}",
                analysis.problem_type
            ));
            StageDelta::Analysis(analysis)
        }
        Err(_) => {
            logger.info("Falling back to unstructured response for analysis");
            match unstructured_call(gateway, ctx, StageKind::Analyze, &prompt).await {
                Ok(response) if !response.is_empty() => {
                    logger.info(&format!("Analysis (unstructured): {}", preview(&response)));
                    StageDelta::Analysis(ProblemAnalysis {
                        problem_type: classify_problem_type(&response).to_string(),
                        key_constraints: vec![
                            "answer accurately".to_string(),
                            "provide explanation".to_string(),
                        ],
                        approach: "Standard problem solving approach".to_string(),
                    })
                }
                Ok(_) => StageDelta::Analysis(ProblemAnalysis {
                    problem_type: "general".to_string(),
                    key_constraints: vec!["answer accurately".to_string()],
                    approach: "Standard problem solving".to_string(),
                }),
                Err(e) => {
                    logger.error(&format!("Error in analyze stage: {e}"));
                    StageDelta::Error(format!("Analysis failed: {e}"))
                }
            }
        }
    }
}

async fn solve_stage(
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    state: &StageState,
) -> StageDelta {
    logger.info(&format!(
        "Stage 2: Solving problem (prompt: {})",
        ctx.prompt_name
    ));

    let Some(analysis) = &state.analysis else {
        return StageDelta::Error("Solution failed: no analysis available".to_string());
    };

    let analysis_summary = format!(
        "Problem Type: {}\nConstraints: {}\nApproach: {}",
        analysis.problem_type,
        analysis.key_constraints.join(", "),
        analysis.approach
    );

    let template = ctx.prompt_config.stage_prompt(StageKind::Solve);
    let prompt = if template.is_empty() {
        format!(
            "Based on this analysis:\n\n{analysis_summary}\n\n\
             Now solve this problem:\n{}\n\nProvide:\n\
             1. Your final answer\n\
             2. Step-by-step reasoning\n\
             3. Your confidence level (high/medium/low)",
            state.problem
        )
    } else {
        template
            .replace("{analysis_summary}", &analysis_summary)
            .replace("{problem}", &state.problem)
    };

    let schema_hint = "Respond with a JSON object: \
        {\"answer\": string, \"reasoning_steps\": [string], \"confidence\": \"high\"|\"medium\"|\"low\"}";

    match structured_call::<Solution>(gateway, logger, ctx, StageKind::Solve, &prompt, schema_hint)
        .await
    {
        Ok(solution) => {
            logger.info(&format!(
                "Solution complete (structured): {} confidence",
                solution.confidence
            ));
            StageDelta::Solution(solution)
        }
        Err(_) => {
            logger.info("Falling back to unstructured response for solution");
            match unstructured_call(gateway, ctx, StageKind::Solve, &prompt).await {
                Ok(response) if !response.is_empty() => {
                    logger.info(&format!("Solution (unstructured): {}", preview(&response)));
                    let mut answer = response.clone();
                    // 500 characters, not bytes: byte truncation can split a
                    // multibyte char and panic
                    if let Some((idx, _)) = answer.char_indices().nth(500) {
                        answer.truncate(idx);
                    }
                    StageDelta::Solution(Solution {
                        answer,
                        reasoning_steps: vec![
                            "Analyzed the problem".to_string(),
                            "Applied knowledge".to_string(),
                            "Formulated answer".to_string(),
                        ],
                        confidence: classify_confidence(&response).to_string(),
                    })
                }
                Ok(_) => StageDelta::Solution(Solution {
                    answer: "Unable to generate solution".to_string(),
                    reasoning_steps: vec!["Attempted to solve".to_string()],
                    confidence: "low".to_string(),
                }),
                Err(e) => {
                    logger.error(&format!("Error in solve stage: {e}"));
                    StageDelta::Error(format!("Solution failed: {e}"))
                }
            }
        }
    }
}

async fn verify_stage(
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    state: &StageState,
) -> StageDelta {
    logger.info(&format!(
        "Stage 3: Verifying solution (prompt: {})",
        ctx.prompt_name
    ));

    let Some(solution) = &state.solution else {
        return StageDelta::Error("Verification failed: no solution available".to_string());
    };

    let solution_summary = format!(
        "Answer: {}\nReasoning: {}\nConfidence: {}",
        solution.answer,
        solution.reasoning_steps.join(" -> "),
        solution.confidence
    );

    let template = ctx.prompt_config.stage_prompt(StageKind::Verify);
    let prompt = if template.is_empty() {
        format!(
            "Verify this solution:\n\nOriginal Problem:\n{}\n\n\
             Proposed Solution:\n{solution_summary}\n\nCheck:\n\
             1. Is the solution correct?\n\
             2. Are there any issues or concerns?\n\
             3. What is the final verified answer?",
            state.problem
        )
    } else {
        template
            .replace("{problem}", &state.problem)
            .replace("{solution_summary}", &solution_summary)
    };

    let schema_hint = "Respond with a JSON object: \
        {\"is_correct\": bool, \"issues_found\": [string], \"final_answer\": string}";

    match structured_call::<Verification>(
        gateway,
        logger,
        ctx,
        StageKind::Verify,
        &prompt,
        schema_hint,
    )
    .await
    {
        Ok(verification) => {
            logger.info(&format!(
                "Verification complete (structured): {}",
                verification.is_correct
            ));
            StageDelta::Verification(verification)
        }
        Err(_) => {
            logger.info("Falling back to unstructured response for verification");
            match unstructured_call(gateway, ctx, StageKind::Verify, &prompt).await {
                Ok(response) if !response.is_empty() => {
                    logger.info(&format!(
                        "Verification (unstructured): {}",
                        preview(&response)
                    ));
                    let (is_correct, issues_found) = classify_correctness(&response);
                    StageDelta::Verification(Verification {
                        is_correct,
                        issues_found,
                        final_answer: solution.answer.clone(),
                    })
                }
                Ok(_) => StageDelta::Verification(Verification {
                    is_correct: true,
                    issues_found: Vec::new(),
                    final_answer: solution.answer.clone(),
                }),
                Err(e) => {
                    logger.error(&format!("Error in verify stage: {e}"));
                    StageDelta::Error(format!("Verification failed: {e}"))
                }
            }
        }
    }
}

// =============================================================================
// Provider calls
// =============================================================================

#[derive(Debug, Error)]
enum StageCallError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("structured output parse failed: {0}")]
    Parse(String),
}

fn build_messages(ctx: &WorkflowContext<'_>, stage: StageKind, user_prompt: String) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    let system_prompt = &ctx.prompt_config.system_prompt;
    if !system_prompt.is_empty()
        && ctx.supports_system_prompt
        && ctx.prompt_config.stage_uses_system_prompt(stage)
    {
        messages.push(Message::system(system_prompt));
    }
    messages.push(Message::user(user_prompt));
    messages
}

/// JSON-mode request parsed into the stage's typed schema.
async fn structured_call<T: serde::de::DeserializeOwned>(
    gateway: &dyn ChatGateway,
    logger: &RunLogger,
    ctx: &WorkflowContext<'_>,
    stage: StageKind,
    prompt: &str,
    schema_hint: &str,
) -> Result<T, StageCallError> {
    let user_prompt = format!("{prompt}\n\n{schema_hint}");
    let req = ChatRequest::new(ctx.model, build_messages(ctx, stage, user_prompt)).with_json_mode();

    let resp = match gateway.chat(&req).await {
        Ok(resp) => resp,
        Err(e) => {
            logger.warn(&format!("Structured output failed: {e}"));
            return Err(e.into());
        }
    };

    match parse_json_payload::<T>(&resp.content) {
        Ok(value) => Ok(value),
        Err(e) => {
            logger.warn(&format!("Structured output failed: {e}"));
            Err(StageCallError::Parse(e))
        }
    }
}

/// Plain free-text request, used as the fallback path.
async fn unstructured_call(
    gateway: &dyn ChatGateway,
    ctx: &WorkflowContext<'_>,
    stage: StageKind,
    prompt: &str,
) -> Result<String, ProviderError> {
    let req = ChatRequest::new(ctx.model, build_messages(ctx, stage, prompt.to_string()));
    let resp = gateway.chat(&req).await?;
    Ok(resp.content.trim().to_string())
}

/// Parse a JSON object out of model output, tolerating code fences and
/// surrounding prose.
fn parse_json_payload<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, String> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            return serde_json::from_str::<T>(&trimmed[start..=end]).map_err(|e| e.to_string());
        }
    }
    Err("no JSON object in response".to_string())
}

fn preview(s: &str) -> String {
    let mut p: String = s.chars().take(200).collect();
    if s.chars().count() > 200 {
        p.push_str("...");
    }
    p
}

// =============================================================================
// Heuristic reclassification
// =============================================================================
//
// Keyword matching over free-text responses, used only on the fallback path.
// Accepted approximation for models without structured output support.

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn classify_problem_type(response: &str) -> &'static str {
    let lower = response.to_lowercase();
    if contains_any(&lower, &["math", "arithmetic", "calculation", "number"]) {
        "mathematical"
    } else if contains_any(&lower, &["logic", "reasoning"]) {
        "logical"
    } else if contains_any(&lower, &["creative", "design", "write"]) {
        "creative"
    } else {
        "general"
    }
}

fn classify_confidence(response: &str) -> &'static str {
    let lower = response.to_lowercase();
    if contains_any(&lower, &["certain", "definitely", "clearly", "obviously"]) {
        "high"
    } else if contains_any(&lower, &["maybe", "possibly", "uncertain", "not sure"]) {
        "low"
    } else {
        "medium"
    }
}

fn classify_correctness(response: &str) -> (bool, Vec<String>) {
    let lower = response.to_lowercase();
    let is_correct = !contains_any(&lower, &["incorrect", "wrong", "error", "mistake", "issue"]);

    let mut issues = Vec::new();
    if lower.contains("issue") || lower.contains("problem") {
        issues.push("Potential issues mentioned in verification".to_string());
    }
    (is_correct, issues)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ChatResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Gateway stub returning scripted responses in call order.
    struct ScriptedGateway {
        responses: Mutex<Vec<Result<String, ()>>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<&str, ()>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .rev()
                        .map(|r| r.map(String::from))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected extra chat call");
            match next {
                Ok(content) => Ok(ChatResponse {
                    content,
                    input_tokens: 10,
                    output_tokens: 10,
                    latency: Duration::from_millis(1),
                }),
                Err(()) => Err(ProviderError::provider("stub", "scripted failure")),
            }
        }
    }

    fn ctx<'a>(prompt_config: &'a PromptConfig) -> WorkflowContext<'a> {
        WorkflowContext {
            prompt_name: "test",
            model: "stub-model",
            supports_system_prompt: true,
            prompt_config,
        }
    }

    const ANALYSIS_JSON: &str =
        r#"{"problem_type":"mathematical","key_constraints":["exact"],"approach":"compute"}"#;
    const SOLUTION_JSON: &str =
        r#"{"answer":"4","reasoning_steps":["2+2"],"confidence":"high"}"#;
    const VERIFICATION_JSON: &str =
        r#"{"is_correct":true,"issues_found":[],"final_answer":"4"}"#;

    #[tokio::test]
    async fn all_structured_stages_succeed() {
        let gateway = ScriptedGateway::new(vec![
            Ok(ANALYSIS_JSON),
            Ok(SOLUTION_JSON),
            Ok(VERIFICATION_JSON),
        ]);
        let prompt_config = PromptConfig::default();
        let out = run_workflow(&gateway, &RunLogger::sink(), &ctx(&prompt_config), "2+2?")
            .await
            .unwrap();
        assert_eq!(out.analysis.problem_type, "mathematical");
        assert_eq!(out.solution.answer, "4");
        assert!(out.verification.is_correct);
    }

    #[tokio::test]
    async fn fallback_reclassifies_free_text() {
        // Structured attempt returns prose (parse fails), fallback gives text.
        let gateway = ScriptedGateway::new(vec![
            Ok("this is clearly a math calculation"),
            Ok("This looks like a number calculation to me."),
            Ok(SOLUTION_JSON),
            Ok("no json here"),
            Ok("The answer is definitely wrong, there is a mistake."),
        ]);
        let prompt_config = PromptConfig::default();
        let out = run_workflow(&gateway, &RunLogger::sink(), &ctx(&prompt_config), "2+2?")
            .await
            .unwrap();
        assert_eq!(out.analysis.problem_type, "mathematical");
        assert!(!out.verification.is_correct);
        assert_eq!(out.verification.final_answer, out.solution.answer);
    }

    #[tokio::test]
    async fn stage_error_short_circuits() {
        // Both analyze attempts fail: solve and verify must never be called.
        let gateway = ScriptedGateway::new(vec![Err(()), Err(())]);
        let prompt_config = PromptConfig::default();
        let err = run_workflow(&gateway, &RunLogger::sink(), &ctx(&prompt_config), "2+2?")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Analysis failed:"));
        assert!(gateway.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fallback_truncates_long_answers_on_char_boundaries() {
        // 499 ASCII chars then multibyte: byte 500 lands inside the first 'é'
        let long_prose = format!("{}{}", "a".repeat(499), "é".repeat(101));
        let gateway = ScriptedGateway::new(vec![
            Ok(ANALYSIS_JSON),
            Ok(long_prose.as_str()),
            Ok(long_prose.as_str()),
            Ok(VERIFICATION_JSON),
        ]);
        let prompt_config = PromptConfig::default();
        let out = run_workflow(&gateway, &RunLogger::sink(), &ctx(&prompt_config), "2+2?")
            .await
            .unwrap();
        assert_eq!(out.solution.answer.chars().count(), 500);
        assert!(out.solution.answer.ends_with('é'));
    }

    #[test]
    fn parse_tolerates_fences_and_prose() {
        let fenced = format!("```json\n{ANALYSIS_JSON}\n```");
        let parsed: ProblemAnalysis = parse_json_payload(&fenced).unwrap();
        assert_eq!(parsed.problem_type, "mathematical");

        let prose = format!("Here you go: {SOLUTION_JSON} hope that helps");
        let parsed: Solution = parse_json_payload(&prose).unwrap();
        assert_eq!(parsed.answer, "4");

        assert!(parse_json_payload::<Solution>("no braces at all").is_err());
    }

    #[test]
    fn heuristics_match_keywords() {
        assert_eq!(classify_problem_type("pure arithmetic"), "mathematical");
        assert_eq!(classify_problem_type("a reasoning puzzle"), "logical");
        assert_eq!(classify_problem_type("write a poem"), "creative");
        assert_eq!(classify_problem_type("capital of France"), "general");

        assert_eq!(classify_confidence("I am certain"), "high");
        assert_eq!(classify_confidence("possibly right"), "low");
        assert_eq!(classify_confidence("the answer is 4"), "medium");

        let (ok, issues) = classify_correctness("No issue found, all good");
        assert!(!ok); // "issue" is in the negative keyword list
        assert_eq!(issues.len(), 1);
        let (ok, issues) = classify_correctness("Verified and accurate.");
        assert!(ok);
        assert!(issues.is_empty());
    }

    #[test]
    fn system_prompt_gating() {
        let mut prompt_config = PromptConfig {
            system_prompt: "be terse".to_string(),
            ..Default::default()
        };
        let c = ctx(&prompt_config);
        let msgs = build_messages(&c, StageKind::Analyze, "hi".into());
        assert_eq!(msgs.len(), 2);

        // provider does not support system prompts
        let c2 = WorkflowContext {
            supports_system_prompt: false,
            ..ctx(&prompt_config)
        };
        let msgs = build_messages(&c2, StageKind::Analyze, "hi".into());
        assert_eq!(msgs.len(), 1);

        // per-stage opt-out
        prompt_config.stages.insert(
            "analyze".to_string(),
            crate::config::StageConfig {
                prompt: None,
                system_prompt_included: false,
            },
        );
        let c3 = ctx(&prompt_config);
        let msgs = build_messages(&c3, StageKind::Analyze, "hi".into());
        assert_eq!(msgs.len(), 1);
    }
}
