//! Stage-graph composition around a mandatory "generate" step.
//!
//! Optional pre- and post-processing stages are declared in one explicit
//! construction-time table rather than self-registering into a global map, so
//! the full stage set is visible at a glance and independent of module load
//! order. `build_plan` turns an enabled-stage configuration into a pure-data
//! plan: the ordered stage list plus its edges, including conditional
//! back-edges into "generate".

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

pub const START: &str = "start";
pub const END: &str = "end";
pub const GENERATE: &str = "generate";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

// =============================================================================
// State and stage table
// =============================================================================

/// State threaded through the stages. Post-stages set the routing flags that
/// their conditions inspect.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub input: String,
    pub output: String,
    pub valid: bool,
    pub needs_refinement: bool,
}

/// Where a conditional stage routes after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Back into the generate step for another attempt.
    Generate,
    /// Forward to the next stage in the plan (or the end).
    Next,
}

/// Per-stage knobs. One shared shape keeps the configuration a plain map;
/// stages read only the fields that concern them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageOptions {
    #[serde(default)]
    pub examples: Option<usize>,
    #[serde(default)]
    pub normalize: Option<bool>,
    #[serde(default)]
    pub max_length: Option<usize>,
}

pub type StageRunner = Box<dyn Fn(&mut GraphState) + Send + Sync>;
pub type Condition = fn(&GraphState) -> Route;

/// Whether a stage runs before or after the generate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCategory {
    Pre,
    Post,
}

/// One entry in the stage table: how to build the runner, and the optional
/// routing condition evaluated after it runs.
pub struct StageSpec {
    pub category: StageCategory,
    pub build: fn(&StageOptions) -> StageRunner,
    pub condition: Option<Condition>,
}

/// The full stage vocabulary. Adding a stage means adding one row here; the
/// plan builder and tests pick it up without further wiring. Table order is
/// plan order within each category.
pub static STAGE_TABLE: &[(&str, StageSpec)] = &[
    (
        "preprocess",
        StageSpec {
            category: StageCategory::Pre,
            build: build_preprocess,
            condition: None,
        },
    ),
    (
        "few_shot",
        StageSpec {
            category: StageCategory::Pre,
            build: build_few_shot,
            condition: None,
        },
    ),
    (
        GENERATE,
        StageSpec {
            category: StageCategory::Post,
            build: build_generate,
            condition: None,
        },
    ),
    (
        "validate",
        StageSpec {
            category: StageCategory::Post,
            build: build_validate,
            condition: Some(validate_condition),
        },
    ),
    (
        "refine",
        StageSpec {
            category: StageCategory::Post,
            build: build_refine,
            condition: Some(refine_condition),
        },
    ),
];

fn lookup(name: &str) -> Option<&'static StageSpec> {
    STAGE_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, spec)| spec)
}

// =============================================================================
// Stage builders and conditions
// =============================================================================

fn build_preprocess(options: &StageOptions) -> StageRunner {
    let normalize = options.normalize.unwrap_or(true);
    Box::new(move |state| {
        if normalize {
            state.input = state.input.trim().to_string();
        }
    })
}

fn build_few_shot(options: &StageOptions) -> StageRunner {
    let examples = options.examples.unwrap_or(3);
    Box::new(move |state| {
        state.input = format!("[{examples} examples]\n{}", state.input);
    })
}

fn build_generate(_options: &StageOptions) -> StageRunner {
    Box::new(|state| {
        state.output = state.input.clone();
        state.valid = true;
        state.needs_refinement = false;
    })
}

fn build_validate(options: &StageOptions) -> StageRunner {
    let max_length = options.max_length.unwrap_or(1000);
    Box::new(move |state| {
        state.valid = !state.output.is_empty() && state.output.chars().count() <= max_length;
    })
}

fn build_refine(_options: &StageOptions) -> StageRunner {
    Box::new(|state| {
        state.needs_refinement = state.output.contains("TODO");
    })
}

fn validate_condition(state: &GraphState) -> Route {
    if state.valid {
        Route::Next
    } else {
        Route::Generate
    }
}

fn refine_condition(state: &GraphState) -> Route {
    if state.needs_refinement {
        Route::Generate
    } else {
        Route::Next
    }
}

// =============================================================================
// Plan construction
// =============================================================================

/// Which optional stages to enable, with their options. "generate" is always
/// part of the plan whether listed or not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub stages: HashMap<String, StageOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    Direct {
        from: String,
        to: String,
    },
    /// After `from` runs, its condition routes either back to `back_to` or
    /// forward to `next`.
    Conditional {
        from: String,
        back_to: String,
        next: String,
    },
}

/// Ordered stage plan: pre stages, generate, post stages, plus every edge.
#[derive(Debug, Clone)]
pub struct GraphPlan {
    pub stages: Vec<String>,
    pub edges: Vec<Edge>,
}

impl GraphPlan {
    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s == name)
    }
}

/// Build the stage plan for a configuration.
///
/// Pre stages each fan out from the start and feed into generate; post stages
/// chain after generate in table order. A post stage with a condition gets a
/// conditional edge back to generate instead of a plain forward edge.
pub fn build_plan(config: &GraphConfig) -> Result<GraphPlan, GraphError> {
    for name in config.stages.keys() {
        if lookup(name).is_none() {
            return Err(GraphError::UnknownStage(name.clone()));
        }
    }

    let enabled = |name: &str| name == GENERATE || config.stages.contains_key(name);

    let pre: Vec<&str> = STAGE_TABLE
        .iter()
        .filter(|(name, spec)| spec.category == StageCategory::Pre && enabled(name))
        .map(|(name, _)| *name)
        .collect();
    let post: Vec<&str> = STAGE_TABLE
        .iter()
        .filter(|(name, spec)| {
            spec.category == StageCategory::Post && *name != GENERATE && enabled(name)
        })
        .map(|(name, _)| *name)
        .collect();

    let mut stages: Vec<String> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    if pre.is_empty() {
        edges.push(Edge::Direct {
            from: START.to_string(),
            to: GENERATE.to_string(),
        });
    }
    for name in &pre {
        stages.push(name.to_string());
        edges.push(Edge::Direct {
            from: START.to_string(),
            to: name.to_string(),
        });
        edges.push(Edge::Direct {
            from: name.to_string(),
            to: GENERATE.to_string(),
        });
    }

    stages.push(GENERATE.to_string());

    let mut current = GENERATE;
    for (i, name) in post.iter().enumerate() {
        stages.push(name.to_string());
        edges.push(Edge::Direct {
            from: current.to_string(),
            to: name.to_string(),
        });

        let spec = lookup(name).expect("enabled stages were validated above");
        if spec.condition.is_some() {
            let next = post.get(i + 1).copied().unwrap_or(END);
            edges.push(Edge::Conditional {
                from: name.to_string(),
                back_to: GENERATE.to_string(),
                next: next.to_string(),
            });
        }
        current = name;
    }

    let last_is_conditional = lookup(current)
        .map(|spec| spec.condition.is_some())
        .unwrap_or(false);
    if !last_is_conditional {
        edges.push(Edge::Direct {
            from: current.to_string(),
            to: END.to_string(),
        });
    }

    Ok(GraphPlan { stages, edges })
}

/// Instantiate the runners for a plan, in plan order. Conditions stay in the
/// stage table; callers that execute a plan look them up per stage.
pub fn build_runners(config: &GraphConfig) -> Result<Vec<(String, StageRunner)>, GraphError> {
    let plan = build_plan(config)?;
    let default_options = StageOptions::default();

    let mut runners = Vec::with_capacity(plan.stages.len());
    for name in &plan.stages {
        let spec = lookup(name).ok_or_else(|| GraphError::UnknownStage(name.clone()))?;
        let options = config.stages.get(name).unwrap_or(&default_options);
        runners.push((name.clone(), (spec.build)(options)));
    }
    Ok(runners)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(names: &[&str]) -> GraphConfig {
        GraphConfig {
            stages: names
                .iter()
                .map(|n| (n.to_string(), StageOptions::default()))
                .collect(),
        }
    }

    #[test]
    fn empty_config_is_start_generate_end() {
        let plan = build_plan(&GraphConfig::default()).unwrap();
        assert_eq!(plan.stages, [GENERATE.to_string()]);
        assert_eq!(
            plan.edges,
            [
                Edge::Direct {
                    from: START.into(),
                    to: GENERATE.into()
                },
                Edge::Direct {
                    from: GENERATE.into(),
                    to: END.into()
                },
            ]
        );
    }

    #[test]
    fn pre_stages_fan_into_generate() {
        let plan = build_plan(&config_with(&["preprocess", "few_shot"])).unwrap();
        assert_eq!(plan.stages, ["preprocess", "few_shot", GENERATE]);
        assert!(plan.edges.contains(&Edge::Direct {
            from: START.into(),
            to: "preprocess".into()
        }));
        assert!(plan.edges.contains(&Edge::Direct {
            from: "few_shot".into(),
            to: GENERATE.into()
        }));
        // with pre stages present, start does not connect straight to generate
        assert!(!plan.edges.contains(&Edge::Direct {
            from: START.into(),
            to: GENERATE.into()
        }));
    }

    #[test]
    fn conditional_stage_gets_back_edge_to_generate() {
        let plan = build_plan(&config_with(&["validate", "refine"])).unwrap();
        assert_eq!(plan.stages, [GENERATE, "validate", "refine"]);
        assert!(plan.edges.contains(&Edge::Conditional {
            from: "validate".into(),
            back_to: GENERATE.into(),
            next: "refine".into(),
        }));
        // the last conditional stage routes forward to the end
        assert!(plan.edges.contains(&Edge::Conditional {
            from: "refine".into(),
            back_to: GENERATE.into(),
            next: END.into(),
        }));
        // no plain edge from the last stage when its condition handles the end
        assert!(!plan.edges.contains(&Edge::Direct {
            from: "refine".into(),
            to: END.into()
        }));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let err = build_plan(&config_with(&["mystery"])).unwrap_err();
        assert!(matches!(err, GraphError::UnknownStage(name) if name == "mystery"));
    }

    #[test]
    fn runners_apply_their_options() {
        let mut config = config_with(&["preprocess", "few_shot"]);
        config.stages.get_mut("few_shot").unwrap().examples = Some(5);

        let runners = build_runners(&config).unwrap();
        let mut state = GraphState {
            input: "  what is 2+2?  ".into(),
            ..Default::default()
        };
        for (_, runner) in &runners {
            runner(&mut state);
        }
        assert!(state.input.starts_with("[5 examples]\n"));
        assert!(state.input.ends_with("what is 2+2?"));
        assert_eq!(state.output, state.input);
        assert!(state.valid);
    }

    #[test]
    fn conditions_route_on_state_flags() {
        let invalid = GraphState {
            valid: false,
            ..Default::default()
        };
        assert_eq!(validate_condition(&invalid), Route::Generate);
        let valid = GraphState {
            valid: true,
            ..Default::default()
        };
        assert_eq!(validate_condition(&valid), Route::Next);

        let needs_work = GraphState {
            needs_refinement: true,
            ..Default::default()
        };
        assert_eq!(refine_condition(&needs_work), Route::Generate);
        assert_eq!(refine_condition(&valid), Route::Next);
    }
}
