//! Benchmark configuration: YAML provider registry plus JSON prompt files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::StageKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("provider entry {0:?} is not a mapping")]
    BadProviderEntry(String),

    #[error("API key not found: set the {0} environment variable")]
    MissingApiKey(String),
}

// =============================================================================
// Provider registry
// =============================================================================

/// One provider endpoint and the models to benchmark against it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub models: Vec<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout: u64,
    /// Whether the provider accepts a system role message.
    #[serde(default = "default_true")]
    pub supports_system_prompt: bool,
    /// Extra headers some providers require (name -> value).
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OutputConfig {
    results_dir: PathBuf,
    logs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    /// Kept as a YAML mapping so provider order survives deserialization.
    providers: serde_yaml::Mapping,
    output: OutputConfig,
    #[serde(default)]
    max_workers: Option<usize>,
}

// =============================================================================
// Prompt files
// =============================================================================

/// Per-stage prompt overrides from a prompt file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageConfig {
    /// Format template for the stage's user prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Whether the scenario's system prompt is sent for this stage.
    #[serde(default = "default_true")]
    pub system_prompt_included: bool,
}

/// One benchmark scenario loaded from `<prompts_dir>/<name>.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub test_prompt: String,
    /// Stage overrides keyed by "analyze"/"solve"/"verify". Older prompt
    /// files use "nodes" or "agents" for this map.
    #[serde(default, alias = "nodes", alias = "agents")]
    pub stages: HashMap<String, StageConfig>,
}

impl PromptConfig {
    /// Template for a stage, empty string when unset.
    pub fn stage_prompt(&self, stage: StageKind) -> &str {
        self.stages
            .get(stage.name())
            .and_then(|s| s.prompt.as_deref())
            .unwrap_or("")
    }

    /// Whether the system prompt is included for a stage (default true).
    pub fn stage_uses_system_prompt(&self, stage: StageKind) -> bool {
        self.stages
            .get(stage.name())
            .map(|s| s.system_prompt_included)
            .unwrap_or(true)
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Loaded benchmark configuration.
pub struct BenchConfig {
    providers: Vec<(String, ProviderConfig)>,
    results_dir: PathBuf,
    logs_dir: PathBuf,
    max_workers: Option<usize>,
    prompts_dir: PathBuf,
    available_prompts: Vec<String>,
    prompt_cache: Mutex<HashMap<String, Arc<PromptConfig>>>,
}

impl BenchConfig {
    /// Load the YAML config and scan the prompts directory.
    ///
    /// Creates the output directories. Fails on unreadable/invalid config,
    /// which is fatal at startup.
    pub fn load(
        config_path: impl AsRef<Path>,
        prompts_dir: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let raw = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: config_path.to_path_buf(),
            source,
        })?;

        let mut providers = Vec::with_capacity(raw.providers.len());
        for (key, value) in raw.providers {
            let name = key.as_str().unwrap_or_default().to_string();
            let provider: ProviderConfig = serde_yaml::from_value(value)
                .map_err(|_| ConfigError::BadProviderEntry(name.clone()))?;
            providers.push((name, provider));
        }

        let prompts_dir = prompts_dir.as_ref().to_path_buf();
        let available_prompts = scan_prompt_files(&prompts_dir)?;

        for dir in [&raw.output.results_dir, &raw.output.logs_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self {
            providers,
            results_dir: raw.output.results_dir,
            logs_dir: raw.output.logs_dir,
            max_workers: raw.max_workers,
            prompts_dir,
            available_prompts,
            prompt_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Providers in configuration file order.
    pub fn providers(&self) -> &[(String, ProviderConfig)] {
        &self.providers
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Prompt scenario names, sorted, without the `.json` extension.
    pub fn available_prompts(&self) -> &[String] {
        &self.available_prompts
    }

    /// Restrict the run to a single prompt scenario.
    ///
    /// Returns false when the name is not among the scanned prompt files.
    pub fn select_prompt(&mut self, name: &str) -> bool {
        if self.available_prompts.iter().any(|p| p == name) {
            self.available_prompts = vec![name.to_string()];
            true
        } else {
            false
        }
    }

    /// Load a prompt scenario by name. Cached after the first read.
    ///
    /// A missing file yields `Ok(None)`; a present-but-invalid file is a
    /// configuration error.
    pub fn prompt(&self, name: &str) -> Result<Option<Arc<PromptConfig>>, ConfigError> {
        if let Some(cached) = self
            .prompt_cache
            .lock()
            .expect("prompt cache poisoned")
            .get(name)
        {
            return Ok(Some(cached.clone()));
        }

        let path = self.prompts_dir.join(format!("{name}.json"));
        if !path.is_file() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let prompt: PromptConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json { path, source })?;

        let prompt = Arc::new(prompt);
        self.prompt_cache
            .lock()
            .expect("prompt cache poisoned")
            .insert(name.to_string(), prompt.clone());
        Ok(Some(prompt))
    }

    /// API key for a provider from the environment. Missing keys are fatal.
    pub fn api_key(&self, env_var: &str) -> Result<String, ConfigError> {
        match std::env::var(env_var) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey(env_var.to_string())),
        }
    }
}

/// Scan a directory for `*.json` prompt files, returning sorted stems.
///
/// An absent directory is not an error: it just means no prompts.
pub fn scan_prompt_files(prompts_dir: &Path) -> Result<Vec<String>, ConfigError> {
    if !prompts_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(prompts_dir).map_err(|source| ConfigError::Io {
        path: prompts_dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: prompts_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

// =============================================================================
// TESTS
// =============================================================================
