//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys split on `__`, e.g. `APP_PIPELINE__TOP_K=3`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k_dense: usize,
    pub k_sparse: usize,
    pub final_k: usize,
    /// Rank constant of reciprocal rank fusion.
    pub fusion_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { k_dense: 10, k_sparse: 10, final_k: 10, fusion_k: 60 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub threshold: f32,
    pub min_segment_chars: usize,
}

impl Default for CompressionSettings {
    fn default() -> Self { Self { threshold: 0.3, min_segment_chars: 20 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Chunks handed to answer generation per sub-question.
    pub top_k: usize,
    /// Sub-question pipelines allowed to run at once.
    pub concurrency: usize,
    pub stage_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self { Self { top_k: 5, concurrency: 4, stage_timeout_secs: 60 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { chunk_size: 500, chunk_overlap: 50 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Texts whose vectors are kept in memory; least useful ones are evicted first.
    pub cache_capacity: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { cache_capacity: 10_000 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3.1".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { docs_dir: "data/docs".to_string() } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub compression: CompressionSettings,
    pub pipeline: PipelineSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub data: DataSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("retrieval.final_k", self.retrieval.final_k),
            ("pipeline.top_k", self.pipeline.top_k),
            ("pipeline.concurrency", self.pipeline.concurrency),
            ("chunking.chunk_size", self.chunking.chunk_size),
        ];
        for (key, value) in positive {
            if value == 0 { return Err(Error::InvalidConfig(format!("{key} must be greater than 0"))); }
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !self.compression.threshold.is_finite() {
            return Err(Error::InvalidConfig("compression.threshold must be finite".to_string()));
        }
        Ok(())
    }

    /// `data.docs_dir` with `~` and env vars expanded, relative to `base`.
    pub fn docs_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.data.docs_dir) }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name, None)
    }

    /// Like [`Config::load`], with an extra TOML file merged after the env file.
    pub fn load_with_file(path: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name, Some(path))
    }

    pub fn load_for_env(env_name: &str, extra: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        if let Some(path) = extra {
            if !path.exists() { return Err(Error::InvalidConfig(format!("config file not found: {}", path.display()))); }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// The fully merged, validated settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
