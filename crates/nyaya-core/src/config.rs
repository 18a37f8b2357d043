use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    pub qdrant_url: String,
    /// Embedding dimension the corpus indexes are provisioned with.
    pub dimension: u64,
}

/// Top-K settings per retrieval path, mirroring how much context each
/// strategy needs, plus the per-corpus search timeout.
#[derive(Clone, Debug, Deserialize)]
pub struct RetrievalConfig {
    pub direct_top_k: u64,
    pub scenario_top_k: u64,
    pub section_top_k: u64,
    /// Used for the semantic fallback after an empty section lookup.
    pub fallback_top_k: u64,
    pub corpus_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".into(),
            dimension: 1536,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            direct_top_k: 5,
            scenario_top_k: 4,
            section_top_k: 5,
            fallback_top_k: 3,
            corpus_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. The LLM API
    /// key is deliberately env-only (`NYAYA_LLM_API_KEY`, falling back to
    /// `OPENAI_API_KEY`), never read from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NYAYA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("NYAYA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("NYAYA_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("NYAYA_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
    }

    /// Resolve the LLM API key from the environment.
    #[must_use]
    pub fn api_key() -> Option<String> {
        std::env::var("NYAYA_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
    }

    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}
