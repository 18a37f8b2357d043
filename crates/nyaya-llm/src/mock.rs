//! Test-only mock LLM provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::provider::{CompletionRequest, LlmProvider};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    completions: Arc<AtomicUsize>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    pub hashed_embeddings: bool,
    pub fail_complete: bool,
    pub fail_embed: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            completions: Arc::new(AtomicUsize::new(0)),
            default_response: "mock response".into(),
            embedding: vec![0.0; 8],
            hashed_embeddings: false,
            fail_complete: false,
            fail_embed: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_complete: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_hashed_embeddings(mut self) -> Self {
        self.hashed_embeddings = true;
        self
    }

    /// Number of `complete` calls made so far.
    #[must_use]
    pub fn completion_calls(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    /// Deterministic text-dependent embedding, so identical texts embed to
    /// identical vectors and different texts (almost always) do not.
    #[must_use]
    pub fn embedding_for(text: &str) -> Vec<f32> {
        let mut v = vec![1.0_f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[i % 8] += f32::from(b) * (1.0 + (i as f32) / 97.0);
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.into_iter().map(|x| x / norm).collect()
    }
}

impl LlmProvider for MockProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, crate::LlmError> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        if self.fail_complete {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        if self.fail_embed {
            return Err(crate::LlmError::Other("mock embed error".into()));
        }
        if self.hashed_embeddings {
            Ok(Self::embedding_for(text))
        } else {
            Ok(self.embedding.clone())
        }
    }

    fn supports_embeddings(&self) -> bool {
        !self.fail_embed
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
