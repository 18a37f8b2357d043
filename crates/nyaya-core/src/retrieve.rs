//! Multi-corpus retrieval: embed once, fan out per corpus, merge in
//! canonical act order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use nyaya_index::VectorStore;
use nyaya_llm::LlmProvider;

use crate::acts::Act;
use crate::chunk::normalize_section;

/// Display metadata of one retrieved provision. Every field is present,
/// defaulting to empty, so callers never probe for missing keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisionMeta {
    pub section: String,
    pub section_display: String,
    pub heading: String,
    pub chapter: String,
    pub act: String,
}

impl ProvisionMeta {
    fn from_payload(payload: &HashMap<String, serde_json::Value>) -> Self {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };
        let section = field("section");
        let mut section_display = field("section_display");
        if section_display.is_empty() {
            section_display = format!("Section {section}");
        }
        Self {
            section,
            section_display,
            heading: field("heading"),
            chapter: field("chapter"),
            act: field("act"),
        }
    }
}

/// Parallel documents and metadata, always the same length and
/// index-aligned. Produced fresh per query, never persisted.
#[derive(Clone, Debug, Default)]
pub struct Retrieval {
    pub documents: Vec<String>,
    pub provisions: Vec<ProvisionMeta>,
}

impl Retrieval {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    fn push(&mut self, document: String, meta: ProvisionMeta) {
        self.documents.push(document);
        self.provisions.push(meta);
    }
}

/// Fans a single query vector out across per-corpus vector indexes.
pub struct Retriever<P> {
    embedder: Arc<P>,
    store: Arc<dyn VectorStore>,
    corpus_timeout: Duration,
}

impl<P> std::fmt::Debug for Retriever<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("corpus_timeout", &self.corpus_timeout)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(embedder: Arc<P>, store: Arc<dyn VectorStore>, corpus_timeout: Duration) -> Self {
        Self {
            embedder,
            store,
            corpus_timeout,
        }
    }

    /// Search the given corpora for the search key's nearest provisions.
    ///
    /// The key is embedded once and the per-corpus index queries run
    /// concurrently under a bounded timeout. A corpus that fails or times
    /// out contributes zero hits; results merge in `acts` iteration order
    /// regardless of completion order, documents and metadata staying
    /// aligned. All corpora failing yields an empty retrieval, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error only if embedding the search key fails: the query
    /// vector is shared across corpora, so there is no per-corpus
    /// fallback for it.
    pub async fn search(
        &self,
        key: &str,
        acts: &[Act],
        top_k: u64,
    ) -> anyhow::Result<Retrieval> {
        let vector = self
            .embedder
            .embed(key)
            .await
            .context("failed to embed search key")?;

        let searches = acts.iter().map(|act| {
            let vector = vector.clone();
            let store = Arc::clone(&self.store);
            async move {
                tokio::time::timeout(
                    self.corpus_timeout,
                    store.search(act.index_name(), vector, top_k),
                )
                .await
            }
        });

        let mut retrieval = Retrieval::default();
        for (act, outcome) in acts.iter().zip(futures::future::join_all(searches).await) {
            let hits = match outcome {
                Ok(Ok(hits)) => hits,
                Ok(Err(e)) => {
                    tracing::warn!(index = act.index_name(), error = %e, "corpus search failed");
                    continue;
                }
                Err(_) => {
                    tracing::warn!(index = act.index_name(), "corpus search timed out");
                    continue;
                }
            };

            for hit in hits {
                let Some(document) = hit
                    .payload
                    .get("document")
                    .and_then(serde_json::Value::as_str)
                    .filter(|d| !d.is_empty())
                else {
                    continue;
                };
                retrieval.push(document.to_owned(), ProvisionMeta::from_payload(&hit.payload));
            }
        }

        debug_assert_eq!(retrieval.documents.len(), retrieval.provisions.len());
        Ok(retrieval)
    }

    /// Exact-lookup-biased resolution of a "section N" query: searches
    /// every corpus with the synthetic key `"Section {n}"` built from the
    /// canonical section form. An empty result means the caller should
    /// fall back to semantic search over the original query text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the synthetic key fails.
    pub async fn lookup_section(&self, token: &str, top_k: u64) -> anyhow::Result<Retrieval> {
        let section = normalize_section(token);
        self.search(&format!("Section {section}"), &Act::ALL, top_k)
            .await
    }
}
