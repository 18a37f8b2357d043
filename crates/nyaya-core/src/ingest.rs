//! Offline ingestion: embed provision chunks and upsert them into the
//! per-corpus indexes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use nyaya_index::{VectorPoint, VectorStore};
use nyaya_llm::LlmProvider;

use crate::acts::Act;
use crate::chunk::{ProvisionChunk, load_chunks};

const BATCH_SIZE: usize = 50;

/// Summary of one act's ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks: usize,
    pub batches: usize,
}

/// Embeds chunks and writes them to the vector store.
pub struct Ingestor<P> {
    embedder: Arc<P>,
    store: Arc<dyn VectorStore>,
    dimension: u64,
}

impl<P> std::fmt::Debug for Ingestor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// The stored payload for one chunk: display metadata plus the document
/// text itself, which retrieval reads back out.
fn chunk_payload(act: Act, chunk: &ProvisionChunk) -> HashMap<String, serde_json::Value> {
    HashMap::from([
        ("section".to_owned(), serde_json::json!(chunk.section)),
        (
            "section_display".to_owned(),
            serde_json::json!(chunk.section_display),
        ),
        ("heading".to_owned(), serde_json::json!(chunk.heading)),
        ("chapter".to_owned(), serde_json::json!(chunk.chapter)),
        ("act".to_owned(), serde_json::json!(act.prefix())),
        ("document".to_owned(), serde_json::json!(chunk.content)),
    ])
}

impl<P: LlmProvider> Ingestor<P> {
    #[must_use]
    pub fn new(embedder: Arc<P>, store: Arc<dyn VectorStore>, dimension: u64) -> Self {
        Self {
            embedder,
            store,
            dimension,
        }
    }

    /// Create every corpus index that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store cannot be reached.
    pub async fn provision_indexes(&self) -> anyhow::Result<()> {
        for act in Act::ALL {
            self.store
                .ensure_collection(act.index_name(), self.dimension)
                .await
                .with_context(|| format!("failed to provision index {}", act.index_name()))?;
            tracing::info!(index = act.index_name(), "index ready");
        }
        Ok(())
    }

    /// Ingest one act's chunk file: embed every chunk's content and
    /// upsert in batches with fresh UUID point ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, an embedding call
    /// fails, or an upsert fails. Ingestion is offline tooling, so unlike
    /// retrieval it fails loudly instead of degrading.
    pub async fn ingest_act(&self, act: Act, path: &Path) -> anyhow::Result<IngestReport> {
        let chunks = load_chunks(path, act)?;
        tracing::info!(act = %act, chunks = chunks.len(), "embedding chunks");

        let mut batches = 0_usize;
        let mut batch: Vec<VectorPoint> = Vec::with_capacity(BATCH_SIZE);

        for chunk in &chunks {
            let vector = self
                .embedder
                .embed(&chunk.content)
                .await
                .with_context(|| format!("failed to embed chunk {}", chunk.id))?;

            batch.push(VectorPoint {
                id: uuid::Uuid::new_v4().to_string(),
                vector,
                payload: chunk_payload(act, chunk),
            });

            if batch.len() >= BATCH_SIZE {
                self.flush(act, std::mem::take(&mut batch)).await?;
                batches += 1;
            }
        }

        if !batch.is_empty() {
            self.flush(act, batch).await?;
            batches += 1;
        }

        Ok(IngestReport {
            chunks: chunks.len(),
            batches,
        })
    }

    async fn flush(&self, act: Act, batch: Vec<VectorPoint>) -> anyhow::Result<()> {
        self.store
            .upsert(act.index_name(), batch)
            .await
            .with_context(|| format!("failed to upsert into {}", act.index_name()))?;
        Ok(())
    }
}
