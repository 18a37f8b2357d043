//! End-to-end query pipeline: classify, retrieve, generate, cite.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nyaya_index::VectorStore;
use nyaya_llm::LlmProvider;

use crate::acts::detect_acts;
use crate::classify::{QueryClassifier, QueryKind, extract_section_token};
use crate::config::RetrievalConfig;
use crate::expand::ConceptExpander;
use crate::respond::{CitationGroup, ResponseAssembler, build_citations};
use crate::retrieve::{Retrieval, Retriever};
use crate::scenario::ScenarioAnalyzer;

const PREVIEW_DOCS: usize = 3;
const PREVIEW_CHARS: usize = 200;

/// Everything one user interaction produces.
#[derive(Clone, Debug)]
pub struct Answer {
    pub analysis: String,
    pub citations: Vec<CitationGroup>,
    pub context_preview: Vec<String>,
    pub retrieval_ms: u128,
    pub generation_ms: u128,
}

/// The per-query pipeline. Stateless across queries; all shared state is
/// immutable after construction.
pub struct Pipeline<P> {
    classifier: QueryClassifier<P>,
    analyzer: ScenarioAnalyzer<P>,
    expander: ConceptExpander<P>,
    retriever: Retriever<P>,
    assembler: ResponseAssembler<P>,
    retrieval: RetrievalConfig,
}

impl<P> std::fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl<P: LlmProvider> Pipeline<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, store: Arc<dyn VectorStore>, retrieval: RetrievalConfig) -> Self {
        let corpus_timeout = Duration::from_secs(retrieval.corpus_timeout_secs);
        Self {
            classifier: QueryClassifier::new(Arc::clone(&provider)),
            analyzer: ScenarioAnalyzer::new(Arc::clone(&provider)),
            expander: ConceptExpander::new(Arc::clone(&provider)),
            retriever: Retriever::new(Arc::clone(&provider), store, corpus_timeout),
            assembler: ResponseAssembler::new(provider),
            retrieval,
        }
    }

    /// Answer a query end to end.
    ///
    /// Never fails: every external-call boundary degrades per its own
    /// policy, and a generation failure surfaces as error text inside the
    /// answer rather than as an `Err`.
    pub async fn answer(&self, query: &str) -> Answer {
        let started = Instant::now();

        let retrieval = self.retrieve(query).await;
        let retrieval_ms = started.elapsed().as_millis();

        let generation_started = Instant::now();
        let analysis = self.assembler.generate(query, &retrieval).await;
        let generation_ms = generation_started.elapsed().as_millis();

        let citations = build_citations(&retrieval, &analysis);
        let context_preview = retrieval
            .documents
            .iter()
            .take(PREVIEW_DOCS)
            .map(|doc| {
                let truncated: String = doc.chars().take(PREVIEW_CHARS).collect();
                if doc.chars().count() > PREVIEW_CHARS {
                    format!("{truncated}...")
                } else {
                    truncated
                }
            })
            .collect();

        Answer {
            analysis,
            citations,
            context_preview,
            retrieval_ms,
            generation_ms,
        }
    }

    /// Pick the retrieval strategy for a query and run it, degrading to
    /// the empty retrieval on hard failure.
    async fn retrieve(&self, query: &str) -> Retrieval {
        let result = match self.classifier.classify(query).await {
            QueryKind::Section => self.retrieve_section(query).await,
            QueryKind::Direct => {
                self.retriever
                    .search(query, &detect_acts(query), self.retrieval.direct_top_k)
                    .await
            }
            QueryKind::Scenario => self.retrieve_scenario(query).await,
        };

        match result {
            Ok(retrieval) => retrieval,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, continuing with empty context");
                Retrieval::default()
            }
        }
    }

    /// Section strategy: exact lookup across all corpora, then semantic
    /// search over the raw query when nothing matched.
    async fn retrieve_section(&self, query: &str) -> anyhow::Result<Retrieval> {
        if let Some(token) = extract_section_token(query) {
            let result = self
                .retriever
                .lookup_section(&token, self.retrieval.section_top_k)
                .await?;
            if !result.is_empty() {
                return Ok(result);
            }
            tracing::debug!(token = %token, "section lookup found nothing, falling back to semantic search");
        }
        self.retriever
            .search(query, &detect_acts(query), self.retrieval.fallback_top_k)
            .await
    }

    /// Scenario strategy: decompose, expand offenses, search with the
    /// joined terms; analysis failure falls back to the raw query text.
    async fn retrieve_scenario(&self, query: &str) -> anyhow::Result<Retrieval> {
        match self.analyzer.analyze(query).await {
            Ok(analysis) => {
                let offenses = analysis.offenses();
                if offenses.is_empty() {
                    return self
                        .retriever
                        .search(query, &analysis.relevant_acts, self.retrieval.scenario_top_k)
                        .await;
                }
                let expanded = self.expander.expand(&offenses).await;
                let acts = if analysis.relevant_acts.is_empty() {
                    detect_acts(query)
                } else {
                    analysis.relevant_acts
                };
                self.retriever
                    .search(&expanded.join(" "), &acts, self.retrieval.scenario_top_k)
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "scenario analysis failed, falling back to direct retrieval");
                self.retriever
                    .search(query, &detect_acts(query), self.retrieval.scenario_top_k)
                    .await
            }
        }
    }
}
