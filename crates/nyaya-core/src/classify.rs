//! Query intent classification: section lookup, direct question, or
//! fact-pattern scenario.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use nyaya_llm::{CompletionRequest, LlmProvider};

/// The retrieval strategy a query should take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Explicit section-number reference; resolved by exact lookup.
    Section,
    /// Definitional question; resolved by direct semantic search.
    Direct,
    /// Fact pattern requiring issue-spotting and decomposition.
    Scenario,
}

static SECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"section\s+\d+",
        r"sec\.?\s*\d+",
        r"§\s*\d+",
        r"\b\d+\s+of\s+(bns|ipc|crpc|cpc|bsa)",
        r"(bns|ipc|crpc|cpc|bsa)\s+section\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("section patterns are valid"))
    .collect()
});

static SECTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:section|sec\.?|§)\s*(\d+[a-z]?)|\b(\d+[a-z]?)\s+of\s+(?:bns|ipc|crpc|cpc|bsa)|^(\d+[a-z]?)$")
        .expect("section token pattern is valid")
});

/// Whether the query contains an explicit section-number reference.
#[must_use]
pub fn is_section_query(query: &str) -> bool {
    let query_lower = query.to_lowercase();
    SECTION_PATTERNS.iter().any(|p| p.is_match(&query_lower))
}

/// Pull the raw section token (digits with optional letter suffix) out of
/// a section-style query. Returns `None` when the query carries none.
#[must_use]
pub fn extract_section_token(query: &str) -> Option<String> {
    let query_lower = query.trim().to_lowercase();
    let caps = SECTION_TOKEN.captures(&query_lower)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().to_owned())
}

const CLASSIFIER_PROMPT: &str = "Classify the user's legal query as exactly one of 'direct', \
'scenario', or 'section'. Reply with the label only.\n\
\n\
Direct queries:\n\
- \"Explain theft in BNS\"\n\
- \"Definition of murder in IPC\"\n\
- \"What is evidence under BSA\"\n\
\n\
Scenario queries:\n\
- \"A mob vandalized property during protest\"\n\
- \"My neighbor stole my bike and sold it\"\n\
- \"Someone committed fraud in business contract\"\n\
\n\
Section queries:\n\
- \"Explain Section 302 of BNS\"\n\
- \"What is IPC section 378\"\n\
- \"BSA section 45 meaning\"";

/// Decides which retrieval strategy a query takes.
///
/// Section references short-circuit without a model call; everything else
/// goes through one temperature-0 classification call.
#[derive(Debug)]
pub struct QueryClassifier<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> QueryClassifier<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Classify a query. Infallible: an unreachable model or an
    /// unrecognized label falls back to [`QueryKind::Scenario`], the
    /// broadest retrieval path.
    pub async fn classify(&self, query: &str) -> QueryKind {
        if is_section_query(query) {
            return QueryKind::Section;
        }

        let request = CompletionRequest::new(CLASSIFIER_PROMPT, query).temperature(0.0);
        match self.provider.complete(&request).await {
            Ok(label) => match label.trim().to_lowercase().as_str() {
                "direct" => QueryKind::Direct,
                "scenario" => QueryKind::Scenario,
                "section" => QueryKind::Section,
                other => {
                    tracing::warn!(label = other, "unrecognized classifier label, treating as scenario");
                    QueryKind::Scenario
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "query classification failed, treating as scenario");
                QueryKind::Scenario
            }
        }
    }
}
