//! Answer generation and act-grouped citation extraction.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use nyaya_llm::{CompletionRequest, LlmProvider};

use crate::chunk::normalize_section;
use crate::retrieve::Retrieval;

/// Shown in place of retrieved context when no corpus produced a hit.
pub const NO_MATCH_SENTINEL: &str = "No matching sections found";

/// One provision surfaced as grounding for the generated answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
    pub section: String,
    pub display: String,
    pub heading: String,
    pub act: String,
}

/// Citations for one act, in retrieval order.
#[derive(Clone, Debug, Default)]
pub struct CitationGroup {
    pub act: String,
    pub citations: Vec<Citation>,
}

static MENTIONED_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:BNS|IPC|CrPC|CPC|BSA)\s+Section\s+(\d+[A-Za-z]?)|Section\s+(\d+[A-Za-z]?)")
        .expect("mention pattern is valid")
});

/// Section numbers (canonical form) the generated text explicitly cites.
#[must_use]
pub fn extract_mentioned_sections(text: &str) -> HashSet<String> {
    MENTIONED_SECTION
        .captures_iter(text)
        .filter_map(|caps| caps.iter().skip(1).flatten().next().map(|m| m.as_str()))
        .map(normalize_section)
        .collect()
}

/// Build act-grouped citations from a retrieval and the generated text.
///
/// An entry is included when the text mentions its section, or when the
/// text mentions no section at all (everything retrieved is shown rather
/// than nothing). Duplicate `(display, heading)` pairs are collapsed;
/// group order and in-group order are first-seen.
#[must_use]
pub fn build_citations(retrieval: &Retrieval, analysis_text: &str) -> Vec<CitationGroup> {
    let mentioned = extract_mentioned_sections(analysis_text);
    let mut groups: Vec<CitationGroup> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for meta in &retrieval.provisions {
        let section = normalize_section(&meta.section);
        if !mentioned.is_empty() && !mentioned.contains(&section) {
            continue;
        }
        if !seen.insert((meta.section_display.clone(), meta.heading.clone())) {
            continue;
        }

        let citation = Citation {
            section,
            display: meta.section_display.clone(),
            heading: meta.heading.clone(),
            act: meta.act.clone(),
        };

        match groups.iter_mut().find(|g| g.act == meta.act) {
            Some(group) => group.citations.push(citation),
            None => groups.push(CitationGroup {
                act: meta.act.clone(),
                citations: vec![citation],
            }),
        }
    }

    groups
}

/// Generates the legal analysis text from the retrieved context.
#[derive(Debug)]
pub struct ResponseAssembler<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> ResponseAssembler<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// The context window handed to the generation model: all retrieved
    /// documents joined by blank lines, or the no-match sentinel.
    #[must_use]
    pub fn build_context(retrieval: &Retrieval) -> String {
        if retrieval.is_empty() {
            NO_MATCH_SENTINEL.to_owned()
        } else {
            retrieval.documents.join("\n\n")
        }
    }

    /// Generate the analysis text for a query over the retrieved context.
    ///
    /// Infallible: a generation failure yields a user-visible error
    /// string so the caller can still render citations.
    pub async fn generate(&self, query: &str, retrieval: &Retrieval) -> String {
        let context = Self::build_context(retrieval);
        let system = format!(
            "You are a multi-act legal expert. Analyze using provisions from BNS, IPC, CrPC, CPC, and BSA.\n\
             \n\
             Structure responses as:\n\
             1. Applicable Sections (mention which act they belong to)\n\
             2. Key Elements\n\
             3. Potential Defenses\n\
             \n\
             Context:\n\
             {context}"
        );
        let request = CompletionRequest::new(system, query).temperature(0.1);

        match self.provider.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "response generation failed");
                format!("Error generating response: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::ProvisionMeta;
    use nyaya_llm::mock::MockProvider;

    fn meta(section: &str, heading: &str, act: &str) -> ProvisionMeta {
        ProvisionMeta {
            section: section.to_owned(),
            section_display: format!("Section {section}"),
            heading: heading.to_owned(),
            chapter: String::new(),
            act: act.to_owned(),
        }
    }

    fn retrieval(entries: &[(&str, &str, &str)]) -> Retrieval {
        let mut r = Retrieval::default();
        for (section, heading, act) in entries {
            r.documents.push(format!("{act} Section {section}: {heading}"));
            r.provisions.push(meta(section, heading, act));
        }
        r
    }

    #[test]
    fn mention_extraction_handles_prefixed_and_bare_forms() {
        let mentioned =
            extract_mentioned_sections("Under BNS Section 302 and Section 45, read with IPC Section 378...");
        assert!(mentioned.contains("302"));
        assert!(mentioned.contains("045"));
        assert!(mentioned.contains("378"));
        assert_eq!(mentioned.len(), 3);
    }

    #[test]
    fn mention_extraction_empty_text() {
        assert!(extract_mentioned_sections("no citations here").is_empty());
    }

    #[test]
    fn no_mentions_includes_everything_retrieved() {
        let r = retrieval(&[("302", "Snatching", "BNS"), ("378", "Theft", "IPC")]);
        let groups = build_citations(&r, "general commentary");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].act, "BNS");
        assert_eq!(groups[1].act, "IPC");
    }

    #[test]
    fn mentions_filter_unmentioned_entries() {
        let r = retrieval(&[("302", "Snatching", "BNS"), ("378", "Theft", "IPC")]);
        let groups = build_citations(&r, "Only BNS Section 302 applies here.");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].citations[0].heading, "Snatching");
    }

    #[test]
    fn mention_matching_normalizes_padding() {
        let r = retrieval(&[("045", "Opinion of experts", "BSA")]);
        let groups = build_citations(&r, "See Section 45 of the evidence act.");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].citations[0].section, "045");
    }

    #[test]
    fn duplicate_display_heading_pairs_collapse() {
        let r = retrieval(&[
            ("302", "Snatching", "BNS"),
            ("302", "Snatching", "BNS"),
            ("302", "Murder", "IPC"),
        ]);
        let groups = build_citations(&r, "");
        let total: usize = groups.iter().map(|g| g.citations.len()).sum();
        assert_eq!(total, 2);
        for group in &groups {
            let mut pairs: Vec<_> = group
                .citations
                .iter()
                .map(|c| (c.display.clone(), c.heading.clone()))
                .collect();
            let before = pairs.len();
            pairs.dedup();
            assert_eq!(pairs.len(), before);
        }
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let r = retrieval(&[
            ("1", "A", "CrPC"),
            ("2", "B", "BNS"),
            ("3", "C", "CrPC"),
        ]);
        let groups = build_citations(&r, "");
        assert_eq!(groups[0].act, "CrPC");
        assert_eq!(groups[1].act, "BNS");
        assert_eq!(groups[0].citations.len(), 2);
    }

    #[test]
    fn context_joins_documents_with_blank_lines() {
        let r = retrieval(&[("302", "Snatching", "BNS"), ("378", "Theft", "IPC")]);
        let context = ResponseAssembler::<MockProvider>::build_context(&r);
        assert_eq!(
            context,
            "BNS Section 302: Snatching\n\nIPC Section 378: Theft"
        );
    }

    #[test]
    fn empty_retrieval_uses_sentinel_context() {
        let context = ResponseAssembler::<MockProvider>::build_context(&Retrieval::default());
        assert_eq!(context, NO_MATCH_SENTINEL);
    }

    #[tokio::test]
    async fn generation_failure_yields_visible_error_text() {
        let assembler = ResponseAssembler::new(Arc::new(MockProvider::failing()));
        let text = assembler.generate("query", &Retrieval::default()).await;
        assert!(text.starts_with("Error generating response:"));
    }

    #[tokio::test]
    async fn generation_returns_model_text() {
        let assembler = ResponseAssembler::new(Arc::new(MockProvider::with_responses(vec![
            "1. Applicable Sections...".into(),
        ])));
        let r = retrieval(&[("302", "Snatching", "BNS")]);
        let text = assembler.generate("query", &r).await;
        assert_eq!(text, "1. Applicable Sections...");
    }
}
