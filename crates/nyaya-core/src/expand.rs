//! Offense-term expansion into legal synonyms.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use nyaya_llm::{CompletionRequest, LlmProvider};

static OFFENSE_CACHE: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        HashMap::from([
            ("theft", &["larceny", "stealing"] as &[&str]),
            ("riot", &["unlawful assembly", "mob violence"]),
        ])
    });

/// Expands offense names with legal synonyms: static cache first, one
/// model call per cache miss.
#[derive(Debug)]
pub struct ConceptExpander<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> ConceptExpander<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Expand a list of offense terms into a deduplicated superset.
    ///
    /// Every input term is kept verbatim; a failed expansion keeps that
    /// term alone and never aborts the rest.
    pub async fn expand(&self, offenses: &[String]) -> Vec<String> {
        fn push_unique(term: String, out: &mut Vec<String>) {
            if !term.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(&term)) {
                out.push(term);
            }
        }

        let mut expanded: Vec<String> = Vec::new();

        for offense in offenses {
            push_unique(offense.clone(), &mut expanded);
        }

        for offense in offenses {
            let offense_lower = offense.to_lowercase();
            if let Some(synonyms) = OFFENSE_CACHE.get(offense_lower.as_str()) {
                for s in *synonyms {
                    push_unique((*s).to_owned(), &mut expanded);
                }
                continue;
            }

            let request = CompletionRequest::new(
                format!("Generate 2-3 alternative legal terms for '{offense}', one per line."),
                offense.clone(),
            )
            .temperature(0.5)
            .max_tokens(30);

            match self.provider.complete(&request).await {
                Ok(body) => {
                    for line in body.lines() {
                        let term = line
                            .trim()
                            .trim_start_matches(['-', '*', '•'])
                            .trim()
                            .trim_matches('"')
                            .trim();
                        push_unique(term.to_owned(), &mut expanded);
                    }
                }
                Err(e) => {
                    tracing::warn!(offense = %offense, error = %e, "offense expansion failed, keeping original term");
                }
            }
        }

        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_llm::mock::MockProvider;

    fn terms(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn cache_hit_makes_no_model_call() {
        let mock = Arc::new(MockProvider::default());
        let expander = ConceptExpander::new(Arc::clone(&mock));
        let expanded = expander.expand(&terms(&["theft"])).await;
        assert_eq!(expanded, terms(&["theft", "larceny", "stealing"]));
        assert_eq!(mock.completion_calls(), 0);
    }

    #[tokio::test]
    async fn cache_lookup_is_case_insensitive() {
        let expander = ConceptExpander::new(Arc::new(MockProvider::default()));
        let expanded = expander.expand(&terms(&["Riot"])).await;
        assert!(expanded.contains(&"unlawful assembly".to_owned()));
        assert!(expanded.contains(&"mob violence".to_owned()));
    }

    #[tokio::test]
    async fn cache_miss_parses_model_lines() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            "- \"cheating\"\nfraudulent inducement\n".into(),
        ]));
        let expander = ConceptExpander::new(mock);
        let expanded = expander.expand(&terms(&["fraud"])).await;
        assert_eq!(
            expanded,
            terms(&["fraud", "cheating", "fraudulent inducement"])
        );
    }

    #[tokio::test]
    async fn output_is_superset_of_input_under_total_failure() {
        let expander = ConceptExpander::new(Arc::new(MockProvider::failing()));
        let input = terms(&["fraud", "criminal breach of trust"]);
        let expanded = expander.expand(&input).await;
        for term in &input {
            assert!(expanded.contains(term));
        }
        assert_eq!(expanded.len(), input.len());
    }

    #[tokio::test]
    async fn duplicates_are_collapsed() {
        let mock = Arc::new(MockProvider::with_responses(vec!["Fraud\ncheating".into()]));
        let expander = ConceptExpander::new(mock);
        let expanded = expander.expand(&terms(&["fraud"])).await;
        assert_eq!(expanded, terms(&["fraud", "cheating"]));
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let expander = ConceptExpander::new(Arc::new(MockProvider::default()));
        assert!(expander.expand(&[]).await.is_empty());
    }
}
