//! Fact-pattern decomposition into a structured offense breakdown.

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use nyaya_llm::{CompletionRequest, LlmProvider};

use crate::acts::{Act, detect_acts};

/// Structured breakdown of a scenario query. All fields default to empty
/// so downstream code never probes for missing keys.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScenarioAnalysis {
    #[serde(default)]
    pub primary_offense: String,
    #[serde(default)]
    pub related_offenses: Vec<String>,
    #[serde(default)]
    pub relevant_acts: Vec<Act>,
    #[serde(default)]
    pub key_elements: Vec<String>,
}

impl ScenarioAnalysis {
    /// Primary offense plus related offenses, in that order.
    #[must_use]
    pub fn offenses(&self) -> Vec<String> {
        let mut offenses = Vec::with_capacity(1 + self.related_offenses.len());
        if !self.primary_offense.is_empty() {
            offenses.push(self.primary_offense.clone());
        }
        offenses.extend(self.related_offenses.iter().cloned());
        offenses
    }
}

const SCENARIO_PROMPT: &str = "Analyze this legal scenario and suggest:\n\
1. PRIMARY criminal/civil offense (most serious applicable)\n\
2. RELATED offenses (other applicable charges)\n\
3. RELEVANT LEGAL ACTS (bns/ipc/crpc/cpc/bsa)\n\
4. KEY ELEMENTS needed to prove the case\n\
\n\
Output JSON format:\n\
{\n\
    \"primary_offense\": \"...\",\n\
    \"related_offenses\": [\"...\", \"...\"],\n\
    \"relevant_acts\": [\"bns\", \"ipc\"],\n\
    \"key_elements\": [\"...\", \"...\"]\n\
}";

/// Some JSON-mode transports still wrap the body in a markdown fence.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Decomposes a scenario query via one JSON-constrained model call.
#[derive(Debug)]
pub struct ScenarioAnalyzer<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> ScenarioAnalyzer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Analyze a scenario into offenses, acts, and key elements.
    ///
    /// An empty `relevant_acts` in the model output is filled in by
    /// keyword detection over the raw scenario text.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or its output is not the
    /// requested JSON shape; the caller falls back to direct retrieval.
    pub async fn analyze(&self, scenario: &str) -> anyhow::Result<ScenarioAnalysis> {
        let request = CompletionRequest::new(SCENARIO_PROMPT, scenario)
            .temperature(0.3)
            .json_object();

        let body = self
            .provider
            .complete(&request)
            .await
            .context("scenario analysis call failed")?;

        let mut analysis: ScenarioAnalysis = serde_json::from_str(strip_code_fences(&body))
            .context("scenario analysis returned malformed JSON")?;

        if analysis.relevant_acts.is_empty() {
            analysis.relevant_acts = detect_acts(scenario);
        }

        Ok(analysis)
    }
}
