//! The fixed registry of statute corpora and keyword-based act detection.

use serde::{Deserialize, Serialize};

/// One of the five statute corpora, each backed by its own vector index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Act {
    /// Bharatiya Nyaya Sanhita, 2023.
    Bns,
    /// Indian Penal Code, 1860.
    Ipc,
    /// Code of Criminal Procedure.
    Crpc,
    /// Code of Civil Procedure.
    Cpc,
    /// Bharatiya Sakshya Adhiniyam (evidence).
    Bsa,
}

impl Act {
    /// Every corpus, in canonical iteration order. Retrieval merges and
    /// citation grouping follow this order, never completion order.
    pub const ALL: [Act; 5] = [Act::Bns, Act::Ipc, Act::Crpc, Act::Cpc, Act::Bsa];

    /// Display prefix used in chunk text and citations.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Act::Bns => "BNS",
            Act::Ipc => "IPC",
            Act::Crpc => "CrPC",
            Act::Cpc => "CPC",
            Act::Bsa => "BSA",
        }
    }

    /// Name of this corpus's vector index.
    #[must_use]
    pub const fn index_name(self) -> &'static str {
        match self {
            Act::Bns => "bns_sections",
            Act::Ipc => "ipc_sections",
            Act::Crpc => "crpc_sections",
            Act::Cpc => "cpc_sections",
            Act::Bsa => "bsa_sections",
        }
    }

    /// Name variants, synonyms, and era markers that flag this corpus as
    /// relevant to a query.
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Act::Bns => &["bns", "nyaya", "sanhita", "bharatiya", "new code", "2023"],
            Act::Ipc => &["ipc", "indian penal", "penal code", "old code", "1860"],
            Act::Crpc => &[
                "crpc",
                "criminal procedure",
                "procedure code",
                "bail",
                "arrest",
                "trial",
            ],
            Act::Cpc => &[
                "cpc",
                "civil procedure",
                "civil code",
                "suit",
                "plaint",
                "decree",
            ],
            Act::Bsa => &[
                "bsa",
                "evidence",
                "evidence act",
                "proof",
                "witness",
                "exhibit",
            ],
        }
    }

    /// Parse a stored payload value (`"BNS"`, `"bns"`, ...) back to an act.
    #[must_use]
    pub fn parse(s: &str) -> Option<Act> {
        match s.to_ascii_lowercase().as_str() {
            "bns" => Some(Act::Bns),
            "ipc" => Some(Act::Ipc),
            "crpc" => Some(Act::Crpc),
            "cpc" => Some(Act::Cpc),
            "bsa" => Some(Act::Bsa),
            _ => None,
        }
    }
}

impl std::fmt::Display for Act {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Detect which corpora a query is about by case-insensitive keyword match.
///
/// A query that names no corpus returns the full set: a broad search beats
/// no search.
#[must_use]
pub fn detect_acts(query: &str) -> Vec<Act> {
    let query_lower = query.to_lowercase();

    let detected: Vec<Act> = Act::ALL
        .into_iter()
        .filter(|act| act.keywords().iter().any(|kw| query_lower.contains(kw)))
        .collect();

    if detected.is_empty() {
        Act::ALL.to_vec()
    } else {
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keyword_returns_all_five() {
        let acts = detect_acts("what happens when somebody is wronged");
        assert_eq!(acts, Act::ALL.to_vec());
    }

    #[test]
    fn single_keyword_includes_that_act() {
        let acts = detect_acts("can I get bail before the hearing?");
        assert!(acts.contains(&Act::Crpc));
        assert!(!acts.contains(&Act::Bns));
    }

    #[test]
    fn detection_is_case_insensitive() {
        let acts = detect_acts("Explain theft in BNS");
        assert!(acts.contains(&Act::Bns));
    }

    #[test]
    fn multiple_keywords_return_multiple_acts() {
        let acts = detect_acts("is a witness statement enough for arrest");
        assert!(acts.contains(&Act::Crpc));
        assert!(acts.contains(&Act::Bsa));
    }

    #[test]
    fn detection_preserves_canonical_order() {
        let acts = detect_acts("evidence rules for a civil suit under the old code");
        let mut sorted = acts.clone();
        sorted.sort();
        assert_eq!(acts, sorted);
    }

    #[test]
    fn parse_round_trips_prefix() {
        for act in Act::ALL {
            assert_eq!(Act::parse(act.prefix()), Some(act));
        }
        assert_eq!(Act::parse("unknown"), None);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Act::Crpc).unwrap(), "\"crpc\"");
        let act: Act = serde_json::from_str("\"bsa\"").unwrap();
        assert_eq!(act, Act::Bsa);
    }
}
