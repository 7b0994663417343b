//! Weighted term queries and relevance feedback.

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::lexical::core::posting::PostingsList;
use crate::lexical::index::Index;
use crate::lexical::index::kgram::WILDCARD;

/// One query term and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerm {
    pub term: String,
    pub weight: f64,
}

impl QueryTerm {
    pub fn new<S: Into<String>>(term: S, weight: f64) -> Self {
        QueryTerm {
            term: term.into(),
            weight,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.term.contains(WILDCARD)
    }
}

/// An ordered list of weighted terms. Order only matters for phrase queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    terms: Vec<QueryTerm>,
}

impl Query {
    pub fn new() -> Self {
        Query { terms: Vec::new() }
    }

    /// Split `text` on whitespace into terms of weight 1.
    pub fn parse(text: &str) -> Self {
        Query {
            terms: text
                .split_whitespace()
                .map(|term| QueryTerm::new(term, 1.0))
                .collect(),
        }
    }

    pub fn from_terms(terms: Vec<QueryTerm>) -> Self {
        Query { terms }
    }

    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Manhattan length: the sum of all weights.
    pub fn length(&self) -> f64 {
        self.terms.iter().map(|t| t.weight).sum()
    }

    pub fn add_term<S: Into<String>>(&mut self, term: S, weight: f64) {
        self.terms.push(QueryTerm::new(term, weight));
    }

    pub fn remove_last(&mut self) -> Option<QueryTerm> {
        self.terms.pop()
    }

    pub fn retain<F: FnMut(&QueryTerm) -> bool>(&mut self, keep: F) {
        self.terms.retain(keep);
    }

    pub fn has_wildcards(&self) -> bool {
        self.terms.iter().any(QueryTerm::is_wildcard)
    }

    /// Re-weight the query from the documents a user marked relevant.
    ///
    /// `relevant[i]` flags the `i`-th entry of `results`. With at least one
    /// relevant document, every non-wildcard term is scaled by
    /// `alpha / len()`, and every term of every relevant document gains
    /// `(beta / n) * tf * ln(N / df) / doc_length`. Wildcard terms are
    /// dropped. Returns whether the query changed.
    pub fn relevance_feedback(
        &mut self,
        results: &PostingsList,
        relevant: &[bool],
        index: &dyn Index,
        frequencies: &dyn TermFrequencySource,
        config: &FeedbackConfig,
    ) -> bool {
        let relevant_docs: Vec<_> = results
            .iter()
            .zip(relevant)
            .filter(|(_, flag)| **flag)
            .map(|(entry, _)| entry.doc_id)
            .collect();
        if relevant_docs.is_empty() {
            return false;
        }

        let n = relevant_docs.len() as f64;
        let documents = index.documents();
        let total = documents.len() as f64;
        let alpha = config.alpha;
        let beta = config.beta();
        let original = self.terms.len() as f64;

        let mut terms: Vec<QueryTerm> = Vec::new();
        let mut position: AHashMap<String, usize> = AHashMap::new();
        let mut add = |terms: &mut Vec<QueryTerm>, term: &str, weight: f64| match position.get(term) {
            Some(&i) => terms[i].weight += weight,
            None => {
                position.insert(term.to_string(), terms.len());
                terms.push(QueryTerm::new(term, weight));
            }
        };

        for qt in self.terms.iter().filter(|qt| !qt.is_wildcard()) {
            add(&mut terms, &qt.term, qt.weight * alpha / original);
        }

        for doc_id in relevant_docs {
            let (Some(name), Some(length)) = (documents.name(doc_id), documents.length(doc_id)) else {
                warn!("relevance feedback: no metadata for document {doc_id}");
                continue;
            };
            if length == 0 {
                continue;
            }
            let Some(tf) = frequencies.term_frequencies(name) else {
                warn!("relevance feedback: no term frequencies for {name}");
                continue;
            };
            for (term, count) in tf {
                let df = index.document_frequency(&term);
                if df == 0 {
                    continue;
                }
                let idf = (total / df as f64).ln();
                let weight = (beta / n) * count as f64 * idf / length as f64;
                add(&mut terms, &term, weight);
            }
        }

        debug!(
            "relevance feedback expanded {} terms to {}",
            self.terms.len(),
            terms.len()
        );
        self.terms = terms;
        true
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, qt) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&qt.term)?;
        }
        Ok(())
    }
}

/// Relevance feedback weights: original terms keep `alpha`, feedback terms
/// share `1 - alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub alpha: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig { alpha: 0.1 }
    }
}

impl FeedbackConfig {
    pub fn beta(&self) -> f64 {
        1.0 - self.alpha
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(LexisError::invalid_config(format!(
                "feedback alpha must lie in [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Raw per-document term counts, keyed by document name.
pub trait TermFrequencySource {
    fn term_frequencies(&self, doc_name: &str) -> Option<BTreeMap<String, u32>>;
}

/// In-memory [`TermFrequencySource`] filled while indexing.
#[derive(Debug, Clone, Default)]
pub struct TermFrequencyTable {
    docs: AHashMap<String, BTreeMap<String, u32>>,
}

impl TermFrequencyTable {
    pub fn new() -> Self {
        TermFrequencyTable::default()
    }

    /// Count one occurrence of `term` in `doc_name`.
    pub fn record(&mut self, doc_name: &str, term: &str) {
        if !self.docs.contains_key(doc_name) {
            self.docs.insert(doc_name.to_string(), BTreeMap::new());
        }
        if let Some(counts) = self.docs.get_mut(doc_name) {
            *counts.entry(term.to_string()).or_insert(0) += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl TermFrequencySource for TermFrequencyTable {
    fn term_frequencies(&self, doc_name: &str) -> Option<BTreeMap<String, u32>> {
        self.docs.get(doc_name).cloned()
    }
}
