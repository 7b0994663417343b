//! K-gram based spelling corrector.

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::lexical::core::posting::{PostingsList, QueryType};
use crate::lexical::index::Index;
use crate::lexical::index::kgram::{KGramIndex, TermId};
use crate::lexical::query::Query;
use crate::lexical::search::searcher::{RankingType, Searcher};
use crate::util::combinations::RankedProduct;
use crate::util::levenshtein::spelling_distance;

/// Acceptance thresholds for correction candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellingConfig {
    /// Minimum Jaccard coefficient of k-gram sets.
    pub jaccard_threshold: f64,
    /// Maximum edit distance, with substitutions costing 2.
    pub max_edit_distance: usize,
    /// Upper bound on query combinations tried per check.
    pub max_combinations: usize,
}

impl Default for SpellingConfig {
    fn default() -> Self {
        SpellingConfig {
            jaccard_threshold: 0.4,
            max_edit_distance: 2,
            max_combinations: 10_000,
        }
    }
}

impl SpellingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(LexisError::invalid_config(format!(
                "jaccard_threshold must lie in [0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        if self.max_combinations == 0 {
            return Err(LexisError::invalid_config("max_combinations must be positive"));
        }
        Ok(())
    }
}

/// One correction candidate for a single term. Lower scores are better.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub term: String,
    pub score: f64,
    pub edit_distance: usize,
    pub jaccard: f64,
}

impl Candidate {
    /// A term that is already indexed.
    fn exact(term: &str) -> Self {
        Candidate {
            term: term.to_string(),
            score: 0.0,
            edit_distance: 0,
            jaccard: 1.0,
        }
    }
}

/// Jaccard coefficient of two sets of sizes `size_a` and `size_b` sharing
/// `overlap` elements.
pub fn jaccard(size_a: usize, size_b: usize, overlap: usize) -> f64 {
    let union = size_a + size_b - overlap;
    if union == 0 {
        return 0.0;
    }
    overlap as f64 / union as f64
}

#[derive(Debug, Clone, Copy)]
pub struct SpellChecker<'a> {
    index: &'a dyn Index,
    kgram: &'a KGramIndex,
    config: SpellingConfig,
}

impl<'a> SpellChecker<'a> {
    pub fn new(index: &'a dyn Index, kgram: &'a KGramIndex, config: SpellingConfig) -> Self {
        SpellChecker {
            index,
            kgram,
            config,
        }
    }

    /// Number of k-grams of the bracketed form of a term with `chars` characters.
    fn kgram_count(&self, chars: usize) -> usize {
        (chars + 3).saturating_sub(self.kgram.k())
    }

    /// Candidates for `term`, best first; ties ordered by term.
    ///
    /// An indexed term is its own only candidate.
    pub fn candidates(&self, term: &str) -> Vec<Candidate> {
        if self.index.get_postings(term).is_some() {
            return vec![Candidate::exact(term)];
        }

        // Repeated k-grams count once per occurrence, as in the set sizes.
        let mut overlap: AHashMap<TermId, usize> = AHashMap::new();
        for kgram in self.kgram.kgrams_of(term) {
            if let Some(ids) = self.kgram.get_postings(&kgram) {
                for id in ids {
                    *overlap.entry(*id).or_insert(0) += 1;
                }
            }
        }

        let size_a = self.kgram_count(term.chars().count());
        let mut candidates: Vec<Candidate> = overlap
            .into_iter()
            .filter_map(|(id, shared)| {
                let candidate = self.kgram.term_of(id)?;
                let size_b = self.kgram_count(candidate.chars().count());
                let jaccard = jaccard(size_a, size_b, shared);
                if jaccard < self.config.jaccard_threshold {
                    return None;
                }
                let edit_distance = spelling_distance(term, candidate);
                if edit_distance > self.config.max_edit_distance {
                    return None;
                }
                Some(Candidate {
                    term: candidate.to_string(),
                    score: edit_distance as f64 - jaccard,
                    edit_distance,
                    jaccard,
                })
            })
            .collect();

        candidates.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.term.cmp(&b.term)));
        debug!("{} spelling candidates for {term:?}", candidates.len());
        candidates
    }

    /// Up to `limit` corrected queries, padded with empty strings to `limit`.
    ///
    /// Combinations of per-term candidates are tried in ascending total
    /// score. Those retrieving at least one document by intersection are
    /// kept and finally ordered by how many documents they retrieve.
    pub fn check(&self, query: &Query, limit: usize) -> Result<Vec<String>> {
        let per_term: Vec<Vec<Candidate>> = query
            .terms()
            .iter()
            .map(|qt| self.candidates(&qt.term))
            .collect();
        let scores = per_term
            .iter()
            .map(|candidates| candidates.iter().map(|c| c.score).collect())
            .collect();

        let searcher = Searcher::new(self.index);
        let mut accepted: Vec<(String, usize)> = Vec::new();
        for (indices, _) in RankedProduct::new(scores).take(self.config.max_combinations) {
            if accepted.len() >= limit {
                break;
            }
            let terms: Vec<&str> = indices
                .iter()
                .zip(&per_term)
                .map(|(&i, candidates)| candidates[i].term.as_str())
                .collect();
            let corrected = Query::parse(&terms.join(" "));
            let hits = searcher
                .search(&corrected, QueryType::Intersection, RankingType::default())?
                .as_ref()
                .map(PostingsList::len)
                .unwrap_or(0);
            if hits > 0 {
                accepted.push((corrected.to_string(), hits));
            }
        }

        // Stable, so equally productive corrections keep their score order.
        accepted.sort_by(|a, b| b.1.cmp(&a.1));
        let mut result: Vec<String> = accepted.into_iter().map(|(text, _)| text).collect();
        result.resize(limit, String::new());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::core::posting::DocId;
    use crate::lexical::index::memory::HashedIndex;

    fn build(docs: &[&str]) -> (HashedIndex, KGramIndex) {
        let mut index = HashedIndex::new();
        let mut kgram = KGramIndex::new(2).unwrap();
        for (doc, text) in docs.iter().enumerate() {
            let doc = doc as DocId;
            index.documents_mut().register(doc, format!("d{doc}"));
            for (offset, term) in text.split_whitespace().enumerate() {
                index.insert(term, doc, offset as u32).unwrap();
                kgram.insert(term);
            }
        }
        (index, kgram)
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(6, 6, 4), 0.5);
        assert_eq!(jaccard(3, 3, 3), 1.0);
        assert_eq!(jaccard(0, 0, 0), 0.0);
    }

    #[test]
    fn test_candidates_for_misspelling() {
        let (index, kgram) = build(&["hello", "hallo", "hullo", "help"]);
        let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
        let candidates = checker.candidates("hxllo");
        let terms: Vec<&str> = candidates.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["hallo", "hello", "hullo"]);
        for c in &candidates {
            assert_eq!(c.edit_distance, 2);
            assert_eq!(c.jaccard, 0.5);
            assert_eq!(c.score, 1.5);
        }
    }

    #[test]
    fn test_repeated_kgrams_count_per_occurrence() {
        let (index, kgram) = build(&["banana"]);
        let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
        // "$bananna$" has 8 bigrams, "an" and "na" twice each; 7 occur in "banana".
        let candidates = checker.candidates("bananna");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].term, "banana");
        assert_eq!(candidates[0].edit_distance, 1);
        assert_eq!(candidates[0].jaccard, 7.0 / 8.0);
    }

    #[test]
    fn test_known_term_is_its_own_candidate() {
        let (index, kgram) = build(&["hello"]);
        let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
        assert_eq!(checker.candidates("hello"), vec![Candidate::exact("hello")]);
    }

    #[test]
    fn test_check_prefers_productive_corrections() {
        let (index, kgram) = build(&["cat hello", "cat hello", "cat hallo", "dog hullo"]);
        let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());

        // All three corrections of "hxllo" score alike, so "cat hallo" is
        // tried first, but "cat hello" retrieves more documents. "cat hullo"
        // retrieves nothing.
        let suggestions = checker.check(&Query::parse("cat hxllo"), 3).unwrap();
        assert_eq!(suggestions, vec!["cat hello", "cat hallo", ""]);
    }

    #[test]
    fn test_check_without_candidates_pads() {
        let (index, kgram) = build(&["alpha beta"]);
        let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
        let suggestions = checker.check(&Query::parse("qqqqqq"), 2).unwrap();
        assert_eq!(suggestions, vec!["", ""]);
    }

    #[test]
    fn test_config_validation() {
        let config = SpellingConfig {
            jaccard_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SpellingConfig::default().validate().is_ok());
    }
}
