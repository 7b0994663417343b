//! Boolean, phrase and ranked retrieval over an [`Index`].
//!
//! Query terms containing `*` are resolved through the k-gram index first.
//! Ranked queries splice every match in place of the pattern. Boolean and
//! phrase queries keep one candidate set per pattern position and run one
//! retrieval per combination, taking the union of the results.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lexical::core::posting::{DocId, PostingsEntry, PostingsList, QueryType};
use crate::lexical::index::Index;
use crate::lexical::index::kgram::KGramIndex;
use crate::lexical::query::{Query, QueryTerm};
use crate::lexical::search::page_rank::PageRankTable;
use crate::util::combinations::Product;

/// How ranked retrieval mixes TF-IDF with the page rank signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingType {
    TfIdf,
    PageRank,
    #[default]
    Combination,
}

impl RankingType {
    /// `(tf_idf_weight, page_rank_weight)`.
    pub fn weights(self) -> (f64, f64) {
        match self {
            RankingType::TfIdf => (1.0, 0.0),
            RankingType::PageRank => (0.0, 1.0),
            RankingType::Combination => (0.01, 1.0),
        }
    }
}

/// Executes queries against one index. Holds borrows only.
#[derive(Debug, Clone, Copy)]
pub struct Searcher<'a> {
    index: &'a dyn Index,
    kgram: Option<&'a KGramIndex>,
    page_rank: Option<&'a PageRankTable>,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a dyn Index) -> Self {
        Searcher {
            index,
            kgram: None,
            page_rank: None,
        }
    }

    /// Enable wildcard expansion.
    pub fn with_kgram_index(mut self, kgram: &'a KGramIndex) -> Self {
        self.kgram = Some(kgram);
        self
    }

    pub fn with_page_rank(mut self, page_rank: &'a PageRankTable) -> Self {
        self.page_rank = Some(page_rank);
        self
    }

    /// Run `query`. `None` means no document matched.
    ///
    /// Ranked results are sorted by descending score, ties by ascending
    /// document id. Other results are sorted by document id.
    pub fn search(
        &self,
        query: &Query,
        query_type: QueryType,
        ranking: RankingType,
    ) -> Result<Option<PostingsList>> {
        if query.is_empty() {
            return Ok(None);
        }
        match query_type {
            QueryType::Ranked => {
                let terms = self.expand_ranked(query)?;
                Ok(self.ranked(&terms, ranking))
            }
            QueryType::Intersection | QueryType::Phrase => {
                if self.has_patterns(query) {
                    let slots = self.expand_slots(query)?;
                    Ok(self.union_of_combinations(&slots, query_type))
                } else {
                    let terms: Vec<&str> = query.terms().iter().map(|qt| qt.term.as_str()).collect();
                    Ok(self.intersect_terms(&terms, query_type))
                }
            }
        }
    }

    fn is_pattern(&self, term: &str) -> bool {
        self.kgram.is_some_and(|kgram| kgram.is_wildcard(term))
    }

    fn has_patterns(&self, query: &Query) -> bool {
        query.terms().iter().any(|qt| self.is_pattern(&qt.term))
    }

    fn matches(&self, pattern: &str) -> Result<Vec<String>> {
        match self.kgram {
            Some(kgram) => {
                let matches = kgram.matching_terms(pattern)?;
                debug!("{pattern:?} expands to {} terms", matches.len());
                Ok(matches)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Query terms with every pattern replaced by its matches, weights copied.
    fn expand_ranked(&self, query: &Query) -> Result<Vec<QueryTerm>> {
        let mut terms = Vec::with_capacity(query.len());
        for qt in query.terms() {
            if self.is_pattern(&qt.term) {
                terms.extend(
                    self.matches(&qt.term)?
                        .into_iter()
                        .map(|term| QueryTerm::new(term, qt.weight)),
                );
            } else {
                terms.push(qt.clone());
            }
        }
        Ok(terms)
    }

    /// One candidate list per query position.
    fn expand_slots(&self, query: &Query) -> Result<Vec<Vec<String>>> {
        query
            .terms()
            .iter()
            .map(|qt| {
                if self.is_pattern(&qt.term) {
                    self.matches(&qt.term)
                } else {
                    Ok(vec![qt.term.clone()])
                }
            })
            .collect()
    }

    /// Left-to-right fold of pairwise intersections.
    fn intersect_terms(&self, terms: &[&str], query_type: QueryType) -> Option<PostingsList> {
        let (first, rest) = terms.split_first()?;
        let mut answer = self.index.get_postings(first)?;
        for term in rest {
            let list = self.index.get_postings(term)?;
            answer = answer.intersect(&list, query_type)?;
        }
        Some(answer)
    }

    fn union_of_combinations(
        &self,
        slots: &[Vec<String>],
        query_type: QueryType,
    ) -> Option<PostingsList> {
        let mut found: BTreeMap<DocId, PostingsEntry> = BTreeMap::new();
        let product = Product::new(slots);
        let combinations = product.count_all();
        for combination in product {
            let terms: Vec<&str> = combination.iter().map(|term| term.as_str()).collect();
            if let Some(result) = self.intersect_terms(&terms, query_type) {
                for entry in result.into_entries() {
                    found.entry(entry.doc_id).or_insert(entry);
                }
            }
        }
        debug!("{combinations} combinations matched {} documents", found.len());
        if found.is_empty() {
            return None;
        }
        Some(PostingsList::from_entries(found.into_values().collect()))
    }

    /// Score documents containing any query term; fails if some term is unknown.
    fn ranked(&self, terms: &[QueryTerm], ranking: RankingType) -> Option<PostingsList> {
        if terms.is_empty() {
            return None;
        }
        let (tf_idf_weight, page_rank_weight) = ranking.weights();
        let documents = self.index.documents();
        let total = documents.len() as f64;

        let mut scored: Vec<PostingsEntry> = Vec::new();
        let mut position: AHashMap<DocId, usize> = AHashMap::new();

        for qt in terms {
            let postings = self.index.get_postings(&qt.term)?;
            let idf = (total / postings.len() as f64).ln();

            for entry in postings.into_entries() {
                let tf_idf = match documents.length(entry.doc_id) {
                    Some(length) if length > 0 => {
                        entry.term_frequency() as f64 * idf / length as f64
                    }
                    _ => 0.0,
                };
                let page_rank = match (self.page_rank, documents.name(entry.doc_id)) {
                    (Some(table), Some(name)) => table.score(name),
                    _ => 0.0,
                };
                let score = (tf_idf_weight * tf_idf + page_rank_weight * page_rank) * qt.weight;

                match position.get(&entry.doc_id) {
                    Some(&i) => scored[i].score += score,
                    None => {
                        position.insert(entry.doc_id, scored.len());
                        scored.push(PostingsEntry { score, ..entry });
                    }
                }
            }
        }

        let mut result = PostingsList::from_entries(scored);
        result.sort_by_score();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::index::memory::HashedIndex;

    fn build(docs: &[&str]) -> (HashedIndex, KGramIndex) {
        let mut index = HashedIndex::new();
        let mut kgram = KGramIndex::new(2).unwrap();
        for (doc, text) in docs.iter().enumerate() {
            let doc = doc as DocId;
            index.documents_mut().register(doc, format!("doc{doc}.f"));
            let mut length = 0;
            for (offset, term) in text.split_whitespace().enumerate() {
                index.insert(term, doc, offset as u32).unwrap();
                kgram.insert(term);
                length += 1;
            }
            index.documents_mut().set_length(doc, length);
        }
        (index, kgram)
    }

    fn ids(result: Option<PostingsList>) -> Vec<DocId> {
        result.map(|list| list.doc_ids()).unwrap_or_default()
    }

    #[test]
    fn test_intersection_and_phrase() {
        let (index, _) = build(&["the cat sat", "the cat ran", "a cat the"]);
        let searcher = Searcher::new(&index);
        let run = |text: &str, query_type| {
            ids(searcher
                .search(&Query::parse(text), query_type, RankingType::TfIdf)
                .unwrap())
        };

        assert_eq!(run("cat the", QueryType::Intersection), vec![0, 1, 2]);
        assert_eq!(run("the cat", QueryType::Phrase), vec![0, 1]);
        assert_eq!(run("the cat sat", QueryType::Phrase), vec![0]);
        assert_eq!(run("cat sat", QueryType::Phrase), vec![0]);
        assert!(run("cat dog", QueryType::Intersection).is_empty());
        assert!(run("sat ran", QueryType::Intersection).is_empty());
        assert!(searcher
            .search(&Query::new(), QueryType::Intersection, RankingType::TfIdf)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ranked_tf_idf() {
        let (index, _) = build(&["cat cat dog", "cat dog dog", "bird"]);
        let searcher = Searcher::new(&index);
        let result = searcher
            .search(&Query::parse("cat"), QueryType::Ranked, RankingType::TfIdf)
            .unwrap()
            .unwrap();
        assert_eq!(result.doc_ids(), vec![0, 1]);
        let idf = (3f64 / 2.0).ln();
        assert!((result.get(0).unwrap().score - 2.0 * idf / 3.0).abs() < 1e-12);
        assert!((result.get(1).unwrap().score - idf / 3.0).abs() < 1e-12);

        // One unknown term fails the whole ranked query.
        assert!(searcher
            .search(&Query::parse("cat zebra"), QueryType::Ranked, RankingType::TfIdf)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ranked_ties_break_by_doc_id() {
        let (index, _) = build(&["x cat", "cat y", "z w"]);
        let searcher = Searcher::new(&index);
        let result = searcher
            .search(&Query::parse("cat"), QueryType::Ranked, RankingType::TfIdf)
            .unwrap()
            .unwrap();
        assert_eq!(result.doc_ids(), vec![0, 1]);
        assert_eq!(result.get(0).unwrap().score, result.get(1).unwrap().score);
    }

    #[test]
    fn test_ranked_with_page_rank() {
        let (index, _) = build(&["cat", "cat", "dog"]);
        let mut page_rank = PageRankTable::new();
        page_rank.insert("doc1.f", 2.0);
        let searcher = Searcher::new(&index).with_page_rank(&page_rank);

        let result = searcher
            .search(&Query::parse("cat"), QueryType::Ranked, RankingType::PageRank)
            .unwrap()
            .unwrap();
        assert_eq!(result.doc_ids(), vec![1, 0]);
        assert_eq!(result.get(0).unwrap().score, 2.0);
        assert_eq!(result.get(1).unwrap().score, 0.0);

        let blended = searcher
            .search(&Query::parse("cat"), QueryType::Ranked, RankingType::Combination)
            .unwrap()
            .unwrap();
        let tf_idf = (3f64 / 2.0).ln();
        assert!((blended.get(0).unwrap().score - (0.01 * tf_idf + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_wildcard_boolean_and_phrase() {
        let (index, kgram) = build(&["the cat sat", "the cart ran", "the dog sat"]);
        let searcher = Searcher::new(&index).with_kgram_index(&kgram);
        let run = |text: &str, query_type| {
            ids(searcher
                .search(&Query::parse(text), query_type, RankingType::TfIdf)
                .unwrap())
        };

        assert_eq!(run("c*t", QueryType::Intersection), vec![0, 1]);
        assert_eq!(run("the c*t", QueryType::Phrase), vec![0, 1]);
        assert_eq!(run("c*t s*", QueryType::Phrase), vec![0]);
        assert!(run("x*z", QueryType::Intersection).is_empty());
    }

    #[test]
    fn test_wildcard_ranked_copies_weight() {
        let (index, kgram) = build(&["cat", "cart", "dog"]);
        let searcher = Searcher::new(&index).with_kgram_index(&kgram);
        let mut query = Query::new();
        query.add_term("ca*", 2.0);
        let result = searcher
            .search(&query, QueryType::Ranked, RankingType::TfIdf)
            .unwrap()
            .unwrap();
        assert_eq!(result.doc_ids(), vec![0, 1]);
        let expected = 2.0 * (3f64).ln();
        assert!((result.get(0).unwrap().score - expected).abs() < 1e-12);
    }
}
