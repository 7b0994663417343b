//! In-memory inverted index.

use ahash::AHashMap;

use crate::error::Result;
use crate::lexical::core::document::DocumentTable;
use crate::lexical::core::posting::{DocId, PostingsList};
use crate::lexical::index::Index;

/// A hash map from terms to postings lists, never evicted.
///
/// Serves as the reference the persistent variants are checked against.
#[derive(Debug, Default)]
pub struct HashedIndex {
    index: AHashMap<String, PostingsList>,
    documents: DocumentTable,
}

impl HashedIndex {
    pub fn new() -> Self {
        HashedIndex {
            index: AHashMap::with_capacity(32_768),
            documents: DocumentTable::new(),
        }
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.index.len()
    }

    /// Borrow the postings of a term without copying.
    pub fn postings(&self, term: &str) -> Option<&PostingsList> {
        self.index.get(term)
    }

    /// Iterate over all terms and postings, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostingsList)> {
        self.index.iter().map(|(term, postings)| (term.as_str(), postings))
    }

    /// Sum over all terms in `doc_id` of term frequency times idf.
    pub fn norm(&self, doc_id: DocId) -> f64 {
        let n = self.documents.len() as f64;
        self.index
            .values()
            .filter_map(|postings| {
                postings.find(doc_id).map(|entry| {
                    let idf = (n / postings.len() as f64).ln();
                    entry.term_frequency() as f64 * idf
                })
            })
            .sum()
    }
}

impl Index for HashedIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32) -> Result<()> {
        match self.index.get_mut(term) {
            Some(postings) => postings.add_entry(doc_id, offset),
            None => {
                self.index
                    .insert(term.to_string(), PostingsList::single(doc_id, offset));
            }
        }
        Ok(())
    }

    fn get_postings(&self, term: &str) -> Option<PostingsList> {
        self.index.get(term).cloned()
    }

    fn documents(&self) -> &DocumentTable {
        &self.documents
    }

    fn documents_mut(&mut self) -> &mut DocumentTable {
        &mut self.documents
    }

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn document_frequency(&self, term: &str) -> usize {
        self.index.get(term).map(|p| p.len()).unwrap_or(0)
    }
}
