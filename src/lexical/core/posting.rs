//! Postings lists: which documents contain a term, and where.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Document identifier assigned by the indexing caller.
pub type DocId = u32;

/// Kind of retrieval performed by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    /// All query terms must occur in the document.
    Intersection,
    /// Query terms must occur at consecutive positions.
    Phrase,
    /// Documents are scored and sorted.
    Ranked,
}

/// One document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingsEntry {
    pub doc_id: DocId,
    /// Token positions, in insertion order.
    pub offsets: Vec<u32>,
    /// Retrieval score, only meaningful in ranked results.
    #[serde(default)]
    pub score: f64,
}

impl PostingsEntry {
    pub fn new(doc_id: DocId) -> Self {
        PostingsEntry {
            doc_id,
            offsets: Vec::new(),
            score: 0.0,
        }
    }

    pub fn with_offsets(doc_id: DocId, offsets: Vec<u32>) -> Self {
        PostingsEntry {
            doc_id,
            offsets,
            score: 0.0,
        }
    }

    /// Number of occurrences of the term in this document.
    pub fn term_frequency(&self) -> usize {
        self.offsets.len()
    }

    /// Ordering used by ranked results: descending score, then ascending doc id.
    pub fn rank_cmp(&self, other: &PostingsEntry) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// A list of postings sorted by strictly increasing document id.
///
/// Callers insert in non-decreasing document order; repeated inserts for the
/// same document extend its offsets instead of adding a new entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingsList {
    entries: Vec<PostingsEntry>,
}

impl PostingsList {
    pub fn new() -> Self {
        PostingsList {
            entries: Vec::new(),
        }
    }

    /// A list holding a single occurrence.
    pub fn single(doc_id: DocId, offset: u32) -> Self {
        let mut list = PostingsList::new();
        list.add_entry(doc_id, offset);
        list
    }

    /// Wrap already ordered entries.
    pub fn from_entries(entries: Vec<PostingsEntry>) -> Self {
        PostingsList { entries }
    }

    /// Record an occurrence of the term at `offset` in `doc_id`.
    pub fn add_entry(&mut self, doc_id: DocId, offset: u32) {
        match self.entries.last_mut() {
            Some(last) if last.doc_id == doc_id => last.offsets.push(offset),
            _ => self
                .entries
                .push(PostingsEntry::with_offsets(doc_id, vec![offset])),
        }
    }

    /// Record a document without positional information.
    pub fn add_doc(&mut self, doc_id: DocId) {
        if self.entries.last().map(|e| e.doc_id) != Some(doc_id) {
            self.entries.push(PostingsEntry::new(doc_id));
        }
    }

    /// Append a complete entry.
    pub fn push_entry(&mut self, entry: PostingsEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&PostingsEntry> {
        self.entries.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PostingsEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[PostingsEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PostingsEntry> {
        self.entries
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.entries.iter().map(|e| e.doc_id).collect()
    }

    /// Find the entry for a document by binary search.
    pub fn find(&self, doc_id: DocId) -> Option<&PostingsEntry> {
        self.entries
            .binary_search_by_key(&doc_id, |e| e.doc_id)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Merge-join with `other` on document id.
    ///
    /// In [`QueryType::Phrase`] mode a document matches only where an offset
    /// in `self` is immediately followed by an offset in `other`; the matched
    /// offsets of `other` are kept so phrases can be chained. Other modes keep
    /// document ids only.
    ///
    /// Returns `None` when nothing matches.
    pub fn intersect(&self, other: &PostingsList, query_type: QueryType) -> Option<PostingsList> {
        let mut result = PostingsList::new();
        let (mut i, mut j) = (0, 0);

        while i < self.entries.len() && j < other.entries.len() {
            let left = &self.entries[i];
            let right = &other.entries[j];
            match left.doc_id.cmp(&right.doc_id) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    match query_type {
                        QueryType::Phrase => {
                            Self::join_adjacent(left, right, &mut result);
                        }
                        QueryType::Intersection | QueryType::Ranked => {
                            result.add_doc(left.doc_id);
                        }
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        if result.is_empty() { None } else { Some(result) }
    }

    fn join_adjacent(left: &PostingsEntry, right: &PostingsEntry, result: &mut PostingsList) {
        let (mut a, mut b) = (0, 0);
        while a < left.offsets.len() && b < right.offsets.len() {
            let first = left.offsets[a];
            let second = right.offsets[b];
            if first.checked_add(1) == Some(second) {
                result.add_entry(right.doc_id, second);
                a += 1;
                b += 1;
            } else if first < second {
                a += 1;
            } else {
                b += 1;
            }
        }
    }

    /// Sort entries for presentation of ranked results.
    pub fn sort_by_score(&mut self) {
        self.entries.sort_by(PostingsEntry::rank_cmp);
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = std::slice::Iter<'a, PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for PostingsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}:", entry.doc_id)?;
            for (k, offset) in entry.offsets.iter().enumerate() {
                if k > 0 {
                    f.write_str(".")?;
                }
                write!(f, "{offset}")?;
            }
        }
        Ok(())
    }
}
