//! Character k-gram index over the vocabulary.
//!
//! Each term is bracketed with `$` markers and cut into overlapping windows
//! of `k` characters. Every k-gram maps to the ascending list of ids of the
//! terms containing it. Term ids are assigned densely in insertion order, so
//! appending the newest id keeps every list sorted, and comparing with the
//! last id is enough to keep it free of duplicates.

use ahash::AHashMap;
use regex::Regex;

use crate::error::{LexisError, Result};

/// Dense identifier of a term inside a [`KGramIndex`].
pub type TermId = u32;

/// Boundary marker placed around terms before cutting k-grams.
pub const BOUNDARY: char = '$';

/// Wildcard character in query patterns.
pub const WILDCARD: char = '*';

#[derive(Debug, Clone)]
pub struct KGramIndex {
    k: usize,
    term2id: AHashMap<String, TermId>,
    id2term: Vec<String>,
    index: AHashMap<String, Vec<TermId>>,
}

impl KGramIndex {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(LexisError::invalid_argument("k-gram length must be positive"));
        }
        Ok(KGramIndex {
            k,
            term2id: AHashMap::new(),
            id2term: Vec::new(),
            index: AHashMap::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of indexed terms.
    pub fn term_count(&self) -> usize {
        self.id2term.len()
    }

    /// Number of distinct k-grams.
    pub fn kgram_count(&self) -> usize {
        self.index.len()
    }

    /// The k-grams of the bracketed form of `term`, in order, repeats included.
    pub fn kgrams_of(&self, term: &str) -> Vec<String> {
        let chars: Vec<char> = bracket(term).chars().collect();
        if chars.len() < self.k {
            return Vec::new();
        }
        chars
            .windows(self.k)
            .map(|window| window.iter().collect())
            .collect()
    }

    /// Add `term` to the index.
    ///
    /// Terms seen before and terms shorter than `k` are ignored.
    pub fn insert(&mut self, term: &str) {
        if self.term2id.contains_key(term) || term.chars().count() < self.k {
            return;
        }
        let id = self.id2term.len() as TermId;
        self.term2id.insert(term.to_string(), id);
        self.id2term.push(term.to_string());

        for kgram in self.kgrams_of(term) {
            let postings = self.index.entry(kgram).or_default();
            if postings.last() != Some(&id) {
                postings.push(id);
            }
        }
    }

    /// Ids of the terms containing `kgram`, or `None` if no term does.
    pub fn get_postings(&self, kgram: &str) -> Option<&[TermId]> {
        self.index.get(kgram).map(Vec::as_slice)
    }

    pub fn id_of(&self, term: &str) -> Option<TermId> {
        self.term2id.get(term).copied()
    }

    pub fn term_of(&self, id: TermId) -> Option<&str> {
        self.id2term.get(id as usize).map(String::as_str)
    }

    /// Merge-join two sorted id lists.
    ///
    /// A missing side places no constraint and yields the other side. Two
    /// present lists always produce `Some`, even when nothing is shared.
    pub fn intersect(a: Option<&[TermId]>, b: Option<&[TermId]>) -> Option<Vec<TermId>> {
        let (a, b) = match (a, b) {
            (None, None) => return None,
            (Some(one), None) | (None, Some(one)) => return Some(one.to_vec()),
            (Some(a), Some(b)) => (a, b),
        };

        let mut result = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Equal => {
                    result.push(a[i]);
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        Some(result)
    }

    /// Ids of the terms containing every k-gram in `kgrams`.
    ///
    /// An unknown k-gram matches nothing. An empty input returns `None`.
    pub fn intersect_all<'a, I>(&self, kgrams: I) -> Option<Vec<TermId>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        kgrams.into_iter().fold(None, |acc: Option<Vec<TermId>>, kgram| {
            let postings = self.get_postings(kgram).unwrap_or(&[]);
            Self::intersect(acc.as_deref(), Some(postings))
        })
    }

    /// Whether `term` is a wildcard pattern this index can resolve.
    pub fn is_wildcard(&self, term: &str) -> bool {
        term.contains(WILDCARD) && term.chars().count() >= self.k
    }

    /// Vocabulary terms matching a `*` pattern, in id order.
    ///
    /// The k-grams of the pattern that contain no `*` select candidates;
    /// each candidate is then checked against the full pattern. A pattern
    /// without any such k-gram is checked against the whole vocabulary.
    pub fn matching_terms(&self, pattern: &str) -> Result<Vec<String>> {
        let kgrams: Vec<String> = self
            .kgrams_of(pattern)
            .into_iter()
            .filter(|kgram| !kgram.contains(WILDCARD))
            .collect();
        let rule = wildcard_regex(pattern)?;

        let candidates = self.intersect_all(kgrams.iter().map(String::as_str));
        let matches = match candidates {
            Some(ids) => ids
                .into_iter()
                .filter_map(|id| self.term_of(id))
                .filter(|term| rule.is_match(term))
                .map(str::to_string)
                .collect(),
            None => self
                .id2term
                .iter()
                .filter(|term| rule.is_match(term))
                .cloned()
                .collect(),
        };
        Ok(matches)
    }
}

fn bracket(term: &str) -> String {
    let mut bracketed = String::with_capacity(term.len() + 2);
    bracketed.push(BOUNDARY);
    bracketed.push_str(term);
    bracketed.push(BOUNDARY);
    bracketed
}

/// Anchored regex equivalent to a `*` pattern.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$"))
        .map_err(|e| LexisError::invalid_argument(format!("invalid wildcard pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(k: usize, terms: &[&str]) -> KGramIndex {
        let mut index = KGramIndex::new(k).unwrap();
        for term in terms {
            index.insert(term);
        }
        index
    }

    #[test]
    fn test_kgrams_of() {
        let index = KGramIndex::new(2).unwrap();
        assert_eq!(index.kgrams_of("cat"), vec!["$c", "ca", "at", "t$"]);
        let index = KGramIndex::new(3).unwrap();
        assert_eq!(index.kgrams_of("aa"), vec!["$aa", "aa$"]);
    }

    #[test]
    fn test_insert_deduplicates() {
        let index = index(2, &["banana", "band", "banana", "a"]);
        assert_eq!(index.term_count(), 2);
        assert_eq!(index.id_of("band"), Some(1));
        assert_eq!(index.term_of(0), Some("banana"));
        // "an" occurs twice in "banana" but is listed once.
        assert_eq!(index.get_postings("an"), Some(&[0, 1][..]));
        assert_eq!(index.get_postings("na"), Some(&[0][..]));
        assert!(index.get_postings("zz").is_none());
        assert!(index.id_of("a").is_none());
    }

    #[test]
    fn test_intersect() {
        let a: &[TermId] = &[1, 3, 5, 7];
        let b: &[TermId] = &[2, 3, 7, 9];
        assert_eq!(KGramIndex::intersect(Some(a), Some(b)), Some(vec![3, 7]));
        assert_eq!(KGramIndex::intersect(Some(b), Some(a)), Some(vec![3, 7]));
        assert_eq!(KGramIndex::intersect(Some(a), None), Some(a.to_vec()));
        assert_eq!(KGramIndex::intersect(None, Some(b)), Some(b.to_vec()));
        assert_eq!(KGramIndex::intersect(None, None), None);
        assert_eq!(KGramIndex::intersect(Some(&[1][..]), Some(&[2][..])), Some(vec![]));
    }

    #[test]
    fn test_intersect_all_with_unknown_kgram() {
        let index = index(2, &["cat", "cot", "dog"]);
        assert_eq!(index.intersect_all(["$c", "t$"]), Some(vec![0, 1]));
        assert_eq!(index.intersect_all(["$c", "zz"]), Some(vec![]));
        assert_eq!(index.intersect_all(std::iter::empty()), None);
    }

    #[test]
    fn test_matching_terms() {
        let index = index(2, &["cat", "cart", "coat", "act", "scat"]);
        assert_eq!(index.matching_terms("c*t").unwrap(), vec!["cat", "cart", "coat"]);
        assert_eq!(index.matching_terms("*at").unwrap(), vec!["cat", "coat", "scat"]);
        assert_eq!(index.matching_terms("ca*").unwrap(), vec!["cat", "cart"]);
        assert!(index.matching_terms("x*").unwrap().is_empty());
    }

    #[test]
    fn test_matching_terms_without_literal_kgram() {
        let index = index(3, &["abc", "abd", "xyz"]);
        // "$a*$" yields only k-grams containing '*', so every term is checked.
        assert_eq!(index.matching_terms("a*").unwrap(), vec!["abc", "abd"]);
    }

    #[test]
    fn test_is_wildcard() {
        let index = KGramIndex::new(2).unwrap();
        assert!(index.is_wildcard("c*"));
        assert!(!index.is_wildcard("*"));
        assert!(!index.is_wildcard("cat"));
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(KGramIndex::new(0).is_err());
    }
}
