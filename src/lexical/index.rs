//! Inverted index implementations.
//!
//! # Module Structure
//!
//! - `memory`: volatile term -> postings map
//! - `persistent`: on-disk hashed dictionary plus append-only data file
//! - `scalable`: block flushing and two-way merging on top of `persistent`
//! - `merge`: the merge task used by `scalable`
//! - `dictionary`, `record`: the on-disk formats
//! - `kgram`: character n-gram index over the vocabulary
//! - `config`: configuration structs

pub mod config;
pub mod dictionary;
pub mod kgram;
pub mod memory;
pub mod merge;
pub mod persistent;
pub mod record;
pub mod scalable;

use std::fmt::Debug;

use crate::error::Result;
use crate::lexical::core::document::DocumentTable;
use crate::lexical::core::posting::{DocId, PostingsList};

/// Common interface of the index variants.
///
/// Indexing and searching are separate phases: callers insert, then call
/// [`Index::cleanup`], then query. The index holds no internal lock.
pub trait Index: Send + Debug {
    /// Record that `term` occurs at `offset` in `doc_id`.
    ///
    /// Documents must be inserted in non-decreasing id order and offsets
    /// within a document left to right.
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32) -> Result<()>;

    /// Postings of `term`, or `None` when the term is not indexed.
    ///
    /// Read failures are logged and reported as `None`.
    fn get_postings(&self, term: &str) -> Option<PostingsList>;

    /// Document names and lengths.
    fn documents(&self) -> &DocumentTable;

    fn documents_mut(&mut self) -> &mut DocumentTable;

    /// Finish indexing and make everything durable.
    fn cleanup(&mut self) -> Result<()>;

    /// Number of documents containing `term`.
    fn document_frequency(&self, term: &str) -> usize {
        self.get_postings(term).map(|p| p.len()).unwrap_or(0)
    }

    /// Number of indexed documents.
    fn document_count(&self) -> usize {
        self.documents().len()
    }
}
