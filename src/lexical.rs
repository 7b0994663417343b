//! Lexical search over inverted indexes.
//!
//! # Module Structure
//!
//! - `core`: postings lists and the document table
//! - `index`: in-memory, persistent and scalable indexes plus the k-gram index
//! - `query`: weighted queries and relevance feedback
//! - `search`: boolean, phrase and ranked retrieval
//! - `writer`: tokenizing documents into an index

pub mod core;
pub mod index;
pub mod query;
pub mod search;
pub mod writer;

pub use core::document::{DocumentInfo, DocumentTable};
pub use core::posting::{DocId, PostingsEntry, PostingsList, QueryType};
pub use index::Index;
pub use index::kgram::KGramIndex;
pub use index::memory::HashedIndex;
pub use index::persistent::PersistentIndex;
pub use index::scalable::{IndexSummary, ScalableIndex};
pub use query::{FeedbackConfig, Query, QueryTerm, TermFrequencySource, TermFrequencyTable};
pub use search::page_rank::PageRankTable;
pub use search::searcher::{RankingType, Searcher};
pub use writer::{IndexWriter, WriterStats};
