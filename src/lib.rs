//! # Lexis
//!
//! An inverted-index search core.
//!
//! ## Features
//!
//! - In-memory, persistent and block-merging scalable indexes
//! - Intersection, phrase and ranked (TF-IDF and page rank) retrieval
//! - Wildcard queries through a k-gram index
//! - K-gram based spelling correction
//! - Rocchio style relevance feedback
//! - Pluggable storage backends

pub mod analysis;
pub mod engine;
pub mod error;
pub mod lexical;
pub mod spelling;
pub mod storage;
pub mod util;

pub use engine::Engine;
pub use engine::config::{EngineConfig, IndexKind};
pub use error::{LexisError, Result};
pub use lexical::{DocId, PostingsList, Query, QueryType, RankingType};
pub use storage::{Storage, StorageConfig, StorageFactory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
