//! Query execution.
//!
//! - `searcher`: intersection, phrase and ranked retrieval with wildcard expansion
//! - `page_rank`: the external document score table used by ranked retrieval

pub mod page_rank;
pub mod searcher;
