//! Data shared by every index variant.
//!
//! - `posting`: postings entries and lists, plus the query types
//! - `document`: document names and lengths

pub mod document;
pub mod posting;
