//! Spelling correction for query terms missing from the index.
//!
//! Candidates come from the k-gram index: vocabulary terms sharing k-grams
//! with the misspelled term are filtered by Jaccard overlap and weighted edit
//! distance. Whole-query corrections are combinations of per-term candidates
//! that still retrieve at least one document.

pub mod corrector;

pub use corrector::{Candidate, SpellChecker, SpellingConfig};
