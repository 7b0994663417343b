//! Shared helpers used by the search and spelling components.

pub mod combinations;
pub mod levenshtein;
