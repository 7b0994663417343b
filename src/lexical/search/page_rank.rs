//! Precomputed link-analysis scores keyed by document name.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;

use crate::error::{LexisError, Result};

/// Document scores looked up by name. Unknown documents score 0.
#[derive(Debug, Clone, Default)]
pub struct PageRankTable {
    scores: AHashMap<String, f64>,
}

impl PageRankTable {
    pub fn new() -> Self {
        PageRankTable::default()
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, score: f64) {
        self.scores.insert(name.into(), score);
    }

    /// Score of `name`, falling back to its last path component.
    pub fn score(&self, name: &str) -> f64 {
        if let Some(score) = self.scores.get(name) {
            return *score;
        }
        name.rsplit(['/', '\\'])
            .next()
            .filter(|base| *base != name)
            .and_then(|base| self.scores.get(base))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Parse `name;score` lines. Blank lines are skipped.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = PageRankTable::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let malformed =
                || LexisError::invalid_argument(format!("malformed page rank line {}: {line:?}", number + 1));
            let (name, score) = line.rsplit_once(';').ok_or_else(malformed)?;
            let score: f64 = score.trim().parse().map_err(|_| malformed())?;
            table.insert(name, score);
        }
        Ok(table)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }
}

impl FromIterator<(String, f64)> for PageRankTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        PageRankTable {
            scores: iter.into_iter().collect(),
        }
    }
}
