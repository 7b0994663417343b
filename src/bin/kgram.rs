//! Build a k-gram index over a text file and intersect k-gram postings.
//!
//! ```text
//! lexis-kgram --file corpus.txt -k 2 --kgrams "ve th he"
//! ```

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use lexis::analysis::{SimpleTokenizer, Tokenizer};
use lexis::lexical::KGramIndex;

/// Number of matching terms printed.
const SHOWN: usize = 10;

/// Inspect the k-gram index of a text file
#[derive(Parser)]
#[command(name = "lexis-kgram", version, about)]
struct Cli {
    /// Text file to index.
    #[arg(short, long)]
    file: PathBuf,

    /// K-gram length.
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// Space-separated k-grams whose postings are intersected.
    #[arg(long)]
    kgrams: String,
}

/// Outcome of one k-gram lookup.
#[derive(Debug, PartialEq)]
struct Report {
    total: usize,
    shown: Vec<String>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Found {} posting(s)", self.total)?;
        if self.total > SHOWN {
            writeln!(f, "The first {SHOWN} of them are:")?;
        }
        for term in &self.shown {
            writeln!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Index the terms of `text` and intersect the postings of `kgrams`.
fn lookup(text: &str, k: usize, kgrams: &str) -> Result<Report> {
    let mut index = KGramIndex::new(k)?;
    for token in SimpleTokenizer::new().tokenize(text) {
        index.insert(&token.text);
    }
    info!(
        "indexed {} terms under {} distinct {k}-grams",
        index.term_count(),
        index.kgram_count()
    );

    let kgrams: Vec<&str> = kgrams.split_whitespace().collect();
    if kgrams.is_empty() {
        bail!("No k-grams given");
    }
    for kgram in &kgrams {
        let len = kgram.chars().count();
        if len != k {
            bail!("Cannot search k-gram index: {len}-gram provided instead of {k}-gram");
        }
    }

    let ids = index.intersect_all(kgrams.iter().copied()).unwrap_or_default();
    let shown = ids
        .iter()
        .take(SHOWN)
        .filter_map(|id| index.term_of(*id))
        .map(str::to_string)
        .collect();
    Ok(Report {
        total: ids.len(),
        shown,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    print!("{}", lookup(&text, cli.k, &cli.kgrams)?);
    Ok(())
}
