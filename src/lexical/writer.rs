//! Feeding documents into an index.

use log::{debug, info};

use crate::analysis::{Token, Tokenizer};
use crate::error::{LexisError, Result};
use crate::lexical::core::posting::DocId;
use crate::lexical::index::Index;
use crate::lexical::index::kgram::KGramIndex;
use crate::lexical::query::TermFrequencyTable;

/// Statistics about the writing process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Number of documents added.
    pub docs_added: u64,
    /// Number of tokens inserted.
    pub tokens_added: u64,
}

/// Tokenizes documents and inserts them into an index, optionally keeping a
/// k-gram index and per-document term counts in step.
///
/// Documents must be added in non-decreasing id order.
pub struct IndexWriter<'a> {
    index: &'a mut dyn Index,
    tokenizer: &'a dyn Tokenizer,
    kgram: Option<&'a mut KGramIndex>,
    frequencies: Option<&'a mut TermFrequencyTable>,
    last_doc: Option<DocId>,
    stats: WriterStats,
}

impl std::fmt::Debug for IndexWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("index", &self.index)
            .field("kgram", &self.kgram.is_some())
            .field("frequencies", &self.frequencies.is_some())
            .field("last_doc", &self.last_doc)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'a> IndexWriter<'a> {
    pub fn new(index: &'a mut dyn Index, tokenizer: &'a dyn Tokenizer) -> Self {
        IndexWriter {
            index,
            tokenizer,
            kgram: None,
            frequencies: None,
            last_doc: None,
            stats: WriterStats::default(),
        }
    }

    pub fn with_kgram_index(mut self, kgram: &'a mut KGramIndex) -> Self {
        self.kgram = Some(kgram);
        self
    }

    pub fn with_term_frequencies(mut self, frequencies: &'a mut TermFrequencyTable) -> Self {
        self.frequencies = Some(frequencies);
        self
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    /// Tokenize `text` and index it as document `doc_id`. Returns the
    /// document length in tokens.
    pub fn add_document(&mut self, doc_id: DocId, name: &str, text: &str) -> Result<u32> {
        let tokens = self.tokenizer.tokenize(text);
        self.add_tokens(doc_id, name, &tokens)
    }

    /// Index already tokenized text as document `doc_id`.
    pub fn add_tokens(&mut self, doc_id: DocId, name: &str, tokens: &[Token]) -> Result<u32> {
        match self.last_doc {
            Some(last) if doc_id < last => {
                return Err(LexisError::invalid_argument(format!(
                    "document {doc_id} added after document {last}"
                )));
            }
            _ => {}
        }
        self.last_doc = Some(doc_id);

        // Metadata goes in first so a block flush mid-document can carry it.
        self.index.documents_mut().register(doc_id, name);
        for token in tokens {
            self.index.insert(&token.text, doc_id, token.position)?;
            if let Some(kgram) = self.kgram.as_deref_mut() {
                kgram.insert(&token.text);
            }
            if let Some(frequencies) = self.frequencies.as_deref_mut() {
                frequencies.record(name, &token.text);
            }
        }
        let length = tokens.len() as u32;
        self.index.documents_mut().set_length(doc_id, length);

        self.stats.docs_added += 1;
        self.stats.tokens_added += tokens.len() as u64;
        debug!("indexed {name} as document {doc_id} with {length} tokens");
        Ok(length)
    }

    /// Finish indexing and make the index durable.
    pub fn commit(self) -> Result<WriterStats> {
        self.index.cleanup()?;
        info!(
            "committed {} documents, {} tokens",
            self.stats.docs_added, self.stats.tokens_added
        );
        Ok(self.stats)
    }
}
