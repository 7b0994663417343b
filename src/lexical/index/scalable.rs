//! Block-based indexing with bounded memory.
//!
//! [`ScalableIndex`] stages postings in a [`PersistentIndex`] and flushes
//! them whenever the staged vocabulary reaches the configured block size.
//! The first block is written straight to the canonical files. Every later
//! block gets its own `_block{n}` file set, and a [`BlockMerge`] worker
//! folds it into the canonical files before indexing resumes. At most one
//! merge runs at a time and the caller waits for it.

use std::sync::Arc;
use std::thread;

use log::{debug, info};

use crate::error::{LexisError, Result};
use crate::lexical::core::document::DocumentTable;
use crate::lexical::core::posting::{DocId, PostingsList};
use crate::lexical::index::Index;
use crate::lexical::index::config::{FileSet, ScalableIndexConfig};
use crate::lexical::index::merge::{BlockMerge, MergeStats};
use crate::lexical::index::persistent::{PersistentIndex, TermLookup};
use crate::storage::Storage;

/// Term and document counts of a finalized index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub terms: u64,
    pub documents: usize,
}

/// A persistent index that flushes and merges fixed-size blocks.
#[derive(Debug)]
pub struct ScalableIndex {
    inner: PersistentIndex,
    canonical: FileSet,
    block_size: usize,
    /// Blocks flushed since the last finalize.
    blocks: usize,
}

impl ScalableIndex {
    pub fn open(storage: Arc<dyn Storage>, config: ScalableIndexConfig) -> Result<Self> {
        config.validate()?;
        let canonical = config.persistent.files();
        let inner = PersistentIndex::open(storage, config.persistent)?;
        Ok(ScalableIndex {
            inner,
            canonical,
            block_size: config.block_size,
            blocks: 0,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks flushed since the last finalize.
    pub fn blocks_flushed(&self) -> usize {
        self.blocks
    }

    /// Every term in the canonical files.
    pub fn terms(&self) -> Result<Vec<String>> {
        self.inner.terms()
    }

    /// Look a term up in the canonical files.
    pub fn lookup(&self, term: &str) -> Result<TermLookup> {
        self.inner.lookup(term)
    }

    fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(self.inner.storage())
    }

    fn block_files(&self, n: usize) -> FileSet {
        self.canonical.with_suffix(&format!("_block{n}"))
    }

    /// Write the staged block, then merge it unless it is the first one.
    ///
    /// Metadata of `current` stays in memory because its postings may
    /// continue in the next block.
    fn flush_block(&mut self, current: DocId) -> Result<()> {
        let carried = self.inner.documents_mut().remove(current);
        info!(
            "flushing block {} with {} unique words",
            self.blocks,
            self.inner.staged_terms()
        );
        self.inner.write_doc_info()?;
        let stats = self.inner.write_index()?;
        debug!("block {} written with {} collisions", self.blocks, stats.collisions);

        let mut next = DocumentTable::new();
        if let Some(info) = carried {
            next.insert(current, info);
        }
        self.inner.replace_documents(next);

        let written = self.blocks;
        self.blocks += 1;
        self.inner.retarget(self.block_files(self.blocks), true)?;
        if written > 0 {
            self.merge(written)?;
        }
        Ok(())
    }

    /// Fold block `n` into the canonical files on a worker thread and wait.
    fn merge(&self, n: usize) -> Result<MergeStats> {
        let task = BlockMerge::new(
            self.storage(),
            self.inner.config().table_size,
            self.canonical.clone(),
            self.block_files(n),
            n,
        );
        let handle = thread::Builder::new()
            .name(format!("lexis-merge-{n}"))
            .spawn(move || task.run())?;
        handle
            .join()
            .map_err(|_| LexisError::index(format!("merge of block {n} panicked")))?
    }

    /// Flush what is staged, fold it into the canonical files and reload
    /// the complete document table.
    pub fn finalize(&mut self) -> Result<IndexSummary> {
        if self.blocks == 0 {
            self.inner.write_doc_info()?;
            self.inner.write_index()?;
        } else {
            info!(
                "flushing final block {} with {} unique words",
                self.blocks,
                self.inner.staged_terms()
            );
            self.inner.write_doc_info()?;
            self.inner.write_index()?;
            self.merge(self.blocks)?;
            self.inner.retarget(self.canonical.clone(), false)?;
        }
        self.blocks = 0;

        let documents = DocumentTable::load(self.storage().as_ref(), &self.canonical.doc_info)?;
        self.inner.replace_documents(documents);

        let summary = IndexSummary {
            terms: self.inner.term_count()?,
            documents: self.inner.documents().len(),
        };
        info!(
            "index finalized: {} terms, {} documents",
            summary.terms, summary.documents
        );
        Ok(summary)
    }
}

impl Index for ScalableIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32) -> Result<()> {
        if self.inner.staged_terms() >= self.block_size {
            self.flush_block(doc_id)?;
        }
        self.inner.insert(term, doc_id, offset)
    }

    fn get_postings(&self, term: &str) -> Option<PostingsList> {
        self.inner.get_postings(term)
    }

    fn documents(&self) -> &DocumentTable {
        self.inner.documents()
    }

    fn documents_mut(&mut self) -> &mut DocumentTable {
        self.inner.documents_mut()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.finalize().map(|_| ())
    }
}
