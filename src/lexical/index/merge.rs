//! Two-way merge of a freshly flushed block into the running index.
//!
//! A merge reads the canonical file set and one block through its own
//! read-only handles and writes a third set:
//!
//! 1. every canonical term is copied, with the block's document groups
//!    appended when the block also holds the term;
//! 2. every block term not yet written is copied unchanged;
//! 3. the document info files are concatenated.
//!
//! The output files are then renamed over the canonical ones and the block
//! is deleted once all three renames have succeeded.

use std::io::{self, BufReader};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::Result;
use crate::lexical::index::config::FileSet;
use crate::lexical::index::dictionary::{HashDictionary, Probe};
use crate::lexical::index::record;
use crate::storage::Storage;

/// Counters reported by a finished merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Terms present in both inputs.
    pub combined: u64,
    /// Terms present only in the canonical index.
    pub kept: u64,
    /// Terms present only in the block.
    pub copied: u64,
}

impl MergeStats {
    /// Number of terms in the merged output.
    pub fn total(&self) -> u64 {
        self.combined + self.kept + self.copied
    }
}

/// One merge of block `generation` into the canonical files.
#[derive(Debug)]
pub struct BlockMerge {
    storage: Arc<dyn Storage>,
    table_size: u64,
    canonical: FileSet,
    block: FileSet,
    output: FileSet,
}

impl BlockMerge {
    pub fn new(
        storage: Arc<dyn Storage>,
        table_size: u64,
        canonical: FileSet,
        block: FileSet,
        generation: usize,
    ) -> Self {
        let output = canonical.with_suffix(&format!("_merging{generation}"));
        BlockMerge {
            storage,
            table_size,
            canonical,
            block,
            output,
        }
    }

    /// Run the merge to completion and publish the result.
    pub fn run(self) -> Result<MergeStats> {
        let storage = self.storage.as_ref();
        debug!(
            "merging {} into {} via {}",
            self.block.dictionary, self.canonical.dictionary, self.output.dictionary
        );

        let stats = {
            let merged = HashDictionary::open_read_only(
                storage,
                &self.canonical.dictionary,
                &self.canonical.data,
                self.table_size,
            )?;
            let block = HashDictionary::open_read_only(
                storage,
                &self.block.dictionary,
                &self.block.data,
                self.table_size,
            )?;
            let mut out = HashDictionary::create(
                storage,
                &self.output.dictionary,
                &self.output.data,
                self.table_size,
            )?;
            let stats = merge_dictionaries(&merged, &block, &mut out)?;
            out.flush()?;
            stats
        };

        self.concat_doc_info()?;
        self.publish()?;

        info!(
            "merged block into {}: {} terms ({} combined, {} new)",
            self.canonical.dictionary,
            stats.total(),
            stats.combined,
            stats.copied
        );
        Ok(stats)
    }

    fn concat_doc_info(&self) -> Result<()> {
        let storage = self.storage.as_ref();
        let mut out = storage.create_output(&self.output.doc_info)?;
        for name in [&self.canonical.doc_info, &self.block.doc_info] {
            if storage.file_exists(name) {
                let mut input = BufReader::new(storage.open_input(name)?);
                io::copy(&mut input, &mut out)?;
            }
        }
        out.flush_and_sync()
    }

    /// Swap the output in over the canonical files, then drop the block.
    fn publish(&self) -> Result<()> {
        let storage = self.storage.as_ref();
        self.output.rename_to(storage, &self.canonical)?;
        self.block.delete(storage)
    }
}

fn merge_dictionaries(
    merged: &HashDictionary,
    block: &HashDictionary,
    out: &mut HashDictionary,
) -> Result<MergeStats> {
    let mut stats = MergeStats::default();

    merged.scan(|term, older| match block.lookup(term)? {
        Probe::Found { record: newer, .. } => {
            stats.combined += 1;
            out.insert(term, &record::concat(older, &newer)?)
        }
        Probe::Absent => {
            stats.kept += 1;
            out.insert(term, older)
        }
        Probe::Corrupt { slot } => {
            warn!("block slot {slot} is corrupt; {term:?} keeps only its merged postings");
            stats.kept += 1;
            out.insert(term, older)
        }
    })?;

    // Everything readable from the canonical side is already in `out`, so
    // probing the output decides which block terms are new.
    block.scan(|term, newer| match out.lookup(term)? {
        Probe::Found { .. } => Ok(()),
        Probe::Absent | Probe::Corrupt { .. } => {
            stats.copied += 1;
            out.insert(term, newer)
        }
    })?;

    Ok(stats)
}
