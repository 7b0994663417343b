//! Inverted index stored as a hashed dictionary on disk.
//!
//! Postings are staged in an in-memory map while documents are inserted.
//! [`PersistentIndex::write_index`] serializes every staged term, appends the
//! record to the data file and stores a pointer to it in the dictionary hash
//! table. Lookups only read from disk, so a term becomes visible once it has
//! been written.
//!
//! Three files make up an index: the dictionary, the data file and the
//! document info file. Reopening an index reads its document info back.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, info, warn};

use crate::error::{LexisError, Result};
use crate::lexical::core::document::DocumentTable;
use crate::lexical::core::posting::{DocId, PostingsList};
use crate::lexical::index::Index;
use crate::lexical::index::config::{FileSet, PersistentIndexConfig};
use crate::lexical::index::dictionary::{HashDictionary, Probe};
use crate::lexical::index::record;
use crate::storage::Storage;

/// Result of a strict lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum TermLookup {
    Found(PostingsList),
    /// The term was never indexed.
    Absent,
    /// The probe sequence hit a slot or record that could not be decoded.
    Corrupt { slot: u64 },
}

/// Counters reported by [`PersistentIndex::write_index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Terms written as new dictionary entries.
    pub inserted: usize,
    /// Terms already on disk whose records were extended.
    pub extended: usize,
    /// Occupied slots skipped while probing.
    pub collisions: u64,
}

/// An inverted index backed by a dictionary/data/doc-info file set.
#[derive(Debug)]
pub struct PersistentIndex {
    storage: Arc<dyn Storage>,
    config: PersistentIndexConfig,
    files: FileSet,
    dictionary: HashDictionary,
    staging: AHashMap<String, PostingsList>,
    documents: DocumentTable,
}

impl PersistentIndex {
    /// Open the index in `storage`, creating empty files when none exist.
    pub fn open(storage: Arc<dyn Storage>, config: PersistentIndexConfig) -> Result<Self> {
        config.validate()?;
        let files = config.files();
        let dictionary = HashDictionary::open(
            storage.as_ref(),
            &files.dictionary,
            &files.data,
            config.table_size,
        )?;
        let documents = DocumentTable::load(storage.as_ref(), &files.doc_info)?;
        if !documents.is_empty() {
            debug!("loaded info for {} documents from {}", documents.len(), files.doc_info);
        }
        Ok(PersistentIndex {
            storage,
            config,
            files,
            dictionary,
            staging: AHashMap::new(),
            documents,
        })
    }

    pub fn config(&self) -> &PersistentIndexConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// The file set writes currently go to.
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Number of distinct terms waiting to be written.
    pub fn staged_terms(&self) -> usize {
        self.staging.len()
    }

    /// Look a term up on disk, distinguishing corruption from absence.
    pub fn lookup(&self, term: &str) -> Result<TermLookup> {
        match self.dictionary.lookup(term)? {
            Probe::Found { record, .. } => {
                let (_, postings) = record::decode(&record)?;
                Ok(TermLookup::Found(postings))
            }
            Probe::Absent => Ok(TermLookup::Absent),
            Probe::Corrupt { slot } => Ok(TermLookup::Corrupt { slot }),
        }
    }

    /// Write every staged term to the dictionary and data files and clear
    /// the staging map.
    pub fn write_index(&mut self) -> Result<WriteStats> {
        let collisions_before = self.dictionary.collisions();
        let mut staged: Vec<(String, PostingsList)> = self.staging.drain().collect();
        staged.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut stats = WriteStats::default();
        let mut staged = staged.into_iter();
        while let Some((term, postings)) = staged.next() {
            let fresh = record::encode(&term, &postings);
            match self.dictionary.lookup(&term)? {
                Probe::Found { slot, record, .. } => {
                    let combined = record::concat(&record, &fresh)?;
                    self.dictionary.replace(slot, &combined)?;
                    stats.extended += 1;
                }
                Probe::Absent => {
                    self.dictionary.insert(&term, &fresh)?;
                    stats.inserted += 1;
                }
                Probe::Corrupt { slot } => {
                    // The term may already be stored past the corrupt slot,
                    // so it and everything after it stay staged.
                    self.staging.insert(term, postings);
                    self.staging.extend(staged);
                    self.dictionary.flush()?;
                    return Err(LexisError::CorruptDictionary { slot });
                }
            }
        }
        self.dictionary.flush()?;
        stats.collisions = self.dictionary.collisions() - collisions_before;
        debug!(
            "wrote {} new and {} extended terms to {} ({} collisions)",
            stats.inserted, stats.extended, self.files.dictionary, stats.collisions
        );
        Ok(stats)
    }

    /// Persist the document table to the current doc info file.
    pub fn write_doc_info(&self) -> Result<()> {
        self.documents.save(self.storage.as_ref(), &self.files.doc_info)
    }

    /// Number of terms stored on disk.
    pub fn term_count(&self) -> Result<u64> {
        self.dictionary.term_count()
    }

    /// Every term stored on disk, in dictionary slot order.
    pub fn terms(&self) -> Result<Vec<String>> {
        let mut terms = Vec::new();
        self.dictionary.scan(|term, _| {
            terms.push(term.to_string());
            Ok(())
        })?;
        Ok(terms)
    }

    /// Point subsequent writes and reads at another file set.
    ///
    /// With `fresh` the files are truncated; otherwise they are opened as they are.
    pub(crate) fn retarget(&mut self, files: FileSet, fresh: bool) -> Result<()> {
        let storage = self.storage.as_ref();
        self.dictionary = if fresh {
            HashDictionary::create(storage, &files.dictionary, &files.data, self.config.table_size)?
        } else {
            HashDictionary::open(storage, &files.dictionary, &files.data, self.config.table_size)?
        };
        self.files = files;
        Ok(())
    }

    /// Replace the document table, returning the previous one.
    pub(crate) fn replace_documents(&mut self, documents: DocumentTable) -> DocumentTable {
        std::mem::replace(&mut self.documents, documents)
    }
}

impl Index for PersistentIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32) -> Result<()> {
        if term.is_empty() || term.contains(char::is_whitespace) {
            return Err(LexisError::invalid_argument(format!(
                "term {term:?} cannot be stored in a postings record"
            )));
        }
        match self.staging.get_mut(term) {
            Some(postings) => postings.add_entry(doc_id, offset),
            None => {
                self.staging
                    .insert(term.to_string(), PostingsList::single(doc_id, offset));
            }
        }
        Ok(())
    }

    fn get_postings(&self, term: &str) -> Option<PostingsList> {
        match self.lookup(term) {
            Ok(TermLookup::Found(postings)) => Some(postings),
            Ok(TermLookup::Absent) => None,
            Ok(TermLookup::Corrupt { slot }) => {
                warn!("lookup of {term:?} hit corrupt dictionary slot {slot}");
                None
            }
            Err(e) => {
                warn!("lookup of {term:?} failed: {e}");
                None
            }
        }
    }

    fn documents(&self) -> &DocumentTable {
        &self.documents
    }

    fn documents_mut(&mut self) -> &mut DocumentTable {
        &mut self.documents
    }

    fn cleanup(&mut self) -> Result<()> {
        info!("{} unique words", self.staging.len());
        self.write_doc_info()?;
        let stats = self.write_index()?;
        info!(
            "index written to {}: {} terms, {} collisions",
            self.files.dictionary,
            stats.inserted + stats.extended,
            stats.collisions
        );
        Ok(())
    }
}
