//! Configuration for the persistent index variants.

use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::lexical::index::dictionary::DEFAULT_TABLE_SIZE;
use crate::storage::Storage;

/// Default number of distinct staged terms that triggers a block flush.
pub const DEFAULT_BLOCK_SIZE: usize = 70_000;

/// Configuration of a [`PersistentIndex`](super::persistent::PersistentIndex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentIndexConfig {
    /// Number of dictionary slots. Should be a prime well above the vocabulary size.
    pub table_size: u64,
    /// Name of the dictionary file.
    pub dictionary_file: String,
    /// Name of the postings data file.
    pub data_file: String,
    /// Name of the document info file.
    pub doc_info_file: String,
}

impl Default for PersistentIndexConfig {
    fn default() -> Self {
        PersistentIndexConfig {
            table_size: DEFAULT_TABLE_SIZE,
            dictionary_file: "dictionary".to_string(),
            data_file: "data".to_string(),
            doc_info_file: "docInfo".to_string(),
        }
    }
}

impl PersistentIndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.table_size == 0 {
            return Err(LexisError::invalid_config("table_size must be positive"));
        }
        let names = [&self.dictionary_file, &self.data_file, &self.doc_info_file];
        if names.iter().any(|name| name.is_empty()) {
            return Err(LexisError::invalid_config("index file names must not be empty"));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(LexisError::invalid_config("index file names must be distinct"));
        }
        Ok(())
    }

    /// The canonical file set of the index.
    pub fn files(&self) -> FileSet {
        FileSet {
            dictionary: self.dictionary_file.clone(),
            data: self.data_file.clone(),
            doc_info: self.doc_info_file.clone(),
        }
    }
}

/// Configuration of a [`ScalableIndex`](super::scalable::ScalableIndex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalableIndexConfig {
    pub persistent: PersistentIndexConfig,
    /// Staged vocabulary size at which a block is flushed.
    pub block_size: usize,
}

impl Default for ScalableIndexConfig {
    fn default() -> Self {
        ScalableIndexConfig {
            persistent: PersistentIndexConfig::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ScalableIndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(LexisError::invalid_config("block_size must be positive"));
        }
        self.persistent.validate()
    }
}

/// Names of the three files that make up one dictionary/data/doc-info set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    pub dictionary: String,
    pub data: String,
    pub doc_info: String,
}

impl FileSet {
    /// The same set with `suffix` appended to every name.
    pub fn with_suffix(&self, suffix: &str) -> FileSet {
        FileSet {
            dictionary: format!("{}{suffix}", self.dictionary),
            data: format!("{}{suffix}", self.data),
            doc_info: format!("{}{suffix}", self.doc_info),
        }
    }

    /// Delete all three files; missing files are ignored.
    pub fn delete(&self, storage: &dyn Storage) -> Result<()> {
        storage.delete_file(&self.dictionary)?;
        storage.delete_file(&self.data)?;
        storage.delete_file(&self.doc_info)
    }

    /// Move all three files over `target`, each rename replacing its
    /// counterpart. The document info moves last.
    ///
    /// Nothing is renamed unless all three source files exist.
    pub fn rename_to(&self, storage: &dyn Storage, target: &FileSet) -> Result<()> {
        for name in [&self.dictionary, &self.data, &self.doc_info] {
            if !storage.file_exists(name) {
                return Err(LexisError::not_found(format!(
                    "{name} is missing; {} left untouched",
                    target.dictionary
                )));
            }
        }
        storage.rename_file(&self.dictionary, &target.dictionary)?;
        storage.rename_file(&self.data, &target.data)?;
        storage.rename_file(&self.doc_info, &target.doc_info)
    }

    pub fn exists(&self, storage: &dyn Storage) -> bool {
        storage.file_exists(&self.dictionary) && storage.file_exists(&self.data)
    }
}
