//! Pluggable storage backends for index files.
//!
//! Every persistent structure in the crate (dictionary, postings data,
//! document info) is a named file inside a [`Storage`]. Two backends exist:
//!
//! - [`file::FileStorage`]: one directory on the local file system
//! - [`memory::MemoryStorage`]: shared in-process buffers, used by tests
//!
//! Handles are random access. Several handles may be open on the same file at
//! once; each keeps its own cursor.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::error::Result;

use self::file::{FileStorage, FileStorageConfig};
use self::memory::{MemoryStorage, MemoryStorageConfig};

/// A random-access handle on a stored file.
pub trait StorageFile: Read + Write + Seek + Send + Debug {
    /// Current size of the file in bytes.
    fn size(&self) -> Result<u64>;

    /// Flush buffered writes and make them durable.
    fn flush_and_sync(&mut self) -> Result<()>;
}

/// A flat namespace of files.
pub trait Storage: Send + Sync + Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageFile>>;

    /// Open a file for reading and writing, creating it if missing.
    /// Existing contents are kept.
    fn open_file(&self, name: &str) -> Result<Box<dyn StorageFile>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageFile>>;

    /// Check whether a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Rename a file, replacing any file already at `to`.
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;

    /// List all file names.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

/// Creates storage backends from configuration.
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(file_config) => Ok(Arc::new(FileStorage::new(file_config)?)),
            StorageConfig::Memory(memory_config) => Ok(Arc::new(MemoryStorage::new(memory_config))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;

    fn exercise(storage: Arc<dyn Storage>) {
        {
            let mut out = storage.create_output("a").unwrap();
            out.write_all(b"hello world").unwrap();
            out.flush_and_sync().unwrap();
        }
        assert!(storage.file_exists("a"));

        {
            let mut file = storage.open_file("a").unwrap();
            file.seek(SeekFrom::Start(6)).unwrap();
            file.write_all(b"there").unwrap();
            assert_eq!(file.size().unwrap(), 11);
        }

        let mut input = storage.open_input("a").unwrap();
        let mut buf = String::new();
        input.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello there");

        storage.rename_file("a", "b").unwrap();
        assert!(!storage.file_exists("a"));
        assert!(storage.file_exists("b"));
        assert_eq!(storage.list_files().unwrap(), vec!["b".to_string()]);

        storage.delete_file("b").unwrap();
        storage.delete_file("b").unwrap();
        assert!(!storage.file_exists("b"));
        assert!(storage.open_input("b").is_err());
    }

    #[test]
    fn test_memory_storage() {
        let storage =
            StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default())).unwrap();
        exercise(storage);
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(
            dir.path().to_path_buf(),
        )))
        .unwrap();
        exercise(storage);
    }
}
