//! File system storage backend.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::{LexisError, Result};
use crate::storage::{Storage, StorageFile};

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Directory holding the index files.
    pub path: PathBuf,
    /// Call `sync_all` on `flush_and_sync`.
    pub sync: bool,
}

impl FileStorageConfig {
    pub fn new(path: PathBuf) -> Self {
        FileStorageConfig { path, sync: false }
    }
}

/// Storage rooted at a directory.
#[derive(Debug)]
pub struct FileStorage {
    config: FileStorageConfig,
}

impl FileStorage {
    /// Create the storage, creating its directory if needed.
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Ok(FileStorage { config })
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.config.path.join(name)
    }

    fn wrap(&self, file: File) -> Box<dyn StorageFile> {
        Box::new(FileHandle {
            file,
            sync: self.config.sync,
        })
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let file = File::open(self.path_of(name)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LexisError::not_found(name.to_string()),
            _ => LexisError::Io(e),
        })?;
        Ok(self.wrap(file))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path_of(name))?;
        Ok(self.wrap(file))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_of(name))?;
        Ok(self.wrap(file))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.path_of(from), self.path_of(to))?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[derive(Debug)]
struct FileHandle {
    file: File,
    sync: bool,
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl StorageFile for FileHandle {
    fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn flush_and_sync(&mut self) -> Result<()> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
