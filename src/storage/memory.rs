//! In-memory storage backend.

use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{LexisError, Result};
use crate::storage::{Storage, StorageFile};

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Initial capacity reserved for newly created files.
    pub initial_capacity: usize,
}

type Buffer = Arc<Mutex<Vec<u8>>>;

/// Storage that keeps every file in memory.
///
/// Handles opened on the same name share one buffer, so a reader sees writes
/// made through another handle immediately.
#[derive(Debug)]
pub struct MemoryStorage {
    config: MemoryStorageConfig,
    files: RwLock<BTreeMap<String, Buffer>>,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            config,
            files: RwLock::new(BTreeMap::new()),
        }
    }

    fn handle(buffer: Buffer) -> Box<dyn StorageFile> {
        Box::new(MemoryHandle {
            buffer,
            position: 0,
        })
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let files = self.files.read();
        let buffer = files
            .get(name)
            .cloned()
            .ok_or_else(|| LexisError::not_found(name.to_string()))?;
        Ok(Self::handle(buffer))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let mut files = self.files.write();
        let buffer = files
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Vec::with_capacity(self.config.initial_capacity)))
            })
            .clone();
        Ok(Self::handle(buffer))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageFile>> {
        let buffer: Buffer = Arc::new(Mutex::new(Vec::with_capacity(
            self.config.initial_capacity,
        )));
        self.files.write().insert(name.to_string(), buffer.clone());
        Ok(Self::handle(buffer))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.write();
        let buffer = files
            .remove(from)
            .ok_or_else(|| LexisError::not_found(from.to_string()))?;
        files.insert(to.to_string(), buffer);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.read().keys().cloned().collect())
    }
}

#[derive(Debug)]
struct MemoryHandle {
    buffer: Buffer,
    position: u64,
}

impl Read for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.buffer.lock();
        let start = (self.position as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Write for MemoryHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.buffer.lock();
        let start = self.position as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.buffer.lock().len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => len + delta,
            SeekFrom::Current(delta) => self.position as i64 + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

impl StorageFile for MemoryHandle {
    fn size(&self) -> Result<u64> {
        Ok(self.buffer.lock().len() as u64)
    }

    fn flush_and_sync(&mut self) -> Result<()> {
        Ok(())
    }
}
