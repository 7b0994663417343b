//! Document metadata: names and lengths keyed by document id.
//!
//! The table is persisted next to the dictionary as UTF-8 text, one line per
//! document: `<docID>;<docName>;<docLength>\n`.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};

use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::lexical::core::posting::DocId;
use crate::storage::Storage;

/// Name and length (in tokens) of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub length: u32,
}

/// Metadata for every document of one index generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTable {
    docs: BTreeMap<DocId, DocumentInfo>,
}

impl DocumentTable {
    pub fn new() -> Self {
        DocumentTable {
            docs: BTreeMap::new(),
        }
    }

    /// Register a document name. The length starts at zero.
    pub fn register(&mut self, doc_id: DocId, name: impl Into<String>) {
        let name = name.into();
        self.docs
            .entry(doc_id)
            .and_modify(|info| info.name = name.clone())
            .or_insert(DocumentInfo { name, length: 0 });
    }

    /// Set the length of a document, registering it under an empty name if needed.
    pub fn set_length(&mut self, doc_id: DocId, length: u32) {
        self.docs
            .entry(doc_id)
            .or_insert_with(|| DocumentInfo {
                name: String::new(),
                length: 0,
            })
            .length = length;
    }

    pub fn insert(&mut self, doc_id: DocId, info: DocumentInfo) {
        self.docs.insert(doc_id, info);
    }

    pub fn remove(&mut self, doc_id: DocId) -> Option<DocumentInfo> {
        self.docs.remove(&doc_id)
    }

    pub fn get(&self, doc_id: DocId) -> Option<&DocumentInfo> {
        self.docs.get(&doc_id)
    }

    pub fn name(&self, doc_id: DocId) -> Option<&str> {
        self.docs.get(&doc_id).map(|info| info.name.as_str())
    }

    pub fn length(&self, doc_id: DocId) -> Option<u32> {
        self.docs.get(&doc_id).map(|info| info.length)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &DocumentInfo)> {
        self.docs.iter().map(|(id, info)| (*id, info))
    }

    /// Add every document of `other`, replacing entries with the same id.
    pub fn extend(&mut self, other: DocumentTable) {
        self.docs.extend(other.docs);
    }

    /// Write the table in `docInfo` line format.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        for (doc_id, info) in &self.docs {
            writeln!(out, "{};{};{}", doc_id, info.name, info.length)?;
        }
        Ok(())
    }

    /// Parse a table from `docInfo` line format.
    ///
    /// The name is everything between the first and the last `;`, so names
    /// containing separators survive a round trip.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = DocumentTable::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (doc_id, rest) = line
                .split_once(';')
                .ok_or_else(|| Self::malformed(number, &line))?;
            let (name, length) = rest
                .rsplit_once(';')
                .ok_or_else(|| Self::malformed(number, &line))?;
            let doc_id: DocId = doc_id
                .trim()
                .parse()
                .map_err(|_| Self::malformed(number, &line))?;
            let length: u32 = length
                .trim()
                .parse()
                .map_err(|_| Self::malformed(number, &line))?;
            table.insert(
                doc_id,
                DocumentInfo {
                    name: name.to_string(),
                    length,
                },
            );
        }
        Ok(table)
    }

    fn malformed(number: usize, line: &str) -> LexisError {
        LexisError::index(format!("malformed document info line {}: {line:?}", number + 1))
    }

    /// Write the table to `name` in `storage`, replacing previous contents.
    pub fn save(&self, storage: &dyn Storage, name: &str) -> Result<()> {
        let mut out = storage.create_output(name)?;
        self.write_to(&mut out)?;
        out.flush_and_sync()
    }

    /// Load the table stored under `name`; a missing file yields an empty table.
    pub fn load(storage: &dyn Storage, name: &str) -> Result<Self> {
        if !storage.file_exists(name) {
            return Ok(DocumentTable::new());
        }
        let input = storage.open_input(name)?;
        DocumentTable::read_from(BufReader::new(input))
    }
}
