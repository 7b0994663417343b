//! On-disk hash table mapping terms to postings records.
//!
//! The dictionary file is an array of `table_size` fixed-width slots. Each
//! slot is 14 bytes, big-endian:
//!
//! ```text
//! offset  bytes  field
//! 0       2      magic marker (0x2F79)
//! 2       8      byte offset of the record in the data file (i64)
//! 10      4      byte length of the record (i32)
//! ```
//!
//! The data file is append-only and holds the text records described in
//! [`record`](super::record). Collisions are resolved by double hashing:
//! attempt `i` for a token lands in slot `|h1 + i * h2| mod table_size`,
//! where `h1` is a multiplier-101 rolling hash and `h2` a multiplier-33 hash
//! seeded with 5381. Entries are never deleted, so probing needs no
//! tombstones: an empty slot ends every probe sequence.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use parking_lot::Mutex;

use crate::error::{LexisError, Result};
use crate::lexical::index::record;
use crate::storage::{Storage, StorageFile};

/// Size of one dictionary slot in bytes.
pub const ENTRY_BYTE_SIZE: u64 = 14;

/// Marker stored in the first two bytes of every occupied slot.
pub const MAGIC: u16 = 0x2F79;

/// Default number of slots (the 50,000th prime).
pub const DEFAULT_TABLE_SIZE: u64 = 611_953;

/// Slots read per batch when scanning the whole table.
const SCAN_BATCH_SLOTS: u64 = 4096;

/// Multiplicative rolling hash with multiplier 101 (Larson).
pub fn larson_hash(token: &str) -> i64 {
    let mut h: i64 = 0;
    for unit in token.encode_utf16() {
        h = h.wrapping_mul(101).wrapping_add(unit as i64);
    }
    h.wrapping_abs()
}

/// Multiplicative rolling hash with multiplier 33 and seed 5381 (Bernstein).
pub fn bernstein_hash(token: &str) -> i64 {
    let mut h: i64 = 5381;
    for unit in token.encode_utf16() {
        h = h.wrapping_mul(33).wrapping_add(unit as i64);
    }
    h.wrapping_abs()
}

/// Byte offset of the slot probed by `attempt` for `token`.
pub fn slot_offset(token: &str, attempt: u64, table_size: u64) -> u64 {
    let mut step = bernstein_hash(token);
    if (step.unsigned_abs() % table_size) == 0 {
        // A step congruent to zero would revisit the home slot forever.
        step = 1;
    }
    let h = larson_hash(token).wrapping_add((attempt as i64).wrapping_mul(step));
    (h.unsigned_abs() % table_size) * ENTRY_BYTE_SIZE
}

/// Location of a record in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub ptr: i64,
    pub len: i32,
}

impl DictionaryEntry {
    pub fn to_bytes(self) -> [u8; ENTRY_BYTE_SIZE as usize] {
        let mut buf = [0u8; ENTRY_BYTE_SIZE as usize];
        let mut cursor = &mut buf[..];
        // Writing into a fixed array of the exact size cannot fail.
        let _ = cursor.write_u16::<BigEndian>(MAGIC);
        let _ = cursor.write_i64::<BigEndian>(self.ptr);
        let _ = cursor.write_i32::<BigEndian>(self.len);
        buf
    }
}

/// Decoded content of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Never written (zero bytes, or past the end of the file).
    Empty,
    Occupied(DictionaryEntry),
    /// Non-zero bytes without a valid magic marker.
    Corrupt,
}

impl Slot {
    pub fn decode(bytes: &[u8]) -> Slot {
        if bytes.len() < ENTRY_BYTE_SIZE as usize || bytes.iter().all(|b| *b == 0) {
            return Slot::Empty;
        }
        let mut cursor = bytes;
        let magic = cursor.read_u16::<BigEndian>().unwrap_or(0);
        if magic != MAGIC {
            return Slot::Corrupt;
        }
        let ptr = cursor.read_i64::<BigEndian>().unwrap_or(-1);
        let len = cursor.read_i32::<BigEndian>().unwrap_or(-1);
        if ptr < 0 || len < 0 {
            return Slot::Corrupt;
        }
        Slot::Occupied(DictionaryEntry { ptr, len })
    }
}

/// Outcome of looking a term up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The term's record, as stored.
    Found { slot: u64, entry: DictionaryEntry, record: String },
    /// The probe sequence reached an empty slot.
    Absent,
    /// The probe sequence reached a slot that could not be decoded, or a
    /// slot whose record could not be read back.
    Corrupt { slot: u64 },
}

/// A dictionary file paired with its data file.
#[derive(Debug)]
pub struct HashDictionary {
    dictionary: Mutex<Box<dyn StorageFile>>,
    data: Mutex<Box<dyn StorageFile>>,
    table_size: u64,
    free: u64,
    collisions: u64,
}

impl HashDictionary {
    /// Open (or create) a dictionary/data pair for reading and appending.
    pub fn open(storage: &dyn Storage, dictionary: &str, data: &str, table_size: u64) -> Result<Self> {
        let dictionary = storage.open_file(dictionary)?;
        let data = storage.open_file(data)?;
        Self::from_handles(dictionary, data, table_size)
    }

    /// Open an existing pair read-only.
    pub fn open_read_only(
        storage: &dyn Storage,
        dictionary: &str,
        data: &str,
        table_size: u64,
    ) -> Result<Self> {
        let dictionary = storage.open_input(dictionary)?;
        let data = storage.open_input(data)?;
        Self::from_handles(dictionary, data, table_size)
    }

    /// Create a fresh, empty pair, truncating existing files.
    pub fn create(storage: &dyn Storage, dictionary: &str, data: &str, table_size: u64) -> Result<Self> {
        let dictionary = storage.create_output(dictionary)?;
        let data = storage.create_output(data)?;
        Self::from_handles(dictionary, data, table_size)
    }

    fn from_handles(
        dictionary: Box<dyn StorageFile>,
        data: Box<dyn StorageFile>,
        table_size: u64,
    ) -> Result<Self> {
        if table_size == 0 {
            return Err(LexisError::invalid_config("dictionary table size must be positive"));
        }
        let free = data.size()?;
        Ok(HashDictionary {
            dictionary: Mutex::new(dictionary),
            data: Mutex::new(data),
            table_size,
            free,
            collisions: 0,
        })
    }

    pub fn table_size(&self) -> u64 {
        self.table_size
    }

    /// Next writable offset in the data file.
    pub fn free(&self) -> u64 {
        self.free
    }

    /// Number of occupied slots skipped while inserting through this handle.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    fn read_slot(&self, offset: u64) -> Result<Slot> {
        let mut file = self.dictionary.lock();
        if offset + ENTRY_BYTE_SIZE > file.size()? {
            return Ok(Slot::Empty);
        }
        let mut buf = [0u8; ENTRY_BYTE_SIZE as usize];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(Slot::decode(&buf))
    }

    fn write_slot(&mut self, offset: u64, entry: DictionaryEntry) -> Result<()> {
        let file = self.dictionary.get_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&entry.to_bytes())?;
        Ok(())
    }

    /// Read the record an entry points at.
    pub fn read_record(&self, entry: DictionaryEntry) -> Result<String> {
        let mut file = self.data.lock();
        let end = entry.ptr as u64 + entry.len as u64;
        if end > file.size()? {
            return Err(LexisError::index(format!(
                "record at {}+{} lies past the end of the data file",
                entry.ptr, entry.len
            )));
        }
        let mut buf = vec![0u8; entry.len as usize];
        file.seek(SeekFrom::Start(entry.ptr as u64))?;
        file.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| LexisError::index(format!("record at {} is not UTF-8: {e}", entry.ptr)))
    }

    fn append_record(&mut self, record: &str) -> Result<DictionaryEntry> {
        let bytes = record.as_bytes();
        let len = i32::try_from(bytes.len())
            .map_err(|_| LexisError::index(format!("record of {} bytes is too large", bytes.len())))?;
        let ptr = self.free;
        let file = self.data.get_mut();
        file.seek(SeekFrom::Start(ptr))?;
        file.write_all(bytes)?;
        self.free += bytes.len() as u64;
        Ok(DictionaryEntry {
            ptr: ptr as i64,
            len,
        })
    }

    /// Find the first free slot on `term`'s probe sequence, append `record`
    /// to the data file and point the slot at it.
    ///
    /// The caller guarantees `term` is not already present. A full table
    /// leaves the data file untouched.
    pub fn insert(&mut self, term: &str, record: &str) -> Result<()> {
        let offset = self.free_slot(term)?;
        let entry = self.append_record(record)?;
        self.write_slot(offset, entry)
    }

    fn free_slot(&mut self, term: &str) -> Result<u64> {
        for attempt in 0..self.table_size {
            let offset = slot_offset(term, attempt, self.table_size);
            match self.read_slot(offset)? {
                Slot::Empty => return Ok(offset),
                Slot::Corrupt => {
                    warn!("overwriting corrupt dictionary slot at byte {offset} with {term:?}");
                    return Ok(offset);
                }
                Slot::Occupied(_) => self.collisions += 1,
            }
        }
        Err(LexisError::index(format!(
            "dictionary with {} slots has no room for {term:?}",
            self.table_size
        )))
    }

    /// Append a new version of a record and repoint an occupied slot at it.
    ///
    /// The old record stays in the data file as dead space.
    pub fn replace(&mut self, slot: u64, record: &str) -> Result<()> {
        let entry = self.append_record(record)?;
        self.write_slot(slot, entry)
    }

    /// Probe for `term`.
    pub fn lookup(&self, term: &str) -> Result<Probe> {
        for attempt in 0..self.table_size {
            let offset = slot_offset(term, attempt, self.table_size);
            match self.read_slot(offset)? {
                Slot::Empty => return Ok(Probe::Absent),
                Slot::Corrupt => return Ok(Probe::Corrupt { slot: offset }),
                Slot::Occupied(entry) => {
                    let record = match self.read_record(entry) {
                        Ok(record) => record,
                        Err(e) => {
                            warn!("unreadable record behind dictionary slot {offset}: {e}");
                            return Ok(Probe::Corrupt { slot: offset });
                        }
                    };
                    if record::term_of(&record) == term {
                        return Ok(Probe::Found {
                            slot: offset,
                            entry,
                            record,
                        });
                    }
                }
            }
        }
        Ok(Probe::Absent)
    }

    /// Visit every occupied slot in table order with its term and record.
    ///
    /// Corrupt slots and unreadable records are skipped with a warning.
    /// Returns the number of records visited.
    pub fn scan<F>(&self, mut visit: F) -> Result<u64>
    where
        F: FnMut(&str, &str) -> Result<()>,
    {
        let size = self.dictionary.lock().size()?;
        let slots = size / ENTRY_BYTE_SIZE;
        let mut visited = 0;
        let mut batch = Vec::new();
        let mut first = 0;

        while first < slots {
            let count = SCAN_BATCH_SLOTS.min(slots - first);
            batch.resize((count * ENTRY_BYTE_SIZE) as usize, 0);
            {
                let mut file = self.dictionary.lock();
                file.seek(SeekFrom::Start(first * ENTRY_BYTE_SIZE))?;
                file.read_exact(&mut batch)?;
            }
            for (i, bytes) in batch.chunks_exact(ENTRY_BYTE_SIZE as usize).enumerate() {
                let offset = (first + i as u64) * ENTRY_BYTE_SIZE;
                match Slot::decode(bytes) {
                    Slot::Empty => {}
                    Slot::Corrupt => warn!("skipping corrupt dictionary slot at byte {offset}"),
                    Slot::Occupied(entry) => match self.read_record(entry) {
                        Ok(record) => {
                            visit(record::term_of(&record), &record)?;
                            visited += 1;
                        }
                        Err(e) => warn!("skipping unreadable record behind slot {offset}: {e}"),
                    },
                }
            }
            first += count;
        }
        Ok(visited)
    }

    /// Count the terms stored in the table.
    pub fn term_count(&self) -> Result<u64> {
        self.scan(|_, _| Ok(()))
    }

    /// Flush both files.
    pub fn flush(&mut self) -> Result<()> {
        self.dictionary.get_mut().flush_and_sync()?;
        self.data.get_mut().flush_and_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn storage() -> MemoryStorage {
        MemoryStorage::new(MemoryStorageConfig::default())
    }

    #[test]
    fn test_hash_functions() {
        assert_eq!(larson_hash(""), 0);
        assert_eq!(larson_hash("ab"), 97 * 101 + 98);
        assert_eq!(bernstein_hash(""), 5381);
        assert_eq!(bernstein_hash("a"), 5381 * 33 + 97);
    }

    #[test]
    fn test_slot_offset_is_entry_aligned() {
        for attempt in 0..10 {
            let offset = slot_offset("hello", attempt, 101);
            assert_eq!(offset % ENTRY_BYTE_SIZE, 0);
            assert!(offset < 101 * ENTRY_BYTE_SIZE);
        }
        assert_eq!(
            slot_offset("hello", 0, 101),
            (larson_hash("hello") as u64 % 101) * ENTRY_BYTE_SIZE
        );
    }

    #[test]
    fn test_slot_encoding() {
        let entry = DictionaryEntry { ptr: 1234, len: 56 };
        let bytes = entry.to_bytes();
        assert_eq!(&bytes[..2], &[0x2F, 0x79]);
        assert_eq!(Slot::decode(&bytes), Slot::Occupied(entry));
        assert_eq!(Slot::decode(&[0u8; 14]), Slot::Empty);
        assert_eq!(Slot::decode(&[0u8; 3]), Slot::Empty);

        let mut corrupt = bytes;
        corrupt[0] = 0x11;
        assert_eq!(Slot::decode(&corrupt), Slot::Corrupt);
    }

    #[test]
    fn test_insert_and_lookup() {
        let storage = storage();
        let mut dict = HashDictionary::create(&storage, "dictionary", "data", 7).unwrap();
        dict.insert("cat", "cat 0:1").unwrap();
        dict.insert("sat", "sat 0:2").unwrap();

        match dict.lookup("cat").unwrap() {
            Probe::Found { record, .. } => assert_eq!(record, "cat 0:1"),
            other => panic!("unexpected probe result {other:?}"),
        }
        assert_eq!(dict.lookup("dog").unwrap(), Probe::Absent);
        assert_eq!(dict.free(), "cat 0:1".len() as u64 + "sat 0:2".len() as u64);
    }

    #[test]
    fn test_collisions_are_probed_past() {
        let storage = storage();
        // A one-slot-wide table cannot hold two terms; three slots force probing.
        let mut dict = HashDictionary::create(&storage, "d", "p", 3).unwrap();
        let terms = ["a", "b", "c"];
        for term in terms {
            dict.insert(term, &format!("{term} 1:0")).unwrap();
        }
        for term in terms {
            assert!(matches!(dict.lookup(term).unwrap(), Probe::Found { .. }));
        }
        assert!(dict.insert("d", "d 1:0").is_err());
        assert_eq!(dict.term_count().unwrap(), 3);
    }

    #[test]
    fn test_full_table_does_not_grow_data_file() {
        let storage = storage();
        let mut dict = HashDictionary::create(&storage, "d", "p", 3).unwrap();
        for term in ["a", "b", "c"] {
            dict.insert(term, &format!("{term} 1:0")).unwrap();
        }
        dict.flush().unwrap();
        let free = dict.free();
        let size = storage.open_input("p").unwrap().size().unwrap();

        assert!(dict.insert("d", "d 1:0").is_err());
        assert!(dict.insert("e", "e 2:0 2:1").is_err());
        dict.flush().unwrap();

        assert_eq!(dict.free(), free);
        assert_eq!(storage.open_input("p").unwrap().size().unwrap(), size);
        assert_eq!(size, "a 1:0".len() as u64 * 3);
    }

    #[test]
    fn test_corrupt_slot_is_reported() {
        let storage = storage();
        {
            let mut dict = HashDictionary::create(&storage, "d", "p", 11).unwrap();
            dict.insert("cat", "cat 0:1").unwrap();
        }
        let offset = slot_offset("cat", 0, 11);
        {
            let mut file = storage.open_file("d").unwrap();
            file.seek(SeekFrom::Start(offset)).unwrap();
            file.write_all(&[0xFF, 0xFF]).unwrap();
        }
        let dict = HashDictionary::open(&storage, "d", "p", 11).unwrap();
        assert_eq!(dict.lookup("cat").unwrap(), Probe::Corrupt { slot: offset });
        assert_eq!(dict.term_count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_continues_appending() {
        let storage = storage();
        {
            let mut dict = HashDictionary::open(&storage, "d", "p", 11).unwrap();
            dict.insert("cat", "cat 0:1").unwrap();
            dict.flush().unwrap();
        }
        let mut dict = HashDictionary::open(&storage, "d", "p", 11).unwrap();
        assert_eq!(dict.free(), 7);
        dict.insert("dog", "dog 1:1").unwrap();
        assert!(matches!(dict.lookup("cat").unwrap(), Probe::Found { .. }));
        assert!(matches!(dict.lookup("dog").unwrap(), Probe::Found { .. }));
    }
}
