//! Persistent string interning table.
//!
//! Tag keys and values repeat heavily across map data, so stored elements
//! reference strings by id instead of carrying the text. The table is an
//! append-only `strings.dat` file of length-prefixed UTF-8 records; the
//! record index is the id. The whole table is rebuilt into memory on open.

use dashmap::DashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::debug;

/// File name of the interning table inside the string path directory.
const STRINGS_FILE: &str = "strings.dat";

/// Error type for string table operations.
#[derive(Debug, thiserror::Error)]
pub enum StringTableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt string table at offset {offset}: {message}")]
    Corrupt { offset: u64, message: String },
}

/// Bidirectional string/id mapping backed by an append-only file.
///
/// Interning is concurrent: readers never block each other, and writers
/// serialize on the append handle.
pub struct StringTable {
    path: PathBuf,
    forward: DashMap<String, u32>,
    reverse: RwLock<Vec<String>>,
    writer: Mutex<BufWriter<File>>,
}

impl StringTable {
    /// Open the table rooted at the given directory, creating it if needed.
    pub fn open(directory: &Path) -> Result<Self, StringTableError> {
        std::fs::create_dir_all(directory)?;
        let path = directory.join(STRINGS_FILE);

        let strings = match File::open(&path) {
            Ok(file) => read_records(BufReader::new(file))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let forward = DashMap::with_capacity(strings.len());
        for (id, value) in strings.iter().enumerate() {
            forward.insert(value.clone(), id as u32);
        }

        let writer = OpenOptions::new().append(true).create(true).open(&path)?;

        debug!(
            strings = strings.len(),
            path = %path.display(),
            "opened string table"
        );

        Ok(Self {
            path,
            forward,
            reverse: RwLock::new(strings),
            writer: Mutex::new(BufWriter::new(writer)),
        })
    }

    /// Return the id for a string, appending it to the table if unseen.
    pub fn intern(&self, value: &str) -> Result<u32, StringTableError> {
        if let Some(id) = self.forward.get(value) {
            return Ok(*id);
        }

        let mut writer = self.writer.lock().unwrap();
        // Another thread may have appended the same string while we waited.
        if let Some(id) = self.forward.get(value) {
            return Ok(*id);
        }

        let mut reverse = self.reverse.write().unwrap();
        let id = reverse.len() as u32;

        let bytes = value.as_bytes();
        writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
        writer.write_all(bytes)?;

        reverse.push(value.to_string());
        self.forward.insert(value.to_string(), id);
        Ok(id)
    }

    /// Look up the string for an id.
    pub fn lookup(&self, id: u32) -> Option<String> {
        self.reverse.read().unwrap().get(id as usize).cloned()
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.reverse.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write buffered appends through to disk.
    pub fn flush(&self) -> Result<(), StringTableError> {
        self.writer.lock().unwrap().flush()?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every length-prefixed record until EOF.
fn read_records<R: Read>(mut reader: R) -> Result<Vec<String>, StringTableError> {
    let mut strings = Vec::new();
    let mut offset = 0u64;
    loop {
        let mut len_bytes = [0u8; 4];
        match reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut bytes = vec![0u8; len];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| StringTableError::Corrupt {
                offset,
                message: format!("record length {} exceeds remaining file", len),
            })?;

        let value = String::from_utf8(bytes).map_err(|_| StringTableError::Corrupt {
            offset,
            message: "record is not valid UTF-8".to_string(),
        })?;

        strings.push(value);
        offset += 4 + len as u64;
    }
    Ok(strings)
}
