use crate::coord::QuadKey;
use crate::entity::Element;
use crate::store::r#trait::ElementStore;
use crate::store::{codec, StoreError};
use crate::strings::StringTable;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Element store backed by tile files.
///
/// Inserts are buffered in memory and appended to
/// `<root>/<level_of_detail>/<quad key>.qmd` on [`flush`]. Reads merge the
/// on-disk tile with whatever is still buffered, so a loaded quad key sees
/// every insert regardless of flush timing.
///
/// [`flush`]: ElementStore::flush
pub struct PersistentStore {
    root: PathBuf,
    strings: Arc<StringTable>,
    pending: RwLock<HashMap<QuadKey, Vec<Element>>>,
}

impl PersistentStore {
    pub fn new(root: impl Into<PathBuf>, strings: Arc<StringTable>) -> Self {
        Self {
            root: root.into(),
            strings,
            pending: RwLock::new(HashMap::new()),
        }
    }

    fn tile_path(&self, quad_key: &QuadKey) -> PathBuf {
        self.root
            .join(quad_key.level_of_detail.to_string())
            .join(format!("{quad_key}.qmd"))
    }

    fn write_tile(&self, quad_key: &QuadKey, elements: &[Element]) -> Result<(), StoreError> {
        let path = self.tile_path(quad_key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);
        if is_new {
            codec::write_magic(&mut writer)?;
        }
        for element in elements {
            codec::write_element(&mut writer, element, &self.strings)?;
        }
        writer.flush()?;

        debug!(quad_key = %quad_key, count = elements.len(), "flushed tile");
        Ok(())
    }

    fn read_tile(&self, path: &Path) -> Result<Vec<Element>, StoreError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        if let Err(e) = codec::read_magic(&mut reader) {
            warn!(path = %path.display(), error = %e, "unreadable tile file");
            return Err(e);
        }

        let mut elements = Vec::new();
        while let Some(element) = codec::read_element(&mut reader, &self.strings)? {
            elements.push(element);
        }
        Ok(elements)
    }
}

impl ElementStore for PersistentStore {
    fn insert(&self, quad_key: &QuadKey, element: &Element) -> Result<(), StoreError> {
        self.pending
            .write()
            .unwrap()
            .entry(*quad_key)
            .or_default()
            .push(element.clone());
        Ok(())
    }

    fn elements(&self, quad_key: &QuadKey) -> Result<Vec<Element>, StoreError> {
        let mut elements = self.read_tile(&self.tile_path(quad_key))?;
        if let Some(pending) = self.pending.read().unwrap().get(quad_key) {
            elements.extend(pending.iter().cloned());
        }
        Ok(elements)
    }

    fn has_data(&self, quad_key: &QuadKey) -> bool {
        if self
            .pending
            .read()
            .unwrap()
            .get(quad_key)
            .map_or(false, |buffered| !buffered.is_empty())
        {
            return true;
        }
        self.tile_path(quad_key).exists()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let mut pending = self.pending.write().unwrap();
        let quad_keys: Vec<QuadKey> = pending.keys().copied().collect();
        for quad_key in quad_keys {
            if let Some(elements) = pending.remove(&quad_key) {
                if let Err(e) = self.write_tile(&quad_key, &elements) {
                    // Keep the tile buffered so a retry can flush it.
                    pending.insert(quad_key, elements);
                    return Err(e);
                }
            }
        }
        drop(pending);

        self.strings.flush()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.pending.write().unwrap().clear();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let level_dir = entry?.path();
            if !level_dir.is_dir() {
                continue;
            }
            for tile in fs::read_dir(&level_dir)? {
                let path = tile?.path();
                if path.extension().map_or(false, |ext| ext == "qmd") {
                    fs::remove_file(&path)?;
                }
            }
        }

        debug!(root = %self.root.display(), "cleared tile files");
        Ok(())
    }
}
