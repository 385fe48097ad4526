use crate::coord::CoordError;
use crate::strings::StringTableError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The two store roles the service registers at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Scratch storage, lost when the service is dropped.
    InMemory,
    /// Tile files under the map data directory.
    Persistent,
}

impl StorageKind {
    /// Registry key the service uses for this role.
    pub fn store_key(&self) -> &'static str {
        match self {
            StorageKind::InMemory => "InMemory",
            StorageKind::Persistent => "Persistent",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.store_key())
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inmemory" | "in-memory" | "memory" => Ok(StorageKind::InMemory),
            "persistent" | "disk" => Ok(StorageKind::Persistent),
            other => Err(format!("unknown storage kind `{other}`")),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt element data: {0}")]
    Corrupt(String),

    #[error("no store registered under key `{0}`")]
    UnknownStore(String),

    #[error(transparent)]
    StringTable(#[from] StringTableError),

    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// Outcome of one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Elements read from the source.
    pub read: usize,
    /// Elements stored under at least one quad key.
    pub stored: usize,
    /// Elements dropped: no geometry, no matching style or outside the
    /// target region.
    pub skipped: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {}, stored {}, skipped {}",
            self.read, self.stored, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind_keys() {
        assert_eq!(StorageKind::InMemory.store_key(), "InMemory");
        assert_eq!(StorageKind::Persistent.store_key(), "Persistent");
    }

    #[test]
    fn test_storage_kind_from_str() {
        assert_eq!("memory".parse::<StorageKind>(), Ok(StorageKind::InMemory));
        assert_eq!("In-Memory".parse::<StorageKind>(), Ok(StorageKind::InMemory));
        assert_eq!("disk".parse::<StorageKind>(), Ok(StorageKind::Persistent));
        assert_eq!(
            "Persistent".parse::<StorageKind>(),
            Ok(StorageKind::Persistent)
        );
        assert!("tape".parse::<StorageKind>().is_err());
    }

    #[test]
    fn test_import_stats_display() {
        let stats = ImportStats {
            read: 10,
            stored: 8,
            skipped: 2,
        };
        assert_eq!(stats.to_string(), "read 10, stored 8, skipped 2");
    }
}
