//! Configuration file handling.
//!
//! The CLI reads an INI file and maps it onto [`ServiceConfig`]. A missing
//! file or key falls back to defaults; present values are validated here so
//! mistakes surface with their section and key names.

use crate::coord::{MAX_LOD, MIN_LOD};
use crate::service::ServiceConfig;
use ini::Ini;
use std::path::Path;
use thiserror::Error;

/// Default directories, relative to the working directory.
const DEFAULT_STRINGS_DIR: &str = "index";
const DEFAULT_MAP_DATA_DIR: &str = "data";
const DEFAULT_ELEVATION_DIR: &str = "elevation";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// A value is present but unusable
    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Load a [`ServiceConfig`] from an INI file.
///
/// If the file does not exist, returns the default configuration.
/// Recognized keys:
///
/// ```ini
/// [paths]
/// strings = index
/// map_data = data
/// elevation = elevation
///
/// [elevation]
/// srtm_lod_start = 14
///
/// [terrain]
/// grid_size = 16
/// ```
pub fn load_from(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        return Ok(default_config());
    }

    let ini = Ini::load_from_file(path)?;
    parse_ini(&ini)
}

fn default_config() -> ServiceConfig {
    ServiceConfig::new(
        DEFAULT_STRINGS_DIR,
        DEFAULT_MAP_DATA_DIR,
        DEFAULT_ELEVATION_DIR,
    )
}

/// Overlay INI values onto the default configuration.
fn parse_ini(ini: &Ini) -> Result<ServiceConfig, ConfigError> {
    let mut strings = DEFAULT_STRINGS_DIR.to_string();
    let mut map_data = DEFAULT_MAP_DATA_DIR.to_string();
    let mut elevation = DEFAULT_ELEVATION_DIR.to_string();

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = section.get("strings") {
            let v = v.trim();
            if !v.is_empty() {
                strings = v.to_string();
            }
        }
        if let Some(v) = section.get("map_data") {
            let v = v.trim();
            if !v.is_empty() {
                map_data = v.to_string();
            }
        }
        if let Some(v) = section.get("elevation") {
            let v = v.trim();
            if !v.is_empty() {
                elevation = v.to_string();
            }
        }
    }

    let mut config = ServiceConfig::new(strings, map_data, elevation);

    // [elevation] section
    if let Some(section) = ini.section(Some("elevation")) {
        if let Some(v) = section.get("srtm_lod_start") {
            let level: i32 = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "elevation".to_string(),
                key: "srtm_lod_start".to_string(),
                value: v.to_string(),
                reason: "must be an integer level of detail".to_string(),
            })?;
            if !(MIN_LOD..=MAX_LOD).contains(&level) {
                return Err(ConfigError::InvalidValue {
                    section: "elevation".to_string(),
                    key: "srtm_lod_start".to_string(),
                    value: v.to_string(),
                    reason: format!("must be between {} and {}", MIN_LOD, MAX_LOD),
                });
            }
            config = config.with_srtm_lod_start(level);
        }
    }

    // [terrain] section
    if let Some(section) = ini.section(Some("terrain")) {
        if let Some(v) = section.get("grid_size") {
            let cells: usize = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "terrain".to_string(),
                key: "grid_size".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;
            if cells == 0 {
                return Err(ConfigError::InvalidValue {
                    section: "terrain".to_string(),
                    key: "grid_size".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config = config.with_terrain_grid_size(cells);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DEFAULT_TERRAIN_GRID_SIZE;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("quadmap.ini");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from(&dir.path().join("absent.ini")).unwrap();

        assert_eq!(config.strings_path(), Path::new(DEFAULT_STRINGS_DIR));
        assert_eq!(config.map_data_path(), Path::new(DEFAULT_MAP_DATA_DIR));
        assert_eq!(config.elevation_path(), Path::new(DEFAULT_ELEVATION_DIR));
        assert_eq!(config.srtm_lod_start(), None);
        assert_eq!(config.terrain_grid_size(), DEFAULT_TERRAIN_GRID_SIZE);
    }

    #[test]
    fn test_full_file_overlays_everything() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[paths]
strings = /var/quadmap/index
map_data = /var/quadmap/data
elevation = /var/quadmap/srtm

[elevation]
srtm_lod_start = 14

[terrain]
grid_size = 64
"#,
        );

        let config = load_from(&path).unwrap();
        assert_eq!(config.strings_path(), Path::new("/var/quadmap/index"));
        assert_eq!(config.map_data_path(), Path::new("/var/quadmap/data"));
        assert_eq!(config.elevation_path(), Path::new("/var/quadmap/srtm"));
        assert_eq!(config.srtm_lod_start(), Some(14));
        assert_eq!(config.terrain_grid_size(), 64);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[terrain]\ngrid_size = 8\n");

        let config = load_from(&path).unwrap();
        assert_eq!(config.terrain_grid_size(), 8);
        assert_eq!(config.strings_path(), Path::new(DEFAULT_STRINGS_DIR));
        assert_eq!(config.srtm_lod_start(), None);
    }

    #[test]
    fn test_empty_path_value_keeps_default() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[paths]\nstrings =  \n");

        let config = load_from(&path).unwrap();
        assert_eq!(config.strings_path(), Path::new(DEFAULT_STRINGS_DIR));
    }

    #[test]
    fn test_non_integer_lod_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[elevation]\nsrtm_lod_start = high\n");

        let error = load_from(&path).expect_err("Should reject");
        let text = error.to_string();
        assert!(text.contains("elevation.srtm_lod_start"), "Got: {}", text);
        assert!(text.contains("high"), "Got: {}", text);
    }

    #[test]
    fn test_out_of_range_lod_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[elevation]\nsrtm_lod_start = 17\n");

        let error = load_from(&path).expect_err("Should reject");
        assert!(error.to_string().contains("between 1 and 16"));
    }

    #[test]
    fn test_zero_grid_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[terrain]\ngrid_size = 0\n");

        let error = load_from(&path).expect_err("Should reject");
        assert!(error.to_string().contains("terrain.grid_size"));
    }
}
